//! Live tournament editing.
//!
//! [`LiveSession`] owns the single working tournament of a local organizer.
//! Every edit is applied to a copy, persisted through the [`LiveStore`] port
//! and only then committed, so the stored blob and the in-memory record never
//! drift apart. The session does not pair players and does not check
//! tournament legality beyond the round-locking rules below.

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::DeckCatalog;
use crate::config::LiveConfig;
use crate::models::{
    EntityId, Entry, Match, MatchId, MatchResult, Player, PlayerId, PointRules, Round, Tournament,
};
use crate::storage::{LiveStore, StorageError};

/// Rejected edits.
#[derive(Debug, Error)]
pub enum LiveError {
    #[error("No round has been started")]
    NoRound,

    #[error("Round {0} is locked")]
    RoundLocked(u32),

    #[error("Match not found: {0}")]
    MatchNotFound(String),

    #[error("Unknown player: {0}")]
    UnknownPlayer(String),

    #[error("A player cannot be paired against themselves: {0}")]
    SelfPairing(String),

    #[error("Round {round} still has {pending} match(es) without a result")]
    ResultsMissing { round: u32, pending: usize },

    #[error("All {0} rounds have been played")]
    RoundLimitReached(u32),

    #[error("Round {0} must be closed before the next one starts")]
    PreviousRoundOpen(u32),

    #[error("Tournament already has {0} round(s)")]
    AlreadyStarted(u32),

    #[error("Round count must be at least 1")]
    InvalidRoundCount,

    #[error("Invalid result: {0}")]
    InvalidResult(String),

    #[error("Name must not be empty")]
    EmptyName,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result alias for live edits.
pub type LiveResult<T> = Result<T, LiveError>;

/// The working tournament plus the store it is saved to.
pub struct LiveSession<S: LiveStore> {
    store: S,
    tournament: Tournament,
    catalog: DeckCatalog,
    defaults: LiveConfig,
}

impl<S: LiveStore> LiveSession<S> {
    /// Resume the stored tournament, or start an empty one dated `today`.
    pub fn open(store: S, defaults: LiveConfig, today: NaiveDate) -> LiveResult<Self> {
        let tournament = match store.load()? {
            Some(t) => {
                info!("Resumed live tournament {} ({} rounds)", t.id, t.rounds.len());
                t
            }
            None => empty_tournament(&defaults, today),
        };
        Ok(Self {
            store,
            tournament,
            catalog: DeckCatalog::default(),
            defaults,
        })
    }

    pub fn tournament(&self) -> &Tournament {
        &self.tournament
    }

    pub fn catalog(&self) -> &DeckCatalog {
        &self.catalog
    }

    /// Apply `edit` to a copy, persist it, then commit it.
    fn apply<R>(
        &mut self,
        action: &str,
        edit: impl FnOnce(&mut Tournament) -> LiveResult<R>,
    ) -> LiveResult<R> {
        let mut next = self.tournament.clone();
        let out = edit(&mut next)?;
        self.store.save(&next)?;
        self.tournament = next;
        debug!("live {}: saved {}", action, self.tournament.id);
        Ok(out)
    }

    /// Replace the working tournament with an empty one.
    pub fn new_tournament(
        &mut self,
        name: Option<&str>,
        date: NaiveDate,
    ) -> LiveResult<&Tournament> {
        let name = match name.map(str::trim) {
            Some("") => return Err(LiveError::EmptyName),
            Some(n) => n.to_string(),
            None => self.defaults.default_name.clone(),
        };
        let fresh = Tournament::new(name, date, self.defaults.format());
        self.apply("new", |t| {
            *t = fresh;
            Ok(())
        })?;
        info!("Started live tournament {}", self.tournament.id);
        Ok(&self.tournament)
    }

    pub fn rename(&mut self, name: &str) -> LiveResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LiveError::EmptyName);
        }
        self.apply("rename", |t| {
            t.name = name.to_string();
            Ok(())
        })
    }

    pub fn set_date(&mut self, date: NaiveDate) -> LiveResult<()> {
        self.apply("set_date", |t| {
            t.date = date;
            Ok(())
        })
    }

    /// Empty clears the location.
    pub fn set_location(&mut self, location: &str) -> LiveResult<()> {
        let location = location.trim();
        self.apply("set_location", |t| {
            t.location = (!location.is_empty()).then(|| location.to_string());
            Ok(())
        })
    }

    /// Planned number of rounds. Cannot drop below the rounds already created.
    pub fn set_rounds(&mut self, rounds: u32) -> LiveResult<()> {
        if rounds == 0 {
            return Err(LiveError::InvalidRoundCount);
        }
        self.apply("set_rounds", |t| {
            let created = t.rounds.len() as u32;
            if rounds < created {
                return Err(LiveError::AlreadyStarted(created));
            }
            t.format.rounds = rounds;
            Ok(())
        })
    }

    pub fn set_rules(&mut self, rules: PointRules) -> LiveResult<()> {
        self.apply("set_rules", |t| {
            t.format.rules = rules;
            Ok(())
        })
    }

    /// Add a roster player and return their new id.
    pub fn add_player(&mut self, name: &str) -> LiveResult<PlayerId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LiveError::EmptyName);
        }
        let pid = EntityId::random("p");
        let player = Player {
            pid: pid.clone(),
            name: name.to_string(),
        };
        self.apply("add_player", |t| {
            t.players.push(player);
            Ok(())
        })?;
        info!("Added player {} ({})", name, pid);
        Ok(pid)
    }

    /// Assign a deck to a player; an empty `did` clears the assignment.
    pub fn set_entry(&mut self, pid: &str, did: &str) -> LiveResult<()> {
        let did = did.trim();
        let mut next = self.tournament.clone();
        if next.player(pid).is_none() {
            return Err(LiveError::UnknownPlayer(pid.to_string()));
        }
        next.entries.retain(|e| e.pid != pid);
        if !did.is_empty() {
            next.entries.push(Entry {
                pid: pid.into(),
                did: did.into(),
            });
        }
        if !self.catalog.is_empty() {
            next.decks = self.catalog.snapshot_decks(&next.entries);
        }
        self.apply("set_entry", |t| {
            *t = next;
            Ok(())
        })
    }

    /// Install a catalog and rebuild the tournament's deck snapshot from it.
    pub fn sync_decks(&mut self, catalog: DeckCatalog) -> LiveResult<()> {
        self.catalog = catalog;
        if self.catalog.is_empty() {
            return Ok(());
        }
        let decks = self.catalog.snapshot_decks(&self.tournament.entries);
        if decks == self.tournament.decks {
            return Ok(());
        }
        self.apply("sync_decks", |t| {
            t.decks = decks;
            Ok(())
        })
    }

    /// Open the next round and return its number.
    ///
    /// The first round opens when none exist; later rounds need the current
    /// one locked and the planned round count not yet reached.
    pub fn start_round(&mut self) -> LiveResult<u32> {
        let r = self.apply("start_round", |t| {
            if let Some(current) = t.rounds.last() {
                if !current.locked {
                    return Err(LiveError::PreviousRoundOpen(current.r));
                }
                if t.rounds.len() as u32 >= t.format.rounds {
                    return Err(LiveError::RoundLimitReached(t.format.rounds));
                }
            }
            let r = t.rounds.len() as u32 + 1;
            t.rounds.push(Round::new(r));
            Ok(r)
        })?;
        info!("Round {} started", r);
        Ok(r)
    }

    /// Add a table to the current round. Without `b` the match is a bye.
    pub fn add_match(&mut self, a: &str, b: Option<&str>) -> LiveResult<MatchId> {
        self.apply("add_match", |t| {
            for pid in std::iter::once(a).chain(b) {
                if t.player(pid).is_none() {
                    return Err(LiveError::UnknownPlayer(pid.to_string()));
                }
            }
            if b == Some(a) {
                return Err(LiveError::SelfPairing(a.to_string()));
            }

            let round = t.rounds.last_mut().ok_or(LiveError::NoRound)?;
            if round.locked {
                return Err(LiveError::RoundLocked(round.r));
            }
            let table = round.matches.len() as u32 + 1;
            let m = match b {
                Some(b) => Match::pairing(table, a.into(), b.into()),
                None => Match::bye(table, a.into()),
            };
            let mid = m.mid.clone();
            round.matches.push(m);
            Ok(mid)
        })
    }

    /// Record the result of a two-sided match in an open round.
    pub fn set_result(&mut self, mid: &str, result: MatchResult) -> LiveResult<()> {
        self.apply("set_result", |t| {
            let round = t
                .rounds
                .iter_mut()
                .find(|r| r.matches.iter().any(|m| m.mid == mid))
                .ok_or_else(|| LiveError::MatchNotFound(mid.to_string()))?;
            if round.locked {
                return Err(LiveError::RoundLocked(round.r));
            }
            let m = round
                .matches
                .iter_mut()
                .find(|m| m.mid == mid)
                .ok_or_else(|| LiveError::MatchNotFound(mid.to_string()))?;

            match (m.is_bye(), result) {
                (true, _) => Err(LiveError::InvalidResult(format!(
                    "match {} is a bye and cannot be edited",
                    mid
                ))),
                (false, MatchResult::Bye) => Err(LiveError::InvalidResult(
                    "BYE is only valid for a match without side B".to_string(),
                )),
                (false, result) => {
                    m.result = Some(result);
                    Ok(())
                }
            }
        })
    }

    /// Lock the current round once every two-sided match has a result.
    pub fn close_round(&mut self) -> LiveResult<u32> {
        let r = self.apply("close_round", |t| {
            let round = t.rounds.last_mut().ok_or(LiveError::NoRound)?;
            if round.locked {
                return Err(LiveError::RoundLocked(round.r));
            }
            let pending = round.matches.iter().filter(|m| m.is_pending()).count();
            if pending > 0 {
                return Err(LiveError::ResultsMissing {
                    round: round.r,
                    pending,
                });
            }
            round.locked = true;
            Ok(round.r)
        })?;
        info!("Round {} closed", r);
        Ok(r)
    }

    /// Drop the stored tournament and start an empty one dated `today`.
    pub fn reset(&mut self, today: NaiveDate) -> LiveResult<()> {
        self.store.clear()?;
        self.tournament = empty_tournament(&self.defaults, today);
        info!("Live tournament reset");
        Ok(())
    }
}

fn empty_tournament(defaults: &LiveConfig, date: NaiveDate) -> Tournament {
    Tournament::new(defaults.default_name.clone(), date, defaults.format())
}
