//! Statistics calculation engine.
//!
//! Pure functions from tournament records to derived metrics:
//! - Single-tournament standings, deck stats and deck-vs-deck matchups
//! - Cross-tournament player and deck leaderboards
//! - Deck Lab: one deck against the field, best/worst matchups, monthly trend
//!
//! Every function here is deterministic and side-effect free. Inputs are
//! borrowed and never mutated, nothing is logged, nothing is cached.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;

mod aggregate;
mod deck_lab;
mod deck_stats;
mod matchups;
mod outcome;
mod standings;

pub use aggregate::*;
pub use deck_lab::*;
pub use deck_stats::*;
pub use matchups::*;
pub use outcome::*;
pub use standings::*;

/// Draw-exclusive win rate: `wins / (wins + losses + draws)`, 0 when empty.
pub fn calculate_win_rate(wins: u32, losses: u32, draws: u32) -> f64 {
    let total = wins + losses + draws;
    if total == 0 {
        0.0
    } else {
        wins as f64 / total as f64
    }
}

/// Draw-inclusive win rate: `(wins + 0.5 * draws) / (wins + losses + draws)`.
///
/// Only Deck Lab uses this one.
pub fn calculate_score_rate(wins: u32, losses: u32, draws: u32) -> f64 {
    let total = wins + losses + draws;
    if total == 0 {
        0.0
    } else {
        (wins as f64 + 0.5 * draws as f64) / total as f64
    }
}

/// `part / total`, 0 when `total` is 0.
pub fn calculate_share(part: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

/// Descending order for rates. Rates are never NaN.
pub(crate) fn rate_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Keyed accumulator that remembers first-seen order.
///
/// Rows are created lazily through [`Ledger::ensure`]; iteration and
/// [`Ledger::into_rows`] follow insertion order so that stable sorts break
/// ties the same way on every run. Keys default to ids; composite keys such
/// as deck pairs use a tuple rather than a joined string.
#[derive(Debug)]
pub(crate) struct Ledger<T, K = String> {
    index: HashMap<K, usize>,
    rows: Vec<T>,
}

impl<T, K: Hash + Eq> Ledger<T, K> {
    pub(crate) fn new() -> Self {
        Self {
            index: HashMap::new(),
            rows: Vec::new(),
        }
    }

    pub(crate) fn ensure<Q>(&mut self, key: &Q, init: impl FnOnce() -> T) -> &mut T
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
    {
        let idx = match self.index.get(key) {
            Some(&idx) => idx,
            None => {
                self.rows.push(init());
                let idx = self.rows.len() - 1;
                self.index.insert(key.to_owned(), idx);
                idx
            }
        };
        &mut self.rows[idx]
    }

    pub(crate) fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut T>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.index.get(key)?;
        self.rows.get_mut(idx)
    }

    pub(crate) fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    pub(crate) fn into_rows(self) -> Vec<T> {
        self.rows
    }
}

/// Win/loss/draw counter shared by the Deck Lab computations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Tally {
    pub matches: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl Tally {
    pub(crate) fn record(&mut self, outcome: Outcome) {
        self.matches += 1;
        match outcome {
            Outcome::Win | Outcome::ByeWin => self.wins += 1,
            Outcome::Loss => self.losses += 1,
            Outcome::Draw => self.draws += 1,
        }
    }

    pub(crate) fn score_rate(&self) -> f64 {
        calculate_score_rate(self.wins, self.losses, self.draws)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Small tournament builders for tests.

    use chrono::NaiveDate;

    use crate::models::{
        Deck, Entry, Match, MatchResult, Player, PointRules, Round, Tournament, TournamentFormat,
    };

    pub fn tournament(id: &str, date: &str) -> Tournament {
        let mut t = Tournament::new(
            format!("Weekly {}", id),
            NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            TournamentFormat::default(),
        );
        t.id = id.into();
        t
    }

    pub fn with_rules(mut t: Tournament, win: u32, draw: u32, loss: u32) -> Tournament {
        t.format.rules = PointRules {
            win_points: win,
            draw_points: draw,
            loss_points: loss,
        };
        t
    }

    /// Adds a player, and an entry when `deck` is given.
    pub fn player(t: &mut Tournament, pid: &str, name: &str, deck: Option<&str>) {
        t.players.push(Player {
            pid: pid.into(),
            name: name.to_string(),
        });
        if let Some(did) = deck {
            t.entries.push(Entry {
                pid: pid.into(),
                did: did.into(),
            });
            if !t.decks.iter().any(|d| d.did == did) {
                t.decks.push(Deck {
                    did: did.into(),
                    name: did.to_uppercase(),
                });
            }
        }
    }

    fn round_mut(t: &mut Tournament, r: u32) -> &mut Round {
        if !t.rounds.iter().any(|round| round.r == r) {
            t.rounds.push(Round::new(r));
        }
        t.rounds.iter_mut().find(|round| round.r == r).unwrap()
    }

    /// Adds a two-sided match; `result` is a stored code or `None` for pending.
    pub fn game(t: &mut Tournament, r: u32, a: &str, b: &str, result: Option<&str>) {
        let round = round_mut(t, r);
        let table = round.matches.len() as u32 + 1;
        let mut m = Match::pairing(table, a.into(), b.into());
        m.result = result.and_then(MatchResult::from_code);
        round.matches.push(m);
    }

    pub fn bye(t: &mut Tournament, r: u32, a: &str) {
        let round = round_mut(t, r);
        let table = round.matches.len() as u32 + 1;
        round.matches.push(Match::bye(table, a.into()));
    }
}
