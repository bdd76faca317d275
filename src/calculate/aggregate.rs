//! Cross-tournament player and deck leaderboards.

use std::cmp::Ordering;

use crate::models::{DeckAgg, MetaAggregate, PlayerAgg, PointRules, Tournament};

use super::{
    calculate_share, calculate_win_rate, rate_desc, resolve_match, Ledger, Outcome, Resolution,
};

impl PlayerAgg {
    fn record(&mut self, outcome: Outcome, rules: &PointRules) {
        self.matches += 1;
        self.points += outcome.points(rules);
        match outcome {
            Outcome::Win | Outcome::ByeWin => self.wins += 1,
            Outcome::Loss => self.losses += 1,
            Outcome::Draw => self.draws += 1,
        }
    }
}

impl DeckAgg {
    fn record(&mut self, outcome: Outcome) {
        self.matches += 1;
        match outcome {
            Outcome::Win | Outcome::ByeWin => self.wins += 1,
            Outcome::Loss => self.losses += 1,
            Outcome::Draw => self.draws += 1,
        }
    }
}

/// Fold a set of tournaments into global player and deck leaderboards.
///
/// Each tournament scores with its own point rules. Names are taken from the
/// first tournament an id appears in. A match counts only when both players
/// are on some roster in the set; its deck side additionally needs both
/// players to have an entry.
pub fn aggregate_players_and_decks(tournaments: &[Tournament]) -> MetaAggregate {
    let mut players: Ledger<PlayerAgg> = Ledger::new();
    let mut decks: Ledger<DeckAgg> = Ledger::new();
    let mut total_entries = 0u32;

    for t in tournaments {
        let deck_of = t.deck_index();
        let names = t.deck_names();

        for p in &t.players {
            let Some(did) = deck_of.get(p.pid.as_str()).copied() else {
                continue;
            };
            total_entries += 1;
            let name = names.get(did).copied().unwrap_or(did);
            decks
                .ensure(did, || DeckAgg {
                    did: did.into(),
                    deck_name: name.to_string(),
                    entries: 0,
                    meta_share: 0.0,
                    matches: 0,
                    wins: 0,
                    losses: 0,
                    draws: 0,
                    win_rate: 0.0,
                })
                .entries += 1;
        }

        for p in &t.players {
            players
                .ensure(p.pid.as_str(), || PlayerAgg {
                    pid: p.pid.clone(),
                    name: p.name.clone(),
                    tournaments: 0,
                    matches: 0,
                    wins: 0,
                    losses: 0,
                    draws: 0,
                    points: 0,
                    win_rate: 0.0,
                })
                .tournaments += 1;
        }

        let rules = &t.format.rules;
        for m in t.matches() {
            let (a, b, a_outcome, b_outcome) = match resolve_match(m) {
                Resolution::Bye { player } => {
                    if let Some(agg) = players.get_mut(player.as_str()) {
                        agg.record(Outcome::ByeWin, rules);
                    }
                    continue;
                }
                Resolution::Contest {
                    a,
                    b,
                    a_outcome,
                    b_outcome,
                } => (a.as_str(), b.as_str(), a_outcome, b_outcome),
                Resolution::Unresolved => continue,
            };

            if !players.contains(a) || !players.contains(b) {
                continue;
            }
            if let Some(agg) = players.get_mut(a) {
                agg.record(a_outcome, rules);
            }
            if let Some(agg) = players.get_mut(b) {
                agg.record(b_outcome, rules);
            }

            let (Some(a_did), Some(b_did)) = (deck_of.get(a).copied(), deck_of.get(b).copied())
            else {
                continue;
            };
            if !decks.contains(a_did) || !decks.contains(b_did) {
                continue;
            }
            if let Some(agg) = decks.get_mut(a_did) {
                agg.record(a_outcome);
            }
            if let Some(agg) = decks.get_mut(b_did) {
                agg.record(b_outcome);
            }
        }
    }

    let mut players = players.into_rows();
    for p in &mut players {
        p.win_rate = calculate_win_rate(p.wins, p.losses, p.draws);
    }
    players.sort_by(player_order);

    let mut decks = decks.into_rows();
    for d in &mut decks {
        d.meta_share = calculate_share(d.entries, total_entries);
        d.win_rate = calculate_win_rate(d.wins, d.losses, d.draws);
    }
    decks.sort_by(deck_order);

    MetaAggregate {
        players,
        decks,
        total_entries,
    }
}

fn player_order(x: &PlayerAgg, y: &PlayerAgg) -> Ordering {
    y.points
        .cmp(&x.points)
        .then_with(|| rate_desc(x.win_rate, y.win_rate))
        .then_with(|| y.matches.cmp(&x.matches))
}

fn deck_order(x: &DeckAgg, y: &DeckAgg) -> Ordering {
    rate_desc(x.meta_share, y.meta_share)
        .then_with(|| rate_desc(x.win_rate, y.win_rate))
        .then_with(|| y.matches.cmp(&x.matches))
}
