//! Single-tournament standings.

use std::cmp::Ordering;

use crate::models::{PlayerStanding, Tournament};

use super::{resolve_match, Ledger, Outcome, Resolution};

impl PlayerStanding {
    fn record(&mut self, outcome: Outcome, points: u32) {
        self.played += 1;
        self.points += points;
        match outcome {
            Outcome::Win | Outcome::ByeWin => self.wins += 1,
            Outcome::Loss => self.losses += 1,
            Outcome::Draw => self.draws += 1,
        }
    }
}

/// Rank every roster player by points, then wins, then name.
///
/// Matches naming a pid that is not on the roster are ignored for that side.
pub fn compute_standings(t: &Tournament) -> Vec<PlayerStanding> {
    let rules = &t.format.rules;

    let mut ledger: Ledger<PlayerStanding> = Ledger::new();
    for p in &t.players {
        ledger.ensure(p.pid.as_str(), || PlayerStanding {
            pid: p.pid.clone(),
            name: p.name.clone(),
            wins: 0,
            losses: 0,
            draws: 0,
            points: 0,
            played: 0,
        });
    }

    let mut apply = |pid: &str, outcome: Outcome| {
        if let Some(s) = ledger.get_mut(pid) {
            s.record(outcome, outcome.points(rules));
        }
    };

    for m in t.matches() {
        match resolve_match(m) {
            Resolution::Bye { player } => apply(player.as_str(), Outcome::ByeWin),
            Resolution::Contest {
                a,
                b,
                a_outcome,
                b_outcome,
            } => {
                apply(a.as_str(), a_outcome);
                apply(b.as_str(), b_outcome);
            }
            Resolution::Unresolved => {}
        }
    }

    let mut standings = ledger.into_rows();
    standings.sort_by(standing_order);
    standings
}

/// Points desc, wins desc, name asc (case-insensitive first, exact second).
fn standing_order(x: &PlayerStanding, y: &PlayerStanding) -> Ordering {
    y.points
        .cmp(&x.points)
        .then_with(|| y.wins.cmp(&x.wins))
        .then_with(|| x.name.to_lowercase().cmp(&y.name.to_lowercase()))
        .then_with(|| x.name.cmp(&y.name))
}
