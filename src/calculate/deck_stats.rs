//! Single-tournament deck statistics.

use std::cmp::Ordering;

use crate::models::{DeckTournamentStats, Tournament};

use super::{calculate_win_rate, rate_desc, resolve_deck_contest, Ledger, Outcome};

impl DeckTournamentStats {
    fn empty(did: &str, deck_name: &str) -> Self {
        Self {
            did: did.into(),
            deck_name: deck_name.to_string(),
            players: 0,
            meta_share: 0.0,
            matches: 0,
            wins: 0,
            losses: 0,
            draws: 0,
            win_rate: 0.0,
        }
    }

    fn record(&mut self, outcome: Outcome) {
        self.matches += 1;
        match outcome {
            Outcome::Win | Outcome::ByeWin => self.wins += 1,
            Outcome::Loss => self.losses += 1,
            Outcome::Draw => self.draws += 1,
        }
    }
}

/// Meta share and draw-exclusive win rate of every deck in one tournament.
///
/// Players without an entry do not count toward any deck, but they still
/// count in the meta-share denominator.
pub fn compute_deck_stats(t: &Tournament) -> Vec<DeckTournamentStats> {
    let total_players = t.players.len().max(1) as u32;
    let deck_of = t.deck_index();
    let names = t.deck_names();

    let mut ledger: Ledger<DeckTournamentStats> = Ledger::new();
    let ensure = |ledger: &mut Ledger<DeckTournamentStats>, did: &str| {
        let name = names.get(did).copied().unwrap_or(did);
        ledger.ensure(did, || DeckTournamentStats::empty(did, name));
    };

    for p in &t.players {
        let Some(did) = deck_of.get(p.pid.as_str()).copied() else {
            continue;
        };
        ensure(&mut ledger, did);
        if let Some(stat) = ledger.get_mut(did) {
            stat.players += 1;
        }
    }

    for m in t.matches() {
        let Some(contest) = resolve_deck_contest(m, &deck_of) else {
            continue;
        };
        ensure(&mut ledger, contest.a_did);
        ensure(&mut ledger, contest.b_did);
        if let Some(a) = ledger.get_mut(contest.a_did) {
            a.record(contest.a_outcome);
        }
        if let Some(b) = ledger.get_mut(contest.b_did) {
            b.record(contest.b_outcome);
        }
    }

    let mut stats = ledger.into_rows();
    for s in &mut stats {
        s.meta_share = s.players as f64 / total_players as f64;
        s.win_rate = calculate_win_rate(s.wins, s.losses, s.draws);
    }
    stats.sort_by(meta_relevance);
    stats
}

/// Meta share desc, win rate desc, matches desc.
pub(crate) fn meta_relevance(a: &DeckTournamentStats, b: &DeckTournamentStats) -> Ordering {
    rate_desc(a.meta_share, b.meta_share)
        .then_with(|| rate_desc(a.win_rate, b.win_rate))
        .then_with(|| b.matches.cmp(&a.matches))
}
