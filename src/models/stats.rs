//! Derived statistics models.
//!
//! None of these are persisted; they are recomputed from tournament records
//! on demand by [`crate::calculate`].

use serde::{Deserialize, Serialize};

use super::{DeckId, PlayerId};
use crate::calculate::rate_desc;

/// One player's line in a single tournament's standings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStanding {
    pub pid: PlayerId,
    pub name: String,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub points: u32,
    /// Resolved matches, byes included.
    pub played: u32,
}

/// Per-deck meta share and performance within one tournament.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckTournamentStats {
    pub did: DeckId,
    pub deck_name: String,
    pub players: u32,
    pub meta_share: f64,
    /// Two-sided matches against a known deck (byes excluded).
    pub matches: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    /// `wins / matches`; draws do not count as partial wins.
    pub win_rate: f64,
}

impl DeckTournamentStats {
    /// Whether the match count clears a display gate.
    pub fn meets_sample(&self, min_matches: u32) -> bool {
        self.matches >= min_matches
    }
}

/// Head-to-head record of an unordered deck pair, `a_did < b_did`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckVsDeckCell {
    pub a_did: DeckId,
    pub b_did: DeckId,
    pub matches: u32,
    pub a_wins: u32,
    pub b_wins: u32,
    pub draws: u32,
    /// `a_wins / matches`.
    pub a_win_rate: f64,
}

/// Player leaderboard line across a set of tournaments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerAgg {
    pub pid: PlayerId,
    /// First name seen for this id.
    pub name: String,
    pub tournaments: u32,
    pub matches: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub points: u32,
    pub win_rate: f64,
}

/// Deck leaderboard line across a set of tournaments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckAgg {
    pub did: DeckId,
    /// First name seen for this id.
    pub deck_name: String,
    /// One per (player, tournament) pair piloting the deck.
    pub entries: u32,
    pub meta_share: f64,
    pub matches: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub win_rate: f64,
}

impl DeckAgg {
    /// `meta_share × win_rate`: popular and strong at the same time.
    pub fn dominance(&self) -> f64 {
        self.meta_share * self.win_rate
    }

    pub fn meets_sample(&self, min_matches: u32) -> bool {
        self.matches >= min_matches
    }
}

/// Output of the cross-tournament aggregator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaAggregate {
    pub players: Vec<PlayerAgg>,
    pub decks: Vec<DeckAgg>,
    pub total_entries: u32,
}

impl MetaAggregate {
    /// Decks with at least `min_matches`, strongest first.
    pub fn decks_by_win_rate(&self, min_matches: u32) -> Vec<&DeckAgg> {
        let mut decks: Vec<_> = self
            .decks
            .iter()
            .filter(|d| d.meets_sample(min_matches))
            .collect();
        decks.sort_by(|a, b| rate_desc(a.win_rate, b.win_rate));
        decks
    }

    /// Decks with at least `min_matches`, highest dominance first.
    pub fn decks_by_dominance(&self, min_matches: u32) -> Vec<&DeckAgg> {
        let mut decks: Vec<_> = self
            .decks
            .iter()
            .filter(|d| d.meets_sample(min_matches))
            .collect();
        decks.sort_by(|a, b| rate_desc(a.dominance(), b.dominance()));
        decks
    }

    pub fn deck(&self, did: &str) -> Option<&DeckAgg> {
        self.decks.iter().find(|d| d.did == did)
    }

    pub fn player(&self, pid: &str) -> Option<&PlayerAgg> {
        self.players.iter().find(|p| p.pid == pid)
    }
}

/// Selected deck's record against one opponent deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckVsRow {
    pub opponent_did: DeckId,
    pub matches: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    /// Draw-inclusive: `(wins + 0.5 * draws) / matches`.
    pub win_rate: f64,
}

/// Selected deck's record against the whole field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckVsSummary {
    pub did: DeckId,
    /// Distinct tournaments with at least one contest involving the deck.
    pub tournaments: u32,
    pub matches: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    /// Draw-inclusive.
    pub win_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckVsField {
    pub summary: DeckVsSummary,
    pub rows: Vec<DeckVsRow>,
}

/// Best and worst sample-gated matchups; `worst[0]` is the single worst.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BestWorst {
    pub best: Vec<DeckVsRow>,
    pub worst: Vec<DeckVsRow>,
}

/// One month of the selected deck's results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    /// `YYYY-MM`.
    pub ym: String,
    pub matches: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    /// Draw-inclusive.
    pub win_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deck(did: &str, meta_share: f64, matches: u32, win_rate: f64) -> DeckAgg {
        DeckAgg {
            did: did.into(),
            deck_name: did.to_string(),
            entries: 0,
            meta_share,
            matches,
            wins: 0,
            losses: 0,
            draws: 0,
            win_rate,
        }
    }

    #[test]
    fn test_dominance() {
        let d = deck("suisei", 0.25, 10, 0.6);
        assert!((d.dominance() - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_decks_by_win_rate_gates_sample() {
        let agg = MetaAggregate {
            players: vec![],
            decks: vec![
                deck("a", 0.5, 5, 0.9),
                deck("b", 0.3, 6, 0.4),
                deck("c", 0.2, 12, 0.7),
            ],
            total_entries: 10,
        };

        let ranked: Vec<_> = agg
            .decks_by_win_rate(6)
            .iter()
            .map(|d| d.did.as_str())
            .collect();
        assert_eq!(ranked, vec!["c", "b"]);
    }

    #[test]
    fn test_decks_by_dominance() {
        let agg = MetaAggregate {
            players: vec![],
            decks: vec![deck("popular", 0.5, 20, 0.4), deck("strong", 0.2, 20, 0.8)],
            total_entries: 10,
        };

        let ranked = agg.decks_by_dominance(6);
        assert_eq!(ranked[0].did, "popular"); // 0.20 vs 0.16
        assert_eq!(ranked[1].did, "strong");
    }

    #[test]
    fn test_sample_gate_keeps_raw_rate() {
        let stat = DeckTournamentStats {
            did: "azki".into(),
            deck_name: "AZKi".to_string(),
            players: 2,
            meta_share: 0.2,
            matches: 5,
            wins: 3,
            losses: 2,
            draws: 0,
            win_rate: 0.6,
        };
        assert!(!stat.meets_sample(6));
        assert_eq!(stat.win_rate, 0.6);
    }

    #[test]
    fn test_serialization_is_camel_case() {
        let point = TrendPoint {
            ym: "2026-02".to_string(),
            matches: 2,
            wins: 1,
            losses: 0,
            draws: 1,
            win_rate: 0.75,
        };
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["winRate"], 0.75);
        assert_eq!(json["ym"], "2026-02");
    }
}
