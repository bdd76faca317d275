//! Outcome resolution: stored result code → per-side outcome.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::{Match, MatchResult, PlayerId, PointRules};

/// Outcome credited to one side of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Win,
    Loss,
    Draw,
    /// Forced win with no opponent.
    ByeWin,
}

impl Outcome {
    pub fn is_win(&self) -> bool {
        matches!(self, Outcome::Win | Outcome::ByeWin)
    }

    /// Points under a tournament's rules; a bye scores as a win.
    pub fn points(&self, rules: &PointRules) -> u32 {
        match self {
            Outcome::Win | Outcome::ByeWin => rules.win_points,
            Outcome::Draw => rules.draw_points,
            Outcome::Loss => rules.loss_points,
        }
    }

    /// The same result seen from the other side.
    pub fn flipped(&self) -> Outcome {
        match self {
            Outcome::Win | Outcome::ByeWin => Outcome::Loss,
            Outcome::Loss => Outcome::Win,
            Outcome::Draw => Outcome::Draw,
        }
    }
}

/// What a single match contributes to player-level statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// Pending, or malformed (a decisive/draw code with no side B).
    Unresolved,
    /// Side A is credited a bye-win.
    Bye { player: &'a PlayerId },
    /// Two-sided match with a result.
    Contest {
        a: &'a PlayerId,
        b: &'a PlayerId,
        a_outcome: Outcome,
        b_outcome: Outcome,
    },
}

/// Per-side outcomes of a two-sided result code. `None` for a bye.
pub fn contest_outcomes(result: MatchResult) -> Option<(Outcome, Outcome)> {
    match result {
        MatchResult::SideA => Some((Outcome::Win, Outcome::Loss)),
        MatchResult::SideB => Some((Outcome::Loss, Outcome::Win)),
        MatchResult::Draw => Some((Outcome::Draw, Outcome::Draw)),
        MatchResult::Bye => None,
    }
}

/// Resolve a match for player standings.
///
/// A `BYE` code credits side A regardless of whether side B is recorded.
pub fn resolve_match(m: &Match) -> Resolution<'_> {
    let Some(result) = m.result else {
        return Resolution::Unresolved;
    };

    if result == MatchResult::Bye {
        return Resolution::Bye { player: &m.a };
    }

    let Some(b) = m.b.as_ref() else {
        return Resolution::Unresolved;
    };

    match contest_outcomes(result) {
        Some((a_outcome, b_outcome)) => Resolution::Contest {
            a: &m.a,
            b,
            a_outcome,
            b_outcome,
        },
        None => Resolution::Unresolved,
    }
}

/// A resolved match between two known decks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeckContest<'a> {
    pub a_did: &'a str,
    pub b_did: &'a str,
    pub a_outcome: Outcome,
    pub b_outcome: Outcome,
}

impl<'a> DeckContest<'a> {
    /// View the contest from `did`'s seat: `(opponent, outcome)`.
    ///
    /// In a mirror match the deck occupies both seats, so it is always the
    /// winning side of a decisive result.
    pub fn seen_from(&self, did: &str) -> Option<(&'a str, Outcome)> {
        let on_a = self.a_did == did;
        let on_b = self.b_did == did;
        if on_a && on_b && self.a_outcome != Outcome::Draw {
            return Some((self.b_did, Outcome::Win));
        }
        if on_a {
            Some((self.b_did, self.a_outcome))
        } else if on_b {
            Some((self.a_did, self.b_outcome))
        } else {
            None
        }
    }
}

/// Resolve a match for deck-level statistics.
///
/// Byes, pending matches and matches where either player has no deck entry
/// yield `None`.
pub fn resolve_deck_contest<'a>(
    m: &'a Match,
    decks: &HashMap<&'a str, &'a str>,
) -> Option<DeckContest<'a>> {
    match resolve_match(m) {
        Resolution::Contest {
            a,
            b,
            a_outcome,
            b_outcome,
        } => {
            let a_did = *decks.get(a.as_str())?;
            let b_did = *decks.get(b.as_str())?;
            Some(DeckContest {
                a_did,
                b_did,
                a_outcome,
                b_outcome,
            })
        }
        Resolution::Bye { .. } | Resolution::Unresolved => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(result: Option<MatchResult>) -> Match {
        let mut m = Match::pairing(1, "p_a".into(), "p_b".into());
        m.result = result;
        m
    }

    #[test]
    fn test_resolve_decisive_results() {
        let m = game(Some(MatchResult::SideA));
        match resolve_match(&m) {
            Resolution::Contest {
                a_outcome,
                b_outcome,
                ..
            } => {
                assert_eq!(a_outcome, Outcome::Win);
                assert_eq!(b_outcome, Outcome::Loss);
            }
            other => panic!("unexpected {:?}", other),
        }

        let m = game(Some(MatchResult::SideB));
        assert!(matches!(
            resolve_match(&m),
            Resolution::Contest {
                a_outcome: Outcome::Loss,
                b_outcome: Outcome::Win,
                ..
            }
        ));
    }

    #[test]
    fn test_resolve_draw_is_symmetric() {
        let m = game(Some(MatchResult::Draw));
        assert!(matches!(
            resolve_match(&m),
            Resolution::Contest {
                a_outcome: Outcome::Draw,
                b_outcome: Outcome::Draw,
                ..
            }
        ));
    }

    #[test]
    fn test_resolve_pending_and_malformed() {
        assert_eq!(resolve_match(&game(None)), Resolution::Unresolved);

        let mut one_sided = Match::bye(1, "p_a".into());
        one_sided.result = Some(MatchResult::SideA);
        assert_eq!(resolve_match(&one_sided), Resolution::Unresolved);
    }

    #[test]
    fn test_resolve_bye() {
        let m = Match::bye(3, "p_a".into());
        match resolve_match(&m) {
            Resolution::Bye { player } => assert_eq!(player.as_str(), "p_a"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_deck_contest_requires_both_decks() {
        let m = game(Some(MatchResult::SideA));
        let mut decks = HashMap::new();
        decks.insert("p_a", "suisei");
        assert!(resolve_deck_contest(&m, &decks).is_none());

        decks.insert("p_b", "azki");
        let contest = resolve_deck_contest(&m, &decks).unwrap();
        assert_eq!(contest.a_did, "suisei");
        assert_eq!(contest.b_did, "azki");
        assert_eq!(contest.a_outcome, Outcome::Win);
    }

    #[test]
    fn test_deck_contest_excludes_bye() {
        let m = Match::bye(1, "p_a".into());
        let decks: HashMap<&str, &str> = [("p_a", "suisei")].into_iter().collect();
        assert!(resolve_deck_contest(&m, &decks).is_none());
    }

    #[test]
    fn test_seen_from() {
        let contest = DeckContest {
            a_did: "suisei",
            b_did: "azki",
            a_outcome: Outcome::Loss,
            b_outcome: Outcome::Win,
        };
        assert_eq!(contest.seen_from("azki"), Some(("suisei", Outcome::Win)));
        assert_eq!(contest.seen_from("suisei"), Some(("azki", Outcome::Loss)));
        assert_eq!(contest.seen_from("pekora"), None);
    }

    #[test]
    fn test_seen_from_mirror() {
        let decisive = DeckContest {
            a_did: "suisei",
            b_did: "suisei",
            a_outcome: Outcome::Loss,
            b_outcome: Outcome::Win,
        };
        assert_eq!(decisive.seen_from("suisei"), Some(("suisei", Outcome::Win)));

        let drawn = DeckContest {
            a_outcome: Outcome::Draw,
            b_outcome: Outcome::Draw,
            ..decisive
        };
        assert_eq!(drawn.seen_from("suisei"), Some(("suisei", Outcome::Draw)));
    }

    #[test]
    fn test_points_and_flip() {
        let rules = PointRules::default();
        assert_eq!(Outcome::ByeWin.points(&rules), 3);
        assert_eq!(Outcome::Draw.points(&rules), 1);
        assert_eq!(Outcome::Loss.points(&rules), 0);
        assert_eq!(Outcome::Win.flipped(), Outcome::Loss);
        assert!(Outcome::ByeWin.is_win());
    }
}
