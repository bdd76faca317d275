//! Deck Lab: one selected deck against the field.
//!
//! Every rate in this module is draw-inclusive, `(wins + 0.5 * draws) /
//! matches`, unlike the leaderboards which count draws as non-wins.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{BestWorst, DeckVsField, DeckVsRow, DeckVsSummary, Tournament, TrendPoint};

use super::{rate_desc, resolve_deck_contest, Ledger, Outcome, Tally};

/// Minimum matches a row needs before it can be called a best or worst matchup.
pub const BEST_WORST_FLOOR: u32 = 3;

/// How many rows each side of [`BestWorst`] holds.
const BEST_WORST_LEN: usize = 3;

/// Ordering of versus-field rows for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersusSort {
    #[default]
    Matches,
    #[serde(rename = "wr")]
    WinRate,
}

impl FromStr for VersusSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "matches" => Ok(VersusSort::Matches),
            "wr" | "winrate" | "win_rate" => Ok(VersusSort::WinRate),
            other => Err(format!("unknown sort '{}', expected matches or wr", other)),
        }
    }
}

/// Every contest the selected deck played, as `(opponent, outcome)`, per tournament.
fn contests_of<'a>(
    t: &'a Tournament,
    selected: &'a str,
) -> impl Iterator<Item = (&'a str, Outcome)> + 'a {
    let deck_of = t.deck_index();
    t.matches()
        .filter_map(move |m| resolve_deck_contest(m, &deck_of)?.seen_from(selected))
}

impl Tally {
    fn into_row(self, opponent_did: &str) -> DeckVsRow {
        DeckVsRow {
            opponent_did: opponent_did.into(),
            matches: self.matches,
            wins: self.wins,
            losses: self.losses,
            draws: self.draws,
            win_rate: self.score_rate(),
        }
    }
}

/// The selected deck's record against each opponent deck, most-played first,
/// plus the overall summary.
pub fn compute_deck_vs_field(tournaments: &[Tournament], selected: &str) -> DeckVsField {
    let mut by_opponent: Ledger<(String, Tally)> = Ledger::new();
    let mut total = Tally::default();
    let mut contributing = 0u32;

    for t in tournaments {
        let before = total.matches;
        for (opponent, outcome) in contests_of(t, selected) {
            by_opponent
                .ensure(opponent, || (opponent.to_string(), Tally::default()))
                .1
                .record(outcome);
            total.record(outcome);
        }
        // each record counts, even when two share an id
        if total.matches > before {
            contributing += 1;
        }
    }

    let mut rows: Vec<DeckVsRow> = by_opponent
        .into_rows()
        .into_iter()
        .map(|(opponent, tally)| tally.into_row(&opponent))
        .collect();
    rows.sort_by(|x, y| y.matches.cmp(&x.matches));

    DeckVsField {
        summary: DeckVsSummary {
            did: selected.into(),
            tournaments: contributing,
            matches: total.matches,
            wins: total.wins,
            losses: total.losses,
            draws: total.draws,
            win_rate: total.score_rate(),
        },
        rows,
    }
}

/// Rows with at least `min_matches`, in the requested order.
pub fn filter_rows(rows: &[DeckVsRow], min_matches: u32, sort: VersusSort) -> Vec<DeckVsRow> {
    let mut out: Vec<DeckVsRow> = rows
        .iter()
        .filter(|r| r.matches >= min_matches)
        .cloned()
        .collect();
    match sort {
        VersusSort::Matches => out.sort_by(|x, y| y.matches.cmp(&x.matches)),
        VersusSort::WinRate => out.sort_by(|x, y| rate_desc(x.win_rate, y.win_rate)),
    }
    out
}

/// Top and bottom three matchups among rows with enough games.
///
/// The sample floor is `max(3, min_sample)`. `worst[0]` is the single worst
/// matchup. With fewer than three qualifying rows both lists hold all of them.
pub fn best_and_worst(rows: &[DeckVsRow], min_sample: u32) -> BestWorst {
    let ranked = filter_rows(rows, min_sample.max(BEST_WORST_FLOOR), VersusSort::WinRate);

    let best = ranked.iter().take(BEST_WORST_LEN).cloned().collect();
    let worst = ranked
        .iter()
        .rev()
        .take(BEST_WORST_LEN)
        .cloned()
        .collect();

    BestWorst { best, worst }
}

/// Monthly draw-inclusive record of the selected deck, oldest month first.
///
/// With `opponent` set only contests against that deck are counted.
pub fn compute_deck_trend_by_month(
    tournaments: &[Tournament],
    selected: &str,
    opponent: Option<&str>,
) -> Vec<TrendPoint> {
    let mut by_month: Ledger<(String, Tally)> = Ledger::new();

    for t in tournaments {
        let ym = t.month_key();
        for (opp, outcome) in contests_of(t, selected) {
            if opponent.is_some_and(|o| o != opp) {
                continue;
            }
            by_month
                .ensure(&ym, || (ym.clone(), Tally::default()))
                .1
                .record(outcome);
        }
    }

    let mut points: Vec<TrendPoint> = by_month
        .into_rows()
        .into_iter()
        .map(|(ym, tally)| TrendPoint {
            ym,
            matches: tally.matches,
            wins: tally.wins,
            losses: tally.losses,
            draws: tally.draws,
            win_rate: tally.score_rate(),
        })
        .collect();
    points.sort_by(|x, y| x.ym.cmp(&y.ym));
    points
}
