//! Deck-vs-deck head-to-head matrix for one tournament.

use crate::models::{DeckVsDeckCell, Tournament};

use super::{calculate_share, resolve_deck_contest, Ledger, Outcome};

/// Canonical key for an unordered deck pair; the lower id comes first.
fn pair_key<'a>(x: &'a str, y: &'a str) -> (&'a str, &'a str) {
    if x < y {
        (x, y)
    } else {
        (y, x)
    }
}

/// One cell per unordered pair of decks that met, most-played first.
///
/// A decisive mirror match is a win for the pair's first slot.
pub fn compute_deck_matchups(t: &Tournament) -> Vec<DeckVsDeckCell> {
    let deck_of = t.deck_index();
    let mut ledger: Ledger<DeckVsDeckCell, (String, String)> = Ledger::new();

    for m in t.matches() {
        let Some(contest) = resolve_deck_contest(m, &deck_of) else {
            continue;
        };
        let (first, second) = pair_key(contest.a_did, contest.b_did);
        let key = (first.to_string(), second.to_string());
        let cell = ledger.ensure(&key, || DeckVsDeckCell {
            a_did: first.into(),
            b_did: second.into(),
            matches: 0,
            a_wins: 0,
            b_wins: 0,
            draws: 0,
            a_win_rate: 0.0,
        });

        cell.matches += 1;
        let winner = match contest.a_outcome {
            Outcome::Draw => {
                cell.draws += 1;
                continue;
            }
            Outcome::Win | Outcome::ByeWin => contest.a_did,
            Outcome::Loss => contest.b_did,
        };
        if cell.a_did == winner {
            cell.a_wins += 1;
        } else {
            cell.b_wins += 1;
        }
    }

    let mut cells = ledger.into_rows();
    for c in &mut cells {
        c.a_win_rate = calculate_share(c.a_wins, c.matches);
    }
    cells.sort_by(|x, y| y.matches.cmp(&x.matches));
    cells
}
