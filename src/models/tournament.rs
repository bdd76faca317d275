//! Tournament record model.
//!
//! This is the on-disk format of live and archived tournaments. Field names
//! follow the exported JSON files (`pid`, `did`, `winPoints`, ...).

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{DeckId, EntityId, MatchId, PlayerId, TournamentId};

/// A roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub pid: PlayerId,
    pub name: String,
}

/// Snapshot of a catalog deck, kept so exported files are self-contained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    pub did: DeckId,
    pub name: String,
}

/// Which deck a player piloted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub pid: PlayerId,
    pub did: DeckId,
}

/// Stored result code of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchResult {
    /// Side A won.
    #[serde(rename = "A")]
    SideA,
    /// Side B won.
    #[serde(rename = "B")]
    SideB,
    #[serde(rename = "D")]
    Draw,
    /// Single-player forced win.
    #[serde(rename = "BYE")]
    Bye,
}

impl MatchResult {
    /// Parse the stored code (`A`, `B`, `D`, `BYE`), case-insensitive.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "A" => Some(MatchResult::SideA),
            "B" => Some(MatchResult::SideB),
            "D" => Some(MatchResult::Draw),
            "BYE" => Some(MatchResult::Bye),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            MatchResult::SideA => "A",
            MatchResult::SideB => "B",
            MatchResult::Draw => "D",
            MatchResult::Bye => "BYE",
        }
    }
}

impl std::fmt::Display for MatchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A single table in a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub mid: MatchId,
    pub table: u32,
    pub a: PlayerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b: Option<PlayerId>,
    /// Absent while the match is pending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<MatchResult>,
}

impl Match {
    /// A two-sided match awaiting its result.
    pub fn pairing(table: u32, a: PlayerId, b: PlayerId) -> Self {
        Self {
            mid: EntityId::random("m"),
            table,
            a,
            b: Some(b),
            result: None,
        }
    }

    /// A bye, which is resolved at creation.
    pub fn bye(table: u32, a: PlayerId) -> Self {
        Self {
            mid: EntityId::random("m"),
            table,
            a,
            b: None,
            result: Some(MatchResult::Bye),
        }
    }

    pub fn is_bye(&self) -> bool {
        self.b.is_none()
    }

    /// Two-sided and still waiting for a result.
    pub fn is_pending(&self) -> bool {
        self.b.is_some() && self.result.is_none()
    }

    pub fn involves(&self, pid: &PlayerId) -> bool {
        self.a == *pid || self.b.as_ref() == Some(pid)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub r: u32,
    #[serde(default)]
    pub matches: Vec<Match>,
    #[serde(default)]
    pub locked: bool,
}

impl Round {
    pub fn new(r: u32) -> Self {
        Self {
            r,
            matches: Vec::new(),
            locked: false,
        }
    }

    /// Every two-sided match has a result.
    pub fn is_complete(&self) -> bool {
        !self.matches.iter().any(Match::is_pending)
    }
}

/// Points awarded per outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointRules {
    pub win_points: u32,
    pub draw_points: u32,
    pub loss_points: u32,
}

impl Default for PointRules {
    fn default() -> Self {
        Self {
            win_points: 3,
            draw_points: 1,
            loss_points: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    #[default]
    Swiss,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentFormat {
    #[serde(rename = "type", default)]
    pub kind: FormatKind,
    /// Planned number of Swiss rounds.
    pub rounds: u32,
    pub rules: PointRules,
}

impl Default for TournamentFormat {
    fn default() -> Self {
        Self {
            kind: FormatKind::Swiss,
            rounds: 4,
            rules: PointRules::default(),
        }
    }
}

/// A complete tournament record, owning every nested entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub format: TournamentFormat,
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub decks: Vec<Deck>,
    #[serde(default)]
    pub entries: Vec<Entry>,
    #[serde(default)]
    pub rounds: Vec<Round>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Tournament {
    /// Create an empty tournament with an id derived from name and date.
    pub fn new(name: String, date: NaiveDate, format: TournamentFormat) -> Self {
        let id = EntityId::tournament(&name, &date.to_string());
        Self {
            id,
            name,
            date,
            location: None,
            format,
            players: Vec::new(),
            decks: Vec::new(),
            entries: Vec::new(),
            rounds: Vec::new(),
            notes: None,
        }
    }

    pub fn with_location(mut self, location: String) -> Self {
        self.location = Some(location);
        self
    }

    /// `YYYY-MM` bucket of the tournament date.
    pub fn month_key(&self) -> String {
        month_key(&self.date)
    }

    /// pid → did lookup. A later entry for the same pid overrides an earlier one.
    pub fn deck_index(&self) -> HashMap<&str, &str> {
        self.entries
            .iter()
            .map(|e| (e.pid.as_str(), e.did.as_str()))
            .collect()
    }

    /// did → display name lookup from the embedded deck snapshot.
    pub fn deck_names(&self) -> HashMap<&str, &str> {
        self.decks
            .iter()
            .map(|d| (d.did.as_str(), d.name.as_str()))
            .collect()
    }

    pub fn player(&self, pid: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.pid == pid)
    }

    pub fn deck_of(&self, pid: &str) -> Option<&DeckId> {
        self.entries.iter().rev().find(|e| e.pid == pid).map(|e| &e.did)
    }

    /// Every match in round order, then table order as stored.
    pub fn matches(&self) -> impl Iterator<Item = &Match> {
        self.rounds.iter().flat_map(|r| r.matches.iter())
    }

    pub fn current_round(&self) -> Option<&Round> {
        self.rounds.last()
    }
}

/// `YYYY-MM` bucket of a date.
pub fn month_key(date: &NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "id": "2026-02-03_weekly_ab12",
        "name": "Weekly Hololive OCG",
        "date": "2026-02-03",
        "location": "",
        "format": {
            "type": "swiss",
            "rounds": 4,
            "rules": { "winPoints": 3, "drawPoints": 1, "lossPoints": 0 }
        },
        "players": [
            { "pid": "p_1", "name": "Alice" },
            { "pid": "p_2", "name": "Bob" },
            { "pid": "p_3", "name": "Carol" }
        ],
        "decks": [{ "did": "suisei", "name": "Suisei" }],
        "entries": [{ "pid": "p_1", "did": "suisei" }],
        "rounds": [
            {
                "r": 1,
                "locked": true,
                "matches": [
                    { "mid": "m_1", "table": 1, "a": "p_1", "b": "p_2", "result": "A" },
                    { "mid": "m_2", "table": 2, "a": "p_3", "result": "BYE" }
                ]
            }
        ],
        "notes": ""
    }"#;

    #[test]
    fn test_parse_exported_file() {
        let t: Tournament = serde_json::from_str(SAMPLE).unwrap();

        assert_eq!(t.name, "Weekly Hololive OCG");
        assert_eq!(t.date, NaiveDate::from_ymd_opt(2026, 2, 3).unwrap());
        assert_eq!(t.format.rules, PointRules::default());
        assert_eq!(t.players.len(), 3);
        assert_eq!(t.rounds[0].matches[0].result, Some(MatchResult::SideA));
        assert_eq!(t.rounds[0].matches[1].result, Some(MatchResult::Bye));
        assert!(t.rounds[0].matches[1].is_bye());
    }

    #[test]
    fn test_optional_collections_default() {
        let t: Tournament = serde_json::from_str(
            r#"{
                "id": "t", "name": "Bare", "date": "2026-01-01",
                "format": { "rounds": 3, "rules": { "winPoints": 2, "drawPoints": 1, "lossPoints": 0 } }
            }"#,
        )
        .unwrap();

        assert!(t.players.is_empty());
        assert!(t.rounds.is_empty());
        assert_eq!(t.format.kind, FormatKind::Swiss);
        assert!(t.location.is_none());
    }

    #[test]
    fn test_result_codes() {
        assert_eq!(
            serde_json::to_string(&MatchResult::Bye).unwrap(),
            "\"BYE\""
        );
        assert_eq!(MatchResult::from_code("d"), Some(MatchResult::Draw));
        assert_eq!(MatchResult::from_code(" bye "), Some(MatchResult::Bye));
        assert_eq!(MatchResult::from_code("X"), None);
        assert_eq!(format!("{}", MatchResult::SideB), "B");
    }

    #[test]
    fn test_pending_match_serialization_omits_result() {
        let m = Match::pairing(1, "p_1".into(), "p_2".into());
        let json = serde_json::to_string(&m).unwrap();
        assert!(!json.contains("result"));
        assert!(m.is_pending());
    }

    #[test]
    fn test_round_completeness() {
        let mut round = Round::new(1);
        round.matches.push(Match::bye(1, "p_1".into()));
        assert!(round.is_complete());

        round.matches.push(Match::pairing(2, "p_2".into(), "p_3".into()));
        assert!(!round.is_complete());

        round.matches[1].result = Some(MatchResult::Draw);
        assert!(round.is_complete());
    }

    #[test]
    fn test_deck_index_and_month_key() {
        let t: Tournament = serde_json::from_str(SAMPLE).unwrap();
        let index = t.deck_index();

        assert_eq!(index.get("p_1"), Some(&"suisei"));
        assert!(index.get("p_2").is_none());
        assert_eq!(t.month_key(), "2026-02");
        assert_eq!(t.deck_names().get("suisei"), Some(&"Suisei"));
    }

    #[test]
    fn test_round_trip_keeps_wire_names() {
        let t: Tournament = serde_json::from_str(SAMPLE).unwrap();
        let json = serde_json::to_value(&t).unwrap();

        assert_eq!(json["format"]["rules"]["winPoints"], 3);
        assert_eq!(json["format"]["type"], "swiss");
        assert_eq!(json["rounds"][0]["matches"][1]["result"], "BYE");
        assert!(json["rounds"][0]["matches"][1].get("b").is_none());
    }
}
