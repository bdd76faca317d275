//! Tournament, player, deck and match identifiers.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// An opaque, stable identifier as stored in tournament files.
///
/// The aggregation engine never interprets ids; it only compares them.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: String) -> Self {
        Self(id)
    }

    /// Random id with a short prefix, e.g. `p_3f9a1c2e`.
    pub fn random(prefix: &str) -> Self {
        let raw = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("{}_{}", prefix, &raw[..8]))
    }

    /// Tournament id of the form `YYYY-MM-DD_<slug>_<hash4>`.
    ///
    /// The suffix is derived from name and date so that re-creating the same
    /// tournament yields the same id.
    pub fn tournament(name: &str, date: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(name.as_bytes());
        hasher.update(b"|");
        hasher.update(date.as_bytes());
        let hash = hex::encode(hasher.finalize());

        let slug = slugify(name);
        let slug = if slug.is_empty() { "tournament" } else { &slug };
        Self(format!("{}_{}_{}", date, slug, &hash[..4]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| part.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for EntityId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for EntityId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Player id, unique within a tournament and stable across the archive.
pub type PlayerId = EntityId;

/// Deck catalog key.
pub type DeckId = EntityId;

/// Match id.
pub type MatchId = EntityId;

/// Tournament id.
pub type TournamentId = EntityId;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tournament_id_deterministic() {
        let id1 = EntityId::tournament("Weekly Hololive OCG", "2026-02-03");
        let id2 = EntityId::tournament("Weekly Hololive OCG", "2026-02-03");
        assert_eq!(id1, id2);
    }

    #[test]
    fn test_tournament_id_format() {
        let id = EntityId::tournament("Weekly Hololive OCG", "2026-02-03");
        assert!(id.as_str().starts_with("2026-02-03_weekly-hololive-ocg_"));
        let suffix = id.as_str().rsplit('_').next().unwrap();
        assert_eq!(suffix.len(), 4);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_tournament_id_empty_name() {
        let id = EntityId::tournament("!!!", "2026-02-03");
        assert!(id.as_str().starts_with("2026-02-03_tournament_"));
    }

    #[test]
    fn test_random_ids_differ() {
        let a = EntityId::random("p");
        let b = EntityId::random("p");
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("p_"));
        assert_eq!(a.as_str().len(), 10);
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = EntityId::from("suisei");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"suisei\"");
        let back: EntityId = serde_json::from_str("\"suisei\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        assert!(EntityId::from("azki") < EntityId::from("suisei"));
    }

    #[test]
    fn test_debug_and_display() {
        let id = EntityId::new("m_1".to_string());
        assert_eq!(format!("{}", id), "m_1");
        assert!(format!("{:?}", id).contains("m_1"));
    }
}
