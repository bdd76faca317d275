//! Deck catalog: stable keys, display names and aliases.
//!
//! The statistics engine only ever sees opaque deck ids. The catalog turns
//! those ids back into labels and lets free-text deck names typed by an
//! organizer be matched to a catalog entry.

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::fetch::{FetchError, Fetcher};
use crate::models::{Deck, DeckAgg, Entry, Tournament};
use crate::storage::{read_json, StorageError};

/// Errors raised while loading the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),
}

/// One deck archetype.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckCatalogItem {
    /// Stable id; used as `did` in tournament records.
    pub key: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oshi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Icon path under the static site root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aliases: Option<Vec<String>>,
}

fn whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

fn apostrophes() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\x{2018}\x{2019}`´]").expect("static regex"))
}

/// Lookup key for free-text deck names: trimmed, lowercased, single-spaced,
/// with typographic apostrophes folded to `'`.
pub fn normalize_name(s: &str) -> String {
    let lowered = s.trim().to_lowercase();
    let spaced = whitespace().replace_all(&lowered, " ");
    apostrophes().replace_all(&spaced, "'").into_owned()
}

/// Indexed deck catalog.
#[derive(Debug, Clone, Default)]
pub struct DeckCatalog {
    items: Vec<DeckCatalogItem>,
    by_key: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
}

impl DeckCatalog {
    /// Index items by key and by normalized name and alias.
    ///
    /// When two items share a name or alias the later one wins.
    pub fn new(items: Vec<DeckCatalogItem>) -> Self {
        let mut by_key = HashMap::new();
        let mut by_name = HashMap::new();
        for (idx, item) in items.iter().enumerate() {
            by_key.insert(item.key.clone(), idx);
            by_name.insert(normalize_name(&item.name), idx);
            for alias in item.aliases.iter().flatten() {
                by_name.insert(normalize_name(alias), idx);
            }
        }
        Self {
            items,
            by_key,
            by_name,
        }
    }

    pub fn load_file(path: &Path) -> Result<Self, CatalogError> {
        let items: Vec<DeckCatalogItem> = read_json(path)?;
        debug!("Loaded {} catalog decks from {:?}", items.len(), path);
        Ok(Self::new(items))
    }

    pub async fn load_url(fetcher: &Fetcher, url: &url::Url) -> Result<Self, CatalogError> {
        let items: Vec<DeckCatalogItem> = fetcher.get_json(url).await?;
        debug!("Loaded {} catalog decks from {}", items.len(), url);
        Ok(Self::new(items))
    }

    /// Load from a path or URL; a missing or broken catalog yields an empty one.
    pub async fn load_or_empty(location: &str, fetcher: Option<&Fetcher>) -> Self {
        let result = match (url::Url::parse(location), fetcher) {
            (Ok(url), Some(fetcher)) if url.scheme().starts_with("http") => {
                Self::load_url(fetcher, &url).await
            }
            _ => Self::load_file(Path::new(location)),
        };
        result.unwrap_or_else(|e| {
            warn!("Deck catalog unavailable ({}): {}", location, e);
            Self::default()
        })
    }

    pub fn items(&self) -> &[DeckCatalogItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&DeckCatalogItem> {
        self.by_key.get(key).map(|&idx| &self.items[idx])
    }

    /// Match a free-text name or alias.
    pub fn find_by_name(&self, name: &str) -> Option<&DeckCatalogItem> {
        self.by_name
            .get(&normalize_name(name))
            .map(|&idx| &self.items[idx])
    }

    /// Resolve user input to a catalog key: exact key first, then name or alias.
    pub fn resolve_key(&self, input: &str) -> Option<&str> {
        self.get(input.trim())
            .or_else(|| self.find_by_name(input))
            .map(|item| item.key.as_str())
    }

    /// Display label for a deck id.
    ///
    /// Falls back to the tournament's own snapshot, then to the raw id.
    pub fn label(&self, did: &str, tournament: Option<&Tournament>) -> String {
        if let Some(item) = self.get(did) {
            return item.name.clone();
        }
        tournament
            .and_then(|t| t.decks.iter().find(|d| d.did == did))
            .map(|d| d.name.clone())
            .unwrap_or_else(|| did.to_string())
    }

    /// Per-tournament deck snapshot covering every deck in `entries`, in
    /// catalog order. Ids unknown to the catalog follow, named by their id.
    pub fn snapshot_decks(&self, entries: &[Entry]) -> Vec<Deck> {
        let mut used: Vec<&str> = Vec::new();
        for e in entries {
            if !used.contains(&e.did.as_str()) {
                used.push(e.did.as_str());
            }
        }

        let mut decks: Vec<Deck> = self
            .items
            .iter()
            .filter(|item| used.contains(&item.key.as_str()))
            .map(|item| Deck {
                did: item.key.as_str().into(),
                name: item.name.clone(),
            })
            .collect();

        for did in used {
            if self.get(did).is_none() {
                decks.push(Deck {
                    did: did.into(),
                    name: did.to_string(),
                });
            }
        }
        decks
    }
}

/// One slice of the meta-share pie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaSlice {
    pub name: String,
    /// Percentage, one decimal place.
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oshi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

pub const OTHERS_LABEL: &str = "Others";
const OTHERS_COLOR: &str = "#9aa3b2";

fn percent(share: f64) -> f64 {
    (share * 1000.0).round() / 10.0
}

/// Top `top` decks by meta share as labelled slices, the rest folded into
/// one "Others" slice.
pub fn meta_slices(decks: &[DeckAgg], catalog: &DeckCatalog, top: usize) -> Vec<MetaSlice> {
    let mut by_meta: Vec<&DeckAgg> = decks.iter().collect();
    by_meta.sort_by(|a, b| {
        b.meta_share
            .partial_cmp(&a.meta_share)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut slices: Vec<MetaSlice> = by_meta
        .iter()
        .take(top)
        .map(|d| {
            let item = catalog
                .get(d.did.as_str())
                .or_else(|| catalog.find_by_name(&d.deck_name));
            MetaSlice {
                name: item.map_or_else(|| d.deck_name.clone(), |i| i.name.clone()),
                value: percent(d.meta_share),
                color: item.and_then(|i| i.color.clone()),
                oshi: item.and_then(|i| i.oshi.clone()),
                icon: item.and_then(|i| i.icon.clone()),
            }
        })
        .collect();

    let rest: f64 = by_meta.iter().skip(top).map(|d| d.meta_share).sum();
    if rest > 0.0 {
        slices.push(MetaSlice {
            name: OTHERS_LABEL.to_string(),
            value: percent(rest),
            color: Some(OTHERS_COLOR.to_string()),
            oshi: None,
            icon: None,
        });
    }
    slices
}
