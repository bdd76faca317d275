//! Archive of finished tournaments.
//!
//! An archive is an `index.json` listing plus one JSON file per tournament,
//! served either from a local directory or from a remote base URL. Callers
//! pick a window of the index (one tournament, the last N, a month or all of
//! it) and load the selected files concurrently.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::fetch::{join_url, FetchError, Fetcher};
use crate::models::{month_key, Tournament};
use crate::storage::StorageError;

/// Errors raised while reading an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Tournament not found in archive: {0}")]
    NotFound(String),
}

impl From<std::io::Error> for ArchiveError {
    fn from(e: std::io::Error) -> Self {
        ArchiveError::Storage(StorageError::Io(e))
    }
}

impl From<serde_json::Error> for ArchiveError {
    fn from(e: serde_json::Error) -> Self {
        ArchiveError::Storage(StorageError::Json(e))
    }
}

/// One line of the archive index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentIndexItem {
    pub id: String,
    pub date: NaiveDate,
    pub name: String,
    /// Location of the tournament file, relative to the archive root.
    pub path: String,
}

impl TournamentIndexItem {
    pub fn month_key(&self) -> String {
        month_key(&self.date)
    }
}

/// A readable tournament archive.
#[async_trait]
pub trait ArchiveSource: Send + Sync {
    /// Source name for logging.
    fn name(&self) -> String;

    async fn load_index(&self) -> Result<Vec<TournamentIndexItem>, ArchiveError>;

    async fn load_tournament(
        &self,
        item: &TournamentIndexItem,
    ) -> Result<Tournament, ArchiveError>;
}

/// Archive stored in a local directory.
#[derive(Debug, Clone)]
pub struct LocalArchive {
    root: PathBuf,
    index_path: String,
}

impl LocalArchive {
    pub fn new(root: PathBuf, index_path: impl Into<String>) -> Self {
        Self {
            root,
            index_path: index_path.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve an index path: as given under the root, else by file name.
    fn resolve(&self, path: &str) -> PathBuf {
        let direct = self.root.join(path.trim_start_matches('/'));
        if direct.exists() {
            return direct;
        }
        match Path::new(path).file_name() {
            Some(name) => self.root.join(name),
            None => direct,
        }
    }

    /// Build an index from the `*.json` files in the root.
    async fn scan(&self) -> Result<Vec<TournamentIndexItem>, ArchiveError> {
        let pattern = self.root.join("*.json");
        let pattern = pattern.to_string_lossy();
        let paths: Vec<PathBuf> = match glob::glob(&pattern) {
            Ok(paths) => paths.filter_map(Result::ok).collect(),
            Err(e) => {
                warn!("Bad archive glob {}: {}", pattern, e);
                Vec::new()
            }
        };

        let mut items = Vec::new();
        for path in paths {
            let Some(file_name) = path.file_name().map(|n| n.to_string_lossy().to_string())
            else {
                continue;
            };
            if file_name == self.index_path {
                continue;
            }
            let contents = tokio::fs::read_to_string(&path).await?;
            match serde_json::from_str::<Tournament>(&contents) {
                Ok(t) => items.push(TournamentIndexItem {
                    id: t.id.to_string(),
                    date: t.date,
                    name: t.name,
                    path: file_name,
                }),
                Err(e) => warn!("Skipping {:?}: not a tournament file ({})", path, e),
            }
        }
        Ok(items)
    }
}

#[async_trait]
impl ArchiveSource for LocalArchive {
    fn name(&self) -> String {
        format!("local:{}", self.root.display())
    }

    async fn load_index(&self) -> Result<Vec<TournamentIndexItem>, ArchiveError> {
        let index = self.root.join(&self.index_path);
        if !index.exists() {
            debug!("No {:?}, scanning {:?}", index, self.root);
            return self.scan().await;
        }
        let contents = tokio::fs::read_to_string(&index).await?;
        Ok(serde_json::from_str(&contents)?)
    }

    async fn load_tournament(
        &self,
        item: &TournamentIndexItem,
    ) -> Result<Tournament, ArchiveError> {
        let path = self.resolve(&item.path);
        if !path.exists() {
            return Err(StorageError::PathNotFound(path).into());
        }
        let contents = tokio::fs::read_to_string(&path).await?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// Archive served over HTTP.
pub struct RemoteArchive {
    base_url: String,
    index_path: String,
    fetcher: Fetcher,
}

impl RemoteArchive {
    pub fn new(
        base_url: impl Into<String>,
        index_path: impl Into<String>,
        fetcher: Fetcher,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            index_path: index_path.into(),
            fetcher,
        }
    }
}

#[async_trait]
impl ArchiveSource for RemoteArchive {
    fn name(&self) -> String {
        format!("remote:{}", self.base_url)
    }

    async fn load_index(&self) -> Result<Vec<TournamentIndexItem>, ArchiveError> {
        let url = join_url(&self.base_url, &self.index_path)?;
        Ok(self.fetcher.get_json(&url).await?)
    }

    async fn load_tournament(
        &self,
        item: &TournamentIndexItem,
    ) -> Result<Tournament, ArchiveError> {
        let url = join_url(&self.base_url, &item.path)?;
        Ok(self.fetcher.get_json_cached(&url).await?)
    }
}

/// Which tournaments of the index to analyse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum ArchiveWindow {
    Single { id: String },
    LastN { n: usize },
    /// `YYYY-MM`
    Month { ym: String },
    All,
}

impl ArchiveWindow {
    /// Items of a newest-first index that fall in the window.
    pub fn select<'a>(&self, index: &'a [TournamentIndexItem]) -> Vec<&'a TournamentIndexItem> {
        match self {
            ArchiveWindow::Single { id } => index.iter().filter(|i| i.id == *id).collect(),
            ArchiveWindow::LastN { n } => index.iter().take(*n).collect(),
            ArchiveWindow::Month { ym } => index.iter().filter(|i| i.month_key() == *ym).collect(),
            ArchiveWindow::All => index.iter().collect(),
        }
    }
}

/// Sort an index newest first.
pub fn sort_newest_first(index: &mut [TournamentIndexItem]) {
    index.sort_by(|a, b| b.date.cmp(&a.date));
}

/// Distinct `YYYY-MM` keys of the index, newest first.
pub fn available_months(index: &[TournamentIndexItem]) -> Vec<String> {
    let mut months: Vec<String> = index.iter().map(|i| i.month_key()).collect();
    months.sort_by(|a, b| b.cmp(a));
    months.dedup();
    months
}

/// Load the index, newest first.
pub async fn load_index(
    source: &dyn ArchiveSource,
) -> Result<Vec<TournamentIndexItem>, ArchiveError> {
    let mut index = source.load_index().await?;
    sort_newest_first(&mut index);
    debug!("{} lists {} tournaments", source.name(), index.len());
    Ok(index)
}

/// Load every tournament in `window`, oldest first.
///
/// Files are fetched concurrently; the first failure aborts the load.
pub async fn load_window(
    source: Arc<dyn ArchiveSource>,
    window: &ArchiveWindow,
) -> Result<Vec<Tournament>, ArchiveError> {
    let index = load_index(source.as_ref()).await?;
    let selected: Vec<TournamentIndexItem> =
        window.select(&index).into_iter().cloned().collect();

    if let ArchiveWindow::Single { id } = window {
        if selected.is_empty() {
            return Err(ArchiveError::NotFound(id.clone()));
        }
    }

    let mut tasks = JoinSet::new();
    for item in selected {
        let source = Arc::clone(&source);
        tasks.spawn(async move { source.load_tournament(&item).await });
    }

    let mut tournaments = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let loaded = joined.map_err(|e| {
            ArchiveError::Storage(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                e,
            )))
        })?;
        tournaments.push(loaded?);
    }

    tournaments.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
    info!(
        "Loaded {} tournaments from {} ({:?})",
        tournaments.len(),
        source.name(),
        window
    );
    Ok(tournaments)
}
