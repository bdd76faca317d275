//! JSON fetching over HTTP with an on-disk cache.
//!
//! Remote archives serve an index and one immutable JSON file per tournament.
//! Responses are cached under the data directory so repeated windows do not
//! refetch the same files; the index is always fetched fresh.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};
use url::Url;

/// Errors that can occur during fetching.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Content too large: {size} bytes (max {max_size})")]
    ContentTooLarge { size: usize, max_size: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Metadata stored alongside a cached body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub url: String,
    pub fetched_at: DateTime<Utc>,
    pub content_length: usize,
    pub etag: Option<String>,
}

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Cache directory; `None` disables caching.
    pub cache_dir: Option<PathBuf>,

    /// Maximum body size (default 10MB).
    pub max_content_size: usize,

    pub timeout: Duration,

    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            max_content_size: 10 * 1024 * 1024,
            timeout: Duration::from_secs(30),
            user_agent: concat!("deck-meta/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl FetcherConfig {
    pub fn with_cache_dir(mut self, dir: PathBuf) -> Self {
        self.cache_dir = Some(dir);
        self
    }
}

/// JSON-over-HTTP client.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    config: FetcherConfig,
}

impl Fetcher {
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("deck-meta")),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn with_defaults() -> Result<Self, FetchError> {
        Self::new(FetcherConfig::default())
    }

    /// Fetch and decode a JSON document, bypassing the cache.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, FetchError> {
        let body = self.fetch_body(url).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Fetch and decode a JSON document that never changes once published.
    ///
    /// The body is served from the cache when present and written to it
    /// after a network fetch.
    pub async fn get_json_cached<T: DeserializeOwned>(&self, url: &Url) -> Result<T, FetchError> {
        let Some(cache_dir) = &self.config.cache_dir else {
            return self.get_json(url).await;
        };
        let body_path = Self::body_path(cache_dir, url);

        if let Ok(body) = fs::read(&body_path).await {
            match serde_json::from_slice(&body) {
                Ok(value) => {
                    debug!("Serving {} from cache", url);
                    return Ok(value);
                }
                Err(e) => debug!("Discarding unreadable cache entry for {}: {}", url, e),
            }
        }

        let (body, etag) = self.fetch_body_with_etag(url).await?;
        let value = serde_json::from_slice(&body)?;
        self.store(cache_dir, url, &body, etag).await?;
        Ok(value)
    }

    async fn fetch_body(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        Ok(self.fetch_body_with_etag(url).await?.0)
    }

    async fn fetch_body_with_etag(
        &self,
        url: &Url,
    ) -> Result<(Vec<u8>, Option<String>), FetchError> {
        info!("Fetching {}", url);

        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let etag = response
            .headers()
            .get("etag")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let content = response.bytes().await?;
        if content.len() > self.config.max_content_size {
            return Err(FetchError::ContentTooLarge {
                size: content.len(),
                max_size: self.config.max_content_size,
            });
        }

        Ok((content.to_vec(), etag))
    }

    async fn store(
        &self,
        cache_dir: &Path,
        url: &Url,
        body: &[u8],
        etag: Option<String>,
    ) -> Result<(), FetchError> {
        let body_path = Self::body_path(cache_dir, url);
        if let Some(parent) = body_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&body_path, body).await?;

        let meta = CacheMetadata {
            url: url.to_string(),
            fetched_at: Utc::now(),
            content_length: body.len(),
            etag,
        };
        fs::write(
            body_path.with_extension("meta.json"),
            serde_json::to_string_pretty(&meta)?,
        )
        .await?;
        Ok(())
    }

    /// `<cache>/<host>/<hash>.json`
    fn body_path(cache_dir: &Path, url: &Url) -> PathBuf {
        let host = url.host_str().unwrap_or("unknown");
        cache_dir
            .join(host)
            .join(format!("{}.json", Self::url_hash(url)))
    }

    /// First 8 bytes of the SHA-256 of the URL, hex encoded.
    fn url_hash(url: &Url) -> String {
        let mut hasher = Sha256::new();
        hasher.update(url.as_str().as_bytes());
        let result = hasher.finalize();
        hex::encode(&result[..8])
    }
}

/// Resolve `path` against a base URL, treating the base as a directory.
pub fn join_url(base: &str, path: &str) -> Result<Url, FetchError> {
    let mut base = base.to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    let base = Url::parse(&base).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", base, e)))?;
    base.join(path.trim_start_matches('/'))
        .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", path, e)))
}
