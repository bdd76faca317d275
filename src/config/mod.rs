//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::{PointRules, TournamentFormat};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Where archived tournaments come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Remote base URL serving `index.json` and tournament files.
    /// When unset the archive is read from `<data_dir>/archive`.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Index file name, relative to the archive root.
    #[serde(default = "default_index_path")]
    pub index_path: String,
}

fn default_index_path() -> String {
    "index.json".to_string()
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            index_path: default_index_path(),
        }
    }
}

/// Deck catalog location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Path or URL of the catalog JSON. Defaults to `<data_dir>/decks.json`.
    #[serde(default)]
    pub path: Option<String>,
}

/// Display gates applied on top of the raw statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Minimum matches before a deck appears in the win-rate rankings.
    #[serde(default = "default_dashboard_min_matches")]
    pub dashboard_min_matches: u32,

    /// Default per-row sample gate in the Deck Lab.
    #[serde(default = "default_lab_min_sample")]
    pub lab_min_sample: u32,
}

fn default_dashboard_min_matches() -> u32 {
    6
}

fn default_lab_min_sample() -> u32 {
    2
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            dashboard_min_matches: default_dashboard_min_matches(),
            lab_min_sample: default_lab_min_sample(),
        }
    }
}

/// Defaults for a freshly created live tournament.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveConfig {
    #[serde(default = "default_live_name")]
    pub default_name: String,

    #[serde(default = "default_rounds")]
    pub default_rounds: u32,

    #[serde(default)]
    pub rules: PointRules,
}

fn default_live_name() -> String {
    "Weekly Tournament".to_string()
}

fn default_rounds() -> u32 {
    4
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            default_name: default_live_name(),
            default_rounds: default_rounds(),
            rules: PointRules::default(),
        }
    }
}

impl LiveConfig {
    pub fn format(&self) -> TournamentFormat {
        TournamentFormat {
            rounds: self.default_rounds,
            rules: self.rules,
            ..TournamentFormat::default()
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub archive: ArchiveConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub live: LiveConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            archive: ArchiveConfig::default(),
            catalog: CatalogConfig::default(),
            analysis: AnalysisConfig::default(),
            live: LiveConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        if self.live.default_rounds == 0 {
            return Err(ConfigError::ValidationError(
                "Default round count must be greater than 0".to_string(),
            ));
        }

        if let Some(base) = &self.archive.base_url {
            url::Url::parse(base).map_err(|e| {
                ConfigError::ValidationError(format!("Invalid archive base_url '{}': {}", base, e))
            })?;
        }

        if self.archive.index_path.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Archive index_path must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.archive.index_path, "index.json");
        assert!(config.archive.base_url.is_none());
        assert_eq!(config.analysis.dashboard_min_matches, 6);
        assert_eq!(config.analysis.lab_min_sample, 2);
    }

    #[test]
    fn test_live_defaults() {
        let live = LiveConfig::default();
        let format = live.format();

        assert_eq!(format.rounds, 4);
        assert_eq!(format.rules.win_points, 3);
        assert_eq!(format.rules.draw_points, 1);
        assert_eq!(format.rules.loss_points, 0);
    }

    #[test]
    fn test_config_validation_ok() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_base_url() {
        let mut config = AppConfig::default();
        config.archive.base_url = Some("not a url".to_string());

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_rounds() {
        let mut config = AppConfig::default();
        config.live.default_rounds = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
data_dir = "/srv/decks"

[analysis]
dashboard_min_matches = 10

[live.rules]
winPoints = 2
drawPoints = 1
lossPoints = 0
"#
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/decks"));
        assert_eq!(config.analysis.dashboard_min_matches, 10);
        assert_eq!(config.analysis.lab_min_sample, 2);
        assert_eq!(config.live.rules.win_points, 2);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();

        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.data_dir, parsed.data_dir);
        assert_eq!(config.live.default_rounds, parsed.live.default_rounds);
    }
}
