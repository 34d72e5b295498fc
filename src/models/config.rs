//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote feed settings
    #[serde(default)]
    pub feed: FeedConfig,

    /// Locations of the downloaded and decompressed artifacts
    #[serde(default)]
    pub paths: PathsConfig,

    /// Snapshot storage backend
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Apply environment overrides (a `.env` file is honoured too).
    pub fn apply_env(&mut self) {
        let _ = dotenvy::dotenv();
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("MATRIX_FEED_URL") {
            self.feed.url = url;
        }
        if let Some(database) = var("DATABASE_URL") {
            let path = database.strip_prefix("file:").unwrap_or(&database);
            self.storage.database = PathBuf::from(path);
        }
        if let Some(backend) = var("MATRIX_STORAGE_BACKEND") {
            match backend.to_lowercase().as_str() {
                "sqlite" => self.storage.backend = StorageBackend::Sqlite,
                "json" => self.storage.backend = StorageBackend::Json,
                other => log::warn!("Ignoring unknown MATRIX_STORAGE_BACKEND '{}'", other),
            }
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.feed.url)
            .map_err(|e| AppError::validation(format!("feed.url is invalid: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::validation("feed.url must use http or https"));
        }
        if self.feed.user_agent.trim().is_empty() {
            return Err(AppError::validation("feed.user_agent is empty"));
        }
        if self.feed.timeout_secs == 0 {
            return Err(AppError::validation("feed.timeout_secs must be > 0"));
        }
        if self.paths.archive_file.trim().is_empty() || self.paths.markup_file.trim().is_empty() {
            return Err(AppError::validation(
                "paths.archive_file and paths.markup_file must be set",
            ));
        }
        if self.paths.archive_file == self.paths.markup_file {
            return Err(AppError::validation(
                "paths.archive_file and paths.markup_file must differ",
            ));
        }
        Ok(())
    }
}

/// Remote feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Location of the gzip-compressed sign feed
    #[serde(default = "defaults::feed_url")]
    pub url: String,

    /// User-Agent header for the download
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: defaults::feed_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Working files produced while decoding the feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "defaults::work_dir")]
    pub work_dir: PathBuf,

    /// Downloaded compressed feed, relative to `work_dir`
    #[serde(default = "defaults::archive_file")]
    pub archive_file: String,

    /// Decompressed markup, relative to `work_dir`
    #[serde(default = "defaults::markup_file")]
    pub markup_file: String,

    /// Leave the artifacts on disk after a run
    #[serde(default)]
    pub keep_artifacts: bool,
}

impl PathsConfig {
    pub fn archive_path(&self) -> PathBuf {
        self.work_dir.join(&self.archive_file)
    }

    pub fn markup_path(&self) -> PathBuf {
        self.work_dir.join(&self.markup_file)
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            work_dir: defaults::work_dir(),
            archive_file: defaults::archive_file(),
            markup_file: defaults::markup_file(),
            keep_artifacts: false,
        }
    }
}

/// Which store receives the snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Json,
}

/// Snapshot storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// SQLite database file
    #[serde(default = "defaults::database")]
    pub database: PathBuf,

    /// Directory holding `signs.json` for the JSON backend
    #[serde(default = "defaults::snapshot_dir")]
    pub snapshot_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            database: defaults::database(),
            snapshot_dir: defaults::snapshot_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log filter when `RUST_LOG` is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Feed defaults
    pub fn feed_url() -> String {
        "http://opendata.ndw.nu/Matrixsignaalinformatie.xml.gz".into()
    }
    pub fn user_agent() -> String {
        concat!("matrix-sync/", env!("CARGO_PKG_VERSION")).into()
    }
    pub fn timeout() -> u64 {
        60
    }

    // Path defaults
    pub fn work_dir() -> PathBuf {
        PathBuf::from("data")
    }
    pub fn archive_file() -> String {
        "matrix.xml.gz".into()
    }
    pub fn markup_file() -> String {
        "matrix.xml".into()
    }

    // Storage defaults
    pub fn database() -> PathBuf {
        PathBuf::from("data/signs.db")
    }
    pub fn snapshot_dir() -> PathBuf {
        PathBuf::from("data/snapshot")
    }

    pub fn log_level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_url() {
        let mut config = Config::default();
        config.feed.url = "not a url".to_string();
        assert!(matches!(config.validate(), Err(AppError::Validation(_))));

        config.feed.url = "ftp://opendata.ndw.nu/matrix.xml.gz".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.feed.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_clashing_artifacts() {
        let mut config = Config::default();
        config.paths.markup_file = config.paths.archive_file.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [storage]
            backend = "json"

            [paths]
            keep_artifacts = true
            "#,
        )
        .unwrap();

        assert_eq!(config.storage.backend, StorageBackend::Json);
        assert!(config.paths.keep_artifacts);
        assert_eq!(config.paths.archive_path(), PathBuf::from("data/matrix.xml.gz"));
        assert_eq!(config.feed.timeout_secs, 60);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = Config::default();
        config.apply_overrides(|key| match key {
            "MATRIX_FEED_URL" => Some("https://example.com/feed.xml.gz".to_string()),
            "DATABASE_URL" => Some("file:./dev.db".to_string()),
            "MATRIX_STORAGE_BACKEND" => Some("JSON".to_string()),
            _ => None,
        });

        assert_eq!(config.feed.url, "https://example.com/feed.xml.gz");
        assert_eq!(config.storage.database, PathBuf::from("./dev.db"));
        assert_eq!(config.storage.backend, StorageBackend::Json);
    }

    #[test]
    fn load_or_default_on_missing_file() {
        let config = Config::load_or_default("/nonexistent/matrix-sync.toml");
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
    }
}
