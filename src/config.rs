//! Configuration loading and management for lumireads.
//!
//! Loads settings from `lumireads.toml` with an environment variable override for the backend URL.

use crate::language::Language;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable that overrides `backend.base_url`
pub const BACKEND_URL_ENV: &str = "LUMIREADS_BACKEND_URL";

const CONFIG_FILE_NAME: &str = "lumireads.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Where catalog searches are sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSource {
    /// Query Open Library directly
    #[default]
    OpenLibrary,
    /// Go through the summarization backend's `/search_book` route
    Backend,
}

/// Book catalog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub source: CatalogSource,
    /// Base URL of the Open Library API
    pub base_url: String,
    /// Base URL of the Open Library covers service
    pub covers_url: String,
    /// Request timeout, unset means the HTTP client default
    pub timeout_secs: Option<u64>,
}

/// Summarization backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_secs: Option<u64>,
}

/// Where downloaded summaries and audio are written
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub dir: PathBuf,
}

/// Audio playback configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AudioConfig {
    /// External command used to play narrated summaries (e.g. "mpv")
    #[serde(default)]
    pub player: Option<String>,
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Language selected when the client starts
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub audio: AudioConfig,
}

impl Config {
    /// Load configuration from the default location (lumireads.toml in cwd or home).
    ///
    /// A missing file is not an error; defaults are used instead.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::find_config_file() {
            Some(path) => Self::load_from(&path),
            None => {
                let mut config = Config::default();
                config.apply_env();
                Ok(config)
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&content)?;
        config.apply_env();
        Ok(config)
    }

    /// Parse configuration from TOML text without consulting the environment
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env(&mut self) {
        self.apply_backend_override(std::env::var(BACKEND_URL_ENV).ok());
    }

    /// Replace the backend URL unless the override is absent or blank
    fn apply_backend_override(&mut self, url: Option<String>) {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.backend.base_url = url;
        }
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        // Check current directory first
        let local_config = PathBuf::from(CONFIG_FILE_NAME);
        if local_config.exists() {
            return Some(local_config);
        }

        let home_config = dirs::home_dir()?
            .join(".config")
            .join("lumireads")
            .join(CONFIG_FILE_NAME);
        home_config.exists().then_some(home_config)
    }
}

impl CatalogConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            source: CatalogSource::OpenLibrary,
            base_url: "https://openlibrary.org".to_string(),
            covers_url: "https://covers.openlibrary.org".to_string(),
            timeout_secs: None,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: None,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
        }
    }
}
