//! config
//!
//! Configuration loading.
//!
//! # Precedence
//!
//! Later overrides earlier:
//! 1. Default values
//! 2. Config file
//! 3. Environment (`API_BASE_URL`, `GOALSYNC_TIMEOUT_MS`)
//! 4. CLI flags (applied by the caller through the `with_*` methods)
//!
//! # Config File Locations
//!
//! An explicit path (`--config`) must exist. Otherwise the first existing
//! file of:
//! 1. `$GOALSYNC_CONFIG`
//! 2. `$XDG_CONFIG_HOME/goalsync/config.toml`
//! 3. `~/.goalsync/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use goalsync::config::Config;
//!
//! let config = Config::load(None).unwrap();
//! println!("server: {}", config.api_base_url());
//! println!("timeout: {:?}", config.timeout());
//! ```

pub mod schema;

pub use schema::{FileConfig, StoreConfig};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::api::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::store::DEFAULT_PROVIDER;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Resolved configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Values from the config file (or defaults)
    pub file: FileConfig,
    api_base_url: Option<String>,
    timeout_ms: Option<u64>,
    source: Option<PathBuf>,
}

impl Config {
    /// Load from the standard locations (or `explicit`) and apply the
    /// process environment.
    ///
    /// # Errors
    ///
    /// - An explicit path that does not exist
    /// - A config file that cannot be read, parsed or validated
    /// - An environment override with an invalid value
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let (file, source) = match explicit {
            Some(path) if !path.exists() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => (Self::read_file(path)?, Some(path.to_path_buf())),
            None => match Self::find_config_file() {
                Some(path) => (Self::read_file(&path)?, Some(path)),
                None => (FileConfig::default(), None),
            },
        };

        let mut config = Self::from_file(file)?;
        config.source = source;
        config.apply_env(|key| std::env::var(key).ok())?;
        tracing::debug!(source = ?config.source, api_base_url = config.api_base_url(), "config loaded");
        Ok(config)
    }

    /// Build from already-parsed file contents.
    pub fn from_file(file: FileConfig) -> Result<Self, ConfigError> {
        file.validate()?;
        Ok(Self {
            file,
            ..Default::default()
        })
    }

    fn find_config_file() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("GOALSYNC_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("goalsync/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        let path = dirs::home_dir()?.join(".goalsync/config.toml");
        path.exists().then_some(path)
    }

    fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(url) = lookup("API_BASE_URL").filter(|v| !v.trim().is_empty()) {
            schema::validate_base_url(&url)?;
            self.api_base_url = Some(url);
        }
        if let Some(raw) = lookup("GOALSYNC_TIMEOUT_MS").filter(|v| !v.trim().is_empty()) {
            let timeout: u64 = raw.trim().parse().map_err(|_| {
                ConfigError::InvalidValue(format!("GOALSYNC_TIMEOUT_MS '{}' is not a number", raw))
            })?;
            schema::validate_timeout(timeout)?;
            self.timeout_ms = Some(timeout);
        }
        Ok(())
    }

    /// Override the base URL (command-line flag).
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into();
        schema::validate_base_url(&url)?;
        self.api_base_url = Some(url);
        Ok(self)
    }

    /// Canonical config file location: `~/.goalsync/config.toml`.
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".goalsync/config.toml"))
    }

    /// The file the configuration came from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Server base URL. Defaults to `http://127.0.0.1:8000`.
    pub fn api_base_url(&self) -> &str {
        self.api_base_url
            .as_deref()
            .or(self.file.api_base_url.as_deref())
            .unwrap_or(DEFAULT_BASE_URL)
    }

    /// Request timeout. Defaults to 15 seconds.
    pub fn timeout(&self) -> Duration {
        self.timeout_ms
            .or(self.file.timeout_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    /// Store provider. Defaults to `"file"`.
    pub fn store_provider(&self) -> &str {
        self.file
            .store
            .as_ref()
            .and_then(|s| s.provider.as_deref())
            .unwrap_or(DEFAULT_PROVIDER)
    }

    /// Store document path, when configured.
    pub fn store_path(&self) -> Option<&Path> {
        self.file.store.as_ref().and_then(|s| s.path.as_deref())
    }
}
