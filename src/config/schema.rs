//! config::schema
//!
//! On-disk configuration schema.
//!
//! # Example
//!
//! ```toml
//! api_base_url = "https://api.example.com"
//! timeout_ms = 15000
//!
//! [store]
//! provider = "file"
//! path = "/home/ana/.goalsync/store.json"
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Configuration file contents. Every key is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Server base URL
    pub api_base_url: Option<String>,

    /// Request timeout in milliseconds
    pub timeout_ms: Option<u64>,

    /// Offline store settings
    pub store: Option<StoreConfig>,
}

/// Offline store settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Backend: "file" or "memory"
    pub provider: Option<String>,

    /// Location of the store document (file backend only)
    pub path: Option<PathBuf>,
}

impl FileConfig {
    /// Validate the values present in the file.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.api_base_url {
            validate_base_url(url)?;
        }
        if let Some(timeout) = self.timeout_ms {
            validate_timeout(timeout)?;
        }
        if let Some(store) = &self.store {
            store.validate()?;
        }
        Ok(())
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(provider) = &self.provider {
            let valid = crate::store::valid_provider_names();
            if !valid.contains(&provider.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid store provider '{}', must be one of: {}",
                    provider,
                    valid.join(", ")
                )));
            }
        }
        Ok(())
    }
}

pub(super) fn validate_base_url(url: &str) -> Result<(), ConfigError> {
    let rest = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"));
    match rest {
        Some(host) if !host.trim_matches('/').is_empty() => Ok(()),
        _ => Err(ConfigError::InvalidValue(format!(
            "invalid api_base_url '{}', expected http:// or https:// followed by a host",
            url
        ))),
    }
}

pub(super) fn validate_timeout(timeout_ms: u64) -> Result<(), ConfigError> {
    if timeout_ms == 0 {
        return Err(ConfigError::InvalidValue(
            "timeout_ms must be greater than zero".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_file() {
        let config: FileConfig = toml::from_str(
            r#"
            api_base_url = "https://api.example.com"
            timeout_ms = 5000

            [store]
            provider = "memory"
            "#,
        )
        .unwrap();

        assert_eq!(config.api_base_url.as_deref(), Some("https://api.example.com"));
        assert_eq!(config.timeout_ms, Some(5000));
        assert_eq!(
            config.store.as_ref().and_then(|s| s.provider.as_deref()),
            Some("memory")
        );
        config.validate().unwrap();
    }

    #[test]
    fn empty_file_is_default() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config, FileConfig::default());
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(toml::from_str::<FileConfig>("api_url = \"x\"").is_err());
        assert!(toml::from_str::<FileConfig>("[store]\nkind = \"file\"").is_err());
    }

    #[test]
    fn validation_errors() {
        let bad_url = FileConfig {
            api_base_url: Some("ftp://host".into()),
            ..Default::default()
        };
        assert!(bad_url.validate().is_err());

        let no_host = FileConfig {
            api_base_url: Some("http://".into()),
            ..Default::default()
        };
        assert!(no_host.validate().is_err());

        let zero_timeout = FileConfig {
            timeout_ms: Some(0),
            ..Default::default()
        };
        assert!(zero_timeout.validate().is_err());

        let bad_provider = FileConfig {
            store: Some(StoreConfig {
                provider: Some("sqlite".into()),
                path: None,
            }),
            ..Default::default()
        };
        let err = bad_provider.validate().unwrap_err().to_string();
        assert!(err.contains("sqlite"));
    }
}
