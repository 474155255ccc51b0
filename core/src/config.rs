//! Client configuration: base address, timeout, and endpoint surface.
//!
//! Loaded once, from `<config dir>/daybook/config.toml` when that file
//! exists, then overridden by `DAYBOOK_*` environment variables. The facade
//! copies what it needs at construction and never re-reads it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

pub const ENV_BASE_URL: &str = "DAYBOOK_BASE_URL";
pub const ENV_TIMEOUT_MS: &str = "DAYBOOK_TIMEOUT_MS";
pub const ENV_API_VERSION: &str = "DAYBOOK_API_VERSION";

/// Endpoint surface a deployment exposes. Later versions only add endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    /// Weather, news, thoughts and suggestions.
    V1,
    /// V1 plus daily records, AI summaries and users.
    V2,
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiVersion::V1 => f.write_str("v1"),
            ApiVersion::V2 => f.write_str("v2"),
        }
    }
}

impl FromStr for ApiVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" | "1" => Ok(ApiVersion::V1),
            "v2" | "2" => Ok(ApiVersion::V2),
            _ => Err(ConfigError::InvalidValue {
                key: "api_version",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub api_version: ApiVersion,
    /// Where the file-backed key-value store lives. `None` picks the
    /// platform data directory.
    pub storage_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            api_version: ApiVersion::V2,
            storage_path: None,
        }
    }
}

impl ClientConfig {
    /// Local development backend.
    pub fn development() -> Self {
        Self::default()
    }

    /// A deployed backend. The address is deployment-specific.
    pub fn production(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load from the default config file (if any) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = default_config_path();
        let config = Self::load_from(path.as_deref())?;
        config.apply_env(|key| std::env::var(key).ok())
    }

    /// Load from `path`, falling back to defaults when it is `None` or the
    /// file does not exist. Environment variables are not consulted.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path.filter(|p| p.exists()) else {
            return Ok(Self::default());
        };
        let label = path.display().to_string();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: label.clone(),
            source,
        })?;
        Self::from_toml_str(&contents, &label)
    }

    pub fn from_toml_str(contents: &str, label: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: label.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `DAYBOOK_*` overrides read through `lookup`.
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            self.timeout_ms = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "timeout_ms",
                value: raw.clone(),
            })?;
        }
        if let Some(raw) = lookup(ENV_API_VERSION) {
            self.api_version = raw.parse()?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                key: "base_url",
                value: self.base_url.clone(),
            });
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "timeout_ms",
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("daybook").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_development_backend() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.api_version, ApiVersion::V2);
        assert_eq!(config, ClientConfig::development());
    }

    #[test]
    fn production_keeps_default_timeout() {
        let config = ClientConfig::production("https://api.example.com");
        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn toml_fills_missing_fields_with_defaults() {
        let config = ClientConfig::from_toml_str(
            r#"base_url = "https://daybook.example.org"
api_version = "v1""#,
            "inline",
        )
        .unwrap();
        assert_eq!(config.base_url, "https://daybook.example.org");
        assert_eq!(config.api_version, ApiVersion::V1);
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn toml_rejects_non_http_base_url() {
        let err = ClientConfig::from_toml_str(r#"base_url = "ftp://nope""#, "inline").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "base_url", .. }));
    }

    #[test]
    fn env_overrides_win() {
        let config = ClientConfig::default()
            .apply_env(env(&[
                (ENV_BASE_URL, "http://10.0.0.5:18080"),
                (ENV_TIMEOUT_MS, "2500"),
                (ENV_API_VERSION, "V1"),
            ]))
            .unwrap();
        assert_eq!(config.base_url, "http://10.0.0.5:18080");
        assert_eq!(config.timeout(), Duration::from_millis(2500));
        assert_eq!(config.api_version, ApiVersion::V1);
    }

    #[test]
    fn env_rejects_bad_timeout() {
        let err = ClientConfig::default()
            .apply_env(env(&[(ENV_TIMEOUT_MS, "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "timeout_ms", .. }));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::load_from(Some(dir.path().join("absent.toml").as_path())).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn file_is_read_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "timeout_ms = 500\n").unwrap();
        let config = ClientConfig::load_from(Some(path.as_path())).unwrap();
        assert_eq!(config.timeout_ms, 500);
    }

    #[test]
    fn versions_are_ordered() {
        assert!(ApiVersion::V1 < ApiVersion::V2);
        assert_eq!("2".parse::<ApiVersion>().unwrap(), ApiVersion::V2);
    }
}
