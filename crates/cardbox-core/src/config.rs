//! Configuration module for cardbox.
//!
//! Provides typed configuration structs that map to the YAML configuration
//! file, with loading, validation, defaults, and field identifier mapping
//! for the remote document store.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::record::FieldRole;

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for cardbox.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub remote: RemoteConfig,
    pub retry: RetryConfig,
    pub save: SaveConfig,
    pub logging: LoggingConfig,
}

/// Remote document store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the record API.
    pub base_url: String,
    /// Application identifier sent with every request.
    pub app_id: Option<String>,
    /// Backend column identifier per logical field role. Backends name
    /// their columns opaquely (`field_1234` style); this map keeps those
    /// identifiers out of code.
    pub field_ids: BTreeMap<String, String>,
}

/// Retry and backoff tuning shared by the save queue and the HTTP client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per operation (first try included).
    pub max_attempts: u32,
    /// Base delay in milliseconds; attempt `n` waits `base * 2^(n-1)`.
    pub base_delay_ms: u64,
}

/// What to do when the pre-save fetch for field preservation fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreservationPolicy {
    /// Proceed without preservation and log a warning. Unrelated remote
    /// fields may be overwritten, but the save is never blocked.
    #[default]
    BestEffort,
    /// Fail the operation so the queue's retry policy applies.
    Strict,
}

/// Save pipeline settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveConfig {
    pub preservation: PreservationPolicy,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/cardbox/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("cardbox")
            .join("config.yaml")
    }
}

impl RemoteConfig {
    /// The backend column identifier for a field role, falling back to the
    /// role's own name when the config does not override it.
    pub fn field_id(&self, role: FieldRole) -> String {
        self.field_ids
            .get(role.as_str())
            .cloned()
            .unwrap_or_else(|| role.as_str().to_string())
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://records.cardbox.app/v1".to_string(),
            app_id: None,
            field_ids: BTreeMap::new(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1_000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_delay_ms, 1_000);
        assert_eq!(config.save.preservation, PreservationPolicy::BestEffort);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_field_id_fallback() {
        let remote = RemoteConfig::default();
        assert_eq!(remote.field_id(FieldRole::CardBank), "cardBank");
    }

    #[test]
    fn test_field_id_override() {
        let mut remote = RemoteConfig::default();
        remote
            .field_ids
            .insert("cardBank".to_string(), "field_2979".to_string());
        assert_eq!(remote.field_id(FieldRole::CardBank), "field_2979");
        assert_eq!(remote.field_id(FieldRole::LastSaved), "lastSaved");
    }

    #[test]
    fn test_load_partial_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "retry:\n  max_attempts: 5\nsave:\n  preservation: strict\n"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay_ms, 1_000);
        assert_eq!(config.save.preservation, PreservationPolicy::Strict);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default(Path::new("/nonexistent/cardbox.yaml"));
        assert_eq!(config.retry.max_attempts, 3);
    }
}
