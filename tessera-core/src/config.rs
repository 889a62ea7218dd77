//! Configuration loading for Tessera.
//!
//! A config file is optional. Without one, defaults are overlaid with
//! `TESSERA_*` environment variables.

use crate::{CacheMode, ConfigError};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Runtime configuration for a cache and its file-backed store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Population strategy.
    pub mode: CacheMode,
    /// Path of the JSON-lines store file.
    pub store_path: PathBuf,
    /// Default log filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit logs as JSON instead of human-readable text.
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            mode: CacheMode::Lazy,
            store_path: PathBuf::from("tessera.jsonl"),
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

impl CacheConfig {
    /// Resolve configuration from `--config <path>`, then `TESSERA_CONFIG`,
    /// then the environment alone.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path_from_args().or_else(config_path_from_env);
        let config = match path {
            Some(path) => Self::from_path(&path)?,
            None => Self::from_env()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })
    }

    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `TESSERA_MODE`: "eager" or "lazy" (default: lazy)
    /// - `TESSERA_STORE_PATH`: Store file path (default: tessera.jsonl)
    /// - `TESSERA_LOG_LEVEL`: Default log level (default: info)
    /// - `TESSERA_LOG_JSON`: "true" or "1" for JSON logs (default: false)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let mode = match lookup("TESSERA_MODE") {
            Some(raw) => raw
                .parse::<CacheMode>()
                .map_err(|e| ConfigError::InvalidValue {
                    field: "mode".to_string(),
                    value: raw.clone(),
                    reason: e.to_string(),
                })?,
            None => defaults.mode,
        };

        Ok(Self {
            mode,
            store_path: lookup("TESSERA_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.store_path),
            log_level: lookup("TESSERA_LOG_LEVEL").unwrap_or(defaults.log_level),
            log_json: lookup("TESSERA_LOG_JSON")
                .map(|s| s == "true" || s == "1")
                .unwrap_or(defaults.log_json),
        })
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "store_path".to_string(),
                value: String::new(),
                reason: "must not be empty".to_string(),
            });
        }
        if !VALID_LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "log_level".to_string(),
                value: self.log_level.clone(),
                reason: format!("must be one of {}", VALID_LOG_LEVELS.join(", ")),
            });
        }
        Ok(())
    }
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
        if let Some(value) = arg.strip_prefix("--config=") {
            return Some(PathBuf::from(value));
        }
    }
    None
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var("TESSERA_CONFIG").ok().map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_uses_defaults_when_unset() {
        let config = CacheConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, CacheConfig::default());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = CacheConfig::from_lookup(lookup_from(&[
            ("TESSERA_MODE", "Eager"),
            ("TESSERA_STORE_PATH", "/tmp/dogs.jsonl"),
            ("TESSERA_LOG_LEVEL", "debug"),
            ("TESSERA_LOG_JSON", "1"),
        ]))
        .unwrap();
        assert_eq!(config.mode, CacheMode::Eager);
        assert_eq!(config.store_path, PathBuf::from("/tmp/dogs.jsonl"));
        assert_eq!(config.log_level, "debug");
        assert!(config.log_json);
    }

    #[test]
    fn test_from_lookup_rejects_unknown_mode() {
        let err = CacheConfig::from_lookup(lookup_from(&[("TESSERA_MODE", "hybrid")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "mode"));
    }

    #[test]
    fn test_from_toml_str() {
        let config = CacheConfig::from_toml_str(
            r#"
            mode = "eager"
            store_path = "db-basic"
            "#,
        )
        .unwrap();
        assert_eq!(config.mode, CacheMode::Eager);
        assert_eq!(config.store_path, PathBuf::from("db-basic"));
        assert_eq!(config.log_level, "info");
        assert!(!config.log_json);
    }

    #[test]
    fn test_from_toml_str_rejects_unknown_fields() {
        let err = CacheConfig::from_toml_str(
            r#"
            mode = "lazy"
            store_path = "db"
            ttl_secs = 30
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_from_path_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "mode = \"lazy\"\nstore_path = \"db\"\nlog_json = true").unwrap();
        let config = CacheConfig::from_path(file.path()).unwrap();
        assert!(config.log_json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = CacheConfig::from_path(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = CacheConfig::default();
        config.log_level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = CacheConfig::default();
        config.store_path = PathBuf::new();
        assert!(config.validate().is_err());
    }
}
