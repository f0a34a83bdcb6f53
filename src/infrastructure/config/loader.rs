use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::models::config::Config;

/// Default configuration file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "geodispatch.yaml";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid cycle_interval_secs: {0}. Must be at least 1")]
    InvalidCycleInterval(u64),

    #[error("Invalid max_consecutive_failures: {0}. Must be at least 1")]
    InvalidMaxConsecutiveFailures(u32),

    #[error("Compute base_url cannot be empty")]
    EmptyComputeUrl,

    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. The YAML file at `path`, or `geodispatch.yaml` (optional)
    /// 3. Environment variables (`GEODISPATCH_*`, `__` separates sections)
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let file = path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), Path::to_path_buf);

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(&file))
            .merge(Env::prefixed("GEODISPATCH_").split("__"))
            .extract()
            .with_context(|| format!("Failed to load configuration from {}", file.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Directory the main configuration file lives in; plugin map
    /// configuration is resolved relative to it.
    pub fn config_dir(path: Option<&Path>) -> PathBuf {
        path.and_then(Path::parent)
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(config.database.max_connections));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        if config.daemon.cycle_interval_secs == 0 {
            return Err(ConfigError::InvalidCycleInterval(config.daemon.cycle_interval_secs));
        }

        if config.daemon.max_consecutive_failures == 0 {
            return Err(ConfigError::InvalidMaxConsecutiveFailures(0));
        }

        if config.compute.base_url.is_empty() {
            return Err(ConfigError::EmptyComputeUrl);
        }

        config.catalog.validate().map_err(ConfigError::InvalidCatalog)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{EngineKind, MapEntry, PluginEntry};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.database.path, ".geodispatch/geodispatch.db");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.plugins_dir, "plugins");
        assert!(config.catalog.plugin("flood").is_some());
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
database:
  path: /custom/path.db
  max_connections: 3
logging:
  level: debug
  format: pretty
compute:
  base_url: https://compute.example.org/api
  api_key: k
daemon:
  cycle_interval_secs: 120
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.database.path, "/custom/path.db");
        assert_eq!(config.database.max_connections, 3);
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.compute.base_url, "https://compute.example.org/api");
        assert_eq!(config.compute.timeout_secs, 60);
        assert_eq!(config.daemon.cycle_interval_secs, 120);
        assert!(config.daemon.run_on_startup);

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_load_file_with_env_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("geodispatch.yaml");
        std::fs::write(&path, "logging:\n  level: warn\ndatabase:\n  path: from-file.db\n").unwrap();

        temp_env::with_vars(
            [
                ("GEODISPATCH_DATABASE__PATH", Some("from-env.db")),
                ("GEODISPATCH_DAEMON__CYCLE_INTERVAL_SECS", Some("30")),
            ],
            || {
                let config = ConfigLoader::load(Some(&path)).unwrap();
                assert_eq!(config.logging.level, "warn");
                assert_eq!(config.database.path, "from-env.db");
                assert_eq!(config.daemon.cycle_interval_secs, 30);
            },
        );
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");
        let config = ConfigLoader::load(Some(&path)).unwrap();
        assert_eq!(config.daemon.cycle_interval_secs, 600);
    }

    #[test]
    fn test_config_dir() {
        assert_eq!(
            ConfigLoader::config_dir(Some(Path::new("/etc/geodispatch/geodispatch.yaml"))),
            PathBuf::from("/etc/geodispatch")
        );
        assert_eq!(ConfigLoader::config_dir(Some(Path::new("geodispatch.yaml"))), PathBuf::from("."));
        assert_eq!(ConfigLoader::config_dir(None), PathBuf::from("."));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();

        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::InvalidLogLevel(level) => assert_eq!(level, "invalid"),
            other => panic!("Expected InvalidLogLevel error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidLogFormat(_)
        ));
    }

    #[test]
    fn test_validate_empty_database_path() {
        let mut config = Config::default();
        config.database.path = String::new();
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::EmptyDatabasePath
        ));
    }

    #[test]
    fn test_validate_zero_max_connections() {
        let mut config = Config::default();
        config.database.max_connections = 0;
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidMaxConnections(0)
        ));
    }

    #[test]
    fn test_validate_zero_cycle_interval() {
        let mut config = Config::default();
        config.daemon.cycle_interval_secs = 0;
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidCycleInterval(0)
        ));
    }

    #[test]
    fn test_validate_zero_max_consecutive_failures() {
        let mut config = Config::default();
        config.daemon.max_consecutive_failures = 0;
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidMaxConsecutiveFailures(0)
        ));
    }

    #[test]
    fn test_validate_empty_compute_url() {
        let mut config = Config::default();
        config.compute.base_url = String::new();
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::EmptyComputeUrl
        ));
    }

    #[test]
    fn test_validate_catalog_with_unknown_map() {
        let mut config = Config::default();
        config.catalog.plugins.push(PluginEntry {
            id: "drought".to_string(),
            name: "Drought".to_string(),
            description: String::new(),
            maps: vec!["spi".to_string()],
        });
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidCatalog(_)
        ));

        config.catalog.maps.push(MapEntry {
            id: "spi".to_string(),
            name: "SPI".to_string(),
            description: String::new(),
            engine: EngineKind::SarFlood,
            owner: None,
        });
        ConfigLoader::validate(&config).unwrap();
    }
}
