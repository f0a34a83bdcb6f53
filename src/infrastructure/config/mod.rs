//! Configuration management infrastructure
//!
//! Hierarchical configuration using figment:
//! - YAML file loading
//! - Environment variable overrides
//! - Configuration validation
//! - Per-plugin map configuration files

pub mod loader;
pub mod map_config;

pub use loader::{ConfigError, ConfigLoader, DEFAULT_CONFIG_FILE};
pub use map_config::{MapConfigStore, PluginMapConfigs};
