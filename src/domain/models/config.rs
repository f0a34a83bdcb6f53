use serde::{Deserialize, Serialize};

use super::catalog::Catalog;

/// Main configuration structure for geodispatch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Compute backend client configuration
    #[serde(default)]
    pub compute: ComputeConfig,

    /// Layer publisher configuration
    #[serde(default)]
    pub publisher: PublisherConfig,

    /// Outbound notification configuration
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Daemon loop configuration
    #[serde(default)]
    pub daemon: DaemonConfig,

    /// Directory holding `<plugin_id>.yaml` map configuration files,
    /// relative to the main configuration file
    #[serde(default = "default_plugins_dir")]
    pub plugins_dir: String,

    /// Plugin and map catalog
    #[serde(default)]
    pub catalog: Catalog,
}

fn default_plugins_dir() -> String {
    "plugins".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            compute: ComputeConfig::default(),
            publisher: PublisherConfig::default(),
            notifier: NotifierConfig::default(),
            daemon: DaemonConfig::default(),
            plugins_dir: default_plugins_dir(),
            catalog: Catalog::default(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".geodispatch/geodispatch.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stdout only when unset
    #[serde(default)]
    pub log_dir: Option<String>,

    /// Rotation: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}

/// Compute backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ComputeConfig {
    /// Base URL of the compute backend REST API
    #[serde(default = "default_compute_url")]
    pub base_url: String,

    /// API key sent as a bearer token
    #[serde(default)]
    pub api_key: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum elapsed time spent retrying one call, in milliseconds
    #[serde(default = "default_max_retry_elapsed_ms")]
    pub max_retry_elapsed_ms: u64,

    /// Initial backoff delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Local directory where workspace files are downloaded before publishing
    #[serde(default = "default_download_dir")]
    pub download_dir: String,
}

fn default_compute_url() -> String {
    "http://localhost:8080/api".to_string()
}

const fn default_timeout_secs() -> u64 {
    60
}

const fn default_max_retry_elapsed_ms() -> u64 {
    30_000
}

const fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_download_dir() -> String {
    ".geodispatch/downloads".to_string()
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            base_url: default_compute_url(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
            max_retry_elapsed_ms: default_max_retry_elapsed_ms(),
            initial_backoff_ms: default_initial_backoff_ms(),
            download_dir: default_download_dir(),
        }
    }
}

/// Layer publisher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PublisherConfig {
    /// Base URL of the publisher REST API
    #[serde(default = "default_publisher_url")]
    pub base_url: String,

    /// Publisher workspace layers are placed in
    #[serde(default = "default_publisher_workspace")]
    pub workspace: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_publisher_url() -> String {
    "http://localhost:8081/rest".to_string()
}

fn default_publisher_workspace() -> String {
    "geodispatch".to_string()
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            base_url: default_publisher_url(),
            workspace: default_publisher_workspace(),
            username: String::new(),
            password: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Outbound notification configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NotifierConfig {
    /// Mail relay endpoint; notifications are only logged when unset
    #[serde(default)]
    pub relay_url: Option<String>,

    /// Recipient addresses
    #[serde(default)]
    pub recipients: Vec<String>,
}

/// Daemon loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DaemonConfig {
    /// Seconds between cycles
    #[serde(default = "default_cycle_interval_secs")]
    pub cycle_interval_secs: u64,

    /// Run a cycle immediately on startup
    #[serde(default = "default_true")]
    pub run_on_startup: bool,

    /// Stop after this many consecutive failed cycles
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
}

const fn default_cycle_interval_secs() -> u64 {
    600
}

const fn default_true() -> bool {
    true
}

const fn default_max_consecutive_failures() -> u32 {
    10
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            cycle_interval_secs: default_cycle_interval_secs(),
            run_on_startup: default_true(),
            max_consecutive_failures: default_max_consecutive_failures(),
        }
    }
}
