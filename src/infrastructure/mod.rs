//! Infrastructure layer module
//!
//! - Configuration management (figment, per-plugin map configuration)
//! - Logging infrastructure (tracing)

pub mod config;
pub mod logging;
