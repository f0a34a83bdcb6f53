//! Geodispatch - processing job orchestration for monitored areas
//!
//! Geodispatch periodically walks every onboarded area, asks each subscribed
//! plugin's map engines what remote processing is due, submits it to the
//! compute backend exactly once, and turns finished jobs into published
//! layers, widget values and event notifications.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): records, catalog, and port traits
//! - **Service Layer** (`services`): job ledger, map engines, plugins, cycle orchestrator, daemon
//! - **Adapters** (`adapters`): `SQLite` store, compute backend, layer publisher, notifier
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    Area, Catalog, Config, Event, EventType, Layer, MapConfig, TaskPayload, TaskRecord,
    TaskStatus, WidgetInfo,
};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{CycleReport, DedupPolicy, EngineServices, JobLedger, MapEngine, Orchestrator};
