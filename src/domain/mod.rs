//! Domain layer for geodispatch
//!
//! Core records (areas, task records, layers, events, widgets), the static
//! catalog, and the port traits the services depend on.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
