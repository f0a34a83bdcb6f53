//! CLI command implementations.

pub mod areas;
pub mod cycle;
pub mod init;
pub mod run;
pub mod tasks;
