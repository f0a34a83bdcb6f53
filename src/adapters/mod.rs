//! Adapters for the entity store and the remote collaborators.

pub mod compute;
pub mod notifier;
pub mod publisher;
pub mod sqlite;
