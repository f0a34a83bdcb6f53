//! Compute backend adapters.

pub mod http;
pub mod mock;

pub use http::HttpComputeBackend;
pub use mock::{MockComputeBackend, Submission};
