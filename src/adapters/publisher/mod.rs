//! Layer publisher adapters.

pub mod http;
pub mod mock;

pub use http::HttpLayerPublisher;
pub use mock::{MockLayerPublisher, PublisherCall};
