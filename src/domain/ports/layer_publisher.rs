use async_trait::async_trait;
use std::path::Path;

use crate::domain::errors::DomainResult;

/// Port for the layer-publishing service
#[async_trait]
pub trait LayerPublisher: Send + Sync {
    /// Publish a raster or vector file as `layer_name`.
    ///
    /// Returns the store handle, or `None` if the service refused the file.
    async fn publish(&self, file_path: &Path, workspace: &str, layer_name: &str) -> DomainResult<Option<String>>;

    /// Remove a published layer; returns false if it did not exist
    async fn delete(&self, layer_name: &str, workspace: &str) -> DomainResult<bool>;
}
