use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::Layer;

/// Repository port for published layers
#[async_trait]
pub trait LayerRepository: Send + Sync {
    async fn insert(&self, layer: &Layer) -> DomainResult<()>;

    async fn get(&self, id: &str) -> DomainResult<Option<Layer>>;

    async fn update(&self, layer: &Layer) -> DomainResult<()>;

    /// Layers of an area, optionally restricted to one map, by reference date
    async fn list_by_area(&self, area_id: &str, map_id: Option<&str>) -> DomainResult<Vec<Layer>>;
}
