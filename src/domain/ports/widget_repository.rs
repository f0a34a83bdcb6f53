use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::WidgetInfo;

/// Repository port for dashboard widgets
#[async_trait]
pub trait WidgetRepository: Send + Sync {
    async fn get(&self, id: &str) -> DomainResult<Option<WidgetInfo>>;

    async fn insert(&self, widget: &WidgetInfo) -> DomainResult<()>;

    async fn update(&self, widget: &WidgetInfo) -> DomainResult<()>;

    async fn list_by_area(&self, area_id: &str) -> DomainResult<Vec<WidgetInfo>>;
}
