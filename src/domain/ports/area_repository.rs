use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::errors::DomainResult;
use crate::domain::models::Area;

/// Repository port for monitored areas
#[async_trait]
pub trait AreaRepository: Send + Sync {
    async fn insert(&self, area: &Area) -> DomainResult<()>;

    async fn get(&self, id: &str) -> DomainResult<Option<Area>>;

    /// List areas; `active_only` skips deactivated ones
    async fn list(&self, active_only: bool) -> DomainResult<Vec<Area>>;

    /// Persist the discovered archive window of an area
    async fn update_archive_window(
        &self,
        id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> DomainResult<()>;
}
