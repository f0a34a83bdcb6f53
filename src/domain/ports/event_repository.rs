use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Event, EventType};

/// Repository port for detected events
#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn insert(&self, event: &Event) -> DomainResult<()>;

    async fn update(&self, event: &Event) -> DomainResult<()>;

    /// The open (`in_going`) event of this type for the area, if any
    async fn find_open(&self, area_id: &str, event_type: EventType) -> DomainResult<Option<Event>>;

    async fn list_by_area(&self, area_id: &str) -> DomainResult<Vec<Event>>;
}
