use async_trait::async_trait;

use crate::domain::errors::DomainResult;

/// Port for outbound notifications (email relay)
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, subject: &str, body: &str) -> DomainResult<()>;
}
