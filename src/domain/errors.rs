//! Domain errors for the geodispatch orchestration core.

use thiserror::Error;

/// Domain-level errors that can occur while dispatching and completing jobs.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Area not found: {0}")]
    AreaNotFound(String),

    #[error("Task record not found: {0}")]
    TaskRecordNotFound(String),

    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("Widget not found: {0}")]
    WidgetNotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Compute backend unavailable: {0}")]
    ComputeUnavailable(String),

    #[error("Layer publisher unavailable: {0}")]
    PublisherUnavailable(String),

    #[error("Notifier unavailable: {0}")]
    NotifierUnavailable(String),

    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Malformed remote result for job {job_id}: {reason}")]
    MalformedResult { job_id: String, reason: String },

    #[error("Concurrency conflict: {entity} {id} already has an active record")]
    ConcurrencyConflict { entity: String, id: String },

    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

impl From<reqwest::Error> for DomainError {
    fn from(err: reqwest::Error) -> Self {
        DomainError::ComputeUnavailable(err.to_string())
    }
}

impl DomainError {
    /// True for failures caused by an unreachable collaborator.
    pub fn is_collaborator_unavailable(&self) -> bool {
        matches!(
            self,
            Self::DatabaseError(_)
                | Self::ComputeUnavailable(_)
                | Self::PublisherUnavailable(_)
                | Self::NotifierUnavailable(_)
        )
    }
}
