//! Port trait definitions (Hexagonal Architecture)
//!
//! Repositories for the entity store, plus the compute backend, layer
//! publisher and notifier collaborators. Services depend only on these.

pub mod area_repository;
pub mod compute_backend;
pub mod event_repository;
pub mod layer_publisher;
pub mod layer_repository;
pub mod notifier;
pub mod task_record_repository;
pub mod widget_repository;

pub use area_repository::AreaRepository;
pub use compute_backend::ComputeBackend;
pub use event_repository::EventRepository;
pub use layer_publisher::LayerPublisher;
pub use layer_repository::LayerRepository;
pub use notifier::Notifier;
pub use task_record_repository::{TaskRecordFilter, TaskRecordRepository};
pub use widget_repository::WidgetRepository;
