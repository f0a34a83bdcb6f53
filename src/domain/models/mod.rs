pub mod area;
pub mod catalog;
pub mod config;
pub mod event;
pub mod layer;
pub mod map_config;
pub mod task_record;
pub mod widget;

pub use area::{Area, BoundingBox};
pub use catalog::{Catalog, EngineKind, MapEntry, PluginEntry};
pub use config::{
    ComputeConfig, Config, DaemonConfig, DatabaseConfig, LoggingConfig, NotifierConfig,
    PublisherConfig,
};
pub use event::{Event, EventType};
pub use layer::Layer;
pub use map_config::MapConfig;
pub use task_record::{dedup_key, TaskPayload, TaskRecord, TaskStatus};
pub use widget::WidgetInfo;
