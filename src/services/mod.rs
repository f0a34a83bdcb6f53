pub mod daemon;
pub mod dispatch_client;
pub mod event_service;
pub mod job_ledger;
pub mod map_engine;
pub mod orchestrator;
pub mod plugin;
pub mod publication;
pub mod widget_service;

pub use daemon::{Daemon, DaemonEvent, DaemonHandle, DaemonStatus, StopReason};
pub use dispatch_client::DispatchClient;
pub use event_service::{EventChange, EventService, Observation};
pub use job_ledger::{DedupPolicy, JobLedger};
pub use map_engine::{EngineContext, EngineRegistry, EngineServices, MapEngine, Repositories, TaskOutcome};
pub use orchestrator::{CycleReport, Orchestrator};
pub use plugin::{Plugin, PluginFactory, PluginReport};
pub use publication::PublicationService;
pub use widget_service::WidgetService;
