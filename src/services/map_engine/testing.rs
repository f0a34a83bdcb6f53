//! Shared fixtures for engine unit tests.

use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;

use crate::adapters::compute::MockComputeBackend;
use crate::adapters::notifier::RecordingNotifier;
use crate::adapters::publisher::MockLayerPublisher;
use crate::adapters::sqlite::{create_migrated_test_pool, repositories};
use crate::domain::models::{Area, MapConfig, TaskRecord};
use crate::services::map_engine::{EngineContext, EngineServices, MapEngine, Repositories, TaskOutcome};

pub(crate) struct Harness {
    pub services: Arc<EngineServices>,
    pub repos: Repositories,
    pub backend: MockComputeBackend,
    pub publisher: MockLayerPublisher,
    pub notifier: RecordingNotifier,
}

impl Harness {
    pub async fn new() -> Self {
        let pool = create_migrated_test_pool().await.unwrap();
        let repos = repositories(pool);
        let backend = MockComputeBackend::new();
        let publisher = MockLayerPublisher::new();
        let notifier = RecordingNotifier::new();
        let services = Arc::new(EngineServices::new(
            repos.clone(),
            Arc::new(backend.clone()),
            Arc::new(publisher.clone()),
            Arc::new(notifier.clone()),
            "geodispatch",
        ));
        Self {
            services,
            repos,
            backend,
            publisher,
            notifier,
        }
    }

    /// Store `area` and build a context for one of its maps.
    pub async fn context(&self, area: &Area, plugin_id: &str, map_id: &str, config: MapConfig, now: DateTime<Utc>) -> EngineContext {
        if self.repos.areas.get(&area.id).await.unwrap().is_none() {
            self.repos.areas.insert(area).await.unwrap();
        }
        let workspace = self
            .services
            .dispatch
            .open_workspace(&EngineContext::workspace_name(&area.id, plugin_id, map_id))
            .await
            .unwrap();
        EngineContext::new(self.services.clone(), area.clone(), plugin_id, map_id, workspace, config, now)
    }

    /// Records of `ctx`'s engine, oldest first.
    pub async fn records(&self, ctx: &EngineContext) -> Vec<TaskRecord> {
        ctx.history().await.unwrap()
    }

    /// Mark every job DONE and run `handle_task` over all active records.
    pub async fn complete_all(&self, engine: &dyn MapEngine, ctx: &EngineContext) -> Vec<TaskOutcome> {
        self.backend.set_all_statuses("DONE").await;
        let mut outcomes = Vec::new();
        for mut record in self.services.ledger.active_records(&ctx.area.id, &ctx.plugin_id).await.unwrap() {
            if let Ok(outcome) = engine.handle_task(ctx, &mut record).await {
                outcomes.push(outcome);
            }
        }
        outcomes
    }
}

pub(crate) fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub(crate) fn area() -> Area {
    Area::new("A1", "Area one").with_plugin("flood")
}
