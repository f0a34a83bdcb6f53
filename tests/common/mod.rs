#![allow(dead_code)]

//! Common test utilities for integration tests
//!
//! Builds an orchestrator over an in-memory database and the mock compute
//! backend, layer publisher and notifier.

use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Arc;

use geodispatch::adapters::compute::MockComputeBackend;
use geodispatch::adapters::notifier::RecordingNotifier;
use geodispatch::adapters::publisher::MockLayerPublisher;
use geodispatch::adapters::sqlite::{create_migrated_test_pool, repositories};
use geodispatch::domain::models::{Area, Catalog, MapConfig, TaskRecord};
use geodispatch::domain::ports::TaskRecordFilter;
use geodispatch::infrastructure::config::PluginMapConfigs;
use geodispatch::services::map_engine::{EngineContext, EngineServices, Repositories};
use geodispatch::services::orchestrator::Orchestrator;
use geodispatch::services::plugin::PluginFactory;

pub struct TestWorld {
    pub orchestrator: Orchestrator,
    pub repos: Repositories,
    pub backend: MockComputeBackend,
    pub publisher: MockLayerPublisher,
    pub notifier: RecordingNotifier,
}

impl TestWorld {
    /// World over the builtin catalog with the given plugin map configurations.
    pub async fn new(configs: HashMap<String, PluginMapConfigs>) -> Self {
        let pool = create_migrated_test_pool().await.expect("Failed to create test pool");
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
        let orchestrator = Orchestrator::new(services, PluginFactory::new(Catalog::builtin(), configs));
        Self {
            orchestrator,
            repos,
            backend,
            publisher,
            notifier,
        }
    }

    pub async fn add_area(&self, area: &Area) {
        self.repos.areas.insert(area).await.expect("Failed to insert area");
    }

    pub async fn area(&self, id: &str) -> Area {
        self.repos.areas.get(id).await.unwrap().expect("area exists")
    }

    /// All task records of `area_id` and `map_id`, oldest first.
    pub async fn records(&self, area_id: &str, map_id: &str) -> Vec<TaskRecord> {
        self.repos
            .tasks
            .list(TaskRecordFilter::for_area(area_id).map(map_id))
            .await
            .unwrap()
    }

    /// Backend workspace id of one area/plugin/map.
    pub async fn workspace(&self, area_id: &str, plugin_id: &str, map_id: &str) -> String {
        self.backend
            .workspace_id(&EngineContext::workspace_name(area_id, plugin_id, map_id))
            .await
            .expect("workspace opened")
    }
}

/// Map configurations of one plugin.
pub fn plugin_configs(plugin_id: &str, maps: &[(&str, MapConfig)]) -> HashMap<String, PluginMapConfigs> {
    let configs = maps
        .iter()
        .map(|(map_id, config)| ((*map_id).to_string(), config.clone()))
        .collect();
    HashMap::from([(plugin_id.to_string(), configs)])
}

pub fn sar_flood_config() -> MapConfig {
    MapConfig::new("edrift_flood").with_look_back_days(7)
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}
