//! Plugins: ordered sets of map engines run for one area.
//!
//! Per run, a plugin first advances its in-flight task records, then queues
//! every engine's short-horizon work before any archive backfill, then runs
//! the recurring update pass. A failing engine or record is logged and
//! skipped; the rest of the plugin still runs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::models::{Area, Catalog, MapConfig};
use crate::infrastructure::config::{MapConfigStore, PluginMapConfigs};
use crate::services::map_engine::{EngineContext, EngineRegistry, EngineServices, MapEngine, TaskOutcome};

/// Counters of one plugin run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PluginReport {
    pub submitted: usize,
    pub skipped: usize,
    pub completed: usize,
    pub failed_tasks: usize,
    pub unit_failures: usize,
}

/// A plugin bound to its engines and their map configurations.
pub struct Plugin {
    id: String,
    engines: Vec<(Arc<dyn MapEngine>, Option<MapConfig>)>,
}

impl Plugin {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn map_ids(&self) -> Vec<&str> {
        self.engines.iter().map(|(e, _)| e.map_id()).collect()
    }

    pub async fn run(&self, services: &Arc<EngineServices>, area: &Area, now: DateTime<Utc>) -> PluginReport {
        let mut report = PluginReport::default();
        let contexts = self.open_contexts(services, area, now, &mut report).await;

        self.advance_records(services, area, &contexts, &mut report).await;

        for (engine, ctx) in &contexts {
            if let Err(e) = engine.trigger_new_area_maps(ctx).await {
                tracing::warn!(area = %area.id, map = engine.map_id(), error = %e, "short-horizon trigger failed");
                report.unit_failures += 1;
            }
        }
        for (engine, ctx) in &contexts {
            if let Err(e) = engine.trigger_new_area_archives(ctx).await {
                tracing::warn!(area = %area.id, map = engine.map_id(), error = %e, "archive trigger failed");
                report.unit_failures += 1;
            }
        }
        for (engine, ctx) in &contexts {
            if let Err(e) = engine.update_new_maps(ctx).await {
                tracing::warn!(area = %area.id, map = engine.map_id(), error = %e, "update pass failed");
                report.unit_failures += 1;
            }
        }

        for (_, ctx) in &contexts {
            report.submitted += ctx.submitted();
            report.skipped += ctx.skipped();
        }
        report
    }

    async fn open_contexts(
        &self,
        services: &Arc<EngineServices>,
        area: &Area,
        now: DateTime<Utc>,
        report: &mut PluginReport,
    ) -> Vec<(Arc<dyn MapEngine>, EngineContext)> {
        let mut contexts = Vec::new();
        for (engine, config) in &self.engines {
            if engine.is_inert() {
                continue;
            }
            let Some(config) = config else {
                tracing::warn!(plugin = %self.id, map = engine.map_id(), "missing map configuration, map skipped");
                continue;
            };

            let name = EngineContext::workspace_name(&area.id, &self.id, engine.map_id());
            let workspace = match services.dispatch.open_workspace(&name).await {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!(workspace = %name, error = %e, "could not open workspace");
                    report.unit_failures += 1;
                    continue;
                }
            };

            let ctx = EngineContext::new(
                services.clone(),
                area.clone(),
                &self.id,
                engine.map_id(),
                workspace,
                config.clone(),
                now,
            );
            contexts.push((engine.clone(), ctx));
        }
        contexts
    }

    async fn advance_records(
        &self,
        services: &Arc<EngineServices>,
        area: &Area,
        contexts: &[(Arc<dyn MapEngine>, EngineContext)],
        report: &mut PluginReport,
    ) {
        let records = match services.ledger.active_records(&area.id, &self.id).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(area = %area.id, plugin = %self.id, error = %e, "could not list active records");
                report.unit_failures += 1;
                return;
            }
        };

        for mut record in records {
            let Some((engine, ctx)) = contexts.iter().find(|(e, _)| e.map_id() == record.map_id) else {
                tracing::warn!(job_id = %record.id, map = %record.map_id, "no engine for active record");
                continue;
            };
            match engine.handle_task(ctx, &mut record).await {
                Ok(TaskOutcome::Completed) => report.completed += 1,
                Ok(TaskOutcome::Failed(_)) => report.failed_tasks += 1,
                Ok(TaskOutcome::Pending | TaskOutcome::AlreadyFinal) => {}
                Err(e) => {
                    tracing::warn!(job_id = %record.id, error = %e, "task handling failed");
                    report.unit_failures += 1;
                }
            }
        }
    }
}

/// Builds plugins from the catalog, the engine registry and loaded map
/// configurations.
pub struct PluginFactory {
    catalog: Catalog,
    registry: EngineRegistry,
    configs: HashMap<String, PluginMapConfigs>,
}

impl PluginFactory {
    pub fn new(catalog: Catalog, configs: HashMap<String, PluginMapConfigs>) -> Self {
        let registry = EngineRegistry::from_catalog(&catalog);
        Self {
            catalog,
            registry,
            configs,
        }
    }

    /// Load the map configuration file of every catalog plugin.
    ///
    /// A file that fails to load leaves its plugin without configuration.
    pub fn from_store(catalog: Catalog, store: &MapConfigStore) -> Self {
        let configs = catalog
            .plugins
            .iter()
            .map(|plugin| {
                let configs = store.load(&plugin.id).unwrap_or_else(|e| {
                    tracing::warn!(plugin = %plugin.id, error = %e, "map configuration not loaded");
                    PluginMapConfigs::new()
                });
                (plugin.id.clone(), configs)
            })
            .collect();
        Self::new(catalog, configs)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn build(&self, plugin_id: &str) -> Option<Plugin> {
        let entry = self.catalog.plugin(plugin_id)?;
        let configs = self.configs.get(plugin_id);

        let engines = entry
            .maps
            .iter()
            .filter_map(|map_id| {
                let engine = self.registry.engine(map_id)?;
                let config = configs.and_then(|c| c.get(map_id)).cloned();
                Some((engine, config))
            })
            .collect();

        Some(Plugin {
            id: entry.id.clone(),
            engines,
        })
    }
}
