//! Cycle orchestrator: every onboarded area, every subscribed plugin.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::Instrument;

use crate::domain::errors::DomainResult;
use crate::services::map_engine::EngineServices;
use crate::services::plugin::{PluginFactory, PluginReport};

/// Totals of one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub areas: usize,
    pub plugins: usize,
    pub submitted: usize,
    pub skipped: usize,
    pub completed: usize,
    pub failed_tasks: usize,
    pub unit_failures: usize,
}

impl CycleReport {
    fn absorb(&mut self, plugin: PluginReport) {
        self.plugins += 1;
        self.submitted += plugin.submitted;
        self.skipped += plugin.skipped;
        self.completed += plugin.completed;
        self.failed_tasks += plugin.failed_tasks;
        self.unit_failures += plugin.unit_failures;
    }
}

pub struct Orchestrator {
    services: Arc<EngineServices>,
    factory: PluginFactory,
}

impl Orchestrator {
    pub fn new(services: Arc<EngineServices>, factory: PluginFactory) -> Self {
        Self { services, factory }
    }

    pub fn services(&self) -> &Arc<EngineServices> {
        &self.services
    }

    /// Run one cycle now. Failures are logged, never returned.
    pub async fn run_cycle(&self) {
        if let Err(e) = self.run_cycle_at(Utc::now()).await {
            tracing::error!(error = %e, "cycle aborted");
        }
    }

    /// Run one cycle as of `now`.
    ///
    /// Only a failure to list areas aborts the cycle; every per-area and
    /// per-plugin failure is counted in the report.
    pub async fn run_cycle_at(&self, now: DateTime<Utc>) -> DomainResult<CycleReport> {
        let areas = self.services.areas.list(true).await?;
        let mut report = CycleReport::default();

        for area in &areas {
            report.areas += 1;
            for plugin_id in &area.plugins {
                let Some(plugin) = self.factory.build(plugin_id) else {
                    tracing::warn!(area = %area.id, plugin = %plugin_id, "area subscribes to unknown plugin");
                    continue;
                };
                let span = tracing::info_span!("plugin", area = %area.id, plugin = %plugin_id);
                let result = plugin.run(&self.services, area, now).instrument(span).await;
                report.absorb(result);
            }
        }

        tracing::info!(
            areas = report.areas,
            plugins = report.plugins,
            submitted = report.submitted,
            skipped = report.skipped,
            completed = report.completed,
            failed_tasks = report.failed_tasks,
            unit_failures = report.unit_failures,
            "cycle finished"
        );
        Ok(report)
    }
}
