//! Per-cycle context handed to every map engine call.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Area, MapConfig, TaskPayload, TaskRecord};
use crate::domain::ports::{
    AreaRepository, ComputeBackend, EventRepository, LayerPublisher, LayerRepository, Notifier,
    TaskRecordFilter, TaskRecordRepository, WidgetRepository,
};
use crate::services::dispatch_client::DispatchClient;
use crate::services::event_service::EventService;
use crate::services::job_ledger::{DedupPolicy, JobLedger};
use crate::services::publication::PublicationService;
use crate::services::widget_service::WidgetService;

/// Entity store handles, one per entity kind.
#[derive(Clone)]
pub struct Repositories {
    pub tasks: Arc<dyn TaskRecordRepository>,
    pub areas: Arc<dyn AreaRepository>,
    pub layers: Arc<dyn LayerRepository>,
    pub events: Arc<dyn EventRepository>,
    pub widgets: Arc<dyn WidgetRepository>,
}

/// Collaborators shared by every engine for the lifetime of the process.
pub struct EngineServices {
    pub ledger: JobLedger,
    pub dispatch: Arc<DispatchClient>,
    pub publication: PublicationService,
    pub widgets: WidgetService,
    pub events: EventService,
    pub areas: Arc<dyn AreaRepository>,
}

impl EngineServices {
    pub fn new(
        repos: Repositories,
        backend: Arc<dyn ComputeBackend>,
        publisher: Arc<dyn LayerPublisher>,
        notifier: Arc<dyn Notifier>,
        publish_workspace: &str,
    ) -> Self {
        let dispatch = Arc::new(DispatchClient::new(backend));
        Self {
            ledger: JobLedger::new(repos.tasks),
            publication: PublicationService::new(dispatch.clone(), publisher, repos.layers, publish_workspace),
            dispatch,
            widgets: WidgetService::new(repos.widgets),
            events: EventService::new(repos.events, notifier),
            areas: repos.areas,
        }
    }
}

/// Result of an idempotent submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted(String),
    /// An existing record (by job id) already covers this unit of work.
    Skipped(String),
}

/// Scope of one map engine within one plugin run for one area.
pub struct EngineContext {
    pub services: Arc<EngineServices>,
    pub area: Area,
    pub plugin_id: String,
    pub map_id: String,
    pub workspace_id: String,
    pub config: MapConfig,
    pub now: DateTime<Utc>,
    submitted: AtomicUsize,
    skipped: AtomicUsize,
}

impl EngineContext {
    pub fn new(
        services: Arc<EngineServices>,
        area: Area,
        plugin_id: impl Into<String>,
        map_id: impl Into<String>,
        workspace_id: impl Into<String>,
        config: MapConfig,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            services,
            area,
            plugin_id: plugin_id.into(),
            map_id: map_id.into(),
            workspace_id: workspace_id.into(),
            config,
            now,
            submitted: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
        }
    }

    /// Workspace name for an (area, plugin, map) triple.
    pub fn workspace_name(area_id: &str, plugin_id: &str, map_id: &str) -> String {
        format!("{area_id}|{plugin_id}|{map_id}")
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    pub fn submitted(&self) -> usize {
        self.submitted.load(Ordering::Relaxed)
    }

    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::Relaxed)
    }

    /// All records this engine ever created for the area.
    pub async fn history(&self) -> DomainResult<Vec<TaskRecord>> {
        self.services
            .ledger
            .history(
                TaskRecordFilter::for_area(&self.area.id)
                    .plugin(&self.plugin_id)
                    .map(&self.map_id),
            )
            .await
    }

    /// Submit one unit of work unless the ledger already holds a record
    /// that blocks it under `policy`.
    ///
    /// `params` are merged over the map's base parameters and snapshotted on
    /// the new record.
    pub async fn submit_once(
        &self,
        payload: TaskPayload,
        reference_date: Option<NaiveDate>,
        params: Map<String, Value>,
        policy: DedupPolicy,
    ) -> DomainResult<SubmitOutcome> {
        let reference = reference_date.map(|d| d.to_string()).unwrap_or_default();
        let probe = TaskRecord::new(
            "",
            &self.area.id,
            &self.map_id,
            &self.plugin_id,
            &self.workspace_id,
            &self.config.processor,
        )
        .with_reference_date(reference)
        .with_payload(payload)
        .with_started_at(self.now);

        if let Some(existing) = self.services.ledger.find_blocking(&probe, policy).await? {
            tracing::debug!(
                area = %self.area.id,
                map = %self.map_id,
                payload = %probe.payload.discriminator(),
                job_id = %existing.id,
                status = existing.status.as_str(),
                "submission skipped, unit already covered"
            );
            self.skipped.fetch_add(1, Ordering::Relaxed);
            return Ok(SubmitOutcome::Skipped(existing.id));
        }

        let mut merged = self.config.base_params();
        merged.extend(params);

        let job_id = self
            .services
            .dispatch
            .submit(&self.workspace_id, &self.config.processor, &merged)
            .await?;
        let record = TaskRecord {
            id: job_id.clone(),
            ..probe
        }
        .with_params(merged);

        match self.services.ledger.record_submission(&record).await {
            Ok(()) => {
                self.submitted.fetch_add(1, Ordering::Relaxed);
                Ok(SubmitOutcome::Submitted(job_id))
            }
            Err(DomainError::ConcurrencyConflict { id, .. }) => {
                tracing::warn!(job_id = %job_id, dedup_key = %id, "lost submission race, job left untracked");
                self.skipped.fetch_add(1, Ordering::Relaxed);
                Ok(SubmitOutcome::Skipped(job_id))
            }
            Err(e) => Err(e),
        }
    }

    /// Widen the area's archive window to cover `dates`.
    pub async fn record_archive_bounds(&self, dates: &[NaiveDate]) -> DomainResult<()> {
        let (Some(start), Some(end)) = (dates.iter().min(), dates.iter().max()) else {
            return Ok(());
        };

        let mut area = self
            .services
            .areas
            .get(&self.area.id)
            .await?
            .ok_or_else(|| DomainError::AreaNotFound(self.area.id.clone()))?;

        if area.widen_archive_window(*start, *end) {
            self.services
                .areas
                .update_archive_window(&area.id, area.archive_start_date, area.archive_end_date)
                .await?;
            tracing::info!(
                area = %area.id,
                start = ?area.archive_start_date,
                end = ?area.archive_end_date,
                "archive window widened"
            );
        }
        Ok(())
    }
}

/// `{key: "YYYY-MM-DD"}` entries for request parameters.
pub fn date_params(entries: &[(&str, NaiveDate)]) -> Map<String, Value> {
    entries
        .iter()
        .map(|(k, d)| ((*k).to_string(), Value::String(d.to_string())))
        .collect()
}
