//! Job ledger: the idempotency and recovery view over task records.

use std::sync::Arc;

use crate::domain::errors::DomainResult;
use crate::domain::models::{TaskRecord, TaskStatus};
use crate::domain::ports::{TaskRecordFilter, TaskRecordRepository};

/// Which existing records block a new submission of the same unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupPolicy {
    /// Only CREATED or RUNNING records block.
    ActiveOnly,
    /// Active records and completed (DONE) records block; a failed record
    /// lets the unit be resubmitted on a later cycle.
    ActiveOrDone,
}

impl DedupPolicy {
    pub fn blocks(&self, status: TaskStatus) -> bool {
        match self {
            Self::ActiveOnly => status.is_active(),
            Self::ActiveOrDone => status.is_active() || status == TaskStatus::Done,
        }
    }
}

pub struct JobLedger {
    repo: Arc<dyn TaskRecordRepository>,
}

impl JobLedger {
    pub fn new(repo: Arc<dyn TaskRecordRepository>) -> Self {
        Self { repo }
    }

    /// Find a record that blocks submitting `probe` again.
    ///
    /// A record matches when it shares the area, map, plugin, workspace,
    /// processor, reference date and payload of the probe.
    pub async fn find_blocking(&self, probe: &TaskRecord, policy: DedupPolicy) -> DomainResult<Option<TaskRecord>> {
        let filter = TaskRecordFilter::for_area(&probe.area_id)
            .map(&probe.map_id)
            .plugin(&probe.plugin_id)
            .workspace(&probe.workspace_id)
            .processor(&probe.processor)
            .reference_date(&probe.reference_date);

        let existing = self.repo.list(filter).await?;
        Ok(existing
            .into_iter()
            .find(|r| r.payload == probe.payload && policy.blocks(r.status)))
    }

    pub async fn record_submission(&self, record: &TaskRecord) -> DomainResult<()> {
        self.repo.insert(record).await?;
        tracing::info!(
            job_id = %record.id,
            area = %record.area_id,
            map = %record.map_id,
            payload = %record.payload.discriminator(),
            reference_date = %record.reference_date,
            "task record created"
        );
        Ok(())
    }

    /// Persist a status transition and mirror it on `record`.
    pub async fn set_status(&self, record: &mut TaskRecord, status: TaskStatus) -> DomainResult<()> {
        if record.status == status {
            return Ok(());
        }
        self.repo.update_status(&record.id, status).await?;
        tracing::debug!(job_id = %record.id, from = record.status.as_str(), to = status.as_str(), "task status changed");
        record.status = status;
        Ok(())
    }

    /// Non-terminal records of one plugin on one area, oldest first.
    pub async fn active_records(&self, area_id: &str, plugin_id: &str) -> DomainResult<Vec<TaskRecord>> {
        self.repo
            .list(TaskRecordFilter::for_area(area_id).plugin(plugin_id).active())
            .await
    }

    pub async fn history(&self, filter: TaskRecordFilter) -> DomainResult<Vec<TaskRecord>> {
        self.repo.list(filter).await
    }

    pub async fn get(&self, job_id: &str) -> DomainResult<Option<TaskRecord>> {
        self.repo.get(job_id).await
    }
}
