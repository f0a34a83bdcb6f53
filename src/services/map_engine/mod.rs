//! Map engines: one state machine per sub-product.
//!
//! Every engine exposes three submission passes and one completion pass:
//!
//! | Pass                          | Purpose                                   |
//! |-------------------------------|-------------------------------------------|
//! | `trigger_new_area_maps`       | short-horizon work for a new area         |
//! | `trigger_new_area_archives`   | long-horizon backfill                     |
//! | `update_new_maps`             | recurring "new work today" pass           |
//! | `handle_task`                 | advance one in-flight task record         |
//!
//! `handle_task` is shared: it polls the backend, records terminal failures,
//! and on DONE runs the engine's [`MapEngine::on_done`] output handling, then
//! always persists DONE so a consumed job is never handled again.

pub mod active_fire;
pub mod archive;
pub mod building;
pub mod context;
pub mod dated;
pub mod flood_event;
pub mod impact;
pub mod pollutant;
pub mod registry;
pub mod scan;
#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{TaskRecord, TaskStatus};

pub use context::{EngineContext, EngineServices, Repositories, SubmitOutcome};
pub use registry::EngineRegistry;

/// What one `handle_task` call did to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Still running remotely.
    Pending,
    /// Remote job ended in ERROR or STOPPED.
    Failed(TaskStatus),
    /// Outputs consumed and DONE persisted.
    Completed,
    /// The record was already terminal.
    AlreadyFinal,
}

#[async_trait]
pub trait MapEngine: Send + Sync {
    fn map_id(&self) -> &str;

    /// Map whose engine submits and owns this map's jobs.
    fn owning_map_id(&self) -> &str {
        self.map_id()
    }

    /// Inert engines defer all work to their owning map.
    fn is_inert(&self) -> bool {
        self.owning_map_id() != self.map_id()
    }

    async fn trigger_new_area_maps(&self, _ctx: &EngineContext) -> DomainResult<()> {
        Ok(())
    }

    async fn trigger_new_area_archives(&self, _ctx: &EngineContext) -> DomainResult<()> {
        Ok(())
    }

    async fn update_new_maps(&self, _ctx: &EngineContext) -> DomainResult<()> {
        Ok(())
    }

    /// Scan and publish the outputs of a job the backend reports DONE.
    async fn on_done(&self, ctx: &EngineContext, record: &TaskRecord) -> DomainResult<()>;

    async fn handle_task(&self, ctx: &EngineContext, record: &mut TaskRecord) -> DomainResult<TaskOutcome> {
        if record.status.is_terminal() {
            return Ok(TaskOutcome::AlreadyFinal);
        }

        let status = ctx.services.dispatch.poll(record).await?;
        match status {
            TaskStatus::Error | TaskStatus::Stopped => {
                ctx.services.ledger.set_status(record, status).await?;
                tracing::warn!(job_id = %record.id, map = %record.map_id, status = status.as_str(), "remote job failed");
                Ok(TaskOutcome::Failed(status))
            }
            TaskStatus::Created | TaskStatus::Running => {
                ctx.services.ledger.set_status(record, TaskStatus::Running).await?;
                Ok(TaskOutcome::Pending)
            }
            TaskStatus::Done => {
                let handled = self.on_done(ctx, record).await;
                ctx.services.ledger.set_status(record, TaskStatus::Done).await?;
                match handled {
                    Ok(()) => {
                        tracing::info!(job_id = %record.id, map = %record.map_id, "task completed");
                        Ok(TaskOutcome::Completed)
                    }
                    Err(e) => {
                        tracing::warn!(job_id = %record.id, map = %record.map_id, error = %e, "output handling failed, task closed");
                        Err(e)
                    }
                }
            }
        }
    }
}

/// Numeric field of a result payload.
pub(crate) fn payload_f64(payload: &Value, key: &str, job_id: &str) -> DomainResult<f64> {
    payload
        .get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| DomainError::MalformedResult {
            job_id: job_id.to_string(),
            reason: format!("missing numeric '{key}'"),
        })
}

/// Result payload of a DONE job; absent payloads are malformed.
pub(crate) async fn require_payload(ctx: &EngineContext, record: &TaskRecord) -> DomainResult<Value> {
    ctx.services
        .dispatch
        .result_payload(&record.id)
        .await?
        .ok_or_else(|| DomainError::MalformedResult {
            job_id: record.id.clone(),
            reason: "no result payload".to_string(),
        })
}
