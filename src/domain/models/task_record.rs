//! Task record domain model.
//!
//! A task record is the persisted state of one submitted remote job. It is
//! the unit of idempotency (no two active records share a dedup tuple) and
//! of recovery (active records are re-polled on every cycle). Records are
//! never deleted.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lifecycle status of a remote job as seen by the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Stored locally, not yet polled.
    #[default]
    Created,
    /// The backend reports the job as not finished.
    Running,
    /// The backend reports success and outputs have been consumed.
    Done,
    /// The backend reports failure.
    Error,
    /// The job was stopped on the backend.
    Stopped,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Done => "done",
            Self::Error => "error",
            Self::Stopped => "stopped",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "created" => Some(Self::Created),
            "running" => Some(Self::Running),
            "done" => Some(Self::Done),
            "error" => Some(Self::Error),
            "stopped" => Some(Self::Stopped),
            _ => None,
        }
    }

    /// Map a status string reported by the compute backend.
    ///
    /// Anything that is not a recognised terminal value (`WAITING`, `READY`,
    /// `CREATED`, unknown strings) counts as still running.
    pub fn from_remote(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "DONE" => Self::Done,
            "ERROR" => Self::Error,
            "STOPPED" => Self::Stopped,
            _ => Self::Running,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error | Self::Stopped)
    }

    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// ERROR and STOPPED are terminal failures.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Error | Self::Stopped)
    }
}

/// Discriminates several job kinds that coexist under one map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskPayload {
    /// A single, not day-scoped job.
    #[default]
    Plain,
    /// The recurring job for one reference day.
    Daily,
    /// The rolling `[today - look_back, today]` archive job.
    ShortArchive,
    /// One day of the long backward backfill.
    LongArchive,
    /// One hour bucket of a sub-daily product.
    HourBucket { hour: u32 },
    /// A job computing against another map's output.
    TargetMap { map: String },
}

impl TaskPayload {
    /// Stable text used inside dedup keys.
    pub fn discriminator(&self) -> String {
        match self {
            Self::Plain => "plain".to_string(),
            Self::Daily => "daily".to_string(),
            Self::ShortArchive => "short_archive".to_string(),
            Self::LongArchive => "long_archive".to_string(),
            Self::HourBucket { hour } => format!("hour:{hour:02}"),
            Self::TargetMap { map } => format!("target:{map}"),
        }
    }

    /// Hour bucket label, e.g. `"06"`.
    pub fn hour_label(&self) -> Option<String> {
        match self {
            Self::HourBucket { hour } => Some(format!("{hour:02}")),
            _ => None,
        }
    }
}

/// Persisted state of one submitted remote job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Remote job id.
    pub id: String,
    pub area_id: String,
    pub map_id: String,
    pub plugin_id: String,
    pub workspace_id: String,
    pub started_at: DateTime<Utc>,
    pub processor: String,
    /// Logical day the job computes for; empty when not day-scoped.
    pub reference_date: String,
    /// Snapshot of submitted parameters.
    pub input_params: Map<String, Value>,
    pub payload: TaskPayload,
    pub status: TaskStatus,
}

impl TaskRecord {
    pub fn new(
        id: impl Into<String>,
        area_id: impl Into<String>,
        map_id: impl Into<String>,
        plugin_id: impl Into<String>,
        workspace_id: impl Into<String>,
        processor: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            area_id: area_id.into(),
            map_id: map_id.into(),
            plugin_id: plugin_id.into(),
            workspace_id: workspace_id.into(),
            started_at: Utc::now(),
            processor: processor.into(),
            reference_date: String::new(),
            input_params: Map::new(),
            payload: TaskPayload::Plain,
            status: TaskStatus::Created,
        }
    }

    pub fn with_reference_date(mut self, date: impl Into<String>) -> Self {
        self.reference_date = date.into();
        self
    }

    pub fn with_payload(mut self, payload: TaskPayload) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.input_params = params;
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_started_at(mut self, at: DateTime<Utc>) -> Self {
        self.started_at = at;
        self
    }

    /// Reference date parsed as a calendar day, if day-scoped.
    pub fn reference_day(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.reference_date, "%Y-%m-%d").ok()
    }

    /// Read a date-valued input parameter (`YYYY-MM-DD`).
    pub fn param_date(&self, key: &str) -> Option<NaiveDate> {
        self.input_params
            .get(key)
            .and_then(Value::as_str)
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
    }

    /// Idempotency tuple rendered as a single key.
    pub fn dedup_key(&self) -> String {
        dedup_key(
            &self.area_id,
            &self.map_id,
            &self.plugin_id,
            &self.workspace_id,
            &self.processor,
            &self.reference_date,
            &self.payload,
        )
    }
}

/// Build the key shared by all records of one logical unit of work.
pub fn dedup_key(
    area_id: &str,
    map_id: &str,
    plugin_id: &str,
    workspace_id: &str,
    processor: &str,
    reference_date: &str,
    payload: &TaskPayload,
) -> String {
    format!(
        "{area_id}|{map_id}|{plugin_id}|{workspace_id}|{processor}|{reference_date}|{}",
        payload.discriminator()
    )
}
