//! Active fire hotspots, computed in fixed hour buckets through the day.

use async_trait::async_trait;
use chrono::Timelike;
use serde_json::{Map, Value};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{TaskPayload, TaskRecord};
use crate::services::job_ledger::DedupPolicy;
use crate::services::map_engine::{payload_f64, require_payload, EngineContext, MapEngine};

const DEFAULT_BUCKET_HOURS: u32 = 6;
pub const HOTSPOT_WIDGET: &str = "fire_hotspots";

pub struct ActiveFireEngine {
    map_id: String,
}

impl ActiveFireEngine {
    pub fn new(map_id: impl Into<String>) -> Self {
        Self { map_id: map_id.into() }
    }

    fn bucket_hours(ctx: &EngineContext) -> u32 {
        ctx.config.bucket_hours.unwrap_or(DEFAULT_BUCKET_HOURS).clamp(1, 24)
    }

    /// Start hour of the bucket containing `hour`.
    pub fn bucket_start(hour: u32, bucket_hours: u32) -> u32 {
        (hour / bucket_hours) * bucket_hours
    }

    pub fn output_name(area_id: &str, date: &str, hour_label: &str) -> String {
        format!("{area_id}_fire_{date}_{hour_label}.tif")
    }
}

#[async_trait]
impl MapEngine for ActiveFireEngine {
    fn map_id(&self) -> &str {
        &self.map_id
    }

    async fn update_new_maps(&self, ctx: &EngineContext) -> DomainResult<()> {
        let today = ctx.today();
        let bucket = Self::bucket_hours(ctx);
        let hour = Self::bucket_start(ctx.now.hour(), bucket);

        let mut params = Map::new();
        params.insert("REFERENCE_DATE".to_string(), Value::String(today.to_string()));
        params.insert("START_HOUR".to_string(), Value::from(hour));
        params.insert("END_HOUR".to_string(), Value::from((hour + bucket).min(24)));

        ctx.submit_once(TaskPayload::HourBucket { hour }, Some(today), params, DedupPolicy::ActiveOrDone)
            .await?;
        Ok(())
    }

    async fn on_done(&self, ctx: &EngineContext, record: &TaskRecord) -> DomainResult<()> {
        let Some(hour_label) = record.payload.hour_label() else {
            return Err(DomainError::MalformedResult {
                job_id: record.id.clone(),
                reason: "fire record without hour bucket".to_string(),
            });
        };
        let date = record.reference_date.clone();

        let output = Self::output_name(&record.area_id, &date, &hour_label);
        let files = ctx.services.dispatch.list_files(&record.workspace_id).await?;
        if files.contains(&output) {
            ctx.services
                .publication
                .publish_output(record, &output, &self.map_id, &date)
                .await?;
        } else {
            tracing::debug!(job_id = %record.id, file = %output, "no hotspot raster in workspace");
        }

        let payload = require_payload(ctx, record).await?;
        let hotspots = payload_f64(&payload, "hotspots", &record.id)?;
        ctx.services
            .widgets
            .merge_numeric(
                HOTSPOT_WIDGET,
                &record.area_id,
                &date,
                &format!("{}@{hour_label}", self.map_id),
                &record.id,
                hotspots,
            )
            .await?;
        Ok(())
    }
}
