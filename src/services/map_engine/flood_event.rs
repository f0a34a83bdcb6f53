//! Flood event finder.
//!
//! Runs once a day after the day's flood extent layer is published and turns
//! the finder's verdict into the area's singleton open flood event.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{EventType, TaskPayload, TaskRecord};
use crate::services::event_service::Observation;
use crate::services::job_ledger::DedupPolicy;
use crate::services::map_engine::{payload_f64, require_payload, EngineContext, MapEngine};

const DEFAULT_SOURCE_MAP: &str = "sar_flood";

pub struct FloodEventEngine {
    map_id: String,
}

impl FloodEventEngine {
    pub fn new(map_id: impl Into<String>) -> Self {
        Self { map_id: map_id.into() }
    }

    fn source_map(ctx: &EngineContext) -> &str {
        ctx.config
            .target_maps
            .first()
            .map_or(DEFAULT_SOURCE_MAP, String::as_str)
    }

    fn parse_observation(record: &TaskRecord, payload: &Value) -> DomainResult<Observation> {
        let malformed = |reason: &str| DomainError::MalformedResult {
            job_id: record.id.clone(),
            reason: reason.to_string(),
        };
        let detected = payload
            .get("flooded")
            .and_then(Value::as_bool)
            .ok_or_else(|| malformed("missing boolean 'flooded'"))?;
        let magnitude = payload_f64(payload, "flooded_area_km2", &record.id)?;
        let bbox = payload
            .get("bbox")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("missing string 'bbox'"))?;
        Ok(Observation {
            detected,
            magnitude,
            bbox: bbox.to_string(),
        })
    }
}

#[async_trait]
impl MapEngine for FloodEventEngine {
    fn map_id(&self) -> &str {
        &self.map_id
    }

    async fn update_new_maps(&self, ctx: &EngineContext) -> DomainResult<()> {
        let today = ctx.today();
        let source = Self::source_map(ctx);
        let Some(layer) = ctx
            .services
            .publication
            .layer_for(&ctx.area.id, source, &today.to_string())
            .await?
        else {
            tracing::debug!(area = %ctx.area.id, source, "no source layer yet for today");
            return Ok(());
        };

        let mut params = Map::new();
        params.insert("REFERENCE_DATE".to_string(), Value::String(today.to_string()));
        params.insert("SOURCE_LAYER".to_string(), Value::String(layer.id));
        ctx.submit_once(TaskPayload::Daily, Some(today), params, DedupPolicy::ActiveOrDone)
            .await?;
        Ok(())
    }

    async fn on_done(&self, ctx: &EngineContext, record: &TaskRecord) -> DomainResult<()> {
        let payload = require_payload(ctx, record).await?;
        let observation = Self::parse_observation(record, &payload)?;
        let date = record.reference_day().unwrap_or_else(|| ctx.today());

        let change = ctx
            .services
            .events
            .observe(&record.area_id, EventType::Flood, date, &observation)
            .await?;
        tracing::debug!(job_id = %record.id, ?change, "flood finder result applied");
        Ok(())
    }
}
