//! Building footprints: a single job per area, outputs listed in the result.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{TaskPayload, TaskRecord};
use crate::services::job_ledger::DedupPolicy;
use crate::services::map_engine::{require_payload, EngineContext, MapEngine};

pub struct BuildingEngine {
    map_id: String,
}

impl BuildingEngine {
    pub fn new(map_id: impl Into<String>) -> Self {
        Self { map_id: map_id.into() }
    }

    fn listed_outputs(record: &TaskRecord, payload: &Value) -> DomainResult<Vec<String>> {
        let outputs = payload
            .get("outputs")
            .and_then(Value::as_array)
            .ok_or_else(|| DomainError::MalformedResult {
                job_id: record.id.clone(),
                reason: "missing array 'outputs'".to_string(),
            })?;
        Ok(outputs
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect())
    }
}

#[async_trait]
impl MapEngine for BuildingEngine {
    fn map_id(&self) -> &str {
        &self.map_id
    }

    async fn trigger_new_area_maps(&self, ctx: &EngineContext) -> DomainResult<()> {
        let mut params = Map::new();
        params.insert("BBOX".to_string(), Value::String(ctx.area.bbox.to_param()));
        ctx.submit_once(TaskPayload::Plain, None, params, DedupPolicy::ActiveOrDone)
            .await?;
        Ok(())
    }

    async fn on_done(&self, ctx: &EngineContext, record: &TaskRecord) -> DomainResult<()> {
        let payload = require_payload(ctx, record).await?;
        let outputs = Self::listed_outputs(record, &payload)?;
        let files = ctx.services.dispatch.list_files(&record.workspace_id).await?;

        for output in outputs {
            if !files.contains(&output) {
                tracing::warn!(job_id = %record.id, file = %output, "listed output not in workspace");
                continue;
            }
            ctx.services
                .publication
                .publish_output(record, &output, &self.map_id, &record.reference_date)
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Area, BoundingBox, MapConfig};
    use crate::services::map_engine::testing::{at, Harness};
    use serde_json::json;

    #[tokio::test]
    async fn test_single_job_and_listed_outputs_published() {
        let h = Harness::new().await;
        let engine = BuildingEngine::new("building");
        let area = Area::new("A1", "Area one")
            .with_plugin("building")
            .with_bbox(BoundingBox::new(45.0, 9.0, 44.0, 10.0));
        let ctx = h
            .context(&area, "building", "building", MapConfig::new("footprints"), at(2024, 5, 8, 10))
            .await;

        engine.trigger_new_area_maps(&ctx).await.unwrap();
        engine.trigger_new_area_maps(&ctx).await.unwrap();
        let records = h.records(&ctx).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].input_params["BBOX"], area.bbox.to_param());

        h.backend.add_file(&ctx.workspace_id, "A1_buildings.zip").await;
        h.backend
            .set_payload(&records[0].id, json!({"outputs": ["A1_buildings.zip", "A1_missing.tif"]}))
            .await;
        h.complete_all(&engine, &ctx).await;

        let layers = h.repos.layers.list_by_area("A1", Some("building")).await.unwrap();
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].id, "A1_buildings");

        // done blocks a second footprint run
        engine.trigger_new_area_maps(&ctx).await.unwrap();
        assert_eq!(h.records(&ctx).await.len(), 1);
    }
}
