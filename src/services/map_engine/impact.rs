//! Population exposure against other maps' daily outputs.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{TaskPayload, TaskRecord};
use crate::services::job_ledger::DedupPolicy;
use crate::services::map_engine::{payload_f64, require_payload, EngineContext, MapEngine};

pub const POPULATION_WIDGET: &str = "population_affected";

pub struct ImpactEngine {
    map_id: String,
}

impl ImpactEngine {
    pub fn new(map_id: impl Into<String>) -> Self {
        Self { map_id: map_id.into() }
    }
}

#[async_trait]
impl MapEngine for ImpactEngine {
    fn map_id(&self) -> &str {
        &self.map_id
    }

    async fn update_new_maps(&self, ctx: &EngineContext) -> DomainResult<()> {
        let today = ctx.today().to_string();
        for target in &ctx.config.target_maps {
            let Some(layer) = ctx
                .services
                .publication
                .layer_for(&ctx.area.id, target, &today)
                .await?
            else {
                continue;
            };

            let mut params = Map::new();
            params.insert("REFERENCE_DATE".to_string(), Value::String(today.clone()));
            params.insert("TARGET_LAYER".to_string(), Value::String(layer.id));
            ctx.submit_once(
                TaskPayload::TargetMap { map: target.clone() },
                Some(ctx.today()),
                params,
                DedupPolicy::ActiveOrDone,
            )
            .await?;
        }
        Ok(())
    }

    async fn on_done(&self, ctx: &EngineContext, record: &TaskRecord) -> DomainResult<()> {
        let TaskPayload::TargetMap { map: target } = &record.payload else {
            return Err(DomainError::MalformedResult {
                job_id: record.id.clone(),
                reason: "impact record without target map".to_string(),
            });
        };
        let payload = require_payload(ctx, record).await?;
        let affected = payload_f64(&payload, "affected_population", &record.id)?;

        ctx.services
            .widgets
            .merge_numeric(
                POPULATION_WIDGET,
                &record.area_id,
                &record.reference_date,
                target,
                &record.id,
                affected,
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Area, Layer, MapConfig};
    use crate::services::map_engine::testing::{at, Harness};
    use serde_json::json;

    #[tokio::test]
    async fn test_one_job_per_published_target_and_widget_sums() {
        let h = Harness::new().await;
        let engine = ImpactEngine::new("impact");
        let area = Area::new("A1", "Area one").with_plugin("impact");
        let config = MapConfig::new("exposure").with_target_maps(&["sar_flood", "active_fire", "lst"]);
        let ctx = h
            .context(&area, "impact", "impact", config, at(2024, 5, 8, 10))
            .await;

        for (id, map) in [("flood_layer", "sar_flood"), ("fire_layer", "active_fire")] {
            let layer = Layer::new(id, map, "A1", "x").with_reference_date("2024-05-08");
            h.repos.layers.insert(&layer).await.unwrap();
        }

        engine.update_new_maps(&ctx).await.unwrap();
        engine.update_new_maps(&ctx).await.unwrap();
        let records = h.records(&ctx).await;
        assert_eq!(records.len(), 2);

        h.backend.set_payload(&records[0].id, json!({"affected_population": 1200})).await;
        h.backend.set_payload(&records[1].id, json!({"affected_population": 300})).await;
        h.complete_all(&engine, &ctx).await;

        let widgets = h.repos.widgets.list_by_area("A1").await.unwrap();
        assert_eq!(widgets.len(), 1);
        assert_eq!(widgets[0].kind, POPULATION_WIDGET);
        assert!((widgets[0].value - 1500.0).abs() < f64::EPSILON);
    }
}
