//! Air quality: one composite job per day fans out to every species map.
//!
//! The species engines are inert. They exist so the catalog can list each
//! species as its own map while the composite engine owns all the jobs.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::errors::DomainResult;
use crate::domain::models::{TaskPayload, TaskRecord};
use crate::services::job_ledger::DedupPolicy;
use crate::services::map_engine::{EngineContext, MapEngine};

pub struct PollutantCompositeEngine {
    map_id: String,
    species: Vec<String>,
}

impl PollutantCompositeEngine {
    pub fn new(map_id: impl Into<String>, species: Vec<String>) -> Self {
        Self {
            map_id: map_id.into(),
            species,
        }
    }

    pub fn species(&self) -> &[String] {
        &self.species
    }

    pub fn output_name(area_id: &str, species: &str, date: &str) -> String {
        format!("{area_id}_{species}_{date}.tif")
    }
}

#[async_trait]
impl MapEngine for PollutantCompositeEngine {
    fn map_id(&self) -> &str {
        &self.map_id
    }

    async fn update_new_maps(&self, ctx: &EngineContext) -> DomainResult<()> {
        if self.species.is_empty() {
            tracing::warn!(map = %self.map_id, "composite owns no species maps");
            return Ok(());
        }
        let today = ctx.today();

        let mut params = Map::new();
        params.insert("REFERENCE_DATE".to_string(), Value::String(today.to_string()));
        params.insert("SPECIES".to_string(), Value::String(self.species.join(",")));
        ctx.submit_once(TaskPayload::Daily, Some(today), params, DedupPolicy::ActiveOrDone)
            .await?;
        Ok(())
    }

    async fn on_done(&self, ctx: &EngineContext, record: &TaskRecord) -> DomainResult<()> {
        let files = ctx.services.dispatch.list_files(&record.workspace_id).await?;
        let date = &record.reference_date;

        let mut last_error = None;
        for species in &self.species {
            let output = Self::output_name(&record.area_id, species, date);
            if !files.contains(&output) {
                tracing::debug!(job_id = %record.id, species = %species, "species output missing");
                continue;
            }
            if let Err(e) = ctx
                .services
                .publication
                .publish_output(record, &output, species, date)
                .await
            {
                tracing::warn!(job_id = %record.id, species = %species, error = %e, "failed to publish species layer");
                last_error = Some(e);
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Species map whose jobs are owned by the composite.
pub struct PollutantSpeciesEngine {
    map_id: String,
    owner: String,
}

impl PollutantSpeciesEngine {
    pub fn new(map_id: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            map_id: map_id.into(),
            owner: owner.into(),
        }
    }
}

#[async_trait]
impl MapEngine for PollutantSpeciesEngine {
    fn map_id(&self) -> &str {
        &self.map_id
    }

    fn owning_map_id(&self) -> &str {
        &self.owner
    }

    async fn on_done(&self, _ctx: &EngineContext, _record: &TaskRecord) -> DomainResult<()> {
        Ok(())
    }
}
