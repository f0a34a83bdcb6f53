//! Compile-time registry from catalog engine tags to map engines.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::models::{Catalog, EngineKind, MapEntry};
use crate::services::map_engine::active_fire::ActiveFireEngine;
use crate::services::map_engine::building::BuildingEngine;
use crate::services::map_engine::dated::DatedProductEngine;
use crate::services::map_engine::flood_event::FloodEventEngine;
use crate::services::map_engine::impact::ImpactEngine;
use crate::services::map_engine::pollutant::{PollutantCompositeEngine, PollutantSpeciesEngine};
use crate::services::map_engine::MapEngine;

/// One engine instance per catalog map, keyed by map id.
#[derive(Clone, Default)]
pub struct EngineRegistry {
    engines: HashMap<String, Arc<dyn MapEngine>>,
}

impl EngineRegistry {
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let engines = catalog
            .maps
            .iter()
            .map(|entry| (entry.id.clone(), build_engine(entry, catalog)))
            .collect();
        Self { engines }
    }

    pub fn engine(&self, map_id: &str) -> Option<Arc<dyn MapEngine>> {
        self.engines.get(map_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}

fn build_engine(entry: &MapEntry, catalog: &Catalog) -> Arc<dyn MapEngine> {
    let id = entry.id.clone();
    match entry.engine {
        EngineKind::SarFlood => Arc::new(DatedProductEngine::sar_flood(id)),
        EngineKind::LandSurfaceTemperature => Arc::new(DatedProductEngine::land_surface_temperature(id)),
        EngineKind::FloodEvent => Arc::new(FloodEventEngine::new(id)),
        EngineKind::ActiveFire => Arc::new(ActiveFireEngine::new(id)),
        EngineKind::PollutantComposite => {
            let species = catalog
                .maps
                .iter()
                .filter(|m| m.owner.as_deref() == Some(entry.id.as_str()))
                .map(|m| m.id.clone())
                .collect();
            Arc::new(PollutantCompositeEngine::new(id, species))
        }
        EngineKind::PollutantSpecies => {
            let owner = entry.owner.clone().unwrap_or_else(|| id.clone());
            Arc::new(PollutantSpeciesEngine::new(id, owner))
        }
        EngineKind::Building => Arc::new(BuildingEngine::new(id)),
        EngineKind::Impact => Arc::new(ImpactEngine::new(id)),
    }
}
