//! Static plugin and map catalog.
//!
//! The catalog is immutable at runtime. Each map names the engine
//! implementation that drives it; the engine registry turns that tag into a
//! concrete map engine.

use serde::{Deserialize, Serialize};

/// Implementation tag of a map engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    SarFlood,
    LandSurfaceTemperature,
    FloodEvent,
    ActiveFire,
    PollutantComposite,
    PollutantSpecies,
    Building,
    Impact,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SarFlood => "sar_flood",
            Self::LandSurfaceTemperature => "land_surface_temperature",
            Self::FloodEvent => "flood_event",
            Self::ActiveFire => "active_fire",
            Self::PollutantComposite => "pollutant_composite",
            Self::PollutantSpecies => "pollutant_species",
            Self::Building => "building",
            Self::Impact => "impact",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub engine: EngineKind,
    /// Map whose engine owns the jobs of this one (fan-in pass-through).
    #[serde(default)]
    pub owner: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Ordered map identifiers this plugin drives.
    pub maps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub plugins: Vec<PluginEntry>,
    pub maps: Vec<MapEntry>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn map(id: &str, name: &str, engine: EngineKind) -> MapEntry {
    MapEntry {
        id: id.to_string(),
        name: name.to_string(),
        description: String::new(),
        engine,
        owner: None,
    }
}

fn species(id: &str, name: &str) -> MapEntry {
    MapEntry {
        owner: Some("pollutant".to_string()),
        ..map(id, name, EngineKind::PollutantSpecies)
    }
}

fn plugin(id: &str, name: &str, maps: &[&str]) -> PluginEntry {
    PluginEntry {
        id: id.to_string(),
        name: name.to_string(),
        description: String::new(),
        maps: maps.iter().map(|m| (*m).to_string()).collect(),
    }
}

impl Catalog {
    /// The catalog shipped with the binary.
    pub fn builtin() -> Self {
        Self {
            plugins: vec![
                plugin("flood", "Flood monitoring", &["sar_flood", "flood_event"]),
                plugin("fire", "Active fires", &["active_fire"]),
                plugin(
                    "pollutant",
                    "Air quality",
                    &["pollutant", "no2", "so2", "o3", "co", "pm25", "pm10"],
                ),
                plugin("building", "Building footprints", &["building"]),
                plugin("impact", "Exposure and impacts", &["impact"]),
                plugin("temperature", "Land surface temperature", &["lst"]),
            ],
            maps: vec![
                map("sar_flood", "SAR flood extent", EngineKind::SarFlood),
                map("flood_event", "Flood event finder", EngineKind::FloodEvent),
                map("active_fire", "Active fire hotspots", EngineKind::ActiveFire),
                map("pollutant", "Pollutant composite", EngineKind::PollutantComposite),
                species("no2", "Nitrogen dioxide"),
                species("so2", "Sulphur dioxide"),
                species("o3", "Ozone"),
                species("co", "Carbon monoxide"),
                species("pm25", "Particulate matter 2.5"),
                species("pm10", "Particulate matter 10"),
                map("building", "Building footprints", EngineKind::Building),
                map("impact", "Population exposure", EngineKind::Impact),
                map("lst", "Land surface temperature", EngineKind::LandSurfaceTemperature),
            ],
        }
    }

    pub fn plugin(&self, id: &str) -> Option<&PluginEntry> {
        self.plugins.iter().find(|p| p.id == id)
    }

    pub fn map(&self, id: &str) -> Option<&MapEntry> {
        self.maps.iter().find(|m| m.id == id)
    }

    /// Check that every plugin references known maps and every owner exists.
    pub fn validate(&self) -> Result<(), String> {
        for plugin in &self.plugins {
            if plugin.maps.is_empty() {
                return Err(format!("plugin '{}' has no maps", plugin.id));
            }
            for map_id in &plugin.maps {
                if self.map(map_id).is_none() {
                    return Err(format!("plugin '{}' references unknown map '{map_id}'", plugin.id));
                }
            }
        }
        for entry in &self.maps {
            if let Some(owner) = &entry.owner {
                if self.map(owner).is_none() {
                    return Err(format!("map '{}' is owned by unknown map '{owner}'", entry.id));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = Catalog::builtin();
        assert!(catalog.validate().is_ok());
        assert_eq!(catalog.plugin("pollutant").unwrap().maps.len(), 7);
        assert_eq!(catalog.map("no2").unwrap().owner.as_deref(), Some("pollutant"));
    }

    #[test]
    fn test_unknown_map_reference_rejected() {
        let mut catalog = Catalog::builtin();
        catalog.plugins[0].maps.push("nope".to_string());
        let err = catalog.validate().unwrap_err();
        assert!(err.contains("unknown map 'nope'"));
    }

    #[test]
    fn test_engine_kind_deserializes_from_tag() {
        let entry: MapEntry = serde_yaml::from_str("id: x\nname: X\nengine: active_fire\n").unwrap();
        assert_eq!(entry.engine, EngineKind::ActiveFire);
        assert!(entry.owner.is_none());
    }
}
