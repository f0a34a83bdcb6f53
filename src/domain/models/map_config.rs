//! Per-(plugin, map) processing configuration.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Configuration of one map inside a plugin-scoped configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    /// Remote processor name.
    pub processor: String,

    /// Parameter template merged into every submission.
    #[serde(default)]
    pub params: Map<String, Value>,

    /// Rolling archive look-back in days.
    #[serde(default = "default_look_back_days")]
    pub look_back_days: u32,

    /// Lower bound of the long archive backfill; unset disables it.
    #[serde(default)]
    pub archive_start_date: Option<NaiveDate>,

    #[serde(default)]
    pub resolution: Option<String>,

    #[serde(default)]
    pub data_source: Option<String>,

    /// Width of hour buckets for sub-daily products.
    #[serde(default)]
    pub bucket_hours: Option<u32>,

    /// Maps whose outputs this map computes against.
    #[serde(default)]
    pub target_maps: Vec<String>,
}

const fn default_look_back_days() -> u32 {
    7
}

/// Longest accepted rolling look-back, ten years.
pub const MAX_LOOK_BACK_DAYS: u32 = 3650;

impl MapConfig {
    pub fn new(processor: impl Into<String>) -> Self {
        Self {
            processor: processor.into(),
            params: Map::new(),
            look_back_days: default_look_back_days(),
            archive_start_date: None,
            resolution: None,
            data_source: None,
            bucket_hours: None,
            target_maps: Vec::new(),
        }
    }

    pub fn with_look_back_days(mut self, days: u32) -> Self {
        self.look_back_days = days;
        self
    }

    pub fn with_archive_start_date(mut self, date: NaiveDate) -> Self {
        self.archive_start_date = Some(date);
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    pub fn with_target_maps(mut self, maps: &[&str]) -> Self {
        self.target_maps = maps.iter().map(|m| (*m).to_string()).collect();
        self
    }

    pub fn with_bucket_hours(mut self, hours: u32) -> Self {
        self.bucket_hours = Some(hours);
        self
    }

    /// Reject values the engines cannot iterate over.
    pub fn validate(&self) -> Result<(), String> {
        if self.processor.is_empty() {
            return Err("processor must not be empty".to_string());
        }
        if self.look_back_days > MAX_LOOK_BACK_DAYS {
            return Err(format!(
                "look_back_days {} exceeds {MAX_LOOK_BACK_DAYS}",
                self.look_back_days
            ));
        }
        Ok(())
    }

    /// Template parameters plus resolution and data-source metadata.
    pub fn base_params(&self) -> Map<String, Value> {
        let mut params = self.params.clone();
        if let Some(resolution) = &self.resolution {
            params.entry("RESOLUTION").or_insert_with(|| Value::String(resolution.clone()));
        }
        if let Some(source) = &self.data_source {
            params.entry("DATA_SOURCE").or_insert_with(|| Value::String(source.clone()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_defaults() {
        let config: MapConfig = serde_yaml::from_str("processor: edrift_flood\n").unwrap();
        assert_eq!(config.processor, "edrift_flood");
        assert_eq!(config.look_back_days, 7);
        assert!(config.archive_start_date.is_none());
        assert!(config.target_maps.is_empty());
    }

    #[test]
    fn test_validate_look_back_range() {
        assert!(MapConfig::new("p").validate().is_ok());
        assert!(MapConfig::new("p").with_look_back_days(MAX_LOOK_BACK_DAYS).validate().is_ok());
        assert!(MapConfig::new("p").with_look_back_days(200_000_000).validate().is_err());
        assert!(MapConfig::new("").validate().is_err());
    }

    #[test]
    fn test_base_params_include_metadata_without_overriding_template() {
        let mut config = MapConfig::new("p").with_param("RESOLUTION", Value::String("10m".into()));
        config.resolution = Some("20m".into());
        config.data_source = Some("S1".into());

        let params = config.base_params();
        assert_eq!(params["RESOLUTION"], "10m");
        assert_eq!(params["DATA_SOURCE"], "S1");
    }
}
