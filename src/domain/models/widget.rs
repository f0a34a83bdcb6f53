//! Dashboard widget model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An aggregated dashboard value for one area, day and widget kind.
///
/// `contributors` maps each input map that already added to `value` to the
/// job that produced it, so the same job is never summed twice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetInfo {
    pub id: String,
    pub kind: String,
    pub area_id: String,
    pub reference_date: String,
    pub value: f64,
    pub contributors: BTreeMap<String, String>,
}

impl WidgetInfo {
    pub fn new(kind: impl Into<String>, area_id: impl Into<String>, reference_date: impl Into<String>) -> Self {
        let kind = kind.into();
        let area_id = area_id.into();
        let reference_date = reference_date.into();
        Self {
            id: Self::id_for(&kind, &area_id, &reference_date),
            kind,
            area_id,
            reference_date,
            value: 0.0,
            contributors: BTreeMap::new(),
        }
    }

    /// One widget exists per (kind, area, day).
    pub fn id_for(kind: &str, area_id: &str, reference_date: &str) -> String {
        format!("{kind}|{area_id}|{reference_date}")
    }

    pub fn has_contribution_from(&self, input_map: &str) -> bool {
        self.contributors.contains_key(input_map)
    }

    /// Add `value` from `input_map` unless that map already contributed.
    ///
    /// Returns true if the widget changed.
    pub fn merge(&mut self, input_map: &str, job_id: &str, value: f64) -> bool {
        if self.has_contribution_from(input_map) {
            return false;
        }
        self.value += value;
        self.contributors.insert(input_map.to_string(), job_id.to_string());
        true
    }
}
