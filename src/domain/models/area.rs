//! Area domain model.
//!
//! An area is a monitored geographic region subscribed to a set of plugins.
//! The core never creates or deletes areas; map engines only widen the
//! discovered archive window.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in WGS84 degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub west: f64,
    pub south: f64,
    pub east: f64,
}

impl BoundingBox {
    pub fn new(north: f64, west: f64, south: f64, east: f64) -> Self {
        Self { north, west, south, east }
    }

    /// Render as `north,west,south,east`, the form processors take as `BBOX`.
    pub fn to_param(&self) -> String {
        format!("{},{},{},{}", self.north, self.west, self.south, self.east)
    }
}

/// A monitored region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: String,
    pub name: String,
    /// Boundary polygon as WKT.
    pub polygon: String,
    pub bbox: BoundingBox,
    /// Subscribed plugin identifiers.
    pub plugins: Vec<String>,
    /// Earliest day for which archive output has been discovered.
    pub archive_start_date: Option<NaiveDate>,
    /// Latest day for which archive output has been discovered.
    pub archive_end_date: Option<NaiveDate>,
    pub active: bool,
}

impl Area {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            polygon: String::new(),
            bbox: BoundingBox::default(),
            plugins: Vec::new(),
            archive_start_date: None,
            archive_end_date: None,
            active: true,
        }
    }

    pub fn with_plugin(mut self, plugin_id: impl Into<String>) -> Self {
        self.plugins.push(plugin_id.into());
        self
    }

    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = bbox;
        self
    }

    /// Widen the archive window so it covers `[start, end]`.
    ///
    /// Returns true if either bound moved.
    pub fn widen_archive_window(&mut self, start: NaiveDate, end: NaiveDate) -> bool {
        let new_start = self.archive_start_date.map_or(start, |s| s.min(start));
        let new_end = self.archive_end_date.map_or(end, |e| e.max(end));
        let changed = self.archive_start_date != Some(new_start)
            || self.archive_end_date != Some(new_end);
        self.archive_start_date = Some(new_start);
        self.archive_end_date = Some(new_end);
        changed
    }
}
