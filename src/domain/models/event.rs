//! Detected real-world event model.
//!
//! At most one event per (area, type) may be open (`in_going`) at a time.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Flood,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flood => "flood",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "flood" => Some(Self::Flood),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub area_id: String,
    pub event_type: EventType,
    /// Bounding box of the affected extent, as reported by the finder.
    pub bbox: String,
    pub start_date: NaiveDate,
    pub peak_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    /// Magnitude at the peak (e.g. flooded km²).
    pub peak_value: f64,
    pub in_going: bool,
}

impl Event {
    /// Open a new ongoing event starting (and peaking) on `date`.
    pub fn open(
        area_id: impl Into<String>,
        event_type: EventType,
        date: NaiveDate,
        magnitude: f64,
        bbox: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            area_id: area_id.into(),
            event_type,
            bbox: bbox.into(),
            start_date: date,
            peak_date: date,
            end_date: None,
            peak_value: magnitude,
            in_going: true,
        }
    }

    /// Record a new observation; returns true if the peak moved.
    pub fn observe(&mut self, date: NaiveDate, magnitude: f64, bbox: &str) -> bool {
        if magnitude > self.peak_value {
            self.peak_value = magnitude;
            self.peak_date = date;
            if !bbox.is_empty() {
                self.bbox = bbox.to_string();
            }
            return true;
        }
        false
    }

    pub fn close(&mut self, date: NaiveDate) {
        self.end_date = Some(date);
        self.in_going = false;
    }
}
