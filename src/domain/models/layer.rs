//! Published layer domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A raster or vector artifact published through the layer publisher.
///
/// The id is the published layer name, so publishing the same output twice
/// targets the same record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: String,
    pub map_id: String,
    pub area_id: String,
    pub plugin_id: String,
    pub reference_date: String,
    /// Address of the layer in the publishing service.
    pub link: String,
    /// Source label, e.g. the processor that produced the file.
    pub source: String,
    pub published: bool,
    pub published_at: DateTime<Utc>,
}

impl Layer {
    pub fn new(
        id: impl Into<String>,
        map_id: impl Into<String>,
        area_id: impl Into<String>,
        plugin_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            map_id: map_id.into(),
            area_id: area_id.into(),
            plugin_id: plugin_id.into(),
            reference_date: String::new(),
            link: String::new(),
            source: String::new(),
            published: true,
            published_at: Utc::now(),
        }
    }

    pub fn with_reference_date(mut self, date: impl Into<String>) -> Self {
        self.reference_date = date.into();
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }
}
