//! Event finder bookkeeping: at most one open event per area and type.

use chrono::NaiveDate;
use std::sync::Arc;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Event, EventType};
use crate::domain::ports::{EventRepository, Notifier};

/// What an observation did to the area's open event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventChange {
    Opened(Event),
    Advanced(Event),
    Unchanged,
    Closed(Event),
    NothingOpen,
}

/// One finder result for an area and day.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub detected: bool,
    pub magnitude: f64,
    pub bbox: String,
}

pub struct EventService {
    repo: Arc<dyn EventRepository>,
    notifier: Arc<dyn Notifier>,
}

impl EventService {
    pub fn new(repo: Arc<dyn EventRepository>, notifier: Arc<dyn Notifier>) -> Self {
        Self { repo, notifier }
    }

    /// Apply a finder observation to the singleton open event.
    ///
    /// A detection opens an event if none is open, otherwise it may move the
    /// peak. A negative observation closes the open event.
    pub async fn observe(
        &self,
        area_id: &str,
        event_type: EventType,
        date: NaiveDate,
        observation: &Observation,
    ) -> DomainResult<EventChange> {
        let open = self.repo.find_open(area_id, event_type).await?;

        match (open, observation.detected) {
            (Some(mut event), true) => {
                if event.observe(date, observation.magnitude, &observation.bbox) {
                    self.repo.update(&event).await?;
                    tracing::info!(event_id = %event.id, area = area_id, peak = event.peak_value, "event peak advanced");
                    Ok(EventChange::Advanced(event))
                } else {
                    Ok(EventChange::Unchanged)
                }
            }
            (Some(mut event), false) => {
                event.close(date);
                self.repo.update(&event).await?;
                tracing::info!(event_id = %event.id, area = area_id, "event closed");
                Ok(EventChange::Closed(event))
            }
            (None, true) => {
                let event = Event::open(area_id, event_type, date, observation.magnitude, &observation.bbox);
                self.repo.insert(&event).await?;
                tracing::info!(event_id = %event.id, area = area_id, kind = event_type.as_str(), "event opened");
                self.announce(&event).await;
                Ok(EventChange::Opened(event))
            }
            (None, false) => Ok(EventChange::NothingOpen),
        }
    }

    async fn announce(&self, event: &Event) {
        let subject = format!("New {} event on area {}", event.event_type.as_str(), event.area_id);
        let body = format!(
            "Started {} with magnitude {:.2} over {}",
            event.start_date, event.peak_value, event.bbox
        );
        if let Err(e) = self.notifier.notify(&subject, &body).await {
            tracing::warn!(event_id = %event.id, error = %e, "event notification failed");
        }
    }

    pub async fn list_by_area(&self, area_id: &str) -> DomainResult<Vec<Event>> {
        self.repo.list_by_area(area_id).await
    }
}
