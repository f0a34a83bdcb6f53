//! Numeric dashboard widgets.

use std::sync::Arc;

use crate::domain::errors::DomainResult;
use crate::domain::models::WidgetInfo;
use crate::domain::ports::WidgetRepository;

pub struct WidgetService {
    repo: Arc<dyn WidgetRepository>,
}

impl WidgetService {
    pub fn new(repo: Arc<dyn WidgetRepository>) -> Self {
        Self { repo }
    }

    /// Add `value` from `input_map` to the widget of `kind` for the area and
    /// day, creating it on first contribution.
    ///
    /// A map that already contributed leaves the widget untouched, so
    /// handling the same completed job twice never double counts.
    pub async fn merge_numeric(
        &self,
        kind: &str,
        area_id: &str,
        reference_date: &str,
        input_map: &str,
        job_id: &str,
        value: f64,
    ) -> DomainResult<WidgetInfo> {
        let id = WidgetInfo::id_for(kind, area_id, reference_date);

        match self.repo.get(&id).await? {
            Some(mut widget) => {
                if widget.merge(input_map, job_id, value) {
                    self.repo.update(&widget).await?;
                    tracing::debug!(widget = %id, input_map, value = widget.value, "widget merged");
                } else {
                    tracing::debug!(widget = %id, input_map, "contribution already recorded");
                }
                Ok(widget)
            }
            None => {
                let mut widget = WidgetInfo::new(kind, area_id, reference_date);
                widget.merge(input_map, job_id, value);
                self.repo.insert(&widget).await?;
                tracing::debug!(widget = %id, input_map, value, "widget created");
                Ok(widget)
            }
        }
    }

    pub async fn list_by_area(&self, area_id: &str) -> DomainResult<Vec<WidgetInfo>> {
        self.repo.list_by_area(area_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{create_migrated_test_pool, SqliteWidgetRepository};

    #[tokio::test]
    async fn test_merge_twice_does_not_double_count() {
        let pool = create_migrated_test_pool().await.unwrap();
        let service = WidgetService::new(Arc::new(SqliteWidgetRepository::new(pool)));

        service
            .merge_numeric("population_affected", "A1", "2024-05-07", "sar_flood", "job-1", 1500.0)
            .await
            .unwrap();
        service
            .merge_numeric("population_affected", "A1", "2024-05-07", "sar_flood", "job-1", 1500.0)
            .await
            .unwrap();
        let widget = service
            .merge_numeric("population_affected", "A1", "2024-05-07", "active_fire", "job-2", 20.0)
            .await
            .unwrap();

        assert!((widget.value - 1520.0).abs() < f64::EPSILON);
        assert_eq!(service.list_by_area("A1").await.unwrap().len(), 1);
    }
}
