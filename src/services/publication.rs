//! Turns workspace output files into published layers.

use std::path::Path;
use std::sync::Arc;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Layer, TaskRecord};
use crate::domain::ports::{LayerPublisher, LayerRepository};
use crate::services::dispatch_client::DispatchClient;

/// Layer name for an output file of `area_id`'s `map_id`.
///
/// Layer names share one publisher workspace, so a file stem that does not
/// already carry the area id is prefixed with the area and map ids.
pub fn layer_name(area_id: &str, map_id: &str, file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    if stem.starts_with(area_id) {
        stem.to_string()
    } else {
        format!("{area_id}_{map_id}_{stem}")
    }
}

/// Remove a downloaded output once it has been handed to the publisher.
async fn discard_download(local: &Path) {
    match tokio::fs::remove_file(local).await {
        Ok(()) => tracing::debug!(path = %local.display(), "removed local output copy"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %local.display(), error = %e, "failed to remove local output copy"),
    }
}

pub struct PublicationService {
    dispatch: Arc<DispatchClient>,
    publisher: Arc<dyn LayerPublisher>,
    layers: Arc<dyn LayerRepository>,
    workspace: String,
}

impl PublicationService {
    pub fn new(
        dispatch: Arc<DispatchClient>,
        publisher: Arc<dyn LayerPublisher>,
        layers: Arc<dyn LayerRepository>,
        workspace: impl Into<String>,
    ) -> Self {
        Self {
            dispatch,
            publisher,
            layers,
            workspace: workspace.into(),
        }
    }

    /// Fetch `file_name` from the job's workspace and publish it under
    /// `map_id`.
    ///
    /// An already published layer of the same name is removed first.
    /// Returns `None` when the publisher refuses the file. The local copy is
    /// removed whatever the outcome.
    pub async fn publish_output(
        &self,
        record: &TaskRecord,
        file_name: &str,
        map_id: &str,
        reference_date: &str,
    ) -> DomainResult<Option<Layer>> {
        let name = layer_name(&record.area_id, map_id, file_name);
        let local = self.dispatch.fetch(&record.workspace_id, file_name).await?;
        let published = self.publish_local(record, &local, &name, map_id, reference_date).await;
        discard_download(&local).await;
        published
    }

    async fn publish_local(
        &self,
        record: &TaskRecord,
        local: &Path,
        name: &str,
        map_id: &str,
        reference_date: &str,
    ) -> DomainResult<Option<Layer>> {
        let existing = self.layers.get(name).await?;
        if existing.is_some() {
            let removed = self.publisher.delete(name, &self.workspace).await?;
            tracing::debug!(layer = %name, removed, "replacing published layer");
        }

        let Some(handle) = self.publisher.publish(local, &self.workspace, name).await? else {
            tracing::warn!(layer = %name, job_id = %record.id, "publisher refused output");
            return Ok(None);
        };

        let layer = Layer::new(name, map_id, &record.area_id, &record.plugin_id)
            .with_reference_date(reference_date)
            .with_link(handle)
            .with_source(&record.processor);

        if existing.is_some() {
            self.layers.update(&layer).await?;
        } else {
            self.layers.insert(&layer).await?;
        }

        tracing::info!(layer = %name, map = map_id, area = %record.area_id, reference_date, "layer recorded");
        Ok(Some(layer))
    }

    /// Published layer of `map_id` for `area_id` on `reference_date`.
    pub async fn layer_for(&self, area_id: &str, map_id: &str, reference_date: &str) -> DomainResult<Option<Layer>> {
        let layers = self.layers.list_by_area(area_id, Some(map_id)).await?;
        Ok(layers
            .into_iter()
            .find(|l| l.published && l.reference_date == reference_date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::compute::MockComputeBackend;
    use crate::adapters::publisher::{MockLayerPublisher, PublisherCall};
    use crate::adapters::sqlite::{create_migrated_test_pool, SqliteLayerRepository};

    async fn setup() -> (PublicationService, MockLayerPublisher, Arc<SqliteLayerRepository>) {
        setup_with(MockComputeBackend::new()).await
    }

    async fn setup_with(
        backend: MockComputeBackend,
    ) -> (PublicationService, MockLayerPublisher, Arc<SqliteLayerRepository>) {
        let pool = create_migrated_test_pool().await.unwrap();
        let layers = Arc::new(SqliteLayerRepository::new(pool));
        let publisher = MockLayerPublisher::new();
        let dispatch = Arc::new(DispatchClient::new(Arc::new(backend)));
        let service = PublicationService::new(dispatch, Arc::new(publisher.clone()), layers.clone(), "geodispatch");
        (service, publisher, layers)
    }

    fn record() -> TaskRecord {
        TaskRecord::new("job-1", "A1", "sar_flood", "flood", "ws-1", "edrift_flood")
    }

    #[test]
    fn test_layer_name_strips_extension() {
        assert_eq!(
            layer_name("A1", "sar_flood", "A1sarflood_2024-05-01_flood.tif"),
            "A1sarflood_2024-05-01_flood"
        );
        assert_eq!(layer_name("A1", "building", "A1_buildings"), "A1_buildings");
    }

    #[test]
    fn test_layer_name_is_scoped_to_area_and_map() {
        assert_eq!(layer_name("A1", "building", "buildings.zip"), "A1_building_buildings");
        assert_ne!(
            layer_name("A1", "building", "buildings.zip"),
            layer_name("A2", "building", "buildings.zip")
        );
    }

    #[tokio::test]
    async fn test_publish_records_layer() {
        let (service, publisher, layers) = setup().await;

        let layer = service
            .publish_output(&record(), "A1sarflood_2024-05-01_flood.tif", "sar_flood", "2024-05-01")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(layer.link, "geodispatch:A1sarflood_2024-05-01_flood");
        assert_eq!(layer.source, "edrift_flood");
        assert!(layers.get(&layer.id).await.unwrap().is_some());
        assert_eq!(publisher.live_layers().await, vec![layer.id.clone()]);
        assert!(service.layer_for("A1", "sar_flood", "2024-05-01").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_republish_deletes_previous_layer_first() {
        let (service, publisher, layers) = setup().await;
        let file = "A1sarflood_2024-05-01_flood.tif";

        service.publish_output(&record(), file, "sar_flood", "2024-05-01").await.unwrap();
        service.publish_output(&record(), file, "sar_flood", "2024-05-01").await.unwrap();

        let calls = publisher.calls().await;
        assert!(matches!(calls[1], PublisherCall::Delete { .. }));
        assert_eq!(publisher.publish_count().await, 2);
        assert_eq!(layers.list_by_area("A1", None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_refused_output_is_not_recorded() {
        let (service, publisher, layers) = setup().await;
        publisher.refuse("A1_broken").await;

        let layer = service.publish_output(&record(), "A1_broken.tif", "sar_flood", "").await.unwrap();
        assert!(layer.is_none());
        assert!(layers.list_by_area("A1", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_same_file_from_two_areas_keeps_both_layers() {
        let (service, publisher, layers) = setup().await;
        let a2 = TaskRecord::new("job-2", "A2", "building", "building", "ws-2", "footprints");
        let a1 = TaskRecord::new("job-1", "A1", "building", "building", "ws-1", "footprints");

        service.publish_output(&a1, "buildings.zip", "building", "").await.unwrap();
        service.publish_output(&a2, "buildings.zip", "building", "").await.unwrap();

        assert_eq!(layers.list_by_area("A1", None).await.unwrap().len(), 1);
        assert_eq!(layers.list_by_area("A2", None).await.unwrap().len(), 1);
        assert_eq!(publisher.live_layers().await.len(), 2);
        assert!(!publisher.calls().await.iter().any(|c| matches!(c, PublisherCall::Delete { .. })));
    }

    #[tokio::test]
    async fn test_local_copy_is_removed_after_publishing() {
        let dir = tempfile::tempdir().unwrap();
        let (service, publisher, _layers) = setup_with(MockComputeBackend::new().with_download_dir(dir.path())).await;
        let local = dir.path().join("ws-1");

        service
            .publish_output(&record(), "A1sarflood_2024-05-01_flood.tif", "sar_flood", "2024-05-01")
            .await
            .unwrap();
        assert!(!local.join("A1sarflood_2024-05-01_flood.tif").exists());

        publisher.refuse("A1_broken").await;
        let refused = service.publish_output(&record(), "A1_broken.tif", "sar_flood", "").await.unwrap();
        assert!(refused.is_none());
        assert!(!local.join("A1_broken.tif").exists());
        assert_eq!(std::fs::read_dir(&local).unwrap().count(), 0);
    }
}
