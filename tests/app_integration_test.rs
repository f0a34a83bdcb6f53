//! Configuration, file-backed storage and orchestrators wired together the
//! way the binary does it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use geodispatch::adapters::compute::MockComputeBackend;
use geodispatch::adapters::notifier::LogNotifier;
use geodispatch::adapters::publisher::MockLayerPublisher;
use geodispatch::cli::App;
use geodispatch::domain::models::{Area, TaskPayload, TaskStatus};
use geodispatch::domain::ports::TaskRecordFilter;
use geodispatch::infrastructure::config::ConfigLoader;
use geodispatch::services::Orchestrator;
use tempfile::TempDir;

mod common;

fn write_project(dir: &Path) -> PathBuf {
    let config_path = dir.join("geodispatch.yaml");
    std::fs::write(
        &config_path,
        format!(
            "database:\n  path: {}\nplugins_dir: plugins\n",
            dir.join("state/geodispatch.db").display()
        ),
    )
    .unwrap();
    std::fs::create_dir_all(dir.join("plugins")).unwrap();
    std::fs::write(
        dir.join("plugins/flood.yaml"),
        "sar_flood:\n  processor: edrift_flood\n  look_back_days: 3\n",
    )
    .unwrap();
    config_path
}

async fn open(config_path: &Path) -> App {
    let config = ConfigLoader::load(Some(config_path)).unwrap();
    App::open(config, Some(config_path)).await.unwrap()
}

/// Orchestrator over the app's own store with in-memory collaborators.
fn mocked(app: &App) -> Orchestrator {
    app.orchestrator_with(
        app.repos.clone(),
        Arc::new(MockComputeBackend::new()),
        Arc::new(MockLayerPublisher::new()),
        Arc::new(LogNotifier),
    )
}

#[tokio::test]
async fn test_records_survive_a_restart() {
    let dir = TempDir::new().unwrap();
    let config_path = write_project(dir.path());

    let app = open(&config_path).await;
    app.repos
        .areas
        .insert(&Area::new("A1", "Delta").with_plugin("flood"))
        .await
        .unwrap();
    let report = mocked(&app)
        .run_cycle_at(common::at(2024, 5, 7, 10))
        .await
        .unwrap();
    assert_eq!(report.submitted, 1);
    drop(app);

    // A fresh process sees the same ledger and does not resubmit
    let app = open(&config_path).await;
    let records = app.repos.tasks.list(TaskRecordFilter::for_area("A1")).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].payload, TaskPayload::ShortArchive);
    assert_eq!(records[0].processor, "edrift_flood");

    let report = mocked(&app)
        .run_cycle_at(common::at(2024, 5, 7, 11))
        .await
        .unwrap();
    assert_eq!(report.submitted, 0);

    let records = app.repos.tasks.list(TaskRecordFilter::for_area("A1")).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, TaskStatus::Running);
}

#[tokio::test]
async fn test_inactive_areas_are_not_cycled() {
    let dir = TempDir::new().unwrap();
    let config_path = write_project(dir.path());
    let app = open(&config_path).await;

    let mut area = Area::new("A9", "Retired").with_plugin("flood");
    area.active = false;
    app.repos.areas.insert(&area).await.unwrap();

    let report = mocked(&app)
        .run_cycle_at(common::at(2024, 5, 7, 10))
        .await
        .unwrap();
    assert_eq!(report.areas, 0);
    assert!(app.repos.tasks.list(TaskRecordFilter::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_dry_run_leaves_the_store_untouched() {
    let dir = TempDir::new().unwrap();
    let config_path = write_project(dir.path());
    let app = open(&config_path).await;
    app.repos
        .areas
        .insert(&Area::new("A1", "Delta").with_plugin("flood"))
        .await
        .unwrap();

    let report = app
        .dry_run_orchestrator()
        .await
        .unwrap()
        .run_cycle_at(common::at(2024, 5, 7, 10))
        .await
        .unwrap();
    assert_eq!(report.areas, 1);
    assert_eq!(report.submitted, 1);

    assert!(app.repos.tasks.list(TaskRecordFilter::default()).await.unwrap().is_empty());
}
