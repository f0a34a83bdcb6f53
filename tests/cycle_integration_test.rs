//! End-to-end cycle scenarios against the mock collaborators.

mod common;

use chrono::NaiveDate;
use serde_json::json;

use common::{at, plugin_configs, sar_flood_config, TestWorld};
use geodispatch::domain::models::{Area, MapConfig, TaskPayload, TaskStatus};
use geodispatch::services::CycleReport;

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

async fn flood_world() -> TestWorld {
    let world = TestWorld::new(plugin_configs("flood", &[("sar_flood", sar_flood_config())])).await;
    world.add_area(&Area::new("A1", "Delta").with_plugin("flood")).await;
    world
}

#[tokio::test]
async fn test_new_area_short_archive_is_submitted_once_then_published() {
    let world = flood_world().await;
    let now = at(2024, 5, 7, 10);

    // Cycle 1: the short archive covers the last week
    let report = world.orchestrator.run_cycle_at(now).await.unwrap();
    assert_eq!(report.areas, 1);
    assert_eq!(report.submitted, 1);

    let records = world.records("A1", "sar_flood").await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].payload, TaskPayload::ShortArchive);
    assert_eq!(records[0].param_date("ARCHIVE_START_DATE"), Some(day("2024-04-30")));
    assert_eq!(records[0].param_date("ARCHIVE_END_DATE"), Some(day("2024-05-07")));

    // Cycle 2: still running, nothing new
    let report = world.orchestrator.run_cycle_at(now).await.unwrap();
    assert_eq!(report.submitted, 0);
    assert_eq!(world.backend.submissions().await.len(), 1);
    let records = world.records("A1", "sar_flood").await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, TaskStatus::Running);

    // Cycle 3: done, one layer per dated output
    let workspace = world.workspace("A1", "flood", "sar_flood").await;
    for d in 1..=7 {
        world
            .backend
            .add_file(&workspace, &format!("A1sarflood_2024-05-0{d}_flood.tif"))
            .await;
    }
    world.backend.set_all_statuses("DONE").await;

    let report = world.orchestrator.run_cycle_at(now).await.unwrap();
    assert_eq!(report.completed, 1);
    assert_eq!(report.submitted, 0);
    assert_eq!(report.unit_failures, 0);
    assert_eq!(world.publisher.publish_count().await, 7);

    let layers = world.repos.layers.list_by_area("A1", Some("sar_flood")).await.unwrap();
    assert_eq!(layers.len(), 7);
    assert!(layers.iter().all(|l| l.published && l.source == "edrift_flood"));

    let area = world.area("A1").await;
    assert_eq!(area.archive_start_date, Some(day("2024-05-01")));
    assert_eq!(area.archive_end_date, Some(day("2024-05-07")));

    let records = world.records("A1", "sar_flood").await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, TaskStatus::Done);
}

#[tokio::test]
async fn test_daily_job_follows_once_short_archive_is_behind() {
    let world = flood_world().await;
    world.orchestrator.run_cycle_at(at(2024, 5, 7, 10)).await.unwrap();
    world.backend.set_all_statuses("DONE").await;
    world.orchestrator.run_cycle_at(at(2024, 5, 7, 16)).await.unwrap();

    let report = world.orchestrator.run_cycle_at(at(2024, 5, 8, 10)).await.unwrap();
    assert_eq!(report.submitted, 1);

    let daily: Vec<_> = world
        .records("A1", "sar_flood")
        .await
        .into_iter()
        .filter(|r| r.payload == TaskPayload::Daily)
        .collect();
    assert_eq!(daily.len(), 1);
    assert_eq!(daily[0].reference_date, "2024-05-08");

    // Same day again: the daily record blocks resubmission
    let report = world.orchestrator.run_cycle_at(at(2024, 5, 8, 16)).await.unwrap();
    assert_eq!(report.submitted, 0);
}

#[tokio::test]
async fn test_terminal_record_is_never_revisited() {
    let world = flood_world().await;
    let now = at(2024, 5, 7, 10);
    world.orchestrator.run_cycle_at(now).await.unwrap();
    world.backend.set_all_statuses("DONE").await;
    world.orchestrator.run_cycle_at(now).await.unwrap();

    // A later contradicting remote status must not reopen the record
    world.backend.set_all_statuses("ERROR").await;
    let report = world.orchestrator.run_cycle_at(now).await.unwrap();
    assert_eq!(report.failed_tasks, 0);
    assert_eq!(report.completed, 0);

    let records = world.records("A1", "sar_flood").await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, TaskStatus::Done);
}

#[tokio::test]
async fn test_failed_short_archive_is_resubmitted() {
    let world = flood_world().await;
    let now = at(2024, 5, 7, 10);
    world.orchestrator.run_cycle_at(now).await.unwrap();
    world.backend.set_all_statuses("ERROR").await;

    let report = world.orchestrator.run_cycle_at(now).await.unwrap();
    assert_eq!(report.failed_tasks, 1);
    assert_eq!(report.submitted, 1);

    let statuses: Vec<TaskStatus> = world.records("A1", "sar_flood").await.iter().map(|r| r.status).collect();
    assert_eq!(statuses, vec![TaskStatus::Error, TaskStatus::Created]);
}

#[tokio::test]
async fn test_concurrent_cycles_keep_one_active_record() {
    let world = flood_world().await;
    let now = at(2024, 5, 7, 10);

    let (a, b) = tokio::join!(
        world.orchestrator.run_cycle_at(now),
        world.orchestrator.run_cycle_at(now)
    );
    let total = a.unwrap().submitted + b.unwrap().submitted;
    assert_eq!(total, 1);

    let active: Vec<_> = world
        .records("A1", "sar_flood")
        .await
        .into_iter()
        .filter(|r| r.status.is_active())
        .collect();
    assert_eq!(active.len(), 1);
}

#[tokio::test]
async fn test_compute_outage_is_counted_not_fatal() {
    let world = flood_world().await;
    world.backend.set_unavailable(true);

    let report = world.orchestrator.run_cycle_at(at(2024, 5, 7, 10)).await.unwrap();
    assert_eq!(report.submitted, 0);
    assert!(report.unit_failures > 0);

    world.backend.set_unavailable(false);
    let report = world.orchestrator.run_cycle_at(at(2024, 5, 7, 11)).await.unwrap();
    assert_eq!(report.submitted, 1);
}

#[tokio::test]
async fn test_flood_event_follows_published_extent() {
    let configs = plugin_configs(
        "flood",
        &[
            ("sar_flood", sar_flood_config()),
            ("flood_event", MapConfig::new("flood_finder")),
        ],
    );
    let world = TestWorld::new(configs).await;
    world.add_area(&Area::new("A1", "Delta").with_plugin("flood")).await;
    let now = at(2024, 5, 7, 10);

    world.orchestrator.run_cycle_at(now).await.unwrap();
    assert!(world.records("A1", "flood_event").await.is_empty());

    let workspace = world.workspace("A1", "flood", "sar_flood").await;
    world.backend.add_file(&workspace, "A1sarflood_2024-05-07_flood.tif").await;
    world.backend.set_all_statuses("DONE").await;

    // Extent publishes during record handling; the finder is queued in the same cycle
    world.orchestrator.run_cycle_at(now).await.unwrap();
    let finder = world.records("A1", "flood_event").await;
    assert_eq!(finder.len(), 1);
    assert_eq!(finder[0].input_params["SOURCE_LAYER"], json!("A1sarflood_2024-05-07_flood"));

    world
        .backend
        .set_payload(
            &finder[0].id,
            json!({"flooded": true, "flooded_area_km2": 12.5, "bbox": "1,2,3,4"}),
        )
        .await;
    world.backend.set_all_statuses("DONE").await;
    world.orchestrator.run_cycle_at(at(2024, 5, 7, 16)).await.unwrap();

    let open = world.repos.events.list_by_area("A1").await.unwrap();
    assert_eq!(open.len(), 1);
    assert!(open[0].in_going);
    assert_eq!(world.notifier.messages().await.len(), 1);
}

#[tokio::test]
async fn test_pollutant_composite_fans_out_to_species_layers() {
    let world = TestWorld::new(plugin_configs("pollutant", &[("pollutant", MapConfig::new("cams_composite"))])).await;
    world.add_area(&Area::new("A2", "City").with_plugin("pollutant")).await;
    let now = at(2024, 5, 7, 10);

    let report = world.orchestrator.run_cycle_at(now).await.unwrap();
    assert_eq!(report.submitted, 1);
    let submission = &world.backend.submissions().await[0];
    assert_eq!(submission.params["SPECIES"], json!("no2,so2,o3,co,pm25,pm10"));

    let workspace = world.workspace("A2", "pollutant", "pollutant").await;
    world.backend.add_file(&workspace, "A2_no2_2024-05-07.tif").await;
    world.backend.add_file(&workspace, "A2_o3_2024-05-07.tif").await;
    world.backend.set_all_statuses("DONE").await;
    world.orchestrator.run_cycle_at(now).await.unwrap();

    let no2 = world.repos.layers.list_by_area("A2", Some("no2")).await.unwrap();
    let o3 = world.repos.layers.list_by_area("A2", Some("o3")).await.unwrap();
    let so2 = world.repos.layers.list_by_area("A2", Some("so2")).await.unwrap();
    assert_eq!((no2.len(), o3.len(), so2.len()), (1, 1, 0));
    assert!(world.records("A2", "no2").await.is_empty());
}

#[tokio::test]
async fn test_unconfigured_and_unknown_plugins_are_skipped() {
    let world = TestWorld::new(Default::default()).await;
    world
        .add_area(&Area::new("A3", "Hills").with_plugin("flood").with_plugin("no_such_plugin"))
        .await;

    let report = world.orchestrator.run_cycle_at(at(2024, 5, 7, 10)).await.unwrap();
    assert_eq!(
        report,
        CycleReport {
            areas: 1,
            plugins: 1,
            ..Default::default()
        }
    );
    assert!(world.backend.submissions().await.is_empty());
}

#[tokio::test]
async fn test_out_of_range_look_back_fails_only_its_unit() {
    let config = MapConfig::new("edrift_flood").with_look_back_days(200_000_000);
    let world = TestWorld::new(plugin_configs("flood", &[("sar_flood", config)])).await;
    world.add_area(&Area::new("A1", "Delta").with_plugin("flood")).await;

    let report = world.orchestrator.run_cycle_at(at(2024, 5, 7, 10)).await.unwrap();
    assert_eq!(report.areas, 1);
    assert!(report.unit_failures >= 1);
    assert!(world
        .records("A1", "sar_flood")
        .await
        .iter()
        .all(|r| r.payload != TaskPayload::ShortArchive));
}
