//! Dated raster products (SAR flood extent, land surface temperature).
//!
//! One file per day, named `<area><base><YYYY-MM-DD><suffix>`. The engine
//! submits a rolling short archive for new areas, walks a long backfill
//! backward one day at a time, and queues one daily job for today.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{TaskPayload, TaskRecord};
use crate::services::job_ledger::DedupPolicy;
use crate::services::map_engine::archive::{next_backfill_day, short_archive_window};
use crate::services::map_engine::context::date_params;
use crate::services::map_engine::scan::{scan_dated, DatedPattern};
use crate::services::map_engine::{EngineContext, MapEngine};

pub const ARCHIVE_START_DATE: &str = "ARCHIVE_START_DATE";
pub const ARCHIVE_END_DATE: &str = "ARCHIVE_END_DATE";

pub struct DatedProductEngine {
    map_id: String,
    base: &'static str,
    suffix: &'static str,
}

impl DatedProductEngine {
    pub fn new(map_id: impl Into<String>, base: &'static str, suffix: &'static str) -> Self {
        Self {
            map_id: map_id.into(),
            base,
            suffix,
        }
    }

    pub fn sar_flood(map_id: impl Into<String>) -> Self {
        Self::new(map_id, "sarflood_", "_flood.tif")
    }

    pub fn land_surface_temperature(map_id: impl Into<String>) -> Self {
        Self::new(map_id, "_lst_", ".tif")
    }

    pub fn pattern(&self, area_id: &str) -> DatedPattern {
        DatedPattern::new(area_id, self.base, self.suffix)
    }

    /// Day range a record asked the processor for.
    fn requested_range(record: &TaskRecord) -> DomainResult<(NaiveDate, NaiveDate)> {
        let start = record.param_date(ARCHIVE_START_DATE).or_else(|| record.reference_day());
        let end = record.param_date(ARCHIVE_END_DATE).or_else(|| record.reference_day());
        match (start, end) {
            (Some(start), Some(end)) => Ok((start, end)),
            _ => Err(DomainError::MalformedResult {
                job_id: record.id.clone(),
                reason: "no archive range on record".to_string(),
            }),
        }
    }
}

#[async_trait]
impl MapEngine for DatedProductEngine {
    fn map_id(&self) -> &str {
        &self.map_id
    }

    async fn trigger_new_area_maps(&self, ctx: &EngineContext) -> DomainResult<()> {
        let (start, end) = short_archive_window(ctx.today(), ctx.config.look_back_days)?;
        let params = date_params(&[(ARCHIVE_START_DATE, start), (ARCHIVE_END_DATE, end)]);
        ctx.submit_once(TaskPayload::ShortArchive, None, params, DedupPolicy::ActiveOrDone)
            .await?;
        Ok(())
    }

    async fn trigger_new_area_archives(&self, ctx: &EngineContext) -> DomainResult<()> {
        let Some(floor) = ctx.config.archive_start_date else {
            return Ok(());
        };

        let backfill: Vec<TaskRecord> = ctx
            .history()
            .await?
            .into_iter()
            .filter(|r| r.payload == TaskPayload::LongArchive)
            .collect();
        if backfill.iter().any(|r| r.status.is_active()) {
            return Ok(());
        }

        let consumed: Vec<NaiveDate> = backfill.iter().filter_map(TaskRecord::reference_day).collect();
        let Some(day) = next_backfill_day(
            ctx.today(),
            ctx.config.look_back_days,
            ctx.area.archive_start_date,
            &consumed,
            floor,
        )?
        else {
            tracing::debug!(area = %ctx.area.id, map = %self.map_id, "long archive complete");
            return Ok(());
        };

        let params = date_params(&[(ARCHIVE_START_DATE, day), (ARCHIVE_END_DATE, day)]);
        ctx.submit_once(TaskPayload::LongArchive, Some(day), params, DedupPolicy::ActiveOnly)
            .await?;
        Ok(())
    }

    async fn update_new_maps(&self, ctx: &EngineContext) -> DomainResult<()> {
        let today = ctx.today();
        let covered = ctx.history().await?.iter().any(|r| {
            r.payload == TaskPayload::ShortArchive
                && !r.status.is_failure()
                && r.param_date(ARCHIVE_END_DATE).is_some_and(|end| end >= today)
        });
        if covered {
            return Ok(());
        }

        let params = date_params(&[(ARCHIVE_START_DATE, today), (ARCHIVE_END_DATE, today)]);
        ctx.submit_once(TaskPayload::Daily, Some(today), params, DedupPolicy::ActiveOrDone)
            .await?;
        Ok(())
    }

    async fn on_done(&self, ctx: &EngineContext, record: &TaskRecord) -> DomainResult<()> {
        let (start, end) = Self::requested_range(record)?;
        let files = ctx.services.dispatch.list_files(&record.workspace_id).await?;
        let found = scan_dated(&files, &self.pattern(&record.area_id), start, end);

        let mut published = Vec::new();
        let mut last_error = None;
        for (date, file) in found {
            match ctx
                .services
                .publication
                .publish_output(record, &file, &self.map_id, &date.to_string())
                .await
            {
                Ok(Some(_)) => published.push(date),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(file = %file, error = %e, "failed to publish dated output");
                    last_error = Some(e);
                }
            }
        }

        tracing::info!(
            job_id = %record.id,
            map = %self.map_id,
            start = %start,
            end = %end,
            published = published.len(),
            "dated outputs scanned"
        );
        ctx.record_archive_bounds(&published).await?;

        match last_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
