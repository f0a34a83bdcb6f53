//! Archive iteration: the rolling short window and the backward long backfill.

use chrono::{Days, NaiveDate};

use crate::domain::errors::{DomainError, DomainResult};

/// Rolling short archive window `[today - look_back_days, today]`.
///
/// Fails when the window reaches past the earliest representable date.
pub fn short_archive_window(today: NaiveDate, look_back_days: u32) -> DomainResult<(NaiveDate, NaiveDate)> {
    let start = today
        .checked_sub_days(Days::new(u64::from(look_back_days)))
        .ok_or_else(|| DomainError::ValidationFailed(format!("look_back_days {look_back_days} is out of range")))?;
    Ok((start, today))
}

/// Every day in `[start, end]`; empty when `start > end`.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|d| *d <= end).collect()
}

/// Next day the long backfill should submit, walking backward.
///
/// The cursor is the earliest day already covered: the area's discovered
/// archive start, any day already consumed by a previous backfill job, or the
/// start of the short window. Returns `None` once the cursor has reached
/// `floor`.
pub fn next_backfill_day(
    today: NaiveDate,
    look_back_days: u32,
    area_start: Option<NaiveDate>,
    consumed: &[NaiveDate],
    floor: NaiveDate,
) -> DomainResult<Option<NaiveDate>> {
    let (window_start, _) = short_archive_window(today, look_back_days)?;
    let cursor = consumed
        .iter()
        .copied()
        .chain(area_start)
        .fold(window_start, NaiveDate::min);

    Ok(cursor.pred_opt().filter(|day| *day >= floor))
}
