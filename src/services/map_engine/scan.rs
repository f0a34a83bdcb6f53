//! Matching workspace file listings against dated output names.

use chrono::NaiveDate;
use std::collections::BTreeMap;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Output naming convention `<area><base><YYYY-MM-DD><suffix>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatedPattern {
    prefix: String,
    suffix: String,
}

impl DatedPattern {
    pub fn new(area_id: &str, base: &str, suffix: &str) -> Self {
        Self {
            prefix: format!("{area_id}{base}"),
            suffix: suffix.to_string(),
        }
    }

    pub fn file_name(&self, date: NaiveDate) -> String {
        format!("{}{}{}", self.prefix, date.format(DATE_FORMAT), self.suffix)
    }

    /// Date encoded in `file_name`, if it follows this pattern.
    pub fn parse(&self, file_name: &str) -> Option<NaiveDate> {
        let middle = file_name.strip_prefix(&self.prefix)?.strip_suffix(&self.suffix)?;
        NaiveDate::parse_from_str(middle, DATE_FORMAT).ok()
    }
}

/// Files of `files` that match `pattern` for a date inside `[start, end]`,
/// one per date, in date order.
pub fn scan_dated(files: &[String], pattern: &DatedPattern, start: NaiveDate, end: NaiveDate) -> Vec<(NaiveDate, String)> {
    let mut found = BTreeMap::new();
    for file in files {
        if let Some(date) = pattern.parse(file) {
            if date >= start && date <= end {
                found.entry(date).or_insert_with(|| file.clone());
            }
        }
    }
    found.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::map_engine::archive::date_range;
    use proptest::prelude::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_parse_round_trips_file_name() {
        let pattern = DatedPattern::new("A1", "sarflood_", "_flood.tif");
        let name = pattern.file_name(day("2024-05-01"));
        assert_eq!(name, "A1sarflood_2024-05-01_flood.tif");
        assert_eq!(pattern.parse(&name), Some(day("2024-05-01")));
    }

    #[test]
    fn test_parse_rejects_other_areas_and_garbage() {
        let pattern = DatedPattern::new("A1", "sarflood_", "_flood.tif");
        assert_eq!(pattern.parse("A11sarflood_2024-05-01_flood.tif"), None);
        assert_eq!(pattern.parse("A1sarflood_2024-05-01_flood.tif.aux"), None);
        assert_eq!(pattern.parse("A1sarflood_yesterday_flood.tif"), None);
    }

    #[test]
    fn test_scan_ignores_dates_outside_range() {
        let pattern = DatedPattern::new("A1", "_lst_", ".tif");
        let files = vec![
            "A1_lst_2024-04-30.tif".to_string(),
            "A1_lst_2024-05-02.tif".to_string(),
            "readme.txt".to_string(),
        ];
        let found = scan_dated(&files, &pattern, day("2024-05-01"), day("2024-05-07"));
        assert_eq!(found, vec![(day("2024-05-02"), "A1_lst_2024-05-02.tif".to_string())]);
    }

    proptest! {
        #[test]
        fn prop_scan_yields_exactly_present_days(
            offset in 0i64..400,
            span in 0i64..40,
            present in proptest::collection::vec(any::<bool>(), 40),
        ) {
            let start = day("2023-01-01") + chrono::Duration::days(offset);
            let end = start + chrono::Duration::days(span);
            let pattern = DatedPattern::new("A1", "sarflood_", "_flood.tif");

            let days = date_range(start, end);
            let expected: Vec<NaiveDate> = days
                .iter()
                .zip(present.iter())
                .filter(|(_, p)| **p)
                .map(|(d, _)| *d)
                .collect();

            let mut files: Vec<String> = expected.iter().map(|d| pattern.file_name(*d)).collect();
            files.push(pattern.file_name(end + chrono::Duration::days(1)));
            files.push(pattern.file_name(start - chrono::Duration::days(1)));

            let found: Vec<NaiveDate> = scan_dated(&files, &pattern, start, end)
                .into_iter()
                .map(|(d, _)| d)
                .collect();
            prop_assert_eq!(found, expected);
        }
    }
}
