// Named date ranges for dashboard queries
// Author: Gabriel Demetrios Lafis

use chrono::{Duration, Local, NaiveDate};
use log::warn;
use serde::Serialize;

/// Days of history the analytics API retains (about 16 months)
pub const RETENTION_DAYS: i64 = 16 * 30;

/// Window used when a range name is not recognised
pub const DEFAULT_WINDOW_DAYS: i64 = 5 * 365;

/// Name of the range dashboards open with
pub const DEFAULT_RANGE_NAME: &str = "All Time";

// English names first, Indonesian aliases after; each maps to days back from today
const NAMED_RANGES: [(&str, i64); 10] = [
    ("Last 7 days", 7),
    ("Last 28 days", 28),
    ("Last 3 months", 90),
    ("Last 6 months", 180),
    ("All Time", RETENTION_DAYS),
    ("7 Hari Terakhir", 7),
    ("28 Hari Terakhir", 28),
    ("3 Bulan Terakhir", 90),
    ("6 Bulan Terakhir", 180),
    ("Semua Waktu", RETENTION_DAYS),
];

/// A concrete inclusive window of calendar dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DateRange {
    /// Create a window ending `days` after it starts
    pub fn ending_at(end_date: NaiveDate, days: i64) -> Self {
        DateRange {
            start_date: end_date - Duration::days(days),
            end_date,
        }
    }

    /// Number of days between start and end
    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }

    /// Bound the window to what the API still retains as of `today`
    pub fn clamp_to_retention(&self, today: NaiveDate) -> DateRange {
        let earliest = today - Duration::days(RETENTION_DAYS);
        let end_date = self.end_date.min(today);
        let start_date = self.start_date.max(earliest).min(end_date);

        DateRange { start_date, end_date }
    }
}

/// Names accepted by [`resolve`]
pub fn range_names() -> Vec<&'static str> {
    NAMED_RANGES.iter().map(|(name, _)| *name).collect()
}

/// Resolve a named range relative to the local date
pub fn resolve(name: &str) -> Option<DateRange> {
    resolve_at(name, today())
}

/// Resolve a named range relative to a given date
pub fn resolve_at(name: &str, today: NaiveDate) -> Option<DateRange> {
    NAMED_RANGES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, days)| DateRange::ending_at(today, *days))
}

/// Resolve a named range, falling back to the five-year default window
pub fn resolve_or_default(name: &str) -> DateRange {
    resolve_or_default_at(name, today())
}

pub fn resolve_or_default_at(name: &str, today: NaiveDate) -> DateRange {
    resolve_at(name, today).unwrap_or_else(|| {
        warn!("Unknown date range '{}', using the last {} days", name, DEFAULT_WINDOW_DAYS);
        DateRange::ending_at(today, DEFAULT_WINDOW_DAYS)
    })
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_last_seven_days() {
        let range = resolve_at("Last 7 days", date("2024-05-10")).unwrap();
        assert_eq!(range.start_date, date("2024-05-03"));
        assert_eq!(range.end_date, date("2024-05-10"));
        assert_eq!(range.days(), 7);
    }

    #[test]
    fn test_all_time_stays_inside_retention() {
        let today = date("2024-05-10");
        let range = resolve_at("All Time", today).unwrap();
        assert_eq!(range.days(), 480);
        assert!(range.days() <= RETENTION_DAYS);
        assert_eq!(resolve_at("Semua Waktu", today), Some(range));
    }

    #[test]
    fn test_localized_aliases_match() {
        let today = date("2024-05-10");
        assert_eq!(resolve_at("28 Hari Terakhir", today), resolve_at("Last 28 days", today));
        assert_eq!(resolve_at("6 Bulan Terakhir", today).unwrap().days(), 180);
    }

    #[test]
    fn test_unknown_name_uses_default_window() {
        let today = date("2024-05-10");
        assert_eq!(resolve_at("Yesterday", today), None);

        let range = resolve_or_default_at("Yesterday", today);
        assert_eq!(range.days(), DEFAULT_WINDOW_DAYS);
        assert_eq!(range.end_date, today);
    }

    #[test]
    fn test_clamp_to_retention() {
        let today = date("2024-05-10");
        let clamped = resolve_or_default_at("Yesterday", today).clamp_to_retention(today);
        assert_eq!(clamped.days(), RETENTION_DAYS);
        assert_eq!(clamped.end_date, today);

        let short = resolve_at("Last 7 days", today).unwrap();
        assert_eq!(short.clamp_to_retention(today), short);
    }
}
