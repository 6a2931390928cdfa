// Overall metrics and daily series
// Author: Gabriel Demetrios Lafis

use serde::{Deserialize, Serialize};

use crate::data::{DimensionName, MetricRecord};
use super::{group_by, AggregationRow, GroupAccumulator};

/// Totals over a record set
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub total_clicks: u64,
    pub total_impressions: u64,
    pub avg_ctr: f64,
    pub avg_position: f64,
    pub row_count: usize,
}

/// Sum clicks and impressions and average ctr and position over all records
///
/// Every record counts once, whatever dimensions it carries. An empty input
/// gives all zeros.
pub fn summarize(records: &[MetricRecord]) -> SummaryMetrics {
    let mut acc = GroupAccumulator::default();
    for record in records {
        acc.update(record);
    }

    let row = acc.finalize(String::new());
    SummaryMetrics {
        total_clicks: row.clicks,
        total_impressions: row.impressions,
        avg_ctr: row.ctr,
        avg_position: row.position,
        row_count: acc.count() as usize,
    }
}

/// One row per date, oldest first
///
/// Dates are `YYYY-MM-DD`, so ordering the keys as strings orders them in
/// time.
pub fn time_series(records: &[MetricRecord]) -> Vec<AggregationRow> {
    let mut rows = group_by(records, DimensionName::Date);
    rows.sort_by(|a, b| a.key.cmp(&b.key));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(date: &str, clicks: u64, ctr: f64) -> MetricRecord {
        MetricRecord::new(clicks, clicks * 10, ctr, 5.0).with_dimension(DimensionName::Date, date)
    }

    #[test]
    fn test_summary_of_nothing_is_zero() {
        assert_eq!(summarize(&[]), SummaryMetrics::default());
    }

    #[test]
    fn test_summary_totals() {
        let summary = summarize(&[day("2024-01-01", 4, 10.0), day("2024-01-02", 6, 20.0)]);
        assert_eq!(summary.total_clicks, 10);
        assert_eq!(summary.total_impressions, 100);
        assert!((summary.avg_ctr - 15.0).abs() < 1e-9);
        assert_eq!(summary.row_count, 2);
    }

    #[test]
    fn test_time_series_sorted_by_date() {
        let series = time_series(&[
            day("2024-01-03", 1, 10.0),
            day("2024-01-01", 2, 10.0),
            day("2024-01-03", 3, 10.0),
            MetricRecord::new(9, 90, 10.0, 1.0).with_dimension(DimensionName::Query, "no date"),
        ]);

        let keys: Vec<&str> = series.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["2024-01-01", "2024-01-03"]);
        assert_eq!(series[1].clicks, 4);
    }
}
