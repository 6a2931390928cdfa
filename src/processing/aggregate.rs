// Grouping and top-N ranking of metric records
// Author: Gabriel Demetrios Lafis

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::data::{DimensionName, MetricName, MetricRecord};
use super::ProcessingError;

/// Metrics of one distinct value of the grouping dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationRow {
    pub key: String,
    pub clicks: u64,
    pub impressions: u64,
    pub ctr: f64,
    pub position: f64,
}

impl AggregationRow {
    /// Get a metric as a float
    pub fn metric(&self, metric: MetricName) -> f64 {
        match metric {
            MetricName::Clicks => self.clicks as f64,
            MetricName::Impressions => self.impressions as f64,
            MetricName::Ctr => self.ctr,
            MetricName::Position => self.position,
        }
    }
}

/// Running totals for one group
///
/// CTR and position are averaged per row, not weighted by impressions.
#[derive(Debug, Clone, Default)]
pub(crate) struct GroupAccumulator {
    clicks: u64,
    impressions: u64,
    ctr_sum: f64,
    position_sum: f64,
    count: u64,
}

impl GroupAccumulator {
    pub(crate) fn update(&mut self, record: &MetricRecord) {
        self.clicks += record.clicks;
        self.impressions += record.impressions;
        self.ctr_sum += record.ctr;
        self.position_sum += record.position;
        self.count += 1;
    }

    pub(crate) fn count(&self) -> u64 {
        self.count
    }

    pub(crate) fn finalize(&self, key: String) -> AggregationRow {
        let (ctr, position) = if self.count == 0 {
            (0.0, 0.0)
        } else {
            (
                self.ctr_sum / self.count as f64,
                self.position_sum / self.count as f64,
            )
        };

        AggregationRow {
            key,
            clicks: self.clicks,
            impressions: self.impressions,
            ctr,
            position,
        }
    }
}

/// Group records by one dimension, keeping groups in first-seen order
///
/// Records that do not carry the dimension are skipped.
pub fn group_by(records: &[MetricRecord], dimension: DimensionName) -> Vec<AggregationRow> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, GroupAccumulator)> = Vec::new();

    for record in records {
        let key = match record.dimension(dimension) {
            Some(key) => key,
            None => continue,
        };

        let slot = *index.entry(key).or_insert_with(|| {
            groups.push((key, GroupAccumulator::default()));
            groups.len() - 1
        });
        groups[slot].1.update(record);
    }

    groups
        .into_iter()
        .map(|(key, acc)| acc.finalize(key.to_string()))
        .collect()
}

/// Order rows best-first by a metric
///
/// Position ranks ascending, every other metric descending. The sort is
/// stable, so equal values keep their incoming order.
pub fn rank(rows: &mut [AggregationRow], metric: MetricName) {
    rows.sort_by(|a, b| compare(a.metric(metric), b.metric(metric), metric));
}

fn compare(a: f64, b: f64, metric: MetricName) -> Ordering {
    if metric.lower_is_better() {
        a.total_cmp(&b)
    } else {
        b.total_cmp(&a)
    }
}

/// Group, rank and keep the best `top_n` groups
pub fn aggregate(
    records: &[MetricRecord],
    group_by_dimension: DimensionName,
    metric: MetricName,
    top_n: usize,
) -> Result<Vec<AggregationRow>, ProcessingError> {
    if top_n == 0 {
        return Err(ProcessingError::InvalidArgument(
            "top_n must be at least 1".to_string(),
        ));
    }

    let mut rows = group_by(records, group_by_dimension);
    rank(&mut rows, metric);
    rows.truncate(top_n);

    Ok(rows)
}
