// API request and response models
// Author: Gabriel Demetrios Lafis

use serde::{Deserialize, Serialize};

use crate::data::{MetricRecord, RecordSet};
use crate::processing::{AggregationRow, SummaryMetrics, REDACTED_COUNT_KEY};
use crate::query::DateRange;
use crate::session::SiteId;

/// Query string selecting a named date range
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RangeQuery {
    pub range: Option<String>,
}

/// Query string of the records listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordsQuery {
    pub range: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Query string of the ranking endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopQuery {
    pub metric: Option<String>,
    pub top_n: Option<usize>,
    pub range: Option<String>,
}

/// Where a response's records came from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadInfo {
    pub source: String,
    pub range: DateRangeModel,
    pub redacted_count: usize,
    pub notices: Vec<String>,
}

impl LoadInfo {
    /// Read the provenance the fallback chain left in a set's metadata
    pub fn from_set(set: &RecordSet, range: DateRange) -> Self {
        let metadata = &set.metadata;
        LoadInfo {
            source: metadata.get("source").cloned().unwrap_or_default(),
            range: range.into(),
            redacted_count: metadata
                .get(REDACTED_COUNT_KEY)
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            notices: metadata
                .get("notices")
                .map(|n| n.lines().map(str::to_string).collect())
                .unwrap_or_default(),
        }
    }
}

/// Date window as `YYYY-MM-DD` strings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateRangeModel {
    pub start_date: String,
    pub end_date: String,
}

impl From<DateRange> for DateRangeModel {
    fn from(range: DateRange) -> Self {
        DateRangeModel {
            start_date: range.start_date.to_string(),
            end_date: range.end_date.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordsResponse {
    pub info: LoadInfo,
    pub total: usize,
    pub records: Vec<MetricRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopResponse {
    pub info: LoadInfo,
    pub dimension: String,
    pub metric: String,
    pub rows: Vec<AggregationRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub info: LoadInfo,
    pub summary: SummaryMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeriesResponse {
    pub info: LoadInfo,
    pub points: Vec<AggregationRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitesResponse {
    pub sites: Vec<SiteId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangesResponse {
    pub ranges: Vec<String>,
    pub default: String,
}

/// Body of every error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
