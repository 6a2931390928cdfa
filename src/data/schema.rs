// Dimension and metric names of search analytics rows
// Author: Gabriel Demetrios Lafis

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A categorical attribute search results can be grouped or filtered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DimensionName {
    Date,
    Query,
    Page,
    Country,
    Device,
    SearchAppearance,
}

impl DimensionName {
    /// All dimensions in canonical column order
    pub const ALL: [DimensionName; 6] = [
        DimensionName::Date,
        DimensionName::Query,
        DimensionName::Page,
        DimensionName::Country,
        DimensionName::Device,
        DimensionName::SearchAppearance,
    ];

    /// Get the wire name of the dimension
    pub fn as_str(&self) -> &'static str {
        match self {
            DimensionName::Date => "date",
            DimensionName::Query => "query",
            DimensionName::Page => "page",
            DimensionName::Country => "country",
            DimensionName::Device => "device",
            DimensionName::SearchAppearance => "searchAppearance",
        }
    }

    /// Whether the analytics API accepts this dimension inside a filter group
    pub fn is_filterable(&self) -> bool {
        !matches!(self, DimensionName::Date)
    }

    /// Parse a comma separated list such as `date,query,page`
    pub fn parse_list(list: &str) -> Result<Vec<DimensionName>, UnknownDimensionError> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(DimensionName::from_str)
            .collect()
    }
}

impl fmt::Display for DimensionName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DimensionName {
    type Err = UnknownDimensionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DimensionName::ALL
            .iter()
            .copied()
            .find(|d| d.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownDimensionError(s.to_string()))
    }
}

/// A numeric measure reported for every row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricName {
    Clicks,
    Impressions,
    Ctr,
    Position,
}

impl MetricName {
    pub const ALL: [MetricName; 4] = [
        MetricName::Clicks,
        MetricName::Impressions,
        MetricName::Ctr,
        MetricName::Position,
    ];

    /// Get the wire name of the metric
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::Clicks => "clicks",
            MetricName::Impressions => "impressions",
            MetricName::Ctr => "ctr",
            MetricName::Position => "position",
        }
    }

    /// Lower values rank first only for position
    pub fn lower_is_better(&self) -> bool {
        matches!(self, MetricName::Position)
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricName {
    type Err = UnknownMetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricName::ALL
            .iter()
            .copied()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownMetricError(s.to_string()))
    }
}

/// Raised when a dimension name is not one the API understands
#[derive(Debug, Clone, PartialEq, Error)]
#[error("unknown dimension '{0}'")]
pub struct UnknownDimensionError(pub String);

/// Raised when a metric name is not one of clicks, impressions, ctr or position
#[derive(Debug, Clone, PartialEq, Error)]
#[error("unknown metric '{0}'")]
pub struct UnknownMetricError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dimension_names() {
        assert_eq!("searchAppearance".parse::<DimensionName>().unwrap(), DimensionName::SearchAppearance);
        assert_eq!("Query".parse::<DimensionName>().unwrap(), DimensionName::Query);
        assert_eq!(
            "keyword".parse::<DimensionName>(),
            Err(UnknownDimensionError("keyword".to_string()))
        );
    }

    #[test]
    fn test_parse_dimension_list() {
        let dims = DimensionName::parse_list("date, query,page").unwrap();
        assert_eq!(dims, vec![DimensionName::Date, DimensionName::Query, DimensionName::Page]);
        assert!(DimensionName::parse_list("date,city").is_err());
    }

    #[test]
    fn test_metric_ordering_direction() {
        assert!(MetricName::Position.lower_is_better());
        assert!(!MetricName::Ctr.lower_is_better());
        assert!("bounce".parse::<MetricName>().is_err());
    }
}
