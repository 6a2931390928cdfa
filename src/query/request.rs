// Request descriptors and their wire body
// Author: Gabriel Demetrios Lafis

use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data::DimensionName;
use super::{FilterGroup, QueryError};

/// Search surface the rows are reported for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchType {
    #[default]
    Web,
    Image,
    Video,
    News,
    GoogleNews,
    Discover,
}

/// Whether to include fresh, not yet finalized data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataState {
    #[default]
    All,
    Fresh,
}

/// How the API aggregates rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AggregationType {
    #[default]
    Auto,
    ByPage,
    ByProperty,
}

impl FromStr for SearchType {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "web" => Ok(SearchType::Web),
            "image" => Ok(SearchType::Image),
            "video" => Ok(SearchType::Video),
            "news" => Ok(SearchType::News),
            "googleNews" => Ok(SearchType::GoogleNews),
            "discover" => Ok(SearchType::Discover),
            _ => Err(QueryError::InvalidArgument(format!("unknown search type '{}'", s))),
        }
    }
}

impl FromStr for DataState {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(DataState::All),
            "fresh" => Ok(DataState::Fresh),
            _ => Err(QueryError::InvalidArgument(format!("unknown data state '{}'", s))),
        }
    }
}

impl FromStr for AggregationType {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(AggregationType::Auto),
            "byPage" => Ok(AggregationType::ByPage),
            "byProperty" => Ok(AggregationType::ByProperty),
            _ => Err(QueryError::InvalidArgument(format!("unknown aggregation type '{}'", s))),
        }
    }
}

/// A validated description of one fetch
///
/// Built by [`super::QueryBuilder`]; the fields are public for reading but
/// every descriptor produced by the builder satisfies `start_date <= end_date`,
/// a non-empty dimension list and `1 <= row_limit <= 25000`.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub site: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub dimensions: Vec<DimensionName>,
    pub row_limit: u32,
    pub start_row: u32,
    pub search_type: SearchType,
    pub data_state: DataState,
    pub aggregation_type: AggregationType,
    pub filter_groups: Vec<FilterGroup>,
}

impl RequestDescriptor {
    /// The descriptor for the page following this one
    pub fn next_page(&self) -> RequestDescriptor {
        RequestDescriptor {
            start_row: self.start_row.saturating_add(self.row_limit),
            ..self.clone()
        }
    }

    /// Build the JSON body sent to the query endpoint
    ///
    /// Options left at their API defaults are omitted.
    pub fn to_body(&self) -> QueryRequestBody {
        QueryRequestBody {
            start_date: self.start_date.format("%Y-%m-%d").to_string(),
            end_date: self.end_date.format("%Y-%m-%d").to_string(),
            dimensions: self.dimensions.clone(),
            row_limit: self.row_limit,
            start_row: self.start_row,
            search_type: Some(self.search_type).filter(|t| *t != SearchType::Web),
            data_state: Some(self.data_state).filter(|s| *s != DataState::All),
            aggregation_type: Some(self.aggregation_type).filter(|a| *a != AggregationType::Auto),
            dimension_filter_groups: self.filter_groups.clone(),
        }
    }
}

/// Request body of `searchAnalytics/query`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequestBody {
    pub start_date: String,
    pub end_date: String,
    pub dimensions: Vec<DimensionName>,
    pub row_limit: u32,
    pub start_row: u32,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none", default)]
    pub search_type: Option<SearchType>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data_state: Option<DataState>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub aggregation_type: Option<AggregationType>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub dimension_filter_groups: Vec<FilterGroup>,
}
