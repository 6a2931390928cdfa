// Query builder for request descriptors
// Author: Gabriel Demetrios Lafis

use chrono::NaiveDate;

use crate::data::DimensionName;
use super::{
    AggregationType, DataState, DateRange, FilterGroup, QueryError, RequestDescriptor, SearchType,
    DEFAULT_ROW_LIMIT, MAX_ROW_LIMIT,
};

/// Builder for [`RequestDescriptor`]
///
/// Pure; validation happens in [`QueryBuilder::build`].
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    site: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    dimensions: Vec<DimensionName>,
    row_limit: u32,
    start_row: u32,
    search_type: SearchType,
    data_state: DataState,
    aggregation_type: AggregationType,
    filter_groups: Vec<FilterGroup>,
}

impl QueryBuilder {
    /// Create a new builder for a site and date window
    pub fn new<S: Into<String>>(site: S, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        QueryBuilder {
            site: site.into(),
            start_date,
            end_date,
            dimensions: Vec::new(),
            row_limit: DEFAULT_ROW_LIMIT,
            start_row: 0,
            search_type: SearchType::default(),
            data_state: DataState::default(),
            aggregation_type: AggregationType::default(),
            filter_groups: Vec::new(),
        }
    }

    /// Create a new builder from a resolved date range
    pub fn for_range<S: Into<String>>(site: S, range: &DateRange) -> Self {
        Self::new(site, range.start_date, range.end_date)
    }

    /// Set the dimensions; their order is the order of the row keys
    pub fn dimensions(mut self, dimensions: Vec<DimensionName>) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Add a single dimension
    pub fn dimension(mut self, dimension: DimensionName) -> Self {
        self.dimensions.push(dimension);
        self
    }

    /// Set dimensions from their wire names
    pub fn dimension_names(self, names: &[&str]) -> Result<Self, QueryError> {
        let dimensions = names
            .iter()
            .map(|n| n.parse::<DimensionName>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.dimensions(dimensions))
    }

    /// Set the row limit; clamped to the API ceiling on build
    pub fn row_limit(mut self, row_limit: u32) -> Self {
        self.row_limit = row_limit;
        self
    }

    /// Set the pagination offset
    pub fn start_row(mut self, start_row: u32) -> Self {
        self.start_row = start_row;
        self
    }

    pub fn search_type(mut self, search_type: SearchType) -> Self {
        self.search_type = search_type;
        self
    }

    pub fn data_state(mut self, data_state: DataState) -> Self {
        self.data_state = data_state;
        self
    }

    pub fn aggregation_type(mut self, aggregation_type: AggregationType) -> Self {
        self.aggregation_type = aggregation_type;
        self
    }

    /// Add a filter group
    pub fn filter_group(mut self, group: FilterGroup) -> Self {
        self.filter_groups.push(group);
        self
    }

    /// Replace all filter groups
    pub fn filter_groups(mut self, groups: Vec<FilterGroup>) -> Self {
        self.filter_groups = groups;
        self
    }

    /// Validate and produce the descriptor
    pub fn build(self) -> Result<RequestDescriptor, QueryError> {
        if self.start_date > self.end_date {
            return Err(QueryError::InvalidRange {
                start: self.start_date,
                end: self.end_date,
            });
        }

        if self.dimensions.is_empty() {
            return Err(QueryError::InvalidArgument(
                "at least one dimension is required".to_string(),
            ));
        }

        if self.site.trim().is_empty() {
            return Err(QueryError::InvalidArgument("site cannot be empty".to_string()));
        }

        // Empty groups would be rejected by the API; they mean "no filtering"
        let filter_groups = self
            .filter_groups
            .into_iter()
            .filter(|g| !g.is_empty())
            .collect();

        Ok(RequestDescriptor {
            site: self.site,
            start_date: self.start_date,
            end_date: self.end_date,
            dimensions: self.dimensions,
            row_limit: self.row_limit.clamp(1, MAX_ROW_LIMIT),
            start_row: self.start_row,
            search_type: self.search_type,
            data_state: self.data_state,
            aggregation_type: self.aggregation_type,
            filter_groups,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{DimensionFilter, FilterOperator, GroupType};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn builder() -> QueryBuilder {
        QueryBuilder::new("https://apudsi.com/", date("2024-01-01"), date("2024-01-31"))
            .dimensions(vec![DimensionName::Date, DimensionName::Query])
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let err = QueryBuilder::new("sc-domain:apudsi.com", date("2024-02-01"), date("2024-01-01"))
            .dimension(DimensionName::Query)
            .build()
            .unwrap_err();

        assert!(matches!(err, QueryError::InvalidRange { .. }));
    }

    #[test]
    fn test_row_limit_is_clamped() {
        assert_eq!(builder().row_limit(100_000).build().unwrap().row_limit, 25_000);
        assert_eq!(builder().row_limit(0).build().unwrap().row_limit, 1);
        assert_eq!(builder().build().unwrap().row_limit, 5_000);
    }

    #[test]
    fn test_missing_dimensions_are_rejected() {
        let err = QueryBuilder::new("s", date("2024-01-01"), date("2024-01-01"))
            .build()
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidArgument(_)));
    }

    #[test]
    fn test_unknown_dimension_name() {
        let err = QueryBuilder::new("s", date("2024-01-01"), date("2024-01-01"))
            .dimension_names(&["date", "keyword"])
            .unwrap_err();
        assert!(matches!(err, QueryError::UnknownDimension(_)));
    }

    #[test]
    fn test_body_omits_defaults() {
        let body = serde_json::to_value(builder().build().unwrap().to_body()).unwrap();

        assert_eq!(body["startDate"], "2024-01-01");
        assert_eq!(body["endDate"], "2024-01-31");
        assert_eq!(body["dimensions"], serde_json::json!(["date", "query"]));
        assert_eq!(body["rowLimit"], 5000);
        assert_eq!(body["startRow"], 0);
        assert!(body.get("type").is_none());
        assert!(body.get("dataState").is_none());
        assert!(body.get("aggregationType").is_none());
        assert!(body.get("dimensionFilterGroups").is_none());
    }

    #[test]
    fn test_body_carries_options_and_filters() {
        let filter = DimensionFilter::new(DimensionName::Device, FilterOperator::Equals, "MOBILE").unwrap();
        let descriptor = builder()
            .search_type(SearchType::GoogleNews)
            .data_state(DataState::Fresh)
            .aggregation_type(AggregationType::ByPage)
            .filter_group(FilterGroup::new(vec![filter]).with_group_type(GroupType::Or))
            .filter_group(FilterGroup::new(Vec::new()))
            .build()
            .unwrap();

        assert_eq!(descriptor.filter_groups.len(), 1);

        let body = serde_json::to_value(descriptor.to_body()).unwrap();
        assert_eq!(body["type"], "googleNews");
        assert_eq!(body["dataState"], "fresh");
        assert_eq!(body["aggregationType"], "byPage");
        assert_eq!(body["dimensionFilterGroups"][0]["groupType"], "or");
        assert_eq!(body["dimensionFilterGroups"][0]["filters"][0]["expression"], "MOBILE");
    }

    #[test]
    fn test_next_page_advances_offset() {
        let descriptor = builder().row_limit(1000).start_row(2000).build().unwrap();
        assert_eq!(descriptor.next_page().start_row, 3000);
    }

    #[test]
    fn test_option_names_parse() {
        assert_eq!("discover".parse::<SearchType>().unwrap(), SearchType::Discover);
        assert_eq!("byProperty".parse::<AggregationType>().unwrap(), AggregationType::ByProperty);
        assert!("stale".parse::<DataState>().is_err());
    }
}
