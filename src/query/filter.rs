// Dimension filters and filter groups
// Author: Gabriel Demetrios Lafis

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data::DimensionName;
use super::QueryError;

/// Comparison applied by a dimension filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    Equals,
    Contains,
    NotEquals,
    NotContains,
    IncludingRegex,
    ExcludingRegex,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Equals => "equals",
            FilterOperator::Contains => "contains",
            FilterOperator::NotEquals => "notEquals",
            FilterOperator::NotContains => "notContains",
            FilterOperator::IncludingRegex => "includingRegex",
            FilterOperator::ExcludingRegex => "excludingRegex",
        }
    }
}

impl FromStr for FilterOperator {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s {
            "equals" => FilterOperator::Equals,
            "contains" => FilterOperator::Contains,
            "notEquals" => FilterOperator::NotEquals,
            "notContains" => FilterOperator::NotContains,
            "includingRegex" => FilterOperator::IncludingRegex,
            "excludingRegex" => FilterOperator::ExcludingRegex,
            _ => {
                return Err(QueryError::InvalidArgument(format!(
                    "unknown filter operator '{}'",
                    s
                )))
            }
        };
        Ok(op)
    }
}

/// How the filters inside a group combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupType {
    #[default]
    And,
    Or,
}

impl FromStr for GroupType {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "and" => Ok(GroupType::And),
            "or" => Ok(GroupType::Or),
            _ => Err(QueryError::InvalidArgument(format!("unknown group type '{}'", s))),
        }
    }
}

/// A single `{dimension, operator, expression}` condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionFilter {
    pub dimension: DimensionName,
    pub operator: FilterOperator,
    pub expression: String,
}

impl DimensionFilter {
    /// Create a filter from typed parts
    pub fn new<S: Into<String>>(
        dimension: DimensionName,
        operator: FilterOperator,
        expression: S,
    ) -> Result<Self, QueryError> {
        let expression = expression.into();

        if !dimension.is_filterable() {
            return Err(QueryError::InvalidArgument(format!(
                "dimension '{}' cannot be used in a filter",
                dimension
            )));
        }

        if expression.is_empty() {
            return Err(QueryError::InvalidArgument(
                "filter expression cannot be empty".to_string(),
            ));
        }

        Ok(DimensionFilter {
            dimension,
            operator,
            expression,
        })
    }

    /// Create a filter from untyped names, rejecting unknown dimensions
    pub fn parse(dimension: &str, operator: &str, expression: &str) -> Result<Self, QueryError> {
        let dimension: DimensionName = dimension.parse()?;
        let operator: FilterOperator = operator.parse()?;
        Self::new(dimension, operator, expression)
    }
}

impl fmt::Display for DimensionFilter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} '{}'", self.dimension, self.operator.as_str(), self.expression)
    }
}

/// A set of filters combined with `and` or `or`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterGroup {
    #[serde(default)]
    pub group_type: GroupType,
    pub filters: Vec<DimensionFilter>,
}

impl FilterGroup {
    /// Create a group with the default `and` combination
    pub fn new(filters: Vec<DimensionFilter>) -> Self {
        FilterGroup {
            group_type: GroupType::default(),
            filters,
        }
    }

    /// Set how the filters combine
    pub fn with_group_type(mut self, group_type: GroupType) -> Self {
        self.group_type = group_type;
        self
    }

    /// Add a filter to the group
    pub fn push(&mut self, filter: DimensionFilter) {
        self.filters.push(filter);
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_unknown_dimension() {
        let err = DimensionFilter::parse("city", "equals", "Jakarta").unwrap_err();
        assert!(matches!(err, QueryError::UnknownDimension(_)));
    }

    #[test]
    fn test_date_is_not_filterable() {
        let err = DimensionFilter::parse("date", "equals", "2024-01-01").unwrap_err();
        assert!(matches!(err, QueryError::InvalidArgument(_)));
    }

    #[test]
    fn test_group_defaults_to_and_on_the_wire() {
        let filter = DimensionFilter::parse("country", "equals", "idn").unwrap();
        let group = FilterGroup::new(vec![filter]);
        let json = serde_json::to_value(&group).unwrap();

        assert_eq!(json["groupType"], "and");
        assert_eq!(json["filters"][0]["dimension"], "country");
        assert_eq!(json["filters"][0]["operator"], "equals");

        let parsed: FilterGroup =
            serde_json::from_str(r#"{"filters":[{"dimension":"page","operator":"notContains","expression":"/admin"}]}"#)
                .unwrap();
        assert_eq!(parsed.group_type, GroupType::And);
        assert_eq!(parsed.filters[0].operator, FilterOperator::NotContains);
    }
}
