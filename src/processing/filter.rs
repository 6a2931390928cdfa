// Filter operations for record sets
// Author: Gabriel Demetrios Lafis

use regex::Regex;

use crate::data::{MetricRecord, RecordSet};
use crate::query::{DimensionFilter, FilterGroup, FilterOperator, GroupType};
use super::{ProcessingError, ProcessorType, RecordProcessor};

type Predicate = Box<dyn Fn(&MetricRecord) -> bool + Send + Sync>;

/// Filter records based on a predicate
pub struct FilterProcessor {
    name: String,
    predicate: Predicate,
}

impl FilterProcessor {
    /// Create a new filter processor with a predicate function
    pub fn new<F>(name: &str, predicate: F) -> Self
    where
        F: Fn(&MetricRecord) -> bool + Send + Sync + 'static,
    {
        FilterProcessor {
            name: name.to_string(),
            predicate: Box::new(predicate),
        }
    }

    /// Apply an API filter group to records already loaded
    ///
    /// Matches the way the API evaluates filters: `equals` is exact,
    /// `contains` ignores case and regex operators use RE2-compatible syntax.
    /// A record without the dimension only passes the negated operators.
    /// An empty group keeps every record.
    pub fn from_filter_group(group: &FilterGroup) -> Result<Self, ProcessingError> {
        let predicates = group
            .filters
            .iter()
            .map(predicate)
            .collect::<Result<Vec<_>, _>>()?;

        let name = group
            .filters
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join(match group.group_type {
                GroupType::And => " and ",
                GroupType::Or => " or ",
            });

        let processor = match group.group_type {
            _ if predicates.is_empty() => Self::new(&name, |_| true),
            GroupType::And => Self::new(&name, move |record| predicates.iter().all(|p| p(record))),
            GroupType::Or => Self::new(&name, move |record| predicates.iter().any(|p| p(record))),
        };

        Ok(processor)
    }

    /// Check a single record
    pub fn matches(&self, record: &MetricRecord) -> bool {
        (self.predicate)(record)
    }
}

fn predicate(filter: &DimensionFilter) -> Result<Predicate, ProcessingError> {
    let dimension = filter.dimension;
    let expression = filter.expression.clone();

    let predicate: Predicate = match filter.operator {
        FilterOperator::Equals => Box::new(move |record: &MetricRecord| {
            record.dimension(dimension) == Some(expression.as_str())
        }),
        FilterOperator::NotEquals => Box::new(move |record: &MetricRecord| {
            record.dimension(dimension) != Some(expression.as_str())
        }),
        FilterOperator::Contains | FilterOperator::NotContains => {
            let needle = expression.to_lowercase();
            let negate = filter.operator == FilterOperator::NotContains;
            Box::new(move |record: &MetricRecord| {
                let found = record
                    .dimension(dimension)
                    .map_or(false, |v| v.to_lowercase().contains(needle.as_str()));
                found != negate
            })
        }
        FilterOperator::IncludingRegex | FilterOperator::ExcludingRegex => {
            let pattern = Regex::new(&expression).map_err(|e| {
                ProcessingError::InvalidArgument(format!("invalid regex '{}': {}", expression, e))
            })?;
            let negate = filter.operator == FilterOperator::ExcludingRegex;
            Box::new(move |record: &MetricRecord| {
                let found = record
                    .dimension(dimension)
                    .map_or(false, |v| pattern.is_match(v));
                found != negate
            })
        }
    };

    Ok(predicate)
}

impl RecordProcessor for FilterProcessor {
    fn process(&self, input: &RecordSet) -> Result<RecordSet, ProcessingError> {
        let mut result = RecordSet::new(input.dimensions.clone());
        result.records = input
            .records
            .iter()
            .filter(|record| self.matches(record))
            .cloned()
            .collect();
        result.metadata = input.metadata.clone();

        Ok(result)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn processor_type(&self) -> ProcessorType {
        ProcessorType::Filter
    }
}

/// Limit the number of records in a set
pub struct LimitProcessor {
    limit: usize,
}

impl LimitProcessor {
    /// Create a new limit processor
    pub fn new(limit: usize) -> Self {
        LimitProcessor { limit }
    }
}

impl RecordProcessor for LimitProcessor {
    fn process(&self, input: &RecordSet) -> Result<RecordSet, ProcessingError> {
        let mut result = RecordSet::new(input.dimensions.clone());
        result.records = input.records.iter().take(self.limit).cloned().collect();
        result.metadata = input.metadata.clone();

        Ok(result)
    }

    fn name(&self) -> &str {
        "limit"
    }

    fn processor_type(&self) -> ProcessorType {
        ProcessorType::Limit
    }
}

/// Skip a number of records in a set
pub struct SkipProcessor {
    skip: usize,
}

impl SkipProcessor {
    /// Create a new skip processor
    pub fn new(skip: usize) -> Self {
        SkipProcessor { skip }
    }
}

impl RecordProcessor for SkipProcessor {
    fn process(&self, input: &RecordSet) -> Result<RecordSet, ProcessingError> {
        let mut result = RecordSet::new(input.dimensions.clone());
        result.records = input.records.iter().skip(self.skip).cloned().collect();
        result.metadata = input.metadata.clone();

        Ok(result)
    }

    fn name(&self) -> &str {
        "skip"
    }

    fn processor_type(&self) -> ProcessorType {
        ProcessorType::Limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DimensionName;

    fn sample() -> RecordSet {
        RecordSet::from_records(vec![
            MetricRecord::new(1, 10, 10.0, 1.0)
                .with_dimension(DimensionName::Device, "MOBILE")
                .with_dimension(DimensionName::Query, "Rust tutorial"),
            MetricRecord::new(2, 20, 10.0, 2.0)
                .with_dimension(DimensionName::Device, "DESKTOP")
                .with_dimension(DimensionName::Query, "python tutorial"),
            MetricRecord::new(3, 30, 10.0, 3.0).with_dimension(DimensionName::Date, "2024-01-01"),
        ])
    }

    fn filter(dimension: DimensionName, operator: FilterOperator, expression: &str) -> DimensionFilter {
        DimensionFilter::new(dimension, operator, expression).unwrap()
    }

    fn single(dimension: DimensionName, operator: FilterOperator, expression: &str) -> FilterProcessor {
        FilterProcessor::from_filter_group(&FilterGroup::new(vec![filter(dimension, operator, expression)]))
            .unwrap()
    }

    fn kept(processor: &FilterProcessor) -> Vec<u64> {
        processor
            .process(&sample())
            .unwrap()
            .records
            .iter()
            .map(|r| r.clicks)
            .collect()
    }

    #[test]
    fn test_not_equals_keeps_absent_values() {
        let processor = single(DimensionName::Device, FilterOperator::NotEquals, "MOBILE");
        assert_eq!(kept(&processor), vec![2, 3]);
    }

    #[test]
    fn test_contains_ignores_case() {
        let processor = single(DimensionName::Query, FilterOperator::Contains, "rust");
        assert_eq!(kept(&processor), vec![1]);
    }

    #[test]
    fn test_regex_operators() {
        let including = single(DimensionName::Query, FilterOperator::IncludingRegex, "^(Rust|python) ");
        assert_eq!(kept(&including), vec![1, 2]);

        let excluding = single(DimensionName::Query, FilterOperator::ExcludingRegex, "^python");
        assert_eq!(kept(&excluding), vec![1, 3]);
    }

    #[test]
    fn test_invalid_regex_is_rejected() {
        let group = FilterGroup::new(vec![filter(
            DimensionName::Query,
            FilterOperator::IncludingRegex,
            "(unclosed",
        )]);
        let result = FilterProcessor::from_filter_group(&group);
        assert!(matches!(result, Err(ProcessingError::InvalidArgument(_))));
    }

    #[test]
    fn test_group_combination() {
        let filters = vec![
            filter(DimensionName::Device, FilterOperator::Equals, "MOBILE"),
            filter(DimensionName::Query, FilterOperator::Contains, "python"),
        ];

        let all = FilterProcessor::from_filter_group(&FilterGroup::new(filters.clone())).unwrap();
        assert!(kept(&all).is_empty());

        let any = FilterProcessor::from_filter_group(
            &FilterGroup::new(filters).with_group_type(GroupType::Or),
        )
        .unwrap();
        assert_eq!(kept(&any), vec![1, 2]);

        let empty = FilterProcessor::from_filter_group(&FilterGroup::new(Vec::new())).unwrap();
        assert_eq!(kept(&empty), vec![1, 2, 3]);
    }

    #[test]
    fn test_skip_and_limit() {
        let skipped = SkipProcessor::new(1).process(&sample()).unwrap();
        let limited = LimitProcessor::new(1).process(&skipped).unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited.records[0].clicks, 2);
    }
}
