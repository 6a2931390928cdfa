// Removal of rows that reference a non-public domain
// Author: Gabriel Demetrios Lafis

use log::info;

use crate::data::{DimensionName, MetricRecord, RecordSet};
use super::{ProcessingError, ProcessorType, RecordProcessor};

/// Default blocked substring, an internal backend host
pub const DEFAULT_BLOCKED_SUBSTRING: &str = "superapp.backend.apudsi.com";

/// Metadata key holding how many rows the last redaction removed
pub const REDACTED_COUNT_KEY: &str = "redacted_count";

/// Drop records whose page or query contains `blocked`, ignoring case
///
/// Returns the kept records in their original order together with the
/// number removed. An empty `blocked` removes nothing.
pub fn redact(records: Vec<MetricRecord>, blocked: &str) -> (Vec<MetricRecord>, usize) {
    if blocked.is_empty() {
        return (records, 0);
    }

    let needle = blocked.to_lowercase();
    let before = records.len();
    let kept: Vec<MetricRecord> = records
        .into_iter()
        .filter(|record| !is_blocked(record, &needle))
        .collect();
    let removed = before - kept.len();

    (kept, removed)
}

fn is_blocked(record: &MetricRecord, needle: &str) -> bool {
    [DimensionName::Page, DimensionName::Query]
        .iter()
        .filter_map(|d| record.dimension(*d))
        .any(|value| value.to_lowercase().contains(needle))
}

/// Processor form of [`redact`]
pub struct RedactionFilter {
    name: String,
    blocked: String,
}

impl RedactionFilter {
    /// Create a new filter for the given substring
    pub fn new(blocked: &str) -> Self {
        RedactionFilter {
            name: format!("redact_{}", blocked),
            blocked: blocked.to_string(),
        }
    }

    pub fn blocked(&self) -> &str {
        &self.blocked
    }

    /// Redact a record set by value, keeping its columns and metadata
    pub fn apply_to_set(&self, set: RecordSet) -> (RecordSet, usize) {
        let RecordSet {
            dimensions,
            records,
            mut metadata,
        } = set;

        let (records, removed) = redact(records, &self.blocked);
        if removed > 0 {
            info!("Redacted {} rows containing '{}'", removed, self.blocked);
        }
        metadata.add(REDACTED_COUNT_KEY.to_string(), removed.to_string());

        (
            RecordSet {
                dimensions,
                records,
                metadata,
            },
            removed,
        )
    }
}

impl RecordProcessor for RedactionFilter {
    fn process(&self, input: &RecordSet) -> Result<RecordSet, ProcessingError> {
        let (output, _) = self.apply_to_set(input.clone());
        Ok(output)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn processor_type(&self) -> ProcessorType {
        ProcessorType::Redact
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(value: &str) -> MetricRecord {
        MetricRecord::new(1, 10, 10.0, 1.0).with_dimension(DimensionName::Page, value)
    }

    #[test]
    fn test_redact_matches_page_case_insensitively() {
        let records = vec![
            page("https://apudsi.com/"),
            page("https://SUPERAPP.backend.apudsi.com/x"),
        ];

        let (kept, removed) = redact(records, DEFAULT_BLOCKED_SUBSTRING);
        assert_eq!(removed, 1);
        assert_eq!(kept, vec![page("https://apudsi.com/")]);
    }

    #[test]
    fn test_redact_matches_query_independently() {
        let query = MetricRecord::new(1, 10, 10.0, 1.0)
            .with_dimension(DimensionName::Query, "superapp.backend.apudsi.com login");
        let country = MetricRecord::new(1, 10, 10.0, 1.0).with_dimension(DimensionName::Country, "IDN");

        let (kept, removed) = redact(vec![query, country.clone()], DEFAULT_BLOCKED_SUBSTRING);
        assert_eq!(removed, 1);
        assert_eq!(kept, vec![country]);
    }

    #[test]
    fn test_empty_substring_removes_nothing() {
        let records = vec![page("/a"), page("/b")];
        let (kept, removed) = redact(records.clone(), "");
        assert_eq!(removed, 0);
        assert_eq!(kept, records);
    }

    #[test]
    fn test_filter_records_count_in_metadata() {
        let set = RecordSet::from_records(vec![page("/a"), page("/secret")]);
        let output = RedactionFilter::new("SECRET").process(&set).unwrap();

        assert_eq!(output.len(), 1);
        assert_eq!(output.metadata.get(REDACTED_COUNT_KEY).map(String::as_str), Some("1"));
        assert_eq!(output.dimensions, vec![DimensionName::Page]);
    }
}
