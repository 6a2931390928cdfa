// Data module for search analytics records and their file formats
// Author: Gabriel Demetrios Lafis

mod csv;
mod json;
mod mock;
mod schema;

pub use csv::*;
pub use json::*;
pub use mock::*;
pub use schema::*;

use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Represents a source of metric records
pub trait RecordSource {
    /// Read records from the source
    fn read(&self) -> Result<RecordSet, DataError>;

    /// Get the source name
    fn name(&self) -> &str;

    /// Get the source type
    fn source_type(&self) -> SourceType;
}

/// Represents a destination for metric records
pub trait RecordSink {
    /// Write records to the sink
    fn write(&self, data: &RecordSet) -> Result<(), DataError>;

    /// Get the sink name
    fn name(&self) -> &str;
}

/// One row of search analytics data
///
/// Only the dimensions requested for the fetch that produced the row are
/// present in `dimension_values`. `ctr` is on the percentage scale.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricRecord {
    #[serde(flatten)]
    pub dimension_values: BTreeMap<DimensionName, String>,
    #[serde(default)]
    pub clicks: u64,
    #[serde(default)]
    pub impressions: u64,
    #[serde(default)]
    pub ctr: f64,
    #[serde(default)]
    pub position: f64,
}

impl MetricRecord {
    /// Create a record with the given metrics and no dimensions
    pub fn new(clicks: u64, impressions: u64, ctr: f64, position: f64) -> Self {
        MetricRecord {
            dimension_values: BTreeMap::new(),
            clicks,
            impressions,
            ctr,
            position,
        }
    }

    /// Set a dimension value
    pub fn with_dimension<S: Into<String>>(mut self, dimension: DimensionName, value: S) -> Self {
        self.dimension_values.insert(dimension, value.into());
        self
    }

    /// Get a dimension value if the record carries it
    pub fn dimension(&self, dimension: DimensionName) -> Option<&str> {
        self.dimension_values.get(&dimension).map(String::as_str)
    }

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

/// An ordered collection of records with the dimension columns they use
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    pub dimensions: Vec<DimensionName>,
    pub records: Vec<MetricRecord>,
    pub metadata: Metadata,
}

impl RecordSet {
    /// Create a new empty record set with the given dimension columns
    pub fn new(dimensions: Vec<DimensionName>) -> Self {
        RecordSet {
            dimensions,
            records: Vec::new(),
            metadata: Metadata::new(),
        }
    }

    /// Build a record set whose columns are every dimension any record carries
    pub fn from_records(records: Vec<MetricRecord>) -> Self {
        let mut set = RecordSet::new(Vec::new());
        for record in records {
            set.add_record(record);
        }
        set
    }

    /// Append a record, extending the dimension columns when needed
    pub fn add_record(&mut self, record: MetricRecord) {
        let missing = record
            .dimension_values
            .keys()
            .any(|d| !self.dimensions.contains(d));

        if missing {
            let mut dims: Vec<DimensionName> = self.dimensions.clone();
            dims.extend(record.dimension_values.keys().copied());
            // Keep canonical order so files written from the set are stable
            self.dimensions = DimensionName::ALL
                .iter()
                .copied()
                .filter(|d| dims.contains(d))
                .collect();
        }

        self.records.push(record);
    }

    /// Get the number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the set is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consume the set and return its records
    pub fn into_records(self) -> Vec<MetricRecord> {
        self.records
    }
}

/// Free-form properties attached to a record set
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub properties: HashMap<String, String>,
}

impl Metadata {
    /// Create new empty metadata
    pub fn new() -> Self {
        Metadata {
            properties: HashMap::new(),
        }
    }

    /// Add a property to the metadata
    pub fn add(&mut self, key: String, value: String) {
        self.properties.insert(key, value);
    }

    /// Get a property from the metadata
    pub fn get(&self, key: &str) -> Option<&String> {
        self.properties.get(key)
    }
}

/// Where a record set came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Live,
    CachedFile,
    Synthetic,
    Memory,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Live => "live",
            SourceType::CachedFile => "cached_file",
            SourceType::Synthetic => "synthetic",
            SourceType::Memory => "memory",
        }
    }
}

/// Represents an error in the data module
#[derive(Debug)]
pub enum DataError {
    IoError(std::io::Error),
    ParseError(String),
    UnknownDimension(UnknownDimensionError),
    ValidationError(String),
    Other(String),
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DataError::IoError(err) => write!(f, "IO error: {}", err),
            DataError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            DataError::UnknownDimension(err) => write!(f, "Schema error: {}", err),
            DataError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            DataError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl Error for DataError {}

impl From<std::io::Error> for DataError {
    fn from(err: std::io::Error) -> Self {
        DataError::IoError(err)
    }
}

impl From<UnknownDimensionError> for DataError {
    fn from(err: UnknownDimensionError) -> Self {
        DataError::UnknownDimension(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_set_columns_follow_canonical_order() {
        let set = RecordSet::from_records(vec![
            MetricRecord::new(1, 10, 10.0, 3.0).with_dimension(DimensionName::Page, "/a"),
            MetricRecord::new(2, 20, 10.0, 4.0)
                .with_dimension(DimensionName::Date, "2024-01-01")
                .with_dimension(DimensionName::Query, "q"),
        ]);

        assert_eq!(
            set.dimensions,
            vec![DimensionName::Date, DimensionName::Query, DimensionName::Page]
        );
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_record_serializes_flat() {
        let record = MetricRecord::new(3, 30, 10.0, 2.5).with_dimension(DimensionName::Query, "rust");
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["query"], "rust");
        assert_eq!(json["clicks"], 3);

        let back: MetricRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
