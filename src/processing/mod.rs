// Processing module for redaction, ranking and summaries
// Author: Gabriel Demetrios Lafis

mod aggregate;
mod filter;
mod redact;
mod summary;

pub use aggregate::*;
pub use filter::*;
pub use redact::*;
pub use summary::*;

use std::error::Error;
use std::fmt;

use crate::data::{DataError, RecordSet};

/// Represents a processor that transforms a record set
pub trait RecordProcessor {
    /// Process a record set and return a new record set
    fn process(&self, input: &RecordSet) -> Result<RecordSet, ProcessingError>;

    /// Get the processor name
    fn name(&self) -> &str;

    /// Get the processor type
    fn processor_type(&self) -> ProcessorType;
}

/// Represents a processor type
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessorType {
    Redact,
    Filter,
    Limit,
    Custom(String),
}

/// Represents an error in the processing module
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessingError {
    DataError(String),
    InvalidArgument(String),
    Other(String),
}

impl fmt::Display for ProcessingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProcessingError::DataError(msg) => write!(f, "Data error: {}", msg),
            ProcessingError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            ProcessingError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl Error for ProcessingError {}

impl From<DataError> for ProcessingError {
    fn from(err: DataError) -> Self {
        ProcessingError::DataError(err.to_string())
    }
}

/// Pipeline for chaining multiple processors
pub struct Pipeline {
    name: String,
    processors: Vec<Box<dyn RecordProcessor>>,
}

impl Pipeline {
    /// Create a new pipeline with the given name
    pub fn new(name: &str) -> Self {
        Pipeline {
            name: name.to_string(),
            processors: Vec::new(),
        }
    }

    /// Add a processor to the pipeline
    pub fn add<P: RecordProcessor + 'static>(mut self, processor: P) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Execute the pipeline on a record set
    pub fn execute(&self, input: &RecordSet) -> Result<RecordSet, ProcessingError> {
        let mut current = input.clone();

        for processor in &self.processors {
            current = processor.process(&current)?;
        }

        Ok(current)
    }
}

impl RecordProcessor for Pipeline {
    fn process(&self, input: &RecordSet) -> Result<RecordSet, ProcessingError> {
        self.execute(input)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn processor_type(&self) -> ProcessorType {
        ProcessorType::Custom("Pipeline".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DimensionName, MetricRecord};

    #[test]
    fn test_pipeline_runs_processors_in_order() {
        let set = RecordSet::from_records(vec![
            MetricRecord::new(1, 10, 10.0, 2.0).with_dimension(DimensionName::Page, "/a"),
            MetricRecord::new(2, 10, 20.0, 3.0).with_dimension(DimensionName::Page, "/hidden"),
            MetricRecord::new(3, 10, 30.0, 4.0).with_dimension(DimensionName::Page, "/b"),
        ]);

        let pipeline = Pipeline::new("test")
            .add(RedactionFilter::new("hidden"))
            .add(LimitProcessor::new(1));

        let result = pipeline.execute(&set).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.records[0].dimension(DimensionName::Page), Some("/a"));
        assert_eq!(pipeline.len(), 2);
        assert_eq!(pipeline.name(), "test");
    }
}
