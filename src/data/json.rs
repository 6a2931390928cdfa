// JSON record source and sink implementation
// Author: Gabriel Demetrios Lafis

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use super::{DataError, MetricRecord, RecordSet, RecordSink, RecordSource, SourceType};

/// JSON record source
///
/// Expects an array of flat objects, one per record.
pub struct JsonSource {
    path: String,
}

impl JsonSource {
    /// Create a new JSON record source
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        JsonSource {
            path: path.as_ref().to_string_lossy().to_string(),
        }
    }
}

impl RecordSource for JsonSource {
    fn read(&self) -> Result<RecordSet, DataError> {
        let file = File::open(&self.path).map_err(DataError::IoError)?;
        let reader = BufReader::new(file);

        let records: Vec<MetricRecord> = serde_json::from_reader(reader)
            .map_err(|e| DataError::ParseError(e.to_string()))?;

        let mut set = RecordSet::from_records(records);
        set.metadata.add("source".to_string(), "json".to_string());
        set.metadata.add("path".to_string(), self.path.clone());

        Ok(set)
    }

    fn name(&self) -> &str {
        &self.path
    }

    fn source_type(&self) -> SourceType {
        SourceType::CachedFile
    }
}

/// JSON record sink
pub struct JsonSink {
    path: String,
    pretty: bool,
}

impl JsonSink {
    /// Create a new JSON record sink
    pub fn new<P: AsRef<Path>>(path: P, pretty: bool) -> Self {
        JsonSink {
            path: path.as_ref().to_string_lossy().to_string(),
            pretty,
        }
    }
}

impl RecordSink for JsonSink {
    fn write(&self, data: &RecordSet) -> Result<(), DataError> {
        let file = File::create(&self.path).map_err(DataError::IoError)?;
        let writer = BufWriter::new(file);

        if self.pretty {
            serde_json::to_writer_pretty(writer, &data.records)
                .map_err(|e| DataError::IoError(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
        } else {
            serde_json::to_writer(writer, &data.records)
                .map_err(|e| DataError::IoError(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
        }

        Ok(())
    }

    fn name(&self) -> &str {
        &self.path
    }
}
