// CSV record source and sink implementation
// Author: Gabriel Demetrios Lafis

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use super::{
    DataError, DimensionName, MetricName, MetricRecord, RecordSet, RecordSink, RecordSource,
    SourceType,
};

/// A recognised CSV column
#[derive(Debug, Clone, Copy)]
enum Column {
    Dimension(DimensionName),
    Metric(MetricName),
    Ignored,
}

impl Column {
    fn from_header(header: &str) -> Self {
        let header = header.trim();
        if let Ok(dimension) = header.parse::<DimensionName>() {
            Column::Dimension(dimension)
        } else if let Ok(metric) = header.parse::<MetricName>() {
            Column::Metric(metric)
        } else {
            Column::Ignored
        }
    }
}

/// CSV record source
///
/// Reads flat tabular dumps such as the fallback data file. Columns may
/// appear in any order; unknown columns are skipped and empty cells mean
/// the record does not carry that dimension.
pub struct CsvSource {
    path: String,
    delimiter: char,
}

impl CsvSource {
    /// Create a new CSV record source
    pub fn new<P: AsRef<Path>>(path: P, delimiter: char) -> Self {
        CsvSource {
            path: path.as_ref().to_string_lossy().to_string(),
            delimiter,
        }
    }

    /// Read records from any reader
    pub fn read_from<R: Read>(reader: R, delimiter: char) -> Result<RecordSet, DataError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(delimiter as u8)
            .has_headers(true)
            .from_reader(reader);

        let columns: Vec<Column> = csv_reader
            .headers()
            .map_err(|e| DataError::ParseError(e.to_string()))?
            .iter()
            .map(Column::from_header)
            .collect();

        let present: Vec<DimensionName> = columns
            .iter()
            .filter_map(|c| match c {
                Column::Dimension(d) => Some(*d),
                _ => None,
            })
            .collect();

        // Canonical order, one entry per dimension however often it repeats
        let dimensions: Vec<DimensionName> = DimensionName::ALL
            .iter()
            .copied()
            .filter(|d| present.contains(d))
            .collect();

        let mut set = RecordSet::new(dimensions);

        for (line, result) in csv_reader.records().enumerate() {
            let row = result.map_err(|e| DataError::ParseError(e.to_string()))?;
            let mut record = MetricRecord::default();

            for (column, field) in columns.iter().zip(row.iter()) {
                let field = field.trim();
                if field.is_empty() {
                    continue;
                }

                match column {
                    Column::Dimension(d) => {
                        record.dimension_values.insert(*d, field.to_string());
                    }
                    Column::Metric(MetricName::Clicks) => record.clicks = parse_count(field, line)?,
                    Column::Metric(MetricName::Impressions) => {
                        record.impressions = parse_count(field, line)?
                    }
                    Column::Metric(MetricName::Ctr) => record.ctr = parse_float(field, line)?,
                    Column::Metric(MetricName::Position) => {
                        record.position = parse_float(field, line)?
                    }
                    Column::Ignored => {}
                }
            }

            set.add_record(record);
        }

        Ok(set)
    }

    /// Write records to any writer
    pub fn write_to<W: Write>(writer: W, data: &RecordSet, delimiter: char) -> Result<(), DataError> {
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(delimiter as u8)
            .from_writer(writer);

        let mut headers: Vec<&str> = data.dimensions.iter().map(|d| d.as_str()).collect();
        headers.extend(MetricName::ALL.iter().map(|m| m.as_str()));

        csv_writer
            .write_record(&headers)
            .map_err(|e| DataError::IoError(std::io::Error::new(std::io::ErrorKind::Other, e)))?;

        for record in &data.records {
            let mut row: Vec<String> = data
                .dimensions
                .iter()
                .map(|d| record.dimension(*d).unwrap_or("").to_string())
                .collect();
            row.push(record.clicks.to_string());
            row.push(record.impressions.to_string());
            row.push(record.ctr.to_string());
            row.push(record.position.to_string());

            csv_writer
                .write_record(&row)
                .map_err(|e| DataError::IoError(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
        }

        csv_writer.flush().map_err(DataError::IoError)?;
        Ok(())
    }
}

// Counts written by dataframe tools sometimes carry a trailing ".0"
fn parse_count(field: &str, line: usize) -> Result<u64, DataError> {
    if let Ok(value) = field.parse::<u64>() {
        return Ok(value);
    }

    match field.parse::<f64>() {
        Ok(value) if value >= 0.0 => Ok(value.round() as u64),
        _ => Err(DataError::ParseError(format!(
            "Invalid count '{}' on line {}",
            field,
            line + 2
        ))),
    }
}

fn parse_float(field: &str, line: usize) -> Result<f64, DataError> {
    field.parse::<f64>().map_err(|_| {
        DataError::ParseError(format!("Invalid number '{}' on line {}", field, line + 2))
    })
}

impl RecordSource for CsvSource {
    fn read(&self) -> Result<RecordSet, DataError> {
        let file = File::open(&self.path).map_err(DataError::IoError)?;
        let mut set = Self::read_from(BufReader::new(file), self.delimiter)?;

        set.metadata.add("source".to_string(), "csv".to_string());
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

/// CSV record sink
pub struct CsvSink {
    path: String,
    delimiter: char,
}

impl CsvSink {
    /// Create a new CSV record sink
    pub fn new<P: AsRef<Path>>(path: P, delimiter: char) -> Self {
        CsvSink {
            path: path.as_ref().to_string_lossy().to_string(),
            delimiter,
        }
    }
}

impl RecordSink for CsvSink {
    fn write(&self, data: &RecordSet) -> Result<(), DataError> {
        let file = File::create(&self.path).map_err(DataError::IoError)?;
        CsvSource::write_to(BufWriter::new(file), data, self.delimiter)
    }

    fn name(&self) -> &str {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_mixed_rows_with_unknown_column() {
        let input = "\
date,query,page,clicks,impressions,ctr,position,note
2024-03-01,,,120,2400,5.0,7.5,total
2024-03-01,rust tutorial,,12,96,12.5,3.2,
2024-03-01,,/blog,15.0,90,16.6,4.0,
";
        let set = CsvSource::read_from(input.as_bytes(), ',').unwrap();

        assert_eq!(set.len(), 3);
        assert_eq!(
            set.dimensions,
            vec![DimensionName::Date, DimensionName::Query, DimensionName::Page]
        );
        assert_eq!(set.records[0].dimension(DimensionName::Query), None);
        assert_eq!(set.records[1].dimension(DimensionName::Query), Some("rust tutorial"));
        assert_eq!(set.records[2].clicks, 15);
        assert_eq!(set.records[2].dimension(DimensionName::Page), Some("/blog"));
    }

    #[test]
    fn test_repeated_dimension_header_is_listed_once() {
        let input = "page,clicks,query,page\n/a,1,rust,/a\n";
        let set = CsvSource::read_from(input.as_bytes(), ',').unwrap();

        assert_eq!(set.dimensions, vec![DimensionName::Query, DimensionName::Page]);
        assert_eq!(set.records[0].dimension(DimensionName::Page), Some("/a"));
    }

    #[test]
    fn test_invalid_count_reports_line() {
        let input = "query,clicks\nfoo,many\n";
        let err = CsvSource::read_from(input.as_bytes(), ',').unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
