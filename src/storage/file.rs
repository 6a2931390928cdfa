// File storage of record sets in a directory
// Author: Gabriel Demetrios Lafis

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::data::{CsvSink, CsvSource, JsonSink, JsonSource, RecordSet, RecordSink, RecordSource};
use super::{validate_name, DataStorage, StorageError};

/// File format for storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Json,
}

impl FileFormat {
    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Json => "json",
        }
    }

    /// Guess the format of a path from its extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| StorageError::InvalidFormat(format!("no extension on {}", path.display())))?;
        ext.parse()
    }

    /// Write a record set to a path in this format
    pub fn write<P: AsRef<Path>>(&self, path: P, data: &RecordSet) -> Result<(), StorageError> {
        match self {
            FileFormat::Csv => CsvSink::new(path, ',').write(data)?,
            FileFormat::Json => JsonSink::new(path, true).write(data)?,
        }
        Ok(())
    }

    /// Read a record set from a path in this format
    pub fn read<P: AsRef<Path>>(&self, path: P) -> Result<RecordSet, StorageError> {
        let set = match self {
            FileFormat::Csv => CsvSource::new(path, ',').read()?,
            FileFormat::Json => JsonSource::new(path).read()?,
        };
        Ok(set)
    }
}

impl FromStr for FileFormat {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(FileFormat::Csv),
            "json" => Ok(FileFormat::Json),
            _ => Err(StorageError::InvalidFormat(format!("Unknown file format: {}", s))),
        }
    }
}

/// Stores each record set as one file in a base directory
pub struct FileStorage {
    base_dir: PathBuf,
    format: FileFormat,
}

impl FileStorage {
    /// Create a new file storage, creating the directory if needed
    pub fn new<P: AsRef<Path>>(base_dir: P, format: FileFormat) -> Result<Self, StorageError> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;

        Ok(FileStorage { base_dir, format })
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, StorageError> {
        validate_name(name)?;
        Ok(self.base_dir.join(format!("{}.{}", name, self.format.extension())))
    }
}

impl DataStorage for FileStorage {
    fn store(&self, name: &str, data: &RecordSet) -> Result<(), StorageError> {
        let path = self.path_for(name)?;
        self.format.write(path, data)
    }

    fn load(&self, name: &str) -> Result<RecordSet, StorageError> {
        let path = self.path_for(name)?;
        if !path.exists() {
            return Err(StorageError::NotFound(name.to_string()));
        }
        self.format.read(path)
    }

    fn exists(&self, name: &str) -> Result<bool, StorageError> {
        Ok(self.path_for(name)?.exists())
    }

    fn delete(&self, name: &str) -> Result<(), StorageError> {
        let path = self.path_for(name)?;
        if !path.exists() {
            return Err(StorageError::NotFound(name.to_string()));
        }
        fs::remove_file(path)?;
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>, StorageError> {
        let ext = self.format.extension();
        let mut names = Vec::new();

        for entry in fs::read_dir(&self.base_dir)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(ext) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }

        names.sort();
        Ok(names)
    }
}
