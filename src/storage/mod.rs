// Storage module for saved record sets
// Author: Gabriel Demetrios Lafis

mod cache;
mod file;
mod memory;

pub use cache::*;
pub use file::*;
pub use memory::*;

use std::error::Error;
use std::fmt;

use crate::data::{DataError, RecordSet};

/// Represents a named store of record sets
pub trait DataStorage {
    /// Store a record set under a name, replacing any previous one
    fn store(&self, name: &str, data: &RecordSet) -> Result<(), StorageError>;

    /// Load a record set
    fn load(&self, name: &str) -> Result<RecordSet, StorageError>;

    /// Check if a record set exists
    fn exists(&self, name: &str) -> Result<bool, StorageError>;

    /// Delete a record set
    fn delete(&self, name: &str) -> Result<(), StorageError>;

    /// List stored names
    fn list(&self) -> Result<Vec<String>, StorageError>;
}

/// Represents an error in the storage module
#[derive(Debug)]
pub enum StorageError {
    DataError(DataError),
    IoError(std::io::Error),
    NotFound(String),
    InvalidName(String),
    InvalidFormat(String),
    LockPoisoned,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StorageError::DataError(err) => write!(f, "Data error: {}", err),
            StorageError::IoError(err) => write!(f, "IO error: {}", err),
            StorageError::NotFound(name) => write!(f, "Record set '{}' not found", name),
            StorageError::InvalidName(name) => write!(f, "Invalid record set name '{}'", name),
            StorageError::InvalidFormat(msg) => write!(f, "Invalid format: {}", msg),
            StorageError::LockPoisoned => write!(f, "Storage lock poisoned"),
        }
    }
}

impl Error for StorageError {}

impl From<DataError> for StorageError {
    fn from(err: DataError) -> Self {
        StorageError::DataError(err)
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::IoError(err)
    }
}

/// Reject names that would escape a storage directory or be unreadable
///
/// Names are used as file stems, so only ASCII letters, digits, `-`, `_`
/// and `.` are allowed, and they may not start with a dot.
pub fn validate_name(name: &str) -> Result<(), StorageError> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("top_queries-2024.01").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("../secrets").is_err());
        assert!(validate_name(".hidden").is_err());
        assert!(validate_name("a/b").is_err());
    }
}
