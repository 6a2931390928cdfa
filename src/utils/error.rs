// Error handling utilities
// Author: Gabriel Demetrios Lafis

use std::error::Error;
use std::fmt;

use crate::data::DataError;
use crate::fetch::{ChainError, FetchError};
use crate::processing::ProcessingError;
use crate::query::QueryError;
use crate::session::SessionError;
use crate::storage::StorageError;

/// Application error type
#[derive(Debug)]
pub enum AppError {
    Data(DataError),
    Query(QueryError),
    Session(SessionError),
    Fetch(FetchError),
    NoData(Vec<String>),
    Processing(ProcessingError),
    Storage(StorageError),
    Config(String),
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Data(err) => write!(f, "Data error: {}", err),
            AppError::Query(err) => write!(f, "Query error: {}", err),
            AppError::Session(err) => write!(f, "Session error: {}", err),
            AppError::Fetch(err) => write!(f, "Fetch error: {}", err),
            AppError::NoData(reasons) if reasons.is_empty() => write!(f, "No data available"),
            AppError::NoData(reasons) => write!(f, "No data available: {}", reasons.join("; ")),
            AppError::Processing(err) => write!(f, "Processing error: {}", err),
            AppError::Storage(err) => write!(f, "Storage error: {}", err),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl Error for AppError {}

impl From<DataError> for AppError {
    fn from(err: DataError) -> Self {
        AppError::Data(err)
    }
}

impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        AppError::Query(err)
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        AppError::Session(err)
    }
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        AppError::Fetch(err)
    }
}

impl From<ChainError> for AppError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::NoData(reasons) => AppError::NoData(reasons),
            ChainError::Processing(err) => AppError::Processing(err),
        }
    }
}

impl From<ProcessingError> for AppError {
    fn from(err: ProcessingError) -> Self {
        AppError::Processing(err)
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Storage(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Other(err.to_string())
    }
}

/// Result type alias for AppError
pub type AppResult<T> = Result<T, AppError>;
