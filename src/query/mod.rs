// Query module for building search analytics requests
// Author: Gabriel Demetrios Lafis

mod builder;
mod dates;
mod filter;
mod request;

pub use builder::*;
pub use dates::*;
pub use filter::*;
pub use request::*;

use chrono::NaiveDate;
use thiserror::Error;

use crate::data::{UnknownDimensionError, UnknownMetricError};

/// Upper bound the analytics API accepts for `rowLimit`
pub const MAX_ROW_LIMIT: u32 = 25_000;

/// Row limit used when the caller does not pick one
pub const DEFAULT_ROW_LIMIT: u32 = 5_000;

/// Local validation failures; none of these ever reach the network
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error(transparent)]
    UnknownDimension(#[from] UnknownDimensionError),

    #[error(transparent)]
    UnknownMetric(#[from] UnknownMetricError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
