// Fetch module for executing queries and normalizing responses
// Author: Gabriel Demetrios Lafis

mod chain;

pub use chain::*;

use log::{info, warn};
use thiserror::Error;

use crate::data::{DimensionName, MetricRecord};
use crate::query::RequestDescriptor;
use crate::session::{ApiRow, SearchAnalyticsApi, ServiceHandle, TransportError};

/// Pages fetched at most by [`Fetcher::fetch_all`] unless configured otherwise
pub const DEFAULT_MAX_PAGES: usize = 10;

/// Represents a failed fetch; an empty result is not one of these
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("not authenticated: {0}")]
    NotAuthenticated(String),
}

impl From<TransportError> for FetchError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Status { status: 401, message } => FetchError::NotAuthenticated(message),
            TransportError::Status { status, message } => FetchError::Api { status, message },
            TransportError::Network(message) => FetchError::Transport(message),
            TransportError::Decode(message) => FetchError::Decode(message),
            TransportError::Credential(message) => FetchError::NotAuthenticated(message),
        }
    }
}

/// Executes request descriptors against an authenticated session
pub struct Fetcher<'a> {
    api: &'a (dyn SearchAnalyticsApi + Send + Sync),
    max_pages: usize,
}

impl<'a> Fetcher<'a> {
    /// Create a new fetcher over an API client
    pub fn new(api: &'a (dyn SearchAnalyticsApi + Send + Sync)) -> Self {
        Fetcher {
            api,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    /// Limit how many pages [`Fetcher::fetch_all`] requests
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// Execute a single call and normalize its rows
    ///
    /// A response without `rows` yields an empty vector.
    pub fn fetch(
        &self,
        handle: &ServiceHandle,
        descriptor: &RequestDescriptor,
    ) -> Result<Vec<MetricRecord>, FetchError> {
        let response = self
            .api
            .query(handle, &descriptor.site, &descriptor.to_body())?;

        match response.rows {
            Some(rows) => {
                info!(
                    "Fetched {} rows for {} ({} to {}, offset {})",
                    rows.len(),
                    descriptor.site,
                    descriptor.start_date,
                    descriptor.end_date,
                    descriptor.start_row
                );
                Ok(normalize_rows(&rows, &descriptor.dimensions))
            }
            None => {
                if descriptor.start_row == 0 {
                    warn!(
                        "No data returned for {} between {} and {}",
                        descriptor.site, descriptor.start_date, descriptor.end_date
                    );
                }
                Ok(Vec::new())
            }
        }
    }

    /// Execute the call and keep requesting pages while they come back full
    pub fn fetch_all(
        &self,
        handle: &ServiceHandle,
        descriptor: &RequestDescriptor,
    ) -> Result<Vec<MetricRecord>, FetchError> {
        let mut records = Vec::new();
        let mut page = descriptor.clone();

        for page_number in 0..self.max_pages {
            let batch = self.fetch(handle, &page)?;
            let full = batch.len() as u64 >= u64::from(page.row_limit);
            records.extend(batch);

            if !full {
                break;
            }

            if page_number + 1 == self.max_pages {
                warn!(
                    "Stopped after {} pages for {}; more rows may be available",
                    self.max_pages, descriptor.site
                );
            }

            page = page.next_page();
        }

        Ok(records)
    }
}

/// Turn response rows into records
///
/// The Nth key belongs to the Nth requested dimension. CTR arrives as a
/// fraction and is scaled to a percentage; missing metrics become zero.
pub fn normalize_rows(rows: &[ApiRow], dimensions: &[DimensionName]) -> Vec<MetricRecord> {
    rows.iter()
        .map(|row| {
            let mut record = MetricRecord::new(
                to_count(row.clicks),
                to_count(row.impressions),
                row.ctr.unwrap_or(0.0) * 100.0,
                row.position.unwrap_or(0.0),
            );

            for (dimension, key) in dimensions.iter().zip(row.keys.iter()) {
                record.dimension_values.insert(*dimension, key.clone());
            }

            record
        })
        .collect()
}

fn to_count(value: Option<f64>) -> u64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v.round() as u64,
        _ => 0,
    }
}
