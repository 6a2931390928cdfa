// Site Performance Engine
// Author: Gabriel Demetrios Lafis

//! # Site Performance Engine
//!
//! Loads search analytics for a web property, removes rows that reference
//! non-public hosts and ranks pages, queries, countries and devices by
//! clicks, impressions, CTR or position.
//!
//! ## Features
//!
//! - Service account, refresh token or static token authentication
//! - Typed query builder with filter groups and pagination
//! - Fallback from the live API to a cached file to synthetic data
//! - Redaction of a blocked host on every load path
//! - Top-N ranking, summaries and daily time series
//! - REST API and command line interface
//!
//! ## Example
//!
//! ```rust
//! use site_performance_engine::{
//!     data::{DimensionName, MetricName, MockSource},
//!     fetch::FallbackChain,
//!     processing::aggregate,
//!     query,
//! };
//!
//! let today = chrono::NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
//! let range = query::resolve_or_default_at("Last 7 days", today);
//!
//! let outcome = FallbackChain::new("superapp.backend.apudsi.com")
//!     .with_provider(MockSource::new(range.start_date, range.end_date, Some(42)))
//!     .load()
//!     .unwrap();
//!
//! let top = aggregate(&outcome.records.records, DimensionName::Query, MetricName::Clicks, 3).unwrap();
//! assert_eq!(top.len(), 3);
//! ```

pub mod api;
pub mod data;
pub mod fetch;
pub mod processing;
pub mod query;
pub mod session;
pub mod storage;
pub mod utils;

// Re-export main types
pub use data::{DimensionName, MetricName, MetricRecord, RecordSet};
pub use fetch::{FallbackChain, Fetcher, LoadOutcome};
pub use processing::{aggregate, AggregationRow};
pub use query::{DateRange, QueryBuilder, RequestDescriptor};
pub use session::{HttpSearchAnalytics, SessionContext};
pub use api::Server;
pub use utils::Config;
