// Search analytics API surface and wire types
// Author: Gabriel Demetrios Lafis

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::query::QueryRequestBody;
use super::{Credentials, ServiceHandle};

/// Calls the session and fetcher make against the analytics API
///
/// Implemented over HTTP by [`super::HttpSearchAnalytics`]; tests substitute
/// a mock.
pub trait SearchAnalyticsApi {
    /// Exchange credentials for an authenticated handle
    fn authorize(&self, credentials: &Credentials) -> Result<ServiceHandle, TransportError>;

    /// List the properties the handle can read
    fn list_sites(&self, handle: &ServiceHandle) -> Result<Vec<SiteEntry>, TransportError>;

    /// Run one `searchAnalytics/query` call
    fn query(
        &self,
        handle: &ServiceHandle,
        site: &str,
        body: &QueryRequestBody,
    ) -> Result<QueryResponse, TransportError>;
}

/// Failure talking to the API
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    /// The API answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The request never got an answer
    #[error("network error: {0}")]
    Network(String),

    /// The answer could not be decoded
    #[error("invalid response: {0}")]
    Decode(String),

    /// The credential could not be turned into a token request
    #[error("credential error: {0}")]
    Credential(String),
}

impl TransportError {
    /// Whether retrying the same call may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::Status { status, .. } => *status == 429 || *status >= 500,
            TransportError::Network(_) => true,
            _ => false,
        }
    }

    /// Whether the API rejected the caller's identity or permissions
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, TransportError::Status { status: 401 | 403, .. })
            || matches!(self, TransportError::Credential(_))
    }
}

/// One property from `GET /sites`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteEntry {
    pub site_url: String,
    #[serde(default)]
    pub permission_level: Option<String>,
}

impl SiteEntry {
    pub fn new<S: Into<String>>(site_url: S) -> Self {
        SiteEntry {
            site_url: site_url.into(),
            permission_level: None,
        }
    }
}

/// Body of `GET /sites`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitesResponse {
    #[serde(default)]
    pub site_entry: Vec<SiteEntry>,
}

/// Body of `searchAnalytics/query`; `rows` is absent when nothing matched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    #[serde(default)]
    pub rows: Option<Vec<ApiRow>>,
    #[serde(default)]
    pub response_aggregation_type: Option<String>,
}

impl QueryResponse {
    pub fn with_rows(rows: Vec<ApiRow>) -> Self {
        QueryResponse {
            rows: Some(rows),
            response_aggregation_type: None,
        }
    }
}

/// One response row; `keys` line up with the requested dimensions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiRow {
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub clicks: Option<f64>,
    #[serde(default)]
    pub impressions: Option<f64>,
    #[serde(default)]
    pub ctr: Option<f64>,
    #[serde(default)]
    pub position: Option<f64>,
}

/// Pull the human readable message out of a Google API error body
pub fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: ErrorDetail,
    }

    #[derive(Deserialize)]
    struct ErrorDetail {
        #[serde(default)]
        message: Option<String>,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody { error: ErrorDetail { message: Some(message) } }) => message,
        _ if body.trim().is_empty() => "Unknown error".to_string(),
        _ => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_without_rows() {
        let response: QueryResponse = serde_json::from_str(r#"{"responseAggregationType":"byProperty"}"#).unwrap();
        assert!(response.rows.is_none());
    }

    #[test]
    fn test_sites_response() {
        let sites: SitesResponse = serde_json::from_str(
            r#"{"siteEntry":[{"siteUrl":"sc-domain:apudsi.com","permissionLevel":"siteOwner"}]}"#,
        )
        .unwrap();
        assert_eq!(sites.site_entry[0].site_url, "sc-domain:apudsi.com");

        let empty: SitesResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.site_entry.is_empty());
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"error":{"code":403,"message":"User does not have sufficient permission"}}"#;
        assert_eq!(error_message(body), "User does not have sufficient permission");
        assert_eq!(error_message(""), "Unknown error");
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_transient_classification() {
        assert!(TransportError::Status { status: 503, message: String::new() }.is_transient());
        assert!(TransportError::Status { status: 429, message: String::new() }.is_transient());
        assert!(!TransportError::Status { status: 403, message: String::new() }.is_transient());
        assert!(TransportError::Status { status: 403, message: String::new() }.is_auth_failure());
    }
}
