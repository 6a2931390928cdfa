// HTTP client for the search analytics API
// Author: Gabriel Demetrios Lafis

use std::thread;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use log::{debug, warn};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::Url;
use serde::de::DeserializeOwned;

use crate::query::QueryRequestBody;
use crate::utils::ApiConfig;
use super::{
    error_message, AssertionClaims, AuthorizedUser, Credentials, QueryResponse, SearchAnalyticsApi,
    ServiceAccountKey, ServiceHandle, SiteEntry, SitesResponse, TokenResponse, TransportError,
};

/// Blocking HTTP implementation of [`SearchAnalyticsApi`]
///
/// Every call has a timeout and transient failures (network errors, 429,
/// 5xx) are retried with exponential backoff.
pub struct HttpSearchAnalytics {
    client: Client,
    base_url: Url,
    max_retries: u32,
    retry_backoff: Duration,
}

impl HttpSearchAnalytics {
    /// Create a client from the API settings
    pub fn new(config: &ApiConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("site-performance-engine/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let base_url = Url::parse(&config.base_url)
            .map_err(|e| TransportError::Network(format!("invalid base URL '{}': {}", config.base_url, e)))?;

        Ok(HttpSearchAnalytics {
            client,
            base_url,
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    /// Build an endpoint URL; each segment is percent-encoded, so site URLs
    /// such as `https://example.com/` stay a single path segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| TransportError::Network("base URL cannot hold a path".to_string()))?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    fn send_with_retry<F>(&self, build: F) -> Result<Response, TransportError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;

        loop {
            let result = build()
                .send()
                .map_err(|e| TransportError::Network(e.to_string()))
                .and_then(check_status);

            match result {
                Ok(response) => return Ok(response),
                Err(err) if err.is_transient() && attempt < self.max_retries => {
                    let delay = retry_delay(self.retry_backoff, attempt);
                    warn!(
                        "Transient API failure ({}), retrying in {} ms",
                        err,
                        delay.as_millis()
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn exchange_token(&self, token_uri: &str, form: &[(&str, &str)]) -> Result<TokenResponse, TransportError> {
        let response = self.send_with_retry(|| self.client.post(token_uri).form(form))?;
        decode(response)
    }

    fn service_account_token(&self, key: &ServiceAccountKey) -> Result<TokenResponse, TransportError> {
        let claims = AssertionClaims::new(key, Utc::now().timestamp());
        let mut header = Header::new(Algorithm::RS256);
        header.kid = key.private_key_id.clone();

        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| TransportError::Credential(format!("invalid private key: {}", e)))?;
        let assertion = jsonwebtoken::encode(&header, &claims, &signing_key)
            .map_err(|e| TransportError::Credential(format!("failed to sign assertion: {}", e)))?;

        self.exchange_token(
            &key.token_uri,
            &[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ],
        )
    }

    fn refresh_user_token(&self, user: &AuthorizedUser) -> Result<TokenResponse, TransportError> {
        self.exchange_token(
            &user.token_uri,
            &[
                ("grant_type", "refresh_token"),
                ("client_id", user.client_id.as_str()),
                ("client_secret", user.client_secret.as_str()),
                ("refresh_token", user.refresh_token.as_str()),
            ],
        )
    }
}

/// Longest single wait between retries
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Exponential backoff for the given attempt, capped at [`MAX_RETRY_DELAY`]
pub fn retry_delay(base: Duration, attempt: u32) -> Duration {
    2u32.checked_pow(attempt)
        .and_then(|factor| base.checked_mul(factor))
        .map_or(MAX_RETRY_DELAY, |delay| delay.min(MAX_RETRY_DELAY))
}

fn check_status(response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    Err(TransportError::Status {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

fn decode<T: DeserializeOwned>(response: Response) -> Result<T, TransportError> {
    response
        .json::<T>()
        .map_err(|e| TransportError::Decode(e.to_string()))
}

impl SearchAnalyticsApi for HttpSearchAnalytics {
    fn authorize(&self, credentials: &Credentials) -> Result<ServiceHandle, TransportError> {
        let token = match credentials {
            Credentials::ServiceAccount(key) => self.service_account_token(key)?,
            Credentials::AuthorizedUser(user) => self.refresh_user_token(user)?,
            Credentials::AccessToken(token) => {
                return Ok(ServiceHandle::new(token.access_token.clone(), credentials.principal()))
            }
        };

        let handle = ServiceHandle::new(token.access_token, credentials.principal());
        Ok(match token.expires_in {
            Some(expires_in) => handle.with_expires_in(expires_in),
            None => handle,
        })
    }

    fn list_sites(&self, handle: &ServiceHandle) -> Result<Vec<SiteEntry>, TransportError> {
        let url = self.endpoint(&["sites"])?;
        let response = self.send_with_retry(|| {
            self.client.get(url.clone()).bearer_auth(handle.access_token())
        })?;

        let sites: SitesResponse = decode(response)?;
        Ok(sites.site_entry)
    }

    fn query(
        &self,
        handle: &ServiceHandle,
        site: &str,
        body: &QueryRequestBody,
    ) -> Result<QueryResponse, TransportError> {
        let url = self.endpoint(&["sites", site, "searchAnalytics", "query"])?;
        debug!(
            "Query request for {}: {}",
            site,
            serde_json::to_string(body).unwrap_or_default()
        );

        let response = self.send_with_retry(|| {
            self.client
                .post(url.clone())
                .bearer_auth(handle.access_token())
                .json(body)
        })?;

        decode(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HttpSearchAnalytics {
        HttpSearchAnalytics::new(&ApiConfig::default()).unwrap()
    }

    #[test]
    fn test_site_url_is_a_single_segment() {
        let url = client()
            .endpoint(&["sites", "https://apudsi.com/", "searchAnalytics", "query"])
            .unwrap();

        assert_eq!(
            url.as_str(),
            "https://www.googleapis.com/webmasters/v3/sites/https:%2F%2Fapudsi.com%2F/searchAnalytics/query"
        );
    }

    #[test]
    fn test_domain_property_url() {
        let url = client().endpoint(&["sites", "sc-domain:apudsi.com"]).unwrap();
        assert!(url.as_str().ends_with("/sites/sc-domain:apudsi.com"));
    }

    #[test]
    fn test_retry_delay_doubles_up_to_the_cap() {
        let base = Duration::from_millis(500);

        assert_eq!(retry_delay(base, 0), Duration::from_millis(500));
        assert_eq!(retry_delay(base, 3), Duration::from_millis(4000));
        assert_eq!(retry_delay(base, 10), MAX_RETRY_DELAY);
        assert_eq!(retry_delay(base, 40), MAX_RETRY_DELAY);
        assert_eq!(retry_delay(Duration::from_secs(u64::MAX), 2), MAX_RETRY_DELAY);
    }

    #[test]
    fn test_bad_private_key_is_a_credential_error() {
        let key = ServiceAccountKey {
            client_email: "svc@example.iam.gserviceaccount.com".to_string(),
            private_key: "not a key".to_string(),
            private_key_id: None,
            project_id: None,
            token_uri: crate::session::DEFAULT_TOKEN_URI.to_string(),
        };

        let err = client().service_account_token(&key).unwrap_err();
        assert!(matches!(err, TransportError::Credential(_)));
    }
}
