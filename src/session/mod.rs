// Session module for authenticated access to the analytics API
// Author: Gabriel Demetrios Lafis

mod api;
mod credentials;
mod http;

pub use api::*;
pub use credentials::*;
pub use http::*;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use log::{debug, error, info, warn};
use thiserror::Error;

/// Property identifier, e.g. `https://apudsi.com/` or `sc-domain:apudsi.com`
pub type SiteId = String;

/// Seconds before expiry at which a cached handle is replaced
pub const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

/// An authenticated client handle
///
/// Opaque to callers; cloned freely and never mutated once issued.
#[derive(Clone, PartialEq)]
pub struct ServiceHandle {
    access_token: String,
    principal: String,
    expires_at: Option<DateTime<Utc>>,
}

impl ServiceHandle {
    pub fn new<T: Into<String>, P: Into<String>>(access_token: T, principal: P) -> Self {
        ServiceHandle {
            access_token: access_token.into(),
            principal: principal.into(),
            expires_at: None,
        }
    }

    /// Mark the token as valid for `expires_in` seconds from now
    pub fn with_expires_in(self, expires_in: i64) -> Self {
        self.with_expires_at(Utc::now() + Duration::seconds(expires_in))
    }

    pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// When the token stops being accepted; `None` when the issuer did not say
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Whether the token expires within `margin` of `now`
    pub fn is_expiring(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.expires_at.map_or(false, |at| now + margin >= at)
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Account the handle acts as
    pub fn principal(&self) -> &str {
        &self.principal
    }
}

// Keep tokens out of logs
impl fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ServiceHandle")
            .field("principal", &self.principal)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Represents an error obtaining or using a session
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// Credential missing, invalid or rejected by the API
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Authenticated, but the account cannot read any property
    #[error("no accessible sites for {0}")]
    NoAccess(String),

    /// The credential file could not be loaded
    #[error("credential error: {0}")]
    Credentials(String),

    /// The API could not be reached
    #[error("transport error: {0}")]
    Transport(TransportError),
}

/// Holds the API client and the handle cached for this context's lifetime
///
/// The handle is created on the first successful [`authenticate`] and reused
/// until [`invalidate`] is called or its token is about to expire, whichever
/// comes first.
///
/// [`authenticate`]: SessionContext::authenticate
/// [`invalidate`]: SessionContext::invalidate
pub struct SessionContext {
    api: Arc<dyn SearchAnalyticsApi + Send + Sync>,
    credentials_path: PathBuf,
    supplied: Option<Credentials>,
    handle: RwLock<Option<ServiceHandle>>,
}

impl SessionContext {
    /// Create a context that reads stored credentials from `credentials_path`
    pub fn new<A, P>(api: A, credentials_path: P) -> Self
    where
        A: SearchAnalyticsApi + Send + Sync + 'static,
        P: AsRef<Path>,
    {
        Self::with_shared_api(Arc::new(api), credentials_path)
    }

    pub fn with_shared_api<P: AsRef<Path>>(
        api: Arc<dyn SearchAnalyticsApi + Send + Sync>,
        credentials_path: P,
    ) -> Self {
        SessionContext {
            api,
            credentials_path: credentials_path.as_ref().to_path_buf(),
            supplied: None,
            handle: RwLock::new(None),
        }
    }

    /// Provide credentials directly instead of reading the stored file
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.supplied = Some(credentials);
        self
    }

    /// The API client this session talks through
    pub fn api(&self) -> &(dyn SearchAnalyticsApi + Send + Sync) {
        self.api.as_ref()
    }

    /// Authenticate, reporting failures through the log instead of the caller
    pub fn authenticate(&self, use_stored: bool) -> Option<ServiceHandle> {
        match self.try_authenticate(use_stored) {
            Ok(handle) => Some(handle),
            Err(err) => {
                error!("{}", err);
                None
            }
        }
    }

    /// Authenticate and verify access with a site listing
    ///
    /// With `use_stored` the stored credential file is used; otherwise only
    /// credentials supplied through [`SessionContext::with_credentials`].
    pub fn try_authenticate(&self, use_stored: bool) -> Result<ServiceHandle, SessionError> {
        if let Some(handle) = self.cached() {
            return Ok(handle);
        }

        let credentials = match (&self.supplied, use_stored) {
            (Some(credentials), _) => credentials.clone(),
            (None, true) => Credentials::from_file(&self.credentials_path)?,
            (None, false) => {
                return Err(SessionError::Credentials(
                    "no credentials supplied and stored credentials disabled".to_string(),
                ))
            }
        };

        let handle = self.api.authorize(&credentials).map_err(auth_error)?;

        // Cheap call that fails fast when the credential is not accepted
        self.api.list_sites(&handle).map_err(auth_error)?;

        info!("Authenticated as {}", handle.principal());

        if let Ok(mut cached) = self.handle.write() {
            *cached = Some(handle.clone());
        }

        Ok(handle)
    }

    /// List the sites the handle can read
    ///
    /// An empty list is not an error; it means the account has no access.
    pub fn list_sites(&self, handle: &ServiceHandle) -> Result<Vec<SiteId>, SessionError> {
        let sites: Vec<SiteId> = self
            .api
            .list_sites(handle)
            .map_err(auth_error)?
            .into_iter()
            .map(|entry| entry.site_url)
            .collect();

        if sites.is_empty() {
            warn!(
                "No sites found for {}; grant it access in Search Console under Users and permissions",
                handle.principal()
            );
        }

        Ok(sites)
    }

    /// Drop the cached handle so the next call authenticates again
    pub fn invalidate(&self) {
        if let Ok(mut cached) = self.handle.write() {
            *cached = None;
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.cached().is_some()
    }

    fn cached(&self) -> Option<ServiceHandle> {
        let handle = self.handle.read().ok().and_then(|h| h.clone())?;

        if handle.is_expiring(Utc::now(), Duration::seconds(TOKEN_EXPIRY_MARGIN_SECS)) {
            debug!("Access token for {} is expiring; authenticating again", handle.principal());
            return None;
        }

        Some(handle)
    }
}

fn auth_error(err: TransportError) -> SessionError {
    if err.is_auth_failure() {
        SessionError::Auth(err.to_string())
    } else {
        SessionError::Transport(err)
    }
}
