// Shared state behind the API handlers
// Author: Gabriel Demetrios Lafis

use std::sync::Arc;
use std::time::Duration;

use crate::data::RecordSet;
use crate::fetch::{FallbackChain, LoadOutcome};
use crate::query::{self, DateRange};
use crate::session::{SessionContext, SessionError, SiteId};
use crate::storage::{CacheStorage, MemoryStorage};
use crate::utils::{AppError, AppResult, Config};

/// Configuration, session and load cache shared by all workers
pub struct AppState {
    config: Config,
    session: Option<Arc<SessionContext>>,
    cache: CacheStorage,
}

impl AppState {
    /// Create the state; without a session only offline sources are used
    pub fn new(config: Config, session: Option<Arc<SessionContext>>) -> Self {
        let mut cache = CacheStorage::new(MemoryStorage::new());
        if let Some(ttl) = config.storage.cache_ttl {
            cache = cache.with_ttl(Duration::from_secs(ttl));
        }

        AppState {
            config,
            session,
            cache,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &CacheStorage {
        &self.cache
    }

    /// Resolve a range name, falling back to the configured one
    pub fn resolve_range(&self, name: Option<&str>) -> DateRange {
        query::resolve_or_default(name.unwrap_or(&self.config.data.date_range))
    }

    /// Load redacted records for a range through the fallback chain
    ///
    /// Results are cached per window, so repeated dashboard requests do not
    /// hit the analytics API again until the entry expires.
    pub fn load(&self, range: DateRange) -> AppResult<RecordSet> {
        let key = format!("records_{}_{}", range.start_date, range.end_date);

        self.cache.get_or_insert_with(&key, || {
            FallbackChain::from_config(&self.config, self.session.clone(), range)?
                .load()
                .map(LoadOutcome::into_record_set)
                .map_err(AppError::from)
        })
    }

    /// List accessible sites through the live session
    pub fn sites(&self) -> AppResult<Vec<SiteId>> {
        let session = self.session.as_ref().ok_or_else(|| {
            AppError::Session(SessionError::Credentials(
                "live access is disabled in mock mode".to_string(),
            ))
        })?;

        let handle = session.try_authenticate(true)?;
        Ok(session.list_sites(&handle)?)
    }
}
