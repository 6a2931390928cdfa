// Ordered record providers: live fetch, cached file, synthetic data
// Author: Gabriel Demetrios Lafis

use std::path::Path;
use std::sync::Arc;

use log::{info, warn};
use thiserror::Error;

use crate::data::{
    CsvSource, DataError, DimensionName, JsonSource, MockSource, RecordSet, RecordSource,
    SourceType,
};
use crate::processing::{FilterProcessor, Pipeline, ProcessingError, RedactionFilter};
use crate::query::{self, DateRange, FilterGroup, QueryBuilder, QueryError, SearchType};
use crate::session::{SessionContext, SessionError};
use crate::utils::Config;
use super::{FetchError, Fetcher, DEFAULT_MAX_PAGES};

/// Something the fallback chain can ask for records
pub trait RecordProvider {
    /// Produce records, or explain why not
    fn provide(&self) -> Result<RecordSet, ProviderError>;

    /// Human readable name for notices
    fn describe(&self) -> String;

    fn source_type(&self) -> SourceType;
}

/// Why a provider produced nothing
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Query(#[from] QueryError),
}

impl ProviderError {
    /// Whether a fresh access token might succeed where this attempt failed
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            ProviderError::Session(SessionError::Auth(_))
                | ProviderError::Fetch(FetchError::NotAuthenticated(_))
        )
    }
}

impl RecordProvider for CsvSource {
    fn provide(&self) -> Result<RecordSet, ProviderError> {
        Ok(self.read()?)
    }

    fn describe(&self) -> String {
        format!("file {}", self.name())
    }

    fn source_type(&self) -> SourceType {
        RecordSource::source_type(self)
    }
}

impl RecordProvider for JsonSource {
    fn provide(&self) -> Result<RecordSet, ProviderError> {
        Ok(self.read()?)
    }

    fn describe(&self) -> String {
        format!("file {}", self.name())
    }

    fn source_type(&self) -> SourceType {
        RecordSource::source_type(self)
    }
}

impl RecordProvider for MockSource {
    fn provide(&self) -> Result<RecordSet, ProviderError> {
        Ok(self.read()?)
    }

    fn describe(&self) -> String {
        "synthetic data".to_string()
    }

    fn source_type(&self) -> SourceType {
        RecordSource::source_type(self)
    }
}

/// Pick the file source matching a fallback file's extension
pub fn file_provider<P: AsRef<Path>>(path: P) -> Box<dyn RecordProvider> {
    let path = path.as_ref();
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => Box::new(JsonSource::new(path)),
        _ => Box::new(CsvSource::new(path, ',')),
    }
}

/// Live fetch from the analytics API
pub struct LiveSource {
    session: Arc<SessionContext>,
    site: Option<String>,
    range: DateRange,
    dimensions: Vec<DimensionName>,
    row_limit: u32,
    max_pages: usize,
    search_type: SearchType,
    filter_groups: Vec<FilterGroup>,
}

impl LiveSource {
    /// Create a live source for a date window with the dashboard's defaults
    pub fn new(session: Arc<SessionContext>, range: DateRange) -> Self {
        LiveSource {
            session,
            site: None,
            range,
            dimensions: vec![
                DimensionName::Date,
                DimensionName::Query,
                DimensionName::Page,
                DimensionName::Country,
            ],
            row_limit: query::DEFAULT_ROW_LIMIT,
            max_pages: 1,
            search_type: SearchType::default(),
            filter_groups: Vec::new(),
        }
    }

    /// Use a specific property instead of the first accessible one
    pub fn with_site<S: Into<String>>(mut self, site: S) -> Self {
        self.site = Some(site.into());
        self
    }

    pub fn with_dimensions(mut self, dimensions: Vec<DimensionName>) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn with_row_limit(mut self, row_limit: u32) -> Self {
        self.row_limit = row_limit;
        self
    }

    /// Follow pagination for up to `max_pages` pages
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    pub fn with_search_type(mut self, search_type: SearchType) -> Self {
        self.search_type = search_type;
        self
    }

    pub fn with_filter_groups(mut self, groups: Vec<FilterGroup>) -> Self {
        self.filter_groups = groups;
        self
    }

    fn pick_site(&self, sites: Vec<String>, principal: &str) -> Result<String, SessionError> {
        match &self.site {
            Some(site) if sites.iter().any(|s| s == site) => Ok(site.clone()),
            Some(site) => Err(SessionError::NoAccess(format!(
                "{} (site {} is not among its properties)",
                principal, site
            ))),
            None => sites
                .into_iter()
                .next()
                .ok_or_else(|| SessionError::NoAccess(principal.to_string())),
        }
    }

    fn fetch_once(&self) -> Result<RecordSet, ProviderError> {
        let handle = self.session.try_authenticate(true)?;
        let sites = self.session.list_sites(&handle)?;
        let site = self.pick_site(sites, handle.principal())?;
        info!("Using site: {}", site);

        let range = self.range.clamp_to_retention(query::today());
        let descriptor = QueryBuilder::for_range(site.clone(), &range)
            .dimensions(self.dimensions.clone())
            .row_limit(self.row_limit)
            .search_type(self.search_type)
            .filter_groups(self.filter_groups.clone())
            .build()?;

        let fetcher = Fetcher::new(self.session.api()).with_max_pages(self.max_pages);
        let records = fetcher.fetch_all(&handle, &descriptor)?;

        let mut set = RecordSet::new(descriptor.dimensions.clone());
        for record in records {
            set.add_record(record);
        }
        set.metadata.add("source".to_string(), "live".to_string());
        set.metadata.add("site".to_string(), site);

        Ok(set)
    }
}

impl RecordProvider for LiveSource {
    /// Fetch once, and once more with a new token if the first was refused
    fn provide(&self) -> Result<RecordSet, ProviderError> {
        match self.fetch_once() {
            Err(err) if err.is_auth_failure() => {
                warn!("Access rejected ({}); authenticating again", err);
                self.session.invalidate();
                self.fetch_once()
            }
            result => result,
        }
    }

    fn describe(&self) -> String {
        match &self.site {
            Some(site) => format!("live fetch for {}", site),
            None => "live fetch".to_string(),
        }
    }

    fn source_type(&self) -> SourceType {
        SourceType::Live
    }
}

/// Records produced by the first provider that had any
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub records: RecordSet,
    pub source: SourceType,
    pub source_name: String,
    pub redacted_count: usize,
    pub notices: Vec<String>,
}

impl LoadOutcome {
    /// Consume the outcome, keeping its provenance in the set's metadata
    pub fn into_record_set(self) -> RecordSet {
        let mut set = self.records;
        set.metadata.add("source".to_string(), self.source.as_str().to_string());
        set.metadata.add("source_name".to_string(), self.source_name);
        set.metadata.add("redacted_count".to_string(), self.redacted_count.to_string());
        if !self.notices.is_empty() {
            set.metadata.add("notices".to_string(), self.notices.join("\n"));
        }
        set
    }
}

/// Represents a chain that could not produce any records
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("no data available: {}", .0.join("; "))]
    NoData(Vec<String>),

    #[error(transparent)]
    Processing(#[from] ProcessingError),
}

/// Tries providers in order until one yields records
///
/// Whatever provider wins, its records pass through the redaction filter.
/// Offline records then pass the local filters, which stand in for the
/// filter groups a live request sends upstream.
pub struct FallbackChain {
    providers: Vec<Box<dyn RecordProvider>>,
    redaction: RedactionFilter,
    local_filters: Pipeline,
}

impl FallbackChain {
    /// Create an empty chain that redacts `blocked_substring`
    pub fn new(blocked_substring: &str) -> Self {
        FallbackChain {
            providers: Vec::new(),
            redaction: RedactionFilter::new(blocked_substring),
            local_filters: Pipeline::new("local-filters"),
        }
    }

    /// Append a provider; earlier providers take precedence
    pub fn with_provider<P: RecordProvider + 'static>(mut self, provider: P) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    pub fn with_boxed_provider(mut self, provider: Box<dyn RecordProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Apply filter groups to records from cached files and synthetic data
    ///
    /// Live records are filtered by the API and skip these.
    pub fn with_filter_groups(mut self, groups: &[FilterGroup]) -> Result<Self, ProcessingError> {
        for group in groups {
            self.local_filters = self.local_filters.add(FilterProcessor::from_filter_group(group)?);
        }
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Build the chain the configuration describes for a date window
    ///
    /// Mock mode uses only synthetic data. Otherwise the live source (when a
    /// session is available) comes first, then the fallback file, then
    /// synthetic data. Configured filter groups apply to every source.
    pub fn from_config(
        config: &Config,
        session: Option<Arc<SessionContext>>,
        range: DateRange,
    ) -> Result<Self, ChainError> {
        let data = &config.data;
        let mut chain = FallbackChain::new(&data.blocked_substring).with_filter_groups(&data.filter_groups)?;

        if !data.mock_mode {
            if let Some(session) = session {
                let mut live = LiveSource::new(session, range)
                    .with_row_limit(data.row_limit)
                    .with_max_pages(data.max_pages.unwrap_or(DEFAULT_MAX_PAGES))
                    .with_filter_groups(data.filter_groups.clone());

                match DimensionName::parse_list(&data.dimensions.join(",")) {
                    Ok(dimensions) if !dimensions.is_empty() => live = live.with_dimensions(dimensions),
                    Ok(_) => {}
                    Err(err) => warn!("Ignoring configured dimensions: {}", err),
                }

                if let Some(site) = &data.site {
                    live = live.with_site(site.clone());
                }

                chain = chain.with_provider(live);
            }

            if let Some(path) = &data.fallback_file {
                chain = chain.with_boxed_provider(file_provider(path));
            }
        }

        Ok(chain.with_provider(MockSource::new(range.start_date, range.end_date, data.seed)))
    }

    /// Try each provider in order
    pub fn load(&self) -> Result<LoadOutcome, ChainError> {
        let mut notices = Vec::new();

        for provider in &self.providers {
            let records = match provider.provide() {
                Ok(records) if records.is_empty() => {
                    let notice = format!("{} returned no rows", provider.describe());
                    warn!("{}", notice);
                    notices.push(notice);
                    continue;
                }
                Ok(records) => records,
                Err(err) => {
                    let notice = format!("{} failed: {}", provider.describe(), err);
                    warn!("{}", notice);
                    notices.push(notice);
                    continue;
                }
            };

            let (records, redacted_count) = self.redaction.apply_to_set(records);

            let records = if provider.source_type() == SourceType::Live {
                records
            } else {
                let filtered = self.local_filters.execute(&records)?;
                info!("Loaded {} rows from {}", filtered.len(), provider.describe());
                filtered
            };

            return Ok(LoadOutcome {
                records,
                source: provider.source_type(),
                source_name: provider.describe(),
                redacted_count,
                notices,
            });
        }

        Err(ChainError::NoData(notices))
    }
}
