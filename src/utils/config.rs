// Configuration utilities
// Author: Gabriel Demetrios Lafis

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::DimensionName;
use crate::processing::{FilterProcessor, DEFAULT_BLOCKED_SUBSTRING};
use crate::query::{self, FilterGroup, DEFAULT_RANGE_NAME, DEFAULT_ROW_LIMIT, MAX_ROW_LIMIT};
use super::{validate_not_empty, validate_range, validate_site, AppError, AppResult};

/// Upper bound for `api.max_retries`; the backoff doubles on every retry
pub const MAX_API_RETRIES: u32 = 10;

/// Application configuration
///
/// Every section and field has a default, so a config file only needs the
/// values it changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub api: ApiConfig,
    pub data: DataConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: None,
            enable_cors: false,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// `memory` or `file`
    #[serde(rename = "type")]
    pub type_: String,
    pub path: Option<String>,
    pub format: Option<String>,
    /// Seconds a loaded record set is served from the cache
    pub cache_ttl: Option<u64>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            type_: "memory".to_string(),
            path: None,
            format: None,
            cache_ttl: Some(300),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
        }
    }
}

/// Analytics API client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub credentials_path: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: "https://www.googleapis.com/webmasters/v3".to_string(),
            credentials_path: "service-account-key.json".to_string(),
            timeout_secs: 30,
            max_retries: 3,
            retry_backoff_ms: 500,
        }
    }
}

/// What to load and how to clean it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Property to query; the first accessible one when unset
    pub site: Option<String>,
    pub date_range: String,
    pub dimensions: Vec<String>,
    pub row_limit: u32,
    pub max_pages: Option<usize>,
    pub blocked_substring: String,
    /// Sent with live requests and applied locally to offline data
    pub filter_groups: Vec<FilterGroup>,
    pub fallback_file: Option<String>,
    pub mock_mode: bool,
    pub seed: Option<u64>,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            site: None,
            date_range: DEFAULT_RANGE_NAME.to_string(),
            dimensions: vec![
                "date".to_string(),
                "query".to_string(),
                "page".to_string(),
                "country".to_string(),
            ],
            row_limit: DEFAULT_ROW_LIMIT,
            max_pages: None,
            blocked_substring: DEFAULT_BLOCKED_SUBSTRING.to_string(),
            filter_groups: Vec::new(),
            fallback_file: Some("mock_gsc_data.csv".to_string()),
            mock_mode: false,
            seed: None,
        }
    }
}

impl Config {
    /// Load configuration from a JSON or YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("failed to read {}: {}", path.display(), e)))?;

        let config: Config = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&contents)
                .map_err(|e| AppError::Config(format!("invalid JSON in {}: {}", path.display(), e)))?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&contents)
                .map_err(|e| AppError::Config(format!("invalid YAML in {}: {}", path.display(), e)))?,
            _ => {
                return Err(AppError::Config(format!(
                    "unsupported config file format: {}",
                    path.display()
                )))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Check values that would only fail later, deep inside a request
    pub fn validate(&self) -> AppResult<()> {
        validate_range(self.data.row_limit, 1, MAX_ROW_LIMIT, "data.row_limit").map_err(AppError::Config)?;
        validate_range(self.api.timeout_secs, 1, 600, "api.timeout_secs").map_err(AppError::Config)?;
        validate_range(self.api.max_retries, 0, MAX_API_RETRIES, "api.max_retries").map_err(AppError::Config)?;
        validate_not_empty(&self.api.base_url, "api.base_url").map_err(AppError::Config)?;

        if let Some(site) = &self.data.site {
            validate_site(site).map_err(AppError::Config)?;
        }

        DimensionName::parse_list(&self.data.dimensions.join(","))
            .map_err(|e| AppError::Config(format!("data.dimensions: {}", e)))?;

        for group in &self.data.filter_groups {
            FilterProcessor::from_filter_group(group)
                .map_err(|e| AppError::Config(format!("data.filter_groups: {}", e)))?;
        }

        if query::resolve(&self.data.date_range).is_none() {
            log::warn!(
                "Unknown date range '{}'; the default window will be used",
                self.data.date_range
            );
        }

        Ok(())
    }

    /// Get the log level filter
    pub fn log_level_filter(&self) -> log::LevelFilter {
        match self.logging.level.to_lowercase().as_str() {
            "off" => log::LevelFilter::Off,
            "error" => log::LevelFilter::Error,
            "warn" => log::LevelFilter::Warn,
            "info" => log::LevelFilter::Info,
            "debug" => log::LevelFilter::Debug,
            "trace" => log::LevelFilter::Trace,
            _ => log::LevelFilter::Info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "data:\n  mock_mode: true\n  seed: 7\nserver:\n  port: 9090").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert!(config.data.mock_mode);
        assert_eq!(config.data.seed, Some(7));
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.data.row_limit, DEFAULT_ROW_LIMIT);
        assert_eq!(config.data.blocked_substring, "superapp.backend.apudsi.com");
        assert_eq!(config.api.timeout_secs, 30);
    }

    #[test]
    fn test_json_with_bad_dimension_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"data": {{"dimensions": ["date", "city"]}}}}"#).unwrap();

        assert!(matches!(Config::from_file(file.path()), Err(AppError::Config(_))));
    }

    #[test]
    fn test_retry_count_is_bounded() {
        let mut config = Config::default();
        config.api.max_retries = MAX_API_RETRIES;
        assert!(config.validate().is_ok());

        config.api.max_retries = 32;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_site_must_be_a_property() {
        let mut config = Config::default();
        config.data.site = Some("sc-domain:apudsi.com".to_string());
        assert!(config.validate().is_ok());

        config.data.site = Some("apudsi.com".to_string());
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_filter_groups_from_yaml() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "data:\n  filter_groups:\n    - groupType: or\n      filters:\n        - dimension: query\n          operator: includingRegex\n          expression: \"^rust\""
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.data.filter_groups.len(), 1);
        assert_eq!(config.data.filter_groups[0].filters[0].expression, "^rust");

        let mut broken = config.clone();
        broken.data.filter_groups[0].filters[0].expression = "(unclosed".to_string();
        assert!(matches!(broken.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        assert!(Config::from_file(file.path()).is_err());
    }

    #[test]
    fn test_log_level_filter() {
        let mut config = Config::default();
        config.logging.level = "DEBUG".to_string();
        assert_eq!(config.log_level_filter(), log::LevelFilter::Debug);
        config.logging.level = "verbose".to_string();
        assert_eq!(config.log_level_filter(), log::LevelFilter::Info);
    }
}
