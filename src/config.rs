//! Configuration management and validation.
//!
//! Provides the service path table used by the converter, the endpoints of
//! the TDMQ and CKAN collaborators and HTTP settings. Configuration is
//! layered: defaults, then an optional JSON file, then environment variables,
//! then command-line overrides applied by the CLI.

use crate::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_POLL_CONCURRENCY,
    DEFAULT_SERVICE_PATHS, ENV_CKAN_API_KEY, ENV_CKAN_URL, ENV_HTTP_TIMEOUT_SECS, ENV_TDMQ_URL,
};
use crate::error::{IngestionError, Result};
use crate::models::EntityType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Mapping from `fiware-servicePath` header value to entity type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServicePathTable(BTreeMap<String, EntityType>);

impl ServicePathTable {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Add or replace a mapping
    pub fn with_path(mut self, path: impl Into<String>, entity_type: EntityType) -> Self {
        self.0.insert(path.into(), entity_type);
        self
    }

    pub fn entity_type(&self, path: &str) -> Option<&EntityType> {
        self.0.get(path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl Default for ServicePathTable {
    fn default() -> Self {
        DEFAULT_SERVICE_PATHS
            .iter()
            .fold(Self::new(), |table, (path, category, subcategory)| {
                table.with_path(*path, EntityType::new(*category, *subcategory))
            })
    }
}

/// TDMQ endpoint settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TdmqConfig {
    /// Base API URL, e.g. `http://tdmq:8000/api/v0.0`
    pub url: Option<String>,

    /// Concurrent time series requests while polling sources
    pub poll_concurrency: Option<usize>,
}

impl TdmqConfig {
    pub fn poll_concurrency(&self) -> usize {
        self.poll_concurrency.unwrap_or(DEFAULT_POLL_CONCURRENCY).max(1)
    }
}

/// CKAN endpoint settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CkanConfig {
    pub url: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Top-level ingestion configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    pub service_paths: ServicePathTable,
    pub tdmq: TdmqConfig,
    pub ckan: CkanConfig,
    pub http: HttpConfig,
}

impl IngestionConfig {
    /// Default configuration file location (`<config dir>/tdm-ingestion/config.json`)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            IngestionError::configuration("Could not determine user configuration directory")
        })?;
        Ok(config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            IngestionError::configuration(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        serde_json::from_str(&contents).map_err(|e| {
            IngestionError::configuration(format!(
                "Invalid config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Load defaults, then the config file (if any), then environment overrides
    pub fn load_layered(config_file: Option<&Path>) -> Result<Self> {
        let mut config = match config_file {
            Some(path) => {
                debug!("Loading configuration from {}", path.display());
                Self::from_file(path)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in production)
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_blank(ENV_TDMQ_URL) {
            self.tdmq.url = Some(url);
        }
        if let Some(url) = non_blank(ENV_CKAN_URL) {
            self.ckan.url = Some(url);
        }
        if let Some(key) = non_blank(ENV_CKAN_API_KEY) {
            self.ckan.api_key = Some(key);
        }
        if let Some(timeout) = non_blank(ENV_HTTP_TIMEOUT_SECS) {
            self.http.timeout_secs = timeout.trim().parse().map_err(|_| {
                IngestionError::configuration(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    ENV_HTTP_TIMEOUT_SECS, timeout
                ))
            })?;
        }
        Ok(())
    }

    pub fn with_tdmq_url(mut self, url: impl Into<String>) -> Self {
        self.tdmq.url = Some(url.into());
        self
    }

    pub fn with_ckan(mut self, url: impl Into<String>, api_key: impl Into<String>) -> Self {
        self.ckan.url = Some(url.into());
        self.ckan.api_key = Some(api_key.into());
        self
    }

    pub fn with_service_paths(mut self, service_paths: ServicePathTable) -> Self {
        self.service_paths = service_paths;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.service_paths.is_empty() {
            return Err(IngestionError::configuration(
                "service_paths must contain at least one mapping",
            ));
        }

        for path in self.service_paths.paths() {
            if path.trim().is_empty() {
                return Err(IngestionError::configuration(
                    "service_paths contains a blank service path",
                ));
            }
        }

        for (name, url) in [("tdmq.url", &self.tdmq.url), ("ckan.url", &self.ckan.url)] {
            if let Some(url) = url {
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(IngestionError::configuration(format!(
                        "{} must be an http(s) URL, got '{}'",
                        name, url
                    )));
                }
            }
        }

        if self.http.timeout_secs == 0 {
            return Err(IngestionError::configuration(
                "http.timeout_secs must be greater than 0",
            ));
        }

        Ok(())
    }

    /// TDMQ URL or a configuration error naming the missing setting
    pub fn require_tdmq_url(&self) -> Result<&str> {
        self.tdmq.url.as_deref().ok_or_else(|| {
            IngestionError::configuration(format!(
                "TDMQ URL not configured (use --tdmq-url, {} or tdmq.url)",
                ENV_TDMQ_URL
            ))
        })
    }

    /// CKAN URL and API key or a configuration error
    pub fn require_ckan(&self) -> Result<(&str, &str)> {
        let url = self.ckan.url.as_deref().ok_or_else(|| {
            IngestionError::configuration(format!(
                "CKAN URL not configured (use --ckan-url, {} or ckan.url)",
                ENV_CKAN_URL
            ))
        })?;
        let api_key = self.ckan.api_key.as_deref().ok_or_else(|| {
            IngestionError::configuration(format!(
                "CKAN API key not configured (use --ckan-api-key, {} or ckan.api_key)",
                ENV_CKAN_API_KEY
            ))
        })?;
        Ok((url, api_key))
    }
}
