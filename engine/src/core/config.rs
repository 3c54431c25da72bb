use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_DEBOUNCE_MS, DEFAULT_DISCOVERY_CACHE_CAPACITY,
    DEFAULT_DISCOVERY_MAX_PAGES, DEFAULT_DISCOVERY_RETRY_ATTEMPTS, DEFAULT_DISCOVERY_TIMEOUT_SECS,
    DEFAULT_DISCOVERY_URL, DEFAULT_MAX_GROUP_DEPTH, SAVED_SEARCHES_FILE_NAME,
};

// =============================================================================
// File Configuration
// =============================================================================

#[derive(Debug, Default, Clone, Deserialize)]
pub struct DiscoveryFileConfig {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_pages: Option<usize>,
    pub cache_capacity: Option<u64>,
    pub retry_attempts: Option<u32>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct SearchFileConfig {
    pub debounce_ms: Option<u64>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct FilterFileConfig {
    pub max_depth: Option<usize>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub discovery: Option<DiscoveryFileConfig>,
    pub search: Option<SearchFileConfig>,
    pub filter: Option<FilterFileConfig>,
    /// Path to the column schema JSON file
    pub columns: Option<String>,
    /// Path to the saved searches JSON file
    pub saved_searches: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Read one JSON layer and report keys this version does not know
    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let layer: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        let unknown = layer.unknown_keys();
        if !unknown.is_empty() {
            tracing::warn!(
                path = %path.display(),
                keys = %unknown.join(", "),
                "Ignoring unknown config keys"
            );
        }
        tracing::debug!(path = %path.display(), "Config layer loaded");
        Ok(layer)
    }

    fn unknown_keys(&self) -> Vec<&str> {
        match &self.extra {
            serde_json::Value::Object(map) => map.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(discovery) = other.discovery {
            let current = self
                .discovery
                .get_or_insert_with(DiscoveryFileConfig::default);
            if discovery.base_url.is_some() {
                tracing::trace!(base_url = ?discovery.base_url, "Merging discovery.base_url");
                current.base_url = discovery.base_url;
            }
            if discovery.timeout_secs.is_some() {
                current.timeout_secs = discovery.timeout_secs;
            }
            if discovery.max_pages.is_some() {
                current.max_pages = discovery.max_pages;
            }
            if discovery.cache_capacity.is_some() {
                current.cache_capacity = discovery.cache_capacity;
            }
            if discovery.retry_attempts.is_some() {
                current.retry_attempts = discovery.retry_attempts;
            }
        }

        if let Some(search) = other.search {
            let current = self.search.get_or_insert_with(SearchFileConfig::default);
            if search.debounce_ms.is_some() {
                tracing::trace!(debounce_ms = ?search.debounce_ms, "Merging search.debounce_ms");
                current.debounce_ms = search.debounce_ms;
            }
        }

        if let Some(filter) = other.filter {
            let current = self.filter.get_or_insert_with(FilterFileConfig::default);
            if filter.max_depth.is_some() {
                tracing::trace!(max_depth = ?filter.max_depth, "Merging filter.max_depth");
                current.max_depth = filter.max_depth;
            }
        }

        if other.columns.is_some() {
            self.columns = other.columns;
        }
        if other.saved_searches.is_some() {
            self.saved_searches = other.saved_searches;
        }
    }
}

// =============================================================================
// Resolved Configuration
// =============================================================================

#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub max_pages: usize,
    pub cache_capacity: u64,
    pub retry_attempts: u32,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_DISCOVERY_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_DISCOVERY_TIMEOUT_SECS),
            max_pages: DEFAULT_DISCOVERY_MAX_PAGES,
            cache_capacity: DEFAULT_DISCOVERY_CACHE_CAPACITY,
            retry_attempts: DEFAULT_DISCOVERY_RETRY_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub debounce: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterConfig {
    pub max_depth: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_GROUP_DEPTH,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub discovery: DiscoveryConfig,
    pub search: SearchConfig,
    pub filter: FilterConfig,
    pub columns: Option<PathBuf>,
    pub saved_searches: PathBuf,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.filterforge/filterforge.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        Self::load_layered(cli, get_profile_config_path().as_deref())
    }

    fn load_layered(cli: &CliConfig, profile_path: Option<&Path>) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        // 1. Profile dir - skip if not exists
        if let Some(profile_path) = profile_path
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(profile_path)?;
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        // 2. CLI-specified path OR local directory
        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        // 3. Layer: defaults -> file config -> CLI/env overrides
        let file_discovery = file_config.discovery.unwrap_or_default();
        let file_search = file_config.search.unwrap_or_default();
        let file_filter = file_config.filter.unwrap_or_default();
        let defaults = DiscoveryConfig::default();

        let base_url = cli
            .discovery_url
            .clone()
            .or(file_discovery.base_url)
            .unwrap_or(defaults.base_url);
        reqwest::Url::parse(&base_url)
            .with_context(|| format!("Invalid discovery base URL: {}", base_url))?;

        let discovery = DiscoveryConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: file_discovery
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            max_pages: file_discovery.max_pages.unwrap_or(defaults.max_pages).max(1),
            cache_capacity: file_discovery
                .cache_capacity
                .unwrap_or(defaults.cache_capacity),
            retry_attempts: file_discovery
                .retry_attempts
                .unwrap_or(defaults.retry_attempts)
                .max(1),
        };

        let search = SearchConfig {
            debounce: Duration::from_millis(
                file_search.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS),
            ),
        };

        let max_depth = cli
            .max_depth
            .or(file_filter.max_depth)
            .unwrap_or(DEFAULT_MAX_GROUP_DEPTH);
        if max_depth == 0 {
            anyhow::bail!("filter.max_depth must be at least 1");
        }

        let columns = cli
            .columns
            .clone()
            .or_else(|| file_config.columns.as_deref().map(expand_path));

        let saved_searches = file_config
            .saved_searches
            .as_deref()
            .map(expand_path)
            .unwrap_or_else(default_saved_searches_path);

        let config = Self {
            discovery,
            search,
            filter: FilterConfig { max_depth },
            columns,
            saved_searches,
        };
        tracing::debug!(
            base_url = %config.discovery.base_url,
            max_depth = config.filter.max_depth,
            columns = ?config.columns,
            "Configuration loaded"
        );
        Ok(config)
    }
}

fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

fn default_saved_searches_path() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(APP_DOT_FOLDER))
        .unwrap_or_else(|| PathBuf::from(APP_DOT_FOLDER))
        .join(SAVED_SEARCHES_FILE_NAME)
}
