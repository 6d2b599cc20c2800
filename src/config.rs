// Configuration module for marquee
// Handles XDG-compliant config directory and TOML configuration file

use serde::Deserialize;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "marquee";
const CONFIG_FILENAME: &str = "config.toml";

const DEFAULT_SEARCH_URL: &str = "https://www.google.com/search?q={query}";
const DEFAULT_OMDB_URL: &str = "https://www.omdbapi.com/";
const DEFAULT_USER_AGENT: &str = concat!("marquee/", env!("CARGO_PKG_VERSION"));

/// TOML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Cinema listing source
    pub cinema: CinemaConfig,

    /// Web search backend used for title resolution
    pub search: SearchConfig,

    /// Metadata backend (OMDb)
    pub metadata: MetadataConfig,

    /// Pipeline tuning
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CinemaConfig {
    /// Listing URL template with a {date} placeholder (YYYYMMDD)
    pub listing_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Search URL template with a {query} placeholder
    pub url: String,

    /// User-Agent sent on every outbound request
    pub user_agent: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SEARCH_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// OMDb endpoint
    pub api_url: String,

    /// OMDb API key (required to fetch metadata)
    pub api_key: Option<String>,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_OMDB_URL.to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Reject matches released before this year (fail open on missing years)
    pub year_cutoff: i32,

    /// Bounded metadata cache capacity (LRU)
    pub cache_capacity: usize,

    /// Concurrent entries in flight
    pub max_workers: usize,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            year_cutoff: 2016,
            cache_capacity: 256,
            max_workers: 4,
            request_timeout_secs: 10,
        }
    }
}

/// Application configuration - combines TOML file with environment overrides
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listing_url: Option<String>,
    pub search_url: String,
    pub omdb_url: String,
    pub omdb_api_key: Option<String>,
    pub user_agent: String,
    pub year_cutoff: i32,
    pub cache_capacity: usize,
    pub max_workers: usize,
    pub request_timeout_secs: u64,
}

impl AppConfig {
    /// Load configuration from TOML file and environment
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. TOML config file
    /// 3. Default values
    pub fn load() -> Self {
        let config_dir = Self::find_config_dir();
        let config_file = Self::load_config_file(&config_dir);
        Self::build(config_file)
    }

    /// Find the config directory (for locating config.toml)
    fn find_config_dir() -> PathBuf {
        // Environment variable takes priority
        if let Ok(path) = std::env::var("MARQUEE_CONFIG_DIR") {
            return PathBuf::from(path);
        }

        // Then XDG config dir
        if let Some(dir) = dirs::config_dir() {
            return dir.join(APP_NAME);
        }

        // Fallback to current directory
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }

    /// Load and parse the TOML config file
    fn load_config_file(config_dir: &Path) -> ConfigFile {
        let config_path = config_dir.join(CONFIG_FILENAME);

        if !config_path.exists() {
            tracing::debug!(
                "No config file found at {}, using defaults",
                config_path.display()
            );
            return ConfigFile::default();
        }

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded configuration from {}", config_path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse config file {}: {}. Using defaults.",
                        config_path.display(),
                        e
                    );
                    ConfigFile::default()
                }
            },
            Err(e) => {
                tracing::warn!(
                    "Failed to read config file {}: {}. Using defaults.",
                    config_path.display(),
                    e
                );
                ConfigFile::default()
            }
        }
    }

    /// Build configuration from config file with environment overrides
    fn build(config_file: ConfigFile) -> Self {
        // Listing URL: env > config
        let listing_url = std::env::var("MARQUEE_LISTING_URL")
            .ok()
            .or(config_file.cinema.listing_url);

        // Search URL: env > config > default
        let search_url = std::env::var("MARQUEE_SEARCH_URL")
            .ok()
            .unwrap_or(config_file.search.url);

        // API key: env > config
        let omdb_api_key = std::env::var("OMDB_API_KEY")
            .ok()
            .or(config_file.metadata.api_key);

        // User agent: env > config > default
        let user_agent = std::env::var("MARQUEE_USER_AGENT")
            .ok()
            .unwrap_or(config_file.search.user_agent);

        Self {
            listing_url,
            search_url,
            omdb_url: config_file.metadata.api_url,
            omdb_api_key,
            user_agent,
            year_cutoff: config_file.pipeline.year_cutoff,
            cache_capacity: config_file.pipeline.cache_capacity,
            max_workers: config_file.pipeline.max_workers,
            request_timeout_secs: config_file.pipeline.request_timeout_secs,
        }
    }

    /// Log configuration status
    pub fn log_config(&self) {
        match self.listing_url {
            Some(ref url) => tracing::info!("Cinema listing: {}", url),
            None => tracing::warn!(
                "No cinema listing configured. Set cinema.listing_url in config.toml \
                 or MARQUEE_LISTING_URL"
            ),
        }

        if self.omdb_api_key.is_some() {
            tracing::info!("Metadata provider: OMDb");
        } else {
            tracing::warn!("No OMDb API key configured");
            tracing::info!("Hint: Add api_key to config.toml or set OMDB_API_KEY env var");
        }

        tracing::debug!(
            "Pipeline: {} workers, {}s timeout, cache {}, year cutoff {}",
            self.max_workers,
            self.request_timeout_secs,
            self.cache_capacity,
            self.year_cutoff
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_file() {
        let config = ConfigFile::default();
        assert!(config.cinema.listing_url.is_none());
        assert_eq!(config.search.url, DEFAULT_SEARCH_URL);
        assert_eq!(config.metadata.api_url, DEFAULT_OMDB_URL);
        assert!(config.metadata.api_key.is_none());
        assert_eq!(config.pipeline.year_cutoff, 2016);
        assert_eq!(config.pipeline.cache_capacity, 256);
    }

    #[test]
    fn test_parse_config_toml() {
        let toml_str = r#"
[cinema]
listing_url = "https://cinema.example/agenda?filter={date}"

[search]
url = "https://search.example/?q={query}"
user_agent = "test-agent/1.0"

[metadata]
api_key = "test_key"

[pipeline]
year_cutoff = 2020
max_workers = 8
"#;
        let config: ConfigFile = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.cinema.listing_url.as_deref(),
            Some("https://cinema.example/agenda?filter={date}")
        );
        assert_eq!(config.search.url, "https://search.example/?q={query}");
        assert_eq!(config.search.user_agent, "test-agent/1.0");
        assert_eq!(config.metadata.api_key.as_deref(), Some("test_key"));
        assert_eq!(config.pipeline.year_cutoff, 2020);
        assert_eq!(config.pipeline.max_workers, 8);
        // Unspecified keys keep their defaults
        assert_eq!(config.pipeline.cache_capacity, 256);
        assert_eq!(config.metadata.api_url, DEFAULT_OMDB_URL);
    }

    #[test]
    fn test_partial_config_toml() {
        // Partial configs work (only specify what you need)
        let toml_str = r#"
[metadata]
api_key = "abc123"
"#;
        let config: ConfigFile = toml::from_str(toml_str).unwrap();
        assert_eq!(config.metadata.api_key.as_deref(), Some("abc123"));
        assert_eq!(config.pipeline.request_timeout_secs, 10);
    }
}
