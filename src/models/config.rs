//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Listing page and HTTP client settings
    #[serde(default)]
    pub source: SourceConfig,

    /// Feed channel metadata
    #[serde(default)]
    pub feed: FeedConfig,

    /// Refresh timing
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Event store settings
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.source.user_agent.trim().is_empty() {
            return Err(AppError::validation("source.user_agent is empty"));
        }
        if self.source.timeout_secs == 0 {
            return Err(AppError::validation("source.timeout_secs must be > 0"));
        }
        url::Url::parse(&self.source.base_url)
            .map_err(|e| AppError::validation(format!("source.base_url: {e}")))?;
        url::Url::parse(&self.source.listing_url)
            .map_err(|e| AppError::validation(format!("source.listing_url: {e}")))?;
        if self.schedule.interval_secs == 0 {
            return Err(AppError::validation("schedule.interval_secs must be > 0"));
        }
        if self.feed.title.trim().is_empty() {
            return Err(AppError::validation("feed.title is empty"));
        }
        if self.server.bind.parse::<std::net::SocketAddr>().is_err() {
            return Err(AppError::validation(format!(
                "server.bind is not a socket address: {}",
                self.server.bind
            )));
        }
        Ok(())
    }
}

/// Listing page and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Site root, used for event links and relative photo paths
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Filtered listing page that is scraped
    #[serde(default = "defaults::listing_url")]
    pub listing_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            listing_url: defaults::listing_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Feed channel metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "defaults::feed_title")]
    pub title: String,

    #[serde(default = "defaults::base_url")]
    pub link: String,

    #[serde(default = "defaults::feed_title")]
    pub description: String,

    #[serde(default = "defaults::language")]
    pub language: String,

    /// Public URL of the feed itself (atom self link)
    #[serde(default = "defaults::self_link")]
    pub self_link: String,

    /// Refresh hint for readers in minutes
    #[serde(default = "defaults::ttl")]
    pub ttl_minutes: u32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            title: defaults::feed_title(),
            link: defaults::base_url(),
            description: defaults::feed_title(),
            language: defaults::language(),
            self_link: defaults::self_link(),
            ttl_minutes: defaults::ttl(),
        }
    }
}

/// Refresh timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Seconds between two refresh cycles
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,

    /// Seconds to wait before the first cycle
    #[serde(default)]
    pub initial_delay_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval(),
            initial_delay_secs: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "defaults::bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: defaults::bind(),
        }
    }
}

/// Event store settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Directory holding `events.json`; the CLI storage dir when unset
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl StorageConfig {
    pub fn data_dir_or(&self, fallback: &Path) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| fallback.to_path_buf())
    }
}

mod defaults {
    pub fn base_url() -> String {
        "https://www.wuppertal-live.de".into()
    }
    pub fn listing_url() -> String {
        "https://www.wuppertal-live.de/events/mode=utf8;client=;what=rubrik;show=21;shop=0;cal=wuppertal"
            .into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; wuppertal-live-rss/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    pub fn feed_title() -> String {
        "Wuppertal Live".into()
    }
    pub fn language() -> String {
        "de-de".into()
    }
    pub fn self_link() -> String {
        "https://wuppertal-live.thelfensdrfer.de/rss.xml".into()
    }
    pub fn ttl() -> u32 {
        60
    }

    pub fn interval() -> u64 {
        3600
    }

    pub fn bind() -> String {
        "0.0.0.0:8000".into()
    }
}
