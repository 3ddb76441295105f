//! # Client Configuration
//!
//! Where the backend lives and how the client behaves.
//!
//! Values are layered: built-in defaults, then `storefront.toml` from the
//! platform config directory (or the path given to [`ClientConfig::load`]),
//! then `PUPUK_*` environment variables. A section missing from the file
//! keeps its defaults, and so does a key missing from a section.
//!
//! ## Configuration File Format
//! ```toml
//! # storefront.toml
//! [api]
//! base_url = "https://api.tanisubur.co.id/api"
//! timeout_secs = 30
//!
//! [cache]
//! stale_secs = 60
//!
//! [catalog]
//! page_size = 12
//!
//! [notifications]
//! enabled = true
//! ws_url = "wss://api.tanisubur.co.id/ws/orders"
//!
//! [shipping]
//! regular = 25000
//! cargo = 150000
//! ```

use std::path::PathBuf;
use std::time::Duration;

use pupuk_core::checkout::ShippingRates;
use pupuk_core::DEFAULT_PAGE_SIZE;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};

// =============================================================================
// Sections
// =============================================================================

/// REST backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL every endpoint path is appended to.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: "http://localhost:3000/api".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Seconds a cached response stays fresh.
    pub stale_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings { stale_secs: 60 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    pub page_size: usize,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        CatalogSettings {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Order notification channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub enabled: bool,
    /// Derived from the API base URL when unset.
    pub ws_url: Option<String>,
    pub connect_timeout_secs: u64,
    /// First retry delay; doubles per failure up to `max_backoff_secs`.
    pub initial_backoff_ms: u64,
    pub max_backoff_secs: u64,
    /// 0 retries forever.
    pub max_retries: u32,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        NotificationSettings {
            enabled: true,
            ws_url: None,
            connect_timeout_secs: 10,
            initial_backoff_ms: 500,
            max_backoff_secs: 60,
            max_retries: 0,
        }
    }
}

// =============================================================================
// Main Client Configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api: ApiSettings,
    pub cache: CacheSettings,
    pub catalog: CatalogSettings,
    pub notifications: NotificationSettings,
    /// Flat shipping cost per method.
    pub shipping: ShippingRates,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Config pointing at `base_url`, everything else default.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.api.base_url = base_url.into();
        config
    }

    /// Reads `config_path` (or the platform default), then applies
    /// `PUPUK_*` overrides and validates. A missing file is not an error.
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let path = config_path.or_else(Self::default_config_path);
        let mut config = match path {
            Some(path) if path.exists() => {
                info!(?path, "Reading storefront.toml");
                toml::from_str(&std::fs::read_to_string(&path)?)?
            }
            other => {
                debug!(path = ?other, "No storefront.toml, starting from defaults");
                Self::default()
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config_path: Option<PathBuf>) -> ClientResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ClientError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Storefront config saved");
        Ok(())
    }

    pub fn validate(&self) -> ClientResult<()> {
        let base = Url::parse(&self.api.base_url)?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ClientError::InvalidUrl(format!(
                "API URL must start with http:// or https://, got: {}",
                self.api.base_url
            )));
        }

        if let Some(ref ws) = self.notifications.ws_url {
            if !ws.starts_with("ws://") && !ws.starts_with("wss://") {
                return Err(ClientError::InvalidUrl(format!(
                    "Websocket URL must start with ws:// or wss://, got: {}",
                    ws
                )));
            }
        }

        if self.api.timeout_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if self.catalog.page_size == 0 {
            return Err(ClientError::InvalidConfig(
                "page_size must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies `PUPUK_*` overrides read through `lookup`.
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("PUPUK_API_URL") {
            debug!(url = %url, "API URL from environment");
            self.api.base_url = url;
        }
        if let Some(url) = lookup("PUPUK_WS_URL") {
            self.notifications.ws_url = Some(url);
        }

        let parsed = |key: &str| lookup(key).and_then(|raw| parse_override(key, &raw));
        if let Some(secs) = parsed("PUPUK_TIMEOUT_SECS") {
            self.api.timeout_secs = secs;
        }
        if let Some(size) = parsed("PUPUK_PAGE_SIZE") {
            self.catalog.page_size = size as usize;
        }
        if let Some(secs) = parsed("PUPUK_CACHE_STALE_SECS") {
            self.cache.stale_secs = secs;
        }

        if let Some(flag) = lookup("PUPUK_NOTIFICATIONS") {
            match flag.to_ascii_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => self.notifications.enabled = true,
                "0" | "false" | "off" | "no" => self.notifications.enabled = false,
                _ => warn!(value = %flag, "Ignoring PUPUK_NOTIFICATIONS"),
            }
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("id", "pupuk", "storefront")
            .map(|dirs| dirs.config_dir().join("storefront.toml"))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn stale_time(&self) -> Duration {
        Duration::from_secs(self.cache.stale_secs)
    }

    /// Websocket URL for order notifications.
    ///
    /// Without an explicit `ws_url` this is the API origin with the scheme
    /// swapped (`http → ws`, `https → wss`) and path `/ws/orders`.
    pub fn ws_url(&self) -> ClientResult<String> {
        if let Some(ref url) = self.notifications.ws_url {
            return Ok(url.clone());
        }

        let mut url = Url::parse(&self.api.base_url)?;
        let scheme = match url.scheme() {
            "https" => "wss",
            _ => "ws",
        };
        url.set_scheme(scheme)
            .map_err(|_| ClientError::InvalidUrl(self.api.base_url.clone()))?;
        url.set_path("/ws/orders");
        url.set_query(None);
        Ok(url.to_string())
    }
}

fn parse_override(key: &str, raw: &str) -> Option<u64> {
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring non-numeric override");
            None
        }
    }
}
