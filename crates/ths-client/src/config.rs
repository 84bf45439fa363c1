//! # Client Configuration
//!
//! Where the REST services live, how long to wait for them, and where the
//! local cache is kept.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     THS_API_URL=https://api.example.com                                │
//! │     THS_CATALOG_URL=https://catalog.example.com                        │
//! │     THS_TIMEOUT_SECS=30                                                │
//! │     THS_CACHE_DIR=/var/lib/ths/cache                                   │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/ths-pos/ths.toml (Linux)                                 │
//! │     ~/Library/Application Support/com.ths.pos/ths.toml (macOS)         │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     localhost services, 30 s timeout, platform data dir for cache      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # ths.toml
//! [api]
//! core_url = "http://192.168.1.20:3000"
//! catalog_url = "http://192.168.1.20:4000"
//! timeout_secs = 30
//!
//! [cache]
//! dir = "/var/lib/ths/cache"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};

// =============================================================================
// Sections
// =============================================================================

/// Remote service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Core service: users, orders, shifts, transfers, carts.
    #[serde(default = "default_core_url")]
    pub core_url: String,

    /// Catalog service: product creation and promo codes.
    #[serde(default = "default_catalog_url")]
    pub catalog_url: String,

    /// Per-request timeout. A stalled request fails after this long.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_core_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_catalog_url() -> String {
    "http://localhost:4000".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            core_url: default_core_url(),
            catalog_url: default_catalog_url(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Local cache settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Directory for cache snapshots. `None` uses the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

// =============================================================================
// Client Config
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub cache: CacheSettings,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (ths.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading client config from file");
                let contents = std::fs::read_to_string(&path)
                    .map_err(|e| ClientError::ConfigLoadFailed(e.to_string()))?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load client config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ClientResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ClientError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)
            .map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Client config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        Self::validate_service_url("core_url", &self.api.core_url)?;
        Self::validate_service_url("catalog_url", &self.api.catalog_url)?;

        if self.api.timeout_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    fn validate_service_url(field: &str, raw: &str) -> ClientResult<()> {
        let url = Url::parse(raw)?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ClientError::InvalidUrl(format!(
                "{} must start with http:// or https://, got: {}",
                field, raw
            )));
        }
        Ok(())
    }

    /// Applies `THS_*` overrides from `lookup` (the process environment in production).
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("THS_API_URL") {
            debug!(url = %url, "Overriding core API URL from environment");
            self.api.core_url = url;
        }

        if let Some(url) = lookup("THS_CATALOG_URL") {
            debug!(url = %url, "Overriding catalog URL from environment");
            self.api.catalog_url = url;
        }

        if let Some(timeout) = lookup("THS_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(secs) => self.api.timeout_secs = secs,
                Err(_) => warn!(value = %timeout, "Ignoring non-numeric THS_TIMEOUT_SECS"),
            }
        }

        if let Some(dir) = lookup("THS_CACHE_DIR") {
            self.cache.dir = Some(PathBuf::from(dir));
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "ths", "pos")
            .map(|dirs| dirs.config_dir().join("ths.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// Resolved cache directory, if one can be determined.
    pub fn cache_dir(&self) -> Option<PathBuf> {
        self.cache.dir.clone().or_else(|| {
            directories::ProjectDirs::from("com", "ths", "pos")
                .map(|dirs| dirs.data_dir().join("cache"))
        })
    }
}
