//! # Client Configuration
//!
//! Configuration for the API client, search behavior and payment defaults.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TILL_API_BASE=https://pos.example.com                              │
//! │     TILL_SEARCH_DEBOUNCE_MS=300                                        │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/till-pos/till.toml (Linux)                               │
//! │     ~/Library/Application Support/com.till.pos/till.toml (macOS)       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     http://localhost:5000, 250 ms debounce, 27000 SOS per USD          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # till.toml
//! [api]
//! base_url = "http://localhost:5000"
//! timeout_secs = 30
//! product_search_limit = 20
//! account_limit = 200
//!
//! [auth]
//! token_path = "/var/lib/till/token"
//!
//! [search]
//! debounce_ms = 250
//! min_chars = 2
//!
//! [payment]
//! default_exchange_rate = "27000"
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use till_core::{ExchangeRate, DEFAULT_SEARCH_MIN_CHARS, DEFAULT_SOS_PER_USD};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};

// =============================================================================
// API Settings
// =============================================================================

/// Where the remote API lives and how much to ask it for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL; endpoint paths such as `/api/sales` are appended to it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// `limit` sent with product searches.
    #[serde(default = "default_product_limit")]
    pub product_search_limit: usize,

    /// `limit` sent when loading payment accounts.
    #[serde(default = "default_account_limit")]
    pub account_limit: usize,
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_product_limit() -> usize {
    20
}

fn default_account_limit() -> usize {
    200
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            product_search_limit: default_product_limit(),
            account_limit: default_account_limit(),
        }
    }
}

// =============================================================================
// Auth Settings
// =============================================================================

/// Where the bearer token is kept between runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthSettings {
    /// Token file. Defaults to the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_path: Option<PathBuf>,
}

// =============================================================================
// Search Settings
// =============================================================================

/// Debounce behavior for product and customer search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Quiet period after the last keystroke before a search fires.
    #[serde(default = "default_debounce")]
    pub debounce_ms: u64,

    /// Minimum trimmed characters before a product search is sent.
    #[serde(default = "default_min_chars")]
    pub min_chars: usize,
}

fn default_debounce() -> u64 {
    250
}

fn default_min_chars() -> usize {
    DEFAULT_SEARCH_MIN_CHARS
}

impl Default for SearchSettings {
    fn default() -> Self {
        SearchSettings {
            debounce_ms: default_debounce(),
            min_chars: default_min_chars(),
        }
    }
}

impl SearchSettings {
    /// Debounce period as a `Duration`.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

// =============================================================================
// Payment Settings
// =============================================================================

/// Payment defaults for new drafts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSettings {
    /// SOS per USD prefilled in a new draft.
    #[serde(default = "default_exchange_rate", with = "rust_decimal::serde::str")]
    pub default_exchange_rate: Decimal,
}

fn default_exchange_rate() -> Decimal {
    Decimal::from(DEFAULT_SOS_PER_USD)
}

impl Default for PaymentSettings {
    fn default() -> Self {
        PaymentSettings {
            default_exchange_rate: default_exchange_rate(),
        }
    }
}

// =============================================================================
// Main Client Configuration
// =============================================================================

/// Complete client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub auth: AuthSettings,

    #[serde(default)]
    pub search: SearchSettings,

    #[serde(default)]
    pub payment: PaymentSettings,
}

impl ClientConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (till.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading client config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
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

        let save_failed = |e: std::io::Error| ClientError::ConfigSaveFailed(e.to_string());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(save_failed)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(save_failed)?;

        info!(?path, "Client config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        let url = Url::parse(&self.api.base_url)?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ClientError::InvalidUrl(format!(
                "API URL must start with http:// or https://, got: {}",
                self.api.base_url
            )));
        }

        if self.api.timeout_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if self.api.product_search_limit == 0 || self.api.account_limit == 0 {
            return Err(ClientError::InvalidConfig(
                "search and account limits must be greater than 0".into(),
            ));
        }

        self.exchange_rate()?;

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = var("TILL_API_BASE") {
            debug!(url = %url, "Overriding API base from environment");
            self.api.base_url = url;
        }

        if let Some(path) = var("TILL_TOKEN_PATH") {
            self.auth.token_path = Some(PathBuf::from(path));
        }

        if let Some(ms) = var("TILL_SEARCH_DEBOUNCE_MS") {
            match ms.parse::<u64>() {
                Ok(ms) => self.search.debounce_ms = ms,
                Err(_) => warn!(value = %ms, "Ignoring invalid TILL_SEARCH_DEBOUNCE_MS"),
            }
        }

        if let Some(n) = var("TILL_SEARCH_MIN_CHARS") {
            match n.parse::<usize>() {
                Ok(n) => self.search.min_chars = n,
                Err(_) => warn!(value = %n, "Ignoring invalid TILL_SEARCH_MIN_CHARS"),
            }
        }

        if let Some(n) = var("TILL_PRODUCT_SEARCH_LIMIT") {
            match n.parse::<usize>() {
                Ok(n) => self.api.product_search_limit = n,
                Err(_) => warn!(value = %n, "Ignoring invalid TILL_PRODUCT_SEARCH_LIMIT"),
            }
        }

        if let Some(n) = var("TILL_ACCOUNT_LIMIT") {
            match n.parse::<usize>() {
                Ok(n) => self.api.account_limit = n,
                Err(_) => warn!(value = %n, "Ignoring invalid TILL_ACCOUNT_LIMIT"),
            }
        }

        if let Some(rate) = var("TILL_DEFAULT_EXCHANGE_RATE") {
            match Decimal::from_str(rate.trim()) {
                Ok(rate) => {
                    debug!(rate = %rate, "Overriding default exchange rate from environment");
                    self.payment.default_exchange_rate = rate;
                }
                Err(_) => warn!(value = %rate, "Ignoring invalid TILL_DEFAULT_EXCHANGE_RATE"),
            }
        }

        if let Some(secs) = var("TILL_REQUEST_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(secs) => self.api.timeout_secs = secs,
                Err(_) => warn!(value = %secs, "Ignoring invalid TILL_REQUEST_TIMEOUT_SECS"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "till", "pos")
            .map(|dirs| dirs.config_dir().join("till.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Returns the API base URL.
    pub fn base_url(&self) -> &str {
        &self.api.base_url
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// Default rate for new drafts.
    pub fn exchange_rate(&self) -> ClientResult<ExchangeRate> {
        ExchangeRate::new(self.payment.default_exchange_rate)
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))
    }
}
