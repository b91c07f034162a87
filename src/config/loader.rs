//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching screener.toml structure.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::adapters::dexscreener::{FeedConfig, DEFAULT_ORIGIN, DEFAULT_USER_AGENT};
use crate::adapters::storage::DEFAULT_OUTPUT_DIR;
use crate::application::enricher::{token_url, DEFAULT_TOKEN_INFO_ENDPOINT};
use crate::application::rate_limiter::DEFAULT_RATE_LIMIT_PER_SECOND;

/// Environment variable that overrides `[screener].ws_url`
pub const WS_URL_ENV: &str = "SCREENER_WS_URL";

/// Main configuration structure matching screener.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub screener: ScreenerSection,
    #[serde(default)]
    pub feed: FeedSection,
    #[serde(default)]
    pub dexscreener: DexScreenerSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Screener configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct ScreenerSection {
    /// Pairs feed websocket URL
    pub ws_url: String,
    /// Minimum seconds between two refresh cycles
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    /// Directory for the daily token files (`~` is expanded)
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Day boundary as minutes east of UTC; local time when unset
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
    /// Command-line override, wins over env and file
    #[serde(skip)]
    pub ws_url_override: Option<String>,
}

impl ScreenerSection {
    /// Get the websocket URL with environment variable override
    /// Checks SCREENER_WS_URL env var first, falls back to config value
    pub fn get_ws_url(&self) -> String {
        self.resolve_ws_url(std::env::var(WS_URL_ENV).ok())
    }

    fn resolve_ws_url(&self, env_value: Option<String>) -> String {
        self.ws_url_override
            .clone()
            .or(env_value)
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| self.ws_url.clone())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// Output directory with `~` and env vars expanded
    pub fn output_dir(&self) -> PathBuf {
        match shellexpand::full(&self.output_dir) {
            Ok(expanded) => PathBuf::from(expanded.to_string()),
            Err(_) => PathBuf::from(shellexpand::tilde(&self.output_dir).to_string()),
        }
    }
}

/// Websocket feed configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct FeedSection {
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_receive_timeout_secs")]
    pub receive_timeout_secs: u64,
    /// Connections tried per refresh cycle
    #[serde(default = "default_attempts")]
    pub connect_attempts: u32,
    /// Frames read per connection while waiting for a pairs frame
    #[serde(default = "default_attempts")]
    pub receive_attempts: u32,
    #[serde(default = "default_connect_retry_delay_ms")]
    pub connect_retry_delay_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_origin")]
    pub origin: String,
}

impl Default for FeedSection {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            receive_timeout_secs: default_receive_timeout_secs(),
            connect_attempts: default_attempts(),
            receive_attempts: default_attempts(),
            connect_retry_delay_ms: default_connect_retry_delay_ms(),
            user_agent: default_user_agent(),
            origin: default_origin(),
        }
    }
}

impl FeedSection {
    pub fn connect_retry_delay(&self) -> Duration {
        Duration::from_millis(self.connect_retry_delay_ms)
    }

    pub fn to_feed_config(&self) -> FeedConfig {
        FeedConfig {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            receive_timeout: Duration::from_secs(self.receive_timeout_secs),
            user_agent: self.user_agent.clone(),
            origin: self.origin.clone(),
        }
    }
}

/// DexScreener tokens API configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct DexScreenerSection {
    /// Endpoint the token address is appended to
    #[serde(default = "default_token_info_endpoint")]
    pub token_info_endpoint: String,
    /// Global request rate across all lookups
    #[serde(default = "default_rate_limit_per_second")]
    pub rate_limit_per_second: f64,
    /// Attempts per address on transport or parse failures
    #[serde(default = "default_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for DexScreenerSection {
    fn default() -> Self {
        Self {
            token_info_endpoint: default_token_info_endpoint(),
            rate_limit_per_second: default_rate_limit_per_second(),
            max_attempts: default_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl DexScreenerSection {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log to file (in addition to stdout)
    #[serde(default)]
    pub log_to_file: bool,
    /// Log file path
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_to_file: false,
            log_file: default_log_file(),
        }
    }
}

fn default_refresh_interval_secs() -> u64 {
    60
}

fn default_output_dir() -> String {
    DEFAULT_OUTPUT_DIR.to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_receive_timeout_secs() -> u64 {
    30
}

fn default_attempts() -> u32 {
    3
}

fn default_connect_retry_delay_ms() -> u64 {
    500
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_origin() -> String {
    DEFAULT_ORIGIN.to_string()
}

fn default_token_info_endpoint() -> String {
    DEFAULT_TOKEN_INFO_ENDPOINT.to_string()
}

fn default_rate_limit_per_second() -> f64 {
    DEFAULT_RATE_LIMIT_PER_SECOND
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/screener.log".to_string()
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ws_url = self.screener.get_ws_url();
        if ws_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "ws_url cannot be empty".to_string(),
            ));
        }

        if !ws_url.starts_with("ws://") && !ws_url.starts_with("wss://") {
            return Err(ConfigError::ValidationError(format!(
                "ws_url must be a ws:// or wss:// URL, got {}",
                ws_url
            )));
        }

        if self.screener.output_dir.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "output_dir cannot be empty".to_string(),
            ));
        }

        if let Some(offset) = self.screener.utc_offset_minutes {
            if !(-1439..=1439).contains(&offset) {
                return Err(ConfigError::ValidationError(format!(
                    "utc_offset_minutes must be within +/-1439, got {}",
                    offset
                )));
            }
        }

        // Validate feed section
        if self.feed.connect_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "connect_attempts must be > 0".to_string(),
            ));
        }

        if self.feed.receive_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "receive_attempts must be > 0".to_string(),
            ));
        }

        if self.feed.connect_timeout_secs == 0 || self.feed.receive_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "feed timeouts must be > 0".to_string(),
            ));
        }

        // Validate DexScreener section
        let rate = self.dexscreener.rate_limit_per_second;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "rate_limit_per_second must be > 0, got {}",
                rate
            )));
        }

        if self.dexscreener.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "max_attempts must be > 0".to_string(),
            ));
        }

        if self.dexscreener.token_info_endpoint.is_empty() {
            return Err(ConfigError::ValidationError(
                "token_info_endpoint cannot be empty".to_string(),
            ));
        }

        if let Err(e) = token_url(&self.dexscreener.token_info_endpoint, "mint") {
            return Err(ConfigError::ValidationError(e.to_string()));
        }

        if self.dexscreener.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}
