//! Configuration Module
//!
//! Loads and validates configuration from TOML files.

pub mod loader;

pub use loader::{
    load_config, Config, ConfigError, DexScreenerSection, FeedSection, LoggingSection,
    ScreenerSection, WS_URL_ENV,
};
