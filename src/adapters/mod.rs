//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - DexScreener: pairs websocket feed and tokens API client
//! - Storage: daily JSON token files
//! - CLI: Command-line interface definitions

pub mod dexscreener;
pub mod storage;
pub mod cli;

pub use dexscreener::{DexScreenerClient, DexScreenerFeed, FeedConfig};
pub use storage::JsonFileStore;
pub use cli::CliApp;
