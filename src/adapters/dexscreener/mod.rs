//! DexScreener adapters: pairs websocket feed and tokens API client

pub mod client;
pub mod feed;

pub use client::DexScreenerClient;
pub use feed::{DexScreenerFeed, DexScreenerSession, FeedConfig, DEFAULT_ORIGIN, DEFAULT_USER_AGENT};
