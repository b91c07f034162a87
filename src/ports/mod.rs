//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement:
//! - Feed sessions (the DexScreener pairs websocket)
//! - Token metadata lookups (the DexScreener tokens API)
//! - Daily token record persistence

pub mod feed;
pub mod metadata;
pub mod storage;

#[cfg(test)]
pub mod mocks;

pub use feed::{FeedConnector, FeedError, FeedSession};
pub use metadata::{HttpResponse, MetadataError, MetadataProvider};
pub use storage::{StoreError, TokenStore};
