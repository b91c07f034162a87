//! Pairs Screener - DexScreener new-pairs harvester
//!
//! Reads the live DexScreener pairs websocket, decodes the token addresses
//! out of the binary frame, resolves each address to its symbol through the
//! tokens API and keeps one address -> symbol record per calendar day.
//!
//! # Modules
//!
//! - `domain`: Frame decoding and the daily token record
//! - `ports`: Trait abstractions (FeedConnector, MetadataProvider, TokenStore)
//! - `adapters`: External implementations (DexScreener websocket and API, JSON files, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Rate limiter, enricher and the refresh orchestrator

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod config;
pub mod application;
