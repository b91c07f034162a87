//! Token Enricher
//!
//! Resolves decoded token addresses to their symbols through the DexScreener
//! tokens API, one rate-limited GET per attempt.
//!
//! Outcomes per address:
//! - HTTP 200 with a pair: symbol recorded, address processed
//! - any other status: permanent failure, address processed, no retry
//! - transport or parse error: retried after `retry_delay`, processed once
//!   the attempt budget runs out

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error};

use super::rate_limiter::RateLimiter;
use crate::domain::{sanitize_symbol, TokenMap, BAD_SYMBOL};
use crate::ports::{MetadataError, MetadataProvider};

/// DexScreener tokens endpoint; the address is appended
pub const DEFAULT_TOKEN_INFO_ENDPOINT: &str = "https://api.dexscreener.com/tokens/v1/solana/";

/// Errors from a single lookup attempt; all but `InvalidEndpoint` are retried
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("Invalid token info endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Transport error: {0}")]
    Transport(#[from] MetadataError),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Response contained no pairs")]
    EmptyResponse,
}

/// Result of enriching one address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichOutcome {
    /// Symbol fetched and recorded
    Resolved(String),
    /// Already attempted, or already in today's record
    AlreadyProcessed,
    /// API answered with a non-200 status
    Rejected(u16),
    /// Every attempt failed with a transport or parse error
    Exhausted,
}

impl EnrichOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, EnrichOutcome::Resolved(_) | EnrichOutcome::AlreadyProcessed)
    }
}

/// Definitive answer from one lookup attempt
enum Lookup {
    Found(String),
    Rejected(u16),
}

/// Retry policy and endpoint for lookups
#[derive(Debug, Clone)]
pub struct EnricherConfig {
    /// URL prefix the address is appended to
    pub endpoint: String,
    /// Attempts per address (transport/parse failures only)
    pub max_attempts: u32,
    /// Pause after a failed attempt
    pub retry_delay: Duration,
}

impl Default for EnricherConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_TOKEN_INFO_ENDPOINT.to_string(),
            max_attempts: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// One pair entry of the tokens API response; only the base token matters
#[derive(Debug, Deserialize)]
struct PairEntry {
    #[serde(rename = "baseToken", default)]
    base_token: Option<BaseToken>,
}

#[derive(Debug, Deserialize)]
struct BaseToken {
    #[serde(default)]
    symbol: Option<String>,
}

/// Extract the sanitized base token symbol from a 200 response body
/// Lookup URL for an address
///
/// The address becomes a single percent-encoded path segment, so `?`, `#`
/// or `/` in a garbled fallback address cannot change the request.
pub fn token_url(endpoint: &str, id: &str) -> Result<String, EnrichError> {
    let mut url = reqwest::Url::parse(endpoint)
        .map_err(|e| EnrichError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;
    url.path_segments_mut()
        .map_err(|_| EnrichError::InvalidEndpoint(format!("{} cannot take a path", endpoint)))?
        .pop_if_empty()
        .push(id);
    Ok(url.to_string())
}

fn parse_symbol(body: &str) -> Result<String, EnrichError> {
    let pairs: Vec<PairEntry> =
        serde_json::from_str(body).map_err(|e| EnrichError::ParseError(e.to_string()))?;
    let first = pairs.into_iter().next().ok_or(EnrichError::EmptyResponse)?;

    let symbol = first
        .base_token
        .and_then(|t| t.symbol)
        .unwrap_or_else(|| BAD_SYMBOL.to_string());

    Ok(sanitize_symbol(&symbol))
}

/// Fetches symbols for decoded addresses and owns the daily record
pub struct TokenEnricher {
    provider: Arc<dyn MetadataProvider>,
    limiter: Arc<RateLimiter>,
    config: EnricherConfig,
    /// Addresses attempted during this process lifetime
    processed: Mutex<HashSet<String>>,
    results: Mutex<TokenMap>,
}

impl TokenEnricher {
    pub fn new(
        provider: Arc<dyn MetadataProvider>,
        limiter: Arc<RateLimiter>,
        config: EnricherConfig,
    ) -> Self {
        Self {
            provider,
            limiter,
            config,
            processed: Mutex::new(HashSet::new()),
            results: Mutex::new(TokenMap::new()),
        }
    }

    /// Seed the record, e.g. from today's file
    pub fn with_results(self, results: TokenMap) -> Self {
        Self {
            results: Mutex::new(results),
            ..self
        }
    }

    pub fn config(&self) -> &EnricherConfig {
        &self.config
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Resolve one address; true when its info is (or already was) obtained
    pub async fn complete_info(&self, id: &str) -> bool {
        self.enrich(id).await.is_success()
    }

    /// Resolve one address and report how it went
    pub async fn enrich(&self, id: &str) -> EnrichOutcome {
        debug!("Completing info for mint {}", id);

        if self.processed.lock().await.contains(id) {
            debug!("Mint {} already processed", id);
            return EnrichOutcome::AlreadyProcessed;
        }
        if self.results.lock().await.contains_key(id) {
            debug!("Mint {} already in today's record", id);
            self.mark_processed(id).await;
            return EnrichOutcome::AlreadyProcessed;
        }

        let url = match token_url(&self.config.endpoint, id) {
            Ok(url) => url,
            Err(e) => {
                error!("Failed building lookup for mint {} - {}", id, e);
                self.mark_processed(id).await;
                return EnrichOutcome::Exhausted;
            }
        };

        for attempt in 1..=self.config.max_attempts {
            match self.attempt(&url).await {
                Ok(Lookup::Found(symbol)) => {
                    self.mark_processed(id).await;
                    self.results
                        .lock()
                        .await
                        .entry(id.to_string())
                        .or_insert_with(|| symbol.clone());
                    debug!("Mint {} resolved to {}", id, symbol);
                    return EnrichOutcome::Resolved(symbol);
                }
                Ok(Lookup::Rejected(status)) => {
                    self.mark_processed(id).await;
                    debug!("[{}] Unexpected response for {} - status {}", attempt, id, status);
                    return EnrichOutcome::Rejected(status);
                }
                Err(e) => {
                    debug!("[{}] Lookup for {} failed - {}", attempt, id, e);
                }
            }

            if attempt < self.config.max_attempts {
                tokio::time::sleep(self.config.retry_delay).await;
            }
        }

        error!("Failed to fetch info for mint {} after {} attempts", id, self.config.max_attempts);
        self.mark_processed(id).await;
        EnrichOutcome::Exhausted
    }

    /// One rate-limited lookup
    async fn attempt(&self, url: &str) -> Result<Lookup, EnrichError> {
        self.limiter.acquire().await;

        let response = self.provider.get(url).await?;
        if !response.is_ok() {
            let preview: String = response.body.chars().take(120).collect();
            debug!("Non-200 body: {}", preview);
            return Ok(Lookup::Rejected(response.status));
        }

        parse_symbol(&response.body).map(Lookup::Found)
    }

    async fn mark_processed(&self, id: &str) {
        self.processed.lock().await.insert(id.to_string());
    }

    pub async fn is_processed(&self, id: &str) -> bool {
        self.processed.lock().await.contains(id)
    }

    pub async fn processed_count(&self) -> usize {
        self.processed.lock().await.len()
    }

    /// Copy of the current record
    pub async fn snapshot(&self) -> TokenMap {
        self.results.lock().await.clone()
    }

    pub async fn result_count(&self) -> usize {
        self.results.lock().await.len()
    }

    /// Swap in the record for a new day; processed addresses are kept
    pub async fn replace_results(&self, results: TokenMap) {
        *self.results.lock().await = results;
    }

    /// Fold a stored record into the current one; stored symbols win
    pub async fn merge_results(&self, stored: TokenMap) {
        self.results.lock().await.extend(stored);
    }
}
