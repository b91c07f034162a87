//! DexScreener Tokens API Client
//!
//! Plain GET client for token lookups. Status handling and retries belong
//! to the enricher; this adapter only reports status and body.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::ports::{HttpResponse, MetadataError, MetadataProvider};

/// reqwest-backed metadata provider
#[derive(Debug, Clone)]
pub struct DexScreenerClient {
    http: Client,
}

impl DexScreenerClient {
    /// Create a client whose requests time out after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, MetadataError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MetadataError::RequestFailed(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http })
    }
}

#[async_trait]
impl MetadataProvider for DexScreenerClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, MetadataError> {
        let response = self.http.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                MetadataError::Timeout
            } else {
                MetadataError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| MetadataError::BodyError(e.to_string()))?;

        debug!("GET {} -> {} ({} bytes)", url, status, body.len());
        Ok(HttpResponse::new(status, body))
    }
}
