use async_trait::async_trait;
use thiserror::Error;

/// Metadata provider error type
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Failed to read response body: {0}")]
    BodyError(String),
}

/// Status and raw body of a metadata lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Token metadata lookups over HTTP
///
/// Any status is a successful lookup at this level; only transport failures
/// are errors.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, MetadataError>;
}
