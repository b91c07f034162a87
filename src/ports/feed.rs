use async_trait::async_trait;
use thiserror::Error;

/// Feed error type
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("WebSocket connection error: {0}")]
    ConnectionFailed(String),

    #[error("Connect timed out after {0} seconds")]
    ConnectTimeout(u64),

    #[error("Receive timed out after {0} seconds")]
    ReceiveTimeout(u64),

    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    #[error("Feed closed by server")]
    Closed,

    #[error("Invalid feed request: {0}")]
    InvalidRequest(String),
}

/// An open feed session delivering raw frames
#[async_trait]
pub trait FeedSession: Send {
    /// Wait for the next data frame
    async fn receive(&mut self) -> Result<Vec<u8>, FeedError>;
}

/// Opens feed sessions
///
/// The screener is a push consumer: nothing is sent after connecting.
#[async_trait]
pub trait FeedConnector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn FeedSession>, FeedError>;
}
