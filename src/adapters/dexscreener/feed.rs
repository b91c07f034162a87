//! DexScreener Pairs Feed
//!
//! Websocket connector for the live new-pairs stream. The server pushes a
//! binary pairs frame shortly after the handshake; nothing is ever sent
//! besides pong replies.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use crate::ports::{FeedConnector, FeedError, FeedSession};

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:140.0) Gecko/20100101 Firefox/140.0";
pub const DEFAULT_ORIGIN: &str = "https://dexscreener.com";

/// Websocket feed configuration
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub connect_timeout: Duration,
    pub receive_timeout: Duration,
    pub user_agent: String,
    pub origin: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            receive_timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            origin: DEFAULT_ORIGIN.to_string(),
        }
    }
}

/// Connector for the DexScreener pairs websocket
#[derive(Debug, Clone, Default)]
pub struct DexScreenerFeed {
    config: FeedConfig,
}

impl DexScreenerFeed {
    pub fn new(config: FeedConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Build the upgrade request with browser-like headers
    fn build_request(
        &self,
        url: &str,
    ) -> Result<tokio_tungstenite::tungstenite::handshake::client::Request, FeedError> {
        let mut request = url
            .into_client_request()
            .map_err(|e| FeedError::InvalidRequest(e.to_string()))?;

        let headers = request.headers_mut();
        headers.insert(header::USER_AGENT, header_value(&self.config.user_agent)?);
        headers.insert(header::ORIGIN, header_value(&self.config.origin)?);
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        Ok(request)
    }
}

fn header_value(value: &str) -> Result<HeaderValue, FeedError> {
    HeaderValue::from_str(value).map_err(|e| FeedError::InvalidRequest(format!("{}: {}", value, e)))
}

#[async_trait]
impl FeedConnector for DexScreenerFeed {
    async fn connect(&self, url: &str) -> Result<Box<dyn FeedSession>, FeedError> {
        let request = self.build_request(url)?;
        debug!("Connecting to pairs feed {}", url);

        let (stream, response) = tokio::time::timeout(self.config.connect_timeout, connect_async(request))
            .await
            .map_err(|_| FeedError::ConnectTimeout(self.config.connect_timeout.as_secs()))?
            .map_err(|e| FeedError::ConnectionFailed(e.to_string()))?;

        debug!("Pairs feed handshake complete - status {}", response.status());

        Ok(Box::new(DexScreenerSession {
            stream,
            receive_timeout: self.config.receive_timeout,
        }))
    }
}

/// One open websocket connection; dropped after the cycle that opened it
pub struct DexScreenerSession {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    receive_timeout: Duration,
}

impl DexScreenerSession {
    async fn next_message(&mut self) -> Result<Message, FeedError> {
        let next = tokio::time::timeout(self.receive_timeout, self.stream.next())
            .await
            .map_err(|_| FeedError::ReceiveTimeout(self.receive_timeout.as_secs()))?;

        match next {
            Some(Ok(message)) => Ok(message),
            Some(Err(e)) => Err(FeedError::WebSocketError(e.to_string())),
            None => Err(FeedError::Closed),
        }
    }
}

#[async_trait]
impl FeedSession for DexScreenerSession {
    async fn receive(&mut self) -> Result<Vec<u8>, FeedError> {
        loop {
            match self.next_message().await? {
                Message::Binary(data) => return Ok(data),
                Message::Text(text) => return Ok(text.into_bytes()),
                Message::Ping(data) => {
                    self.stream
                        .send(Message::Pong(data))
                        .await
                        .map_err(|e| FeedError::WebSocketError(e.to_string()))?;
                }
                Message::Close(frame) => {
                    debug!("Pairs feed closed by server: {:?}", frame);
                    return Err(FeedError::Closed);
                }
                Message::Pong(_) | Message::Frame(_) => {}
            }
        }
    }
}
