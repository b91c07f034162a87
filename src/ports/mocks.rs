//! Scripted port implementations for tests
//!
//! Each mock records its calls and replays responses queued up front.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;

use super::feed::{FeedConnector, FeedError, FeedSession};
use super::metadata::{HttpResponse, MetadataError, MetadataProvider};
use super::storage::{StoreError, TokenStore};
use crate::domain::TokenMap;

/// One scripted feed connection: either a connect failure or a list of frames
#[derive(Debug, Clone)]
enum ScriptedConnection {
    Refused(String),
    Frames(Vec<Vec<u8>>),
}

/// Mock feed connector that replays scripted sessions in order
///
/// Once the script runs out every connect is refused.
#[derive(Debug, Default, Clone)]
pub struct MockFeed {
    script: Arc<Mutex<VecDeque<ScriptedConnection>>>,
    connects: Arc<Mutex<Vec<String>>>,
    frames_served: Arc<Mutex<usize>>,
}

impl MockFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a session that delivers these frames, then reports the feed closed
    pub fn with_session(self, frames: Vec<Vec<u8>>) -> Self {
        self.script.lock().unwrap().push_back(ScriptedConnection::Frames(frames));
        self
    }

    /// Queue a connect failure
    pub fn with_refused(self, reason: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(ScriptedConnection::Refused(reason.to_string()));
        self
    }

    /// URLs of every connect attempt
    pub fn connects(&self) -> Vec<String> {
        self.connects.lock().unwrap().clone()
    }

    /// Number of frames handed out across all sessions
    pub fn frames_served(&self) -> usize {
        *self.frames_served.lock().unwrap()
    }
}

struct MockSession {
    frames: VecDeque<Vec<u8>>,
    served: Arc<Mutex<usize>>,
}

#[async_trait]
impl FeedSession for MockSession {
    async fn receive(&mut self) -> Result<Vec<u8>, FeedError> {
        let frame = self.frames.pop_front().ok_or(FeedError::Closed)?;
        *self.served.lock().unwrap() += 1;
        Ok(frame)
    }
}

#[async_trait]
impl FeedConnector for MockFeed {
    async fn connect(&self, url: &str) -> Result<Box<dyn FeedSession>, FeedError> {
        self.connects.lock().unwrap().push(url.to_string());
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(ScriptedConnection::Frames(frames)) => Ok(Box::new(MockSession {
                frames: frames.into(),
                served: Arc::clone(&self.frames_served),
            })),
            Some(ScriptedConnection::Refused(reason)) => Err(FeedError::ConnectionFailed(reason)),
            None => Err(FeedError::ConnectionFailed("no scripted session".into())),
        }
    }
}

/// Mock metadata provider with per-URL response queues
///
/// A URL with an empty queue gets the fallback response, or a transport
/// error when no fallback is set.
#[derive(Debug, Default, Clone)]
pub struct MockMetadata {
    responses: Arc<Mutex<HashMap<String, VecDeque<Result<HttpResponse, String>>>>>,
    fallback: Option<HttpResponse>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for a URL
    pub fn with_response(self, url: &str, status: u16, body: &str) -> Self {
        self.push(url, Ok(HttpResponse::new(status, body)));
        self
    }

    /// Queue a transport failure for a URL
    pub fn with_failure(self, url: &str, reason: &str) -> Self {
        self.push(url, Err(reason.to_string()));
        self
    }

    /// Response used once a URL's queue is empty
    pub fn with_fallback(mut self, status: u16, body: &str) -> Self {
        self.fallback = Some(HttpResponse::new(status, body));
        self
    }

    fn push(&self, url: &str, response: Result<HttpResponse, String>) {
        self.responses
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(response);
    }

    /// Get all recorded calls
    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls made for one URL
    pub fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.as_str() == url).count()
    }
}

#[async_trait]
impl MetadataProvider for MockMetadata {
    async fn get(&self, url: &str) -> Result<HttpResponse, MetadataError> {
        self.calls.lock().unwrap().push(url.to_string());
        let queued = self
            .responses
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(|queue| queue.pop_front());

        match queued {
            Some(Ok(response)) => Ok(response),
            Some(Err(reason)) => Err(MetadataError::RequestFailed(reason)),
            None => self
                .fallback
                .clone()
                .ok_or_else(|| MetadataError::RequestFailed("No response configured".into())),
        }
    }
}

/// In-memory token store
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    days: Arc<Mutex<HashMap<NaiveDate, TokenMap>>>,
    saves: Arc<Mutex<usize>>,
    fail_saves: bool,
    /// Days whose record fails to parse until quarantined
    unreadable: Arc<Mutex<HashSet<NaiveDate>>>,
    fail_reads: Arc<Mutex<bool>>,
    quarantined: Arc<Mutex<Vec<NaiveDate>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the record for a day
    pub fn with_day(self, day: NaiveDate, tokens: TokenMap) -> Self {
        self.days.lock().unwrap().insert(day, tokens);
        self
    }

    /// Make every save fail
    pub fn failing_saves(mut self) -> Self {
        self.fail_saves = true;
        self
    }

    /// Make the day's record fail to parse until it is quarantined
    pub fn with_unreadable_day(self, day: NaiveDate) -> Self {
        self.unreadable.lock().unwrap().insert(day);
        self
    }

    /// Make loads and quarantines fail with a read error
    pub fn set_failing_reads(&self, failing: bool) {
        *self.fail_reads.lock().unwrap() = failing;
    }

    /// Stored record for a day
    pub fn day(&self, day: NaiveDate) -> Option<TokenMap> {
        self.days.lock().unwrap().get(&day).cloned()
    }

    /// Number of save attempts
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }

    /// Days moved aside so far
    pub fn quarantined(&self) -> Vec<NaiveDate> {
        self.quarantined.lock().unwrap().clone()
    }
}

impl TokenStore for MemoryStore {
    fn load_all(&self, day: NaiveDate) -> Result<TokenMap, StoreError> {
        if *self.fail_reads.lock().unwrap() {
            return Err(StoreError::ReadError("memory store configured to fail".into()));
        }
        if self.unreadable.lock().unwrap().contains(&day) {
            return Err(StoreError::DeserializationError("unreadable record".into()));
        }
        Ok(self.days.lock().unwrap().get(&day).cloned().unwrap_or_default())
    }

    fn save_all(&self, day: NaiveDate, tokens: &TokenMap) -> Result<(), StoreError> {
        *self.saves.lock().unwrap() += 1;
        if self.fail_saves {
            return Err(StoreError::WriteError("memory store configured to fail".into()));
        }
        self.days.lock().unwrap().insert(day, tokens.clone());
        Ok(())
    }

    fn quarantine(&self, day: NaiveDate) -> Result<String, StoreError> {
        if *self.fail_reads.lock().unwrap() {
            return Err(StoreError::ReadError("memory store configured to fail".into()));
        }
        self.unreadable.lock().unwrap().remove(&day);
        self.days.lock().unwrap().remove(&day);
        self.quarantined.lock().unwrap().push(day);
        Ok(format!("memory:{}", day))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_feed_replays_sessions() {
        let feed = MockFeed::new()
            .with_refused("boom")
            .with_session(vec![b"one".to_vec()]);

        assert!(feed.connect("wss://a").await.is_err());

        let mut session = feed.connect("wss://b").await.unwrap();
        assert_eq!(session.receive().await.unwrap(), b"one".to_vec());
        assert!(matches!(session.receive().await, Err(FeedError::Closed)));

        assert_eq!(feed.connects(), vec!["wss://a".to_string(), "wss://b".to_string()]);
        assert_eq!(feed.frames_served(), 1);
    }

    #[tokio::test]
    async fn test_mock_metadata_queue_then_fallback() {
        let mock = MockMetadata::new()
            .with_failure("u", "reset")
            .with_response("u", 200, "[]")
            .with_fallback(404, "");

        assert!(mock.get("u").await.is_err());
        assert_eq!(mock.get("u").await.unwrap(), HttpResponse::new(200, "[]"));
        assert_eq!(mock.get("u").await.unwrap().status, 404);
        assert_eq!(mock.calls_for("u"), 3);
    }

    #[tokio::test]
    async fn test_mock_metadata_without_fallback_errors() {
        let mock = MockMetadata::new();
        assert!(mock.get("missing").await.is_err());
        assert_eq!(mock.get_calls(), vec!["missing".to_string()]);
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        let day = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        assert!(store.load_all(day).unwrap().is_empty());

        let mut tokens = TokenMap::new();
        tokens.insert("mint".into(), "SYM".into());
        store.save_all(day, &tokens).unwrap();

        assert_eq!(store.load_all(day).unwrap(), tokens);
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn test_memory_store_failing_saves() {
        let store = MemoryStore::new().failing_saves();
        let day = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        assert!(store.save_all(day, &TokenMap::new()).is_err());
        assert!(store.day(day).is_none());
    }

    #[test]
    fn test_memory_store_unreadable_until_quarantined() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let store = MemoryStore::new().with_unreadable_day(day);

        assert!(matches!(store.load_all(day), Err(StoreError::DeserializationError(_))));
        store.quarantine(day).unwrap();
        assert!(store.load_all(day).unwrap().is_empty());
        assert_eq!(store.quarantined(), vec![day]);
    }
}
