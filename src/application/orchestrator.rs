//! Screener Orchestrator
//!
//! Drives one refresh cycle of the pairs screener:
//! Idle -> Connecting -> Decoding -> Enriching -> Persisting -> Idle.
//!
//! A cycle reads one pairs frame from the feed, decodes the token addresses
//! it carries, resolves every address through the enricher concurrently and
//! flushes the daily record. Cycles closer together than the refresh
//! interval are skipped. Nothing in a cycle propagates an error to the
//! caller of `refresh()`; failures surface in the logs.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use futures_util::future::join_all;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::enricher::{EnrichOutcome, EnricherConfig, TokenEnricher};
use super::rate_limiter::RateLimiter;
use crate::adapters::dexscreener::{DexScreenerClient, DexScreenerFeed};
use crate::adapters::storage::JsonFileStore;
use crate::config::Config;
use crate::domain::{day_key, is_pairs_frame, DayClock, FrameDecoder, TokenMap};
use crate::ports::{FeedConnector, FeedError, StoreError, TokenStore};

/// Minimum spacing between two executed cycles
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum ScreenerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Client setup failed: {0}")]
    ClientError(String),

    #[error("A refresh cycle is already running")]
    CycleInProgress,
}

/// Where a refresh cycle currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    Idle,
    Connecting,
    Decoding,
    Enriching,
    Persisting,
}

/// Orchestration settings
#[derive(Debug, Clone)]
pub struct ScreenerConfig {
    /// Pairs feed websocket URL
    pub ws_url: String,
    /// Cycles closer together than this are skipped
    pub refresh_interval: Duration,
    /// Feed connections tried per cycle
    pub connect_attempts: u32,
    /// Frames read per connection while looking for a pairs frame
    pub receive_attempts: u32,
    /// Pause between failed connections
    pub connect_retry_delay: Duration,
    /// Day boundary for the daily record
    pub clock: DayClock,
}

impl ScreenerConfig {
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            connect_attempts: 3,
            receive_attempts: 3,
            connect_retry_delay: Duration::from_millis(500),
            clock: DayClock::Local,
        }
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }
}

/// What a refresh cycle did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Cycle skipped by the refresh interval
    pub skipped: bool,
    /// A pairs frame was read and decoded
    pub frame_received: bool,
    /// Addresses decoded from the frame
    pub decoded: usize,
    pub resolved: usize,
    pub already_processed: usize,
    pub rejected: usize,
    pub exhausted: usize,
    /// Entries added to the daily record
    pub new_tokens: usize,
    /// Daily record flushed successfully
    pub persisted: bool,
}

impl RefreshReport {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Default::default()
        }
    }

    fn tally(&mut self, outcomes: &[EnrichOutcome]) {
        for outcome in outcomes {
            match outcome {
                EnrichOutcome::Resolved(_) => self.resolved += 1,
                EnrichOutcome::AlreadyProcessed => self.already_processed += 1,
                EnrichOutcome::Rejected(_) => self.rejected += 1,
                EnrichOutcome::Exhausted => self.exhausted += 1,
            }
        }
    }
}

/// Status snapshot of the screener
#[derive(Debug, Clone)]
pub struct ScreenerStatus {
    pub is_running: bool,
    pub phase: RefreshPhase,
    pub day: NaiveDate,
    pub tokens_today: usize,
    pub processed: usize,
    pub pending: usize,
    pub since_last_refresh: Option<Duration>,
}

/// Day the in-memory record belongs to
#[derive(Debug, Clone, Copy)]
struct DayState {
    day: NaiveDate,
    /// False while the stored record could not be read; saving would overwrite it
    loaded: bool,
}

/// DexScreener new-pairs screener
pub struct Screener {
    config: ScreenerConfig,
    feed: Arc<dyn FeedConnector>,
    decoder: FrameDecoder,
    enricher: TokenEnricher,
    store: Arc<dyn TokenStore>,
    /// Addresses decoded from the latest frame
    pending: Mutex<Vec<String>>,
    phase: Mutex<RefreshPhase>,
    last_refresh: Mutex<Option<Instant>>,
    day: Mutex<DayState>,
    cycle_lock: Mutex<()>,
    is_running: Arc<RwLock<bool>>,
}

impl Screener {
    /// Create a screener and load today's record from the store
    pub fn new(
        config: ScreenerConfig,
        feed: Arc<dyn FeedConnector>,
        enricher: TokenEnricher,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        info!("Initializing screener for {}", config.ws_url);

        let today = config.clock.today();
        let tokens = load_day(store.as_ref(), today);
        let loaded = tokens.is_some();

        Self {
            feed,
            decoder: FrameDecoder::new(),
            enricher: enricher.with_results(tokens.unwrap_or_default()),
            store,
            pending: Mutex::new(Vec::new()),
            phase: Mutex::new(RefreshPhase::Idle),
            last_refresh: Mutex::new(None),
            day: Mutex::new(DayState { day: today, loaded }),
            cycle_lock: Mutex::new(()),
            is_running: Arc::new(RwLock::new(false)),
            config,
        }
    }

    /// Wire the DexScreener adapters and the JSON file store from configuration
    pub fn from_config(config: &Config) -> Result<Self, ScreenerError> {
        let limiter = RateLimiter::per_second(config.dexscreener.rate_limit_per_second)
            .map_err(|e| ScreenerError::ConfigError(e.to_string()))?;

        let client = DexScreenerClient::new(config.dexscreener.request_timeout())
            .map_err(|e| ScreenerError::ClientError(e.to_string()))?;

        let enricher = TokenEnricher::new(
            Arc::new(client),
            Arc::new(limiter),
            EnricherConfig {
                endpoint: config.dexscreener.token_info_endpoint.clone(),
                max_attempts: config.dexscreener.max_attempts,
                retry_delay: config.dexscreener.retry_delay(),
            },
        );

        let feed = DexScreenerFeed::new(config.feed.to_feed_config());
        let store = JsonFileStore::new(config.screener.output_dir());

        let clock = DayClock::from_offset_minutes(config.screener.utc_offset_minutes).ok_or_else(|| {
            ScreenerError::ConfigError(format!(
                "utc_offset_minutes out of range: {:?}",
                config.screener.utc_offset_minutes
            ))
        })?;

        let screener_config = ScreenerConfig {
            ws_url: config.screener.get_ws_url(),
            refresh_interval: config.screener.refresh_interval(),
            connect_attempts: config.feed.connect_attempts,
            receive_attempts: config.feed.receive_attempts,
            connect_retry_delay: config.feed.connect_retry_delay(),
            clock,
        };

        Ok(Self::new(screener_config, Arc::new(feed), enricher, Arc::new(store)))
    }

    /// Run one refresh cycle; never fails, false only when the cycle could not run
    pub async fn refresh(&self) -> bool {
        match self.refresh_cycle().await {
            Ok(_) => true,
            Err(e) => {
                error!("Failed refreshing screener - {}", e);
                false
            }
        }
    }

    /// Run one refresh cycle and report what it did
    pub async fn refresh_cycle(&self) -> Result<RefreshReport, ScreenerError> {
        let _cycle = self
            .cycle_lock
            .try_lock()
            .map_err(|_| ScreenerError::CycleInProgress)?;

        if let Some(last) = *self.last_refresh.lock().await {
            if last.elapsed() < self.config.refresh_interval {
                debug!("Too early refresh, skipping");
                return Ok(RefreshReport::skipped());
            }
        }

        info!("── Screener refresh ──");

        self.roll_day().await;
        let before = self.enricher.result_count().await;

        let mut report = RefreshReport::default();
        let batch = self.refresh_pairs().await;
        report.frame_received = batch.is_some();
        let batch = batch.unwrap_or_default();
        report.decoded = batch.len();

        let outcomes = self.enrich_batch(&batch).await;
        report.tally(&outcomes);

        self.set_phase(RefreshPhase::Persisting).await;
        report.persisted = self.persist().await;

        *self.last_refresh.lock().await = Some(Instant::now());
        self.set_phase(RefreshPhase::Idle).await;

        report.new_tokens = self.enricher.result_count().await.saturating_sub(before);
        info!("Screener refreshed. {} new tokens arrived", report.new_tokens);
        Ok(report)
    }

    /// Connect to the feed and decode the first pairs frame
    ///
    /// Returns `None` when no pairs frame could be read this cycle.
    async fn refresh_pairs(&self) -> Option<Vec<String>> {
        self.pending.lock().await.clear();

        for attempt in 1..=self.config.connect_attempts {
            self.set_phase(RefreshPhase::Connecting).await;

            match self.read_pairs_frame().await {
                Ok(Some(frame)) => {
                    self.set_phase(RefreshPhase::Decoding).await;
                    let ids = self.decoder.decode(&frame);
                    debug!("[{}] Screener websocket data fetched, {} addresses", attempt, ids.len());
                    *self.pending.lock().await = ids.clone();
                    return Some(ids);
                }
                Ok(None) => {
                    warn!(
                        "No pairs frame within {} received frames",
                        self.config.receive_attempts
                    );
                    return None;
                }
                Err(e) => {
                    debug!("[{}] Failed refreshing new pairs - {}", attempt, e);
                }
            }

            if attempt < self.config.connect_attempts {
                tokio::time::sleep(self.config.connect_retry_delay).await;
            }
        }

        error!("Failed connecting to websocket after all attempts");
        None
    }

    /// Open a session and read frames until one is a pairs frame
    async fn read_pairs_frame(&self) -> Result<Option<Vec<u8>>, FeedError> {
        let mut session = self.feed.connect(&self.config.ws_url).await?;

        for attempt in 1..=self.config.receive_attempts {
            let frame = session.receive().await?;
            if is_pairs_frame(&frame) {
                debug!("Websocket complete");
                return Ok(Some(frame));
            }
            debug!("[{}] Discarding non-pairs frame of {} bytes", attempt, frame.len());
        }

        Ok(None)
    }

    /// Resolve every distinct address of the batch concurrently
    async fn enrich_batch(&self, batch: &[String]) -> Vec<EnrichOutcome> {
        self.set_phase(RefreshPhase::Enriching).await;

        let mut seen = HashSet::new();
        let unique: Vec<&String> = batch.iter().filter(|id| seen.insert(id.as_str())).collect();
        debug!("Enriching {} addresses ({} decoded)", unique.len(), batch.len());

        join_all(unique.into_iter().map(|id| self.enricher.enrich(id))).await
    }

    /// Flush the daily record; failures keep the in-memory state
    ///
    /// A record that could not be read is never overwritten: the load is
    /// retried first and what it returns is merged in.
    async fn persist(&self) -> bool {
        let mut state = self.day.lock().await;
        if !state.loaded {
            match load_day(self.store.as_ref(), state.day) {
                Some(stored) => {
                    self.enricher.merge_results(stored).await;
                    state.loaded = true;
                }
                None => {
                    warn!("Not saving {} until its stored record can be read", day_key(state.day));
                    return false;
                }
            }
        }

        let tokens = self.enricher.snapshot().await;
        match self.store.save_all(state.day, &tokens) {
            Ok(()) => {
                info!("Saved {} tokens", tokens.len());
                true
            }
            Err(e) => {
                error!("Failed saving screener tokens - {}", e);
                false
            }
        }
    }

    /// Switch to a fresh record when the calendar day changed
    async fn roll_day(&self) {
        let today = self.config.clock.today();
        let mut state = self.day.lock().await;
        if state.day == today {
            return;
        }

        info!("Day changed {} -> {}, starting a new token record", day_key(state.day), day_key(today));
        let tokens = load_day(self.store.as_ref(), today);
        *state = DayState {
            day: today,
            loaded: tokens.is_some(),
        };
        self.enricher.replace_results(tokens.unwrap_or_default()).await;
    }

    async fn set_phase(&self, phase: RefreshPhase) {
        let mut current = self.phase.lock().await;
        if *current != phase {
            debug!("Screener phase {:?} -> {:?}", *current, phase);
            *current = phase;
        }
    }

    /// Poll `refresh()` until `stop()` is called
    pub async fn run(&self, poll_interval: Duration) {
        *self.is_running.write().await = true;
        info!("Starting screener - poll interval: {:?}", poll_interval);

        while *self.is_running.read().await {
            self.refresh().await;
            tokio::time::sleep(poll_interval).await;
        }

        info!("Screener stopped");
    }

    /// Stop the poll loop
    pub async fn stop(&self) {
        *self.is_running.write().await = false;
        info!("Stop signal sent to screener");
    }

    pub async fn phase(&self) -> RefreshPhase {
        *self.phase.lock().await
    }

    /// Addresses decoded by the latest cycle
    pub async fn pending_batch(&self) -> Vec<String> {
        self.pending.lock().await.clone()
    }

    /// Copy of today's record
    pub async fn tokens(&self) -> TokenMap {
        self.enricher.snapshot().await
    }

    pub fn enricher(&self) -> &TokenEnricher {
        &self.enricher
    }

    pub fn config(&self) -> &ScreenerConfig {
        &self.config
    }

    /// Get current status snapshot
    pub async fn status(&self) -> ScreenerStatus {
        ScreenerStatus {
            is_running: *self.is_running.read().await,
            phase: self.phase().await,
            day: self.day.lock().await.day,
            tokens_today: self.enricher.result_count().await,
            processed: self.enricher.processed_count().await,
            pending: self.pending.lock().await.len(),
            since_last_refresh: self.last_refresh.lock().await.map(|last| last.elapsed()),
        }
    }
}

/// Load a day's record
///
/// A record that exists but does not parse is quarantined and the day starts
/// empty. `None` when the record could not be read or moved aside.
fn load_day(store: &dyn TokenStore, day: NaiveDate) -> Option<TokenMap> {
    debug!("Loading the screener tokens for {}", day_key(day));
    match store.load_all(day) {
        Ok(tokens) => {
            info!("Loaded {} tokens", tokens.len());
            Some(tokens)
        }
        Err(StoreError::DeserializationError(reason)) => {
            error!("Failed parsing screener tokens - {}", reason);
            match store.quarantine(day) {
                Ok(kept_at) => {
                    warn!("Unreadable record for {} kept at {}", day_key(day), kept_at);
                    Some(TokenMap::new())
                }
                Err(e) => {
                    error!("Failed moving unreadable screener tokens aside - {}", e);
                    None
                }
            }
        }
        Err(e) => {
            error!("Failed loading screener tokens - {}", e);
            None
        }
    }
}
