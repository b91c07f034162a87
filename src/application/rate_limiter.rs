//! Global request spacing for the DexScreener tokens API
//!
//! Single-token leaky bucket: any two permitted calls are at least
//! `min_interval` apart, across every caller sharing the limiter.
//!
//! The lock is held across the sleep. Waiters queue in arrival order
//! (`tokio::sync::Mutex` is fair) and each one's wait starts after the
//! previous caller was let through.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Reference deployment rate for the tokens API
pub const DEFAULT_RATE_LIMIT_PER_SECOND: f64 = 4.0;

#[derive(Debug, Error, PartialEq)]
pub enum RateLimiterError {
    #[error("Rate limit must be a positive finite number, got {0}")]
    InvalidRate(f64),
}

#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    /// Instant the last caller was let through
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a limiter with an explicit minimum spacing
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// Create a limiter allowing `rate` calls per second
    pub fn per_second(rate: f64) -> Result<Self, RateLimiterError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(RateLimiterError::InvalidRate(rate));
        }
        Ok(Self::new(Duration::from_secs_f64(1.0 / rate)))
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until a call is permitted, then claim the slot
    pub async fn acquire(&self) {
        let mut last_call = self.last_call.lock().await;

        if let Some(last) = *last_call {
            let ready_at = last + self.min_interval;
            let now = Instant::now();
            if ready_at > now {
                let wait = ready_at - now;
                debug!("DexScreener rate limiter sleeping for {:.3}s", wait.as_secs_f64());
                tokio::time::sleep(wait).await;
            }
        }

        *last_call = Some(Instant::now());
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Duration::from_secs_f64(1.0 / DEFAULT_RATE_LIMIT_PER_SECOND))
    }
}
