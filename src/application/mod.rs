pub mod enricher;
pub mod orchestrator;
pub mod rate_limiter;

pub use enricher::{
    token_url, EnrichError, EnrichOutcome, EnricherConfig, TokenEnricher, DEFAULT_TOKEN_INFO_ENDPOINT,
};
pub use orchestrator::{
    RefreshPhase, RefreshReport, Screener, ScreenerConfig, ScreenerError, ScreenerStatus,
    DEFAULT_REFRESH_INTERVAL,
};
pub use rate_limiter::{RateLimiter, RateLimiterError, DEFAULT_RATE_LIMIT_PER_SECOND};
