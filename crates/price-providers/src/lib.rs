//! Upstream price-data adapters.
//!
//! Both adapters speak the [`market_core::PriceProvider`] contract and report
//! failures as classified [`market_core::FetchError`]s so the cascade can decide
//! between retrying, widening and falling through to the next tier.

pub mod alpha_vantage;
mod http;
pub mod rate_limiter;
pub mod yahoo;

pub use alpha_vantage::AlphaVantageProvider;
pub use rate_limiter::RateLimiter;
pub use yahoo::YahooChartProvider;

use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// Connection settings shared by every adapter
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub timeout: Duration,
    pub user_agent: String,
    /// Client-side cap, requests per minute
    pub requests_per_minute: usize,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(12),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            requests_per_minute: 120,
        }
    }
}
