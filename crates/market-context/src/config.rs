use anyhow::{Context, Result};
use price_providers::{ProviderSettings, DEFAULT_USER_AGENT};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketContextConfig {
    // Secondary provider
    pub alpha_vantage_api_key: Option<String>,

    // HTTP
    pub http_timeout_seconds: u64,         // 12
    pub user_agent: String,
    pub primary_rate_limit: usize,         // requests/minute
    pub secondary_rate_limit: usize,       // requests/minute (free tier: 5)

    // Cache TTLs
    pub snapshot_ttl_secs: i64,            // 24h
    pub profile_ttl_secs: i64,             // 7d
    pub benchmark_ttl_secs: i64,           // 6h

    // Peers
    pub enable_network_profile: bool,      // off by default for stability
    pub max_peers: usize,                  // 10
    pub peer_universe_cap: usize,          // 500
    pub peer_budget_secs: u64,             // 20

    // Window-widening ladder
    pub retry_delay_ms: u64,               // 250

    pub security_directory_path: Option<PathBuf>,
}

impl Default for MarketContextConfig {
    fn default() -> Self {
        Self {
            alpha_vantage_api_key: None,
            http_timeout_seconds: 12,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            primary_rate_limit: 120,
            secondary_rate_limit: 5,
            snapshot_ttl_secs: 24 * 60 * 60,
            profile_ttl_secs: 7 * 24 * 60 * 60,
            benchmark_ttl_secs: 6 * 60 * 60,
            enable_network_profile: false,
            max_peers: 10,
            peer_universe_cap: 500,
            peer_budget_secs: 20,
            retry_delay_ms: 250,
            security_directory_path: None,
        }
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw)),
        _ => Ok(default),
    }
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl MarketContextConfig {
    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let config = Self {
            alpha_vantage_api_key: optional_var("ALPHAVANTAGE_API_KEY")
                .or_else(|| optional_var("ALPHA_VANTAGE_API_KEY")),

            http_timeout_seconds: parse_var("HTTP_TIMEOUT_SECONDS", defaults.http_timeout_seconds)?,
            user_agent: optional_var("USER_AGENT").unwrap_or(defaults.user_agent),
            primary_rate_limit: parse_var("PRIMARY_RATE_LIMIT", defaults.primary_rate_limit)?,
            secondary_rate_limit: parse_var("SECONDARY_RATE_LIMIT", defaults.secondary_rate_limit)?,

            snapshot_ttl_secs: parse_var("MARKET_SNAPSHOT_TTL_SECS", defaults.snapshot_ttl_secs)?,
            profile_ttl_secs: parse_var("PROFILE_TTL_SECS", defaults.profile_ttl_secs)?,
            benchmark_ttl_secs: parse_var("BENCHMARK_TTL_SECS", defaults.benchmark_ttl_secs)?,

            enable_network_profile: parse_var("ENABLE_NETWORK_PROFILE", defaults.enable_network_profile)?,
            max_peers: parse_var("MAX_PEERS", defaults.max_peers)?,
            peer_universe_cap: parse_var("PEER_UNIVERSE_CAP", defaults.peer_universe_cap)?,
            peer_budget_secs: parse_var("PEER_BUDGET_SECS", defaults.peer_budget_secs)?,

            retry_delay_ms: parse_var("RETRY_DELAY_MS", defaults.retry_delay_ms)?,

            security_directory_path: optional_var("SECURITY_DIRECTORY_PATH").map(PathBuf::from),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.http_timeout_seconds == 0 {
            anyhow::bail!("HTTP_TIMEOUT_SECONDS must be positive");
        }
        if self.primary_rate_limit == 0 || self.secondary_rate_limit == 0 {
            anyhow::bail!("Provider rate limits must be positive");
        }
        if self.snapshot_ttl_secs <= 0 || self.profile_ttl_secs <= 0 || self.benchmark_ttl_secs <= 0 {
            anyhow::bail!("Cache TTLs must be positive");
        }
        Ok(())
    }

    pub fn primary_settings(&self) -> ProviderSettings {
        ProviderSettings {
            timeout: Duration::from_secs(self.http_timeout_seconds),
            user_agent: self.user_agent.clone(),
            requests_per_minute: self.primary_rate_limit,
        }
    }

    pub fn secondary_settings(&self) -> ProviderSettings {
        ProviderSettings {
            requests_per_minute: self.secondary_rate_limit,
            ..self.primary_settings()
        }
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn peer_budget(&self) -> Duration {
        Duration::from_secs(self.peer_budget_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MarketContextConfig::default();
        assert_eq!(config.snapshot_ttl_secs, 86_400);
        assert_eq!(config.profile_ttl_secs, 604_800);
        assert_eq!(config.benchmark_ttl_secs, 21_600);
        assert!(!config.enable_network_profile);
        assert_eq!(config.max_peers, 10);
        assert_eq!(config.peer_universe_cap, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_secondary_settings_keep_timeout() {
        let config = MarketContextConfig::default();
        let secondary = config.secondary_settings();
        assert_eq!(secondary.timeout, Duration::from_secs(12));
        assert_eq!(secondary.requests_per_minute, 5);
        assert_eq!(config.primary_settings().requests_per_minute, 120);
    }

    #[test]
    fn test_validate_rejects_zero_ttl() {
        let config = MarketContextConfig {
            benchmark_ttl_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
