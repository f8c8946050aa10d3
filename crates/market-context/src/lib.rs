//! Market Context Resolution Engine
//!
//! Turns a ticker into a [`MarketSnapshot`]: price history from a
//! primary/secondary provider cascade, technical indicators, and comparative
//! benchmarks against the S&P 500 proxy, the sector and industry ETFs and a
//! peer basket. Resolution never fails; missing data degrades to null fields.

pub mod cache;
pub mod cascade;
pub mod comparative;
pub mod config;
pub mod directory;
pub mod profile;
pub mod telemetry;


pub use cache::{CacheTtls, Clock, ManualClock, ResultCache, SystemClock, TtlCache};
pub use cascade::{DataSourceCascade, FullFetch, LightFetch, RequestState};
pub use comparative::{relative_strength, ComparativeBenchmarkEngine, EtfFetch, PeerBenchmark, PeerSettings};
pub use config::MarketContextConfig;
pub use directory::StaticDirectory;
pub use profile::ProfileResolver;

use anyhow::Result;
use market_core::{
    normalized, DataSource, MarketSnapshot, PricePoint, PriceProvider, SecurityDirectory, TickerProfile,
    SURFACED_SERIES_LEN,
};
use price_providers::{AlphaVantageProvider, YahooChartProvider};
use std::collections::HashSet;
use std::sync::Arc;
use technical_analysis::TechnicalIndicatorEngine;

fn surfaced(points: &[PricePoint]) -> Vec<PricePoint> {
    points[points.len().saturating_sub(SURFACED_SERIES_LEN)..].to_vec()
}

pub struct MarketContextEngine {
    cascade: Arc<DataSourceCascade>,
    cache: Arc<ResultCache>,
    profiles: Arc<ProfileResolver>,
    benchmarks: ComparativeBenchmarkEngine,
    indicators: TechnicalIndicatorEngine,
}

impl MarketContextEngine {
    pub fn new(
        primary: Arc<dyn PriceProvider>,
        secondary: Arc<dyn PriceProvider>,
        directory: Arc<dyn SecurityDirectory>,
        config: &MarketContextConfig,
    ) -> Self {
        Self::with_clock(primary, secondary, directory, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        primary: Arc<dyn PriceProvider>,
        secondary: Arc<dyn PriceProvider>,
        directory: Arc<dyn SecurityDirectory>,
        config: &MarketContextConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let ttls = CacheTtls {
            snapshot: chrono::Duration::seconds(config.snapshot_ttl_secs),
            profile: chrono::Duration::seconds(config.profile_ttl_secs),
            benchmark: chrono::Duration::seconds(config.benchmark_ttl_secs),
        };
        let cascade = Arc::new(DataSourceCascade::new(primary, secondary, config.retry_delay()));
        let cache = Arc::new(ResultCache::new(ttls, clock));
        let profiles = Arc::new(ProfileResolver::new(
            cascade.clone(),
            cache.clone(),
            directory.clone(),
            config.enable_network_profile,
        ));
        let benchmarks = ComparativeBenchmarkEngine::new(
            cascade.clone(),
            cache.clone(),
            profiles.clone(),
            directory,
            PeerSettings {
                max_peers: config.max_peers,
                universe_cap: config.peer_universe_cap,
                budget: config.peer_budget(),
            },
        );

        Self {
            cascade,
            cache,
            profiles,
            benchmarks,
            indicators: TechnicalIndicatorEngine::new(),
        }
    }

    /// Wire the HTTP adapters and the offline directory described by `config`.
    pub fn from_config(config: &MarketContextConfig) -> Result<Self> {
        let primary: Arc<dyn PriceProvider> = Arc::new(YahooChartProvider::new(&config.primary_settings()));
        let secondary: Arc<dyn PriceProvider> = Arc::new(AlphaVantageProvider::new(
            config.alpha_vantage_api_key.clone(),
            &config.secondary_settings(),
        ));
        if config.alpha_vantage_api_key.is_none() {
            tracing::warn!("No Alpha Vantage API key configured; secondary provider disabled");
        }

        let directory: Arc<dyn SecurityDirectory> = match &config.security_directory_path {
            Some(path) => Arc::new(StaticDirectory::from_json_file(path)?),
            None => Arc::new(StaticDirectory::default()),
        };

        Ok(Self::new(primary, secondary, directory, config))
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Full market context for the primary ticker, cached per normalized symbol.
    pub async fn resolve_primary(&self, ticker: &str) -> MarketSnapshot {
        let Some(ticker) = normalized(ticker) else {
            return MarketSnapshot::empty("");
        };
        if let Some(snapshot) = self.cache.snapshots.get(&ticker) {
            tracing::debug!("Snapshot cache hit for {}", ticker);
            return snapshot;
        }

        tracing::info!("Resolving market context for {}", ticker);
        let state = RequestState::new();
        let profile = self.profiles.resolve(&ticker, &state).await;
        let mut snapshot = MarketSnapshot::empty(ticker.clone());
        snapshot.apply_profile(&profile);

        match self.cascade.fetch_full(&ticker, &state).await {
            FullFetch::Ohlcv { rows, source } => {
                let metrics = self.indicators.compute(&rows);
                metrics.apply_to(&mut snapshot);
                snapshot.data_source = source;
                if metrics.has_returns {
                    self.benchmarks.apply(&mut snapshot, &state).await;
                }
            }
            FullFetch::CloseOnly(points) => {
                snapshot.current_price = points.last().map(|p| p.close);
                snapshot.set_price_series(surfaced(&points));
                snapshot.data_source = DataSource::Secondary;
            }
            FullFetch::Nothing => {}
        }

        snapshot.sanitize();
        tracing::info!(
            "Market context for {}: {} points from {:?}",
            ticker,
            snapshot.price_series_days,
            snapshot.data_source
        );
        self.cache.snapshots.insert(ticker, snapshot.clone());
        snapshot
    }

    /// Light context (series, day move, volatility) for each distinct ticker, in input order.
    ///
    /// The batch counts as one request: a primary throttle seen for one ticker
    /// sends the rest straight to the secondary.
    pub async fn resolve_secondary<S: AsRef<str>>(&self, tickers: &[S]) -> Vec<MarketSnapshot> {
        let state = RequestState::new();
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for raw in tickers {
            let Some(ticker) = normalized(raw.as_ref()) else {
                continue;
            };
            if !seen.insert(ticker.clone()) {
                continue;
            }
            out.push(self.light_snapshot(&ticker, &state).await);
        }
        out
    }

    /// Uncached light path; never touches the snapshot cache or benchmarks.
    pub async fn resolve_light(&self, ticker: &str) -> MarketSnapshot {
        match normalized(ticker) {
            Some(ticker) => self.light_snapshot(&ticker, &RequestState::new()).await,
            None => MarketSnapshot::empty(""),
        }
    }

    async fn light_snapshot(&self, ticker: &str, state: &RequestState) -> MarketSnapshot {
        let mut snapshot = MarketSnapshot::empty(ticker);

        if let Some(light) = self.cascade.fetch_light(ticker, state).await {
            let closes: Vec<f64> = light.points.iter().map(|p| p.close).collect();
            let metrics = self.indicators.light(&closes);
            snapshot.day_move_pct = metrics.day_move_pct;
            snapshot.vol_20d = metrics.vol_20d;
            snapshot.move_zscore = metrics.move_zscore;
            snapshot.set_price_series(surfaced(&light.points));
            snapshot.data_source = light.source;
        }

        snapshot.sanitize();
        snapshot
    }

    /// Cleaned, directory-backfilled profile for a ticker.
    pub async fn profile(&self, ticker: &str) -> TickerProfile {
        match normalized(ticker) {
            Some(ticker) => self.profiles.resolve(&ticker, &RequestState::new()).await,
            None => TickerProfile::default(),
        }
    }
}
