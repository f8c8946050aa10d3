//! Comparative benchmarks: S&P 500 proxy, sector ETF, industry ETF and peers.

use market_core::{finite, normalize_ticker, FetchWindow, MarketSnapshot, PricePoint, SecurityDirectory};
use sector_benchmarks::{clean_profile_str, select_peers, IndustryBenchmark, PeerCandidate, Sector, SP500_PROXY};
use std::sync::Arc;
use std::time::Duration;
use technical_analysis::{day_move, TechnicalIndicatorEngine};
use tokio::time::{timeout_at, Instant};

use crate::cache::ResultCache;
use crate::cascade::{DataSourceCascade, RequestState};
use crate::profile::ProfileResolver;

/// How the primary provider is asked for an ETF's recent closes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtfFetch {
    /// Window-widening ladder (sector and industry ETFs)
    Ladder,
    /// One short-window attempt (index proxy)
    RecentSessions,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeerBenchmark {
    pub label: Option<String>,
    pub size: Option<usize>,
    pub avg_move: Option<f64>,
}

/// `target - benchmark`, null when either side is null
pub fn relative_strength(target: Option<f64>, benchmark: Option<f64>) -> Option<f64> {
    match (target, benchmark) {
        (Some(t), Some(b)) => finite(t - b),
        _ => None,
    }
}

fn closes(points: &[PricePoint]) -> Vec<f64> {
    points.iter().map(|p| p.close).collect()
}

#[derive(Debug, Clone, Copy)]
pub struct PeerSettings {
    pub max_peers: usize,
    pub universe_cap: usize,
    /// Wall-clock budget for the whole peer computation
    pub budget: Duration,
}

impl Default for PeerSettings {
    fn default() -> Self {
        Self {
            max_peers: 10,
            universe_cap: 500,
            budget: Duration::from_secs(20),
        }
    }
}

pub struct ComparativeBenchmarkEngine {
    cascade: Arc<DataSourceCascade>,
    cache: Arc<ResultCache>,
    profiles: Arc<ProfileResolver>,
    directory: Arc<dyn SecurityDirectory>,
    indicators: TechnicalIndicatorEngine,
    peers: PeerSettings,
}

impl ComparativeBenchmarkEngine {
    pub fn new(
        cascade: Arc<DataSourceCascade>,
        cache: Arc<ResultCache>,
        profiles: Arc<ProfileResolver>,
        directory: Arc<dyn SecurityDirectory>,
        peers: PeerSettings,
    ) -> Self {
        Self {
            cascade,
            cache,
            profiles,
            directory,
            indicators: TechnicalIndicatorEngine::new(),
            peers,
        }
    }

    /// One-day move of an ETF, cached per symbol. Only computed values are cached.
    pub async fn etf_daily_move(&self, symbol: &str, fetch: EtfFetch, state: &RequestState) -> Option<f64> {
        let symbol = normalize_ticker(symbol);
        if let Some(value) = self.cache.benchmarks.get(&symbol) {
            tracing::debug!("Benchmark cache hit for {}", symbol);
            return Some(value);
        }

        let primary = match fetch {
            EtfFetch::Ladder => self.cascade.primary_with_ladder(&symbol, state).await,
            EtfFetch::RecentSessions => self.cascade.primary_ohlcv(&symbol, FetchWindow::FiveDays, state).await,
        };
        let mut value = match primary {
            Ok(rows) => {
                let closes: Vec<f64> = rows.iter().map(|r| r.close).collect();
                day_move(&closes)
            }
            Err(e) => {
                tracing::debug!("Primary benchmark fetch failed for {}: {}", symbol, e);
                None
            }
        };

        if value.is_none() {
            value = match self.cascade.secondary_closes(&symbol).await {
                Ok(points) => day_move(&closes(&points)),
                Err(e) => {
                    tracing::warn!("No benchmark data for {}: {}", symbol, e);
                    None
                }
            };
        }

        if let Some(v) = value {
            self.cache.benchmarks.insert(symbol, v);
        }
        value
    }

    pub async fn sp500_move(&self, state: &RequestState) -> Option<f64> {
        self.etf_daily_move(SP500_PROXY, EtfFetch::RecentSessions, state).await
    }

    pub async fn sector_move(&self, sector: Sector, state: &RequestState) -> Option<f64> {
        let etf = sector.etf()?;
        self.etf_daily_move(etf, EtfFetch::Ladder, state).await
    }

    pub async fn industry_move(&self, benchmark: IndustryBenchmark, state: &RequestState) -> Option<f64> {
        self.etf_daily_move(benchmark.etf(), EtfFetch::Ladder, state).await
    }

    /// Average day move of the target's largest same-industry (else same-sector) peers.
    ///
    /// Candidate profiles come from the network, so nothing is found while
    /// network profiles are disabled. Each peer is priced with the light path.
    /// The budget is a hard deadline: a lookup still pending when it passes is
    /// abandoned.
    pub async fn peer_benchmark(
        &self,
        target: &str,
        sector: Option<&str>,
        industry: Option<&str>,
        state: &RequestState,
    ) -> PeerBenchmark {
        if !self.profiles.network_enabled() {
            return PeerBenchmark::default();
        }
        let deadline = Instant::now() + self.peers.budget;
        let target = normalize_ticker(target);

        let mut candidates = Vec::new();
        for record in self.directory.list_all().into_iter().take(self.peers.universe_cap) {
            if Instant::now() >= deadline {
                tracing::warn!("Peer budget exhausted after scanning {} candidates", candidates.len());
                break;
            }
            let ticker = normalize_ticker(&record.ticker);
            if ticker.is_empty() || ticker == target {
                continue;
            }
            let profile = match timeout_at(deadline, self.profiles.network_profile(&ticker, state)).await {
                Ok(profile) => profile.unwrap_or_default(),
                Err(_) => {
                    tracing::warn!("Peer budget exhausted during profile lookup for {}", ticker);
                    break;
                }
            };
            let sector = clean_profile_str(profile.sector.as_deref())
                .or_else(|| clean_profile_str(record.sector.as_deref()));
            let industry = clean_profile_str(profile.industry.as_deref())
                .or_else(|| clean_profile_str(record.industry.as_deref()));
            candidates.push(PeerCandidate {
                ticker,
                sector: Sector::from_raw(sector.as_deref()),
                industry,
                market_cap: profile.market_cap,
            });
        }

        let Some(selection) = select_peers(
            &target,
            Sector::from_raw(sector),
            industry,
            &candidates,
            self.peers.max_peers,
        ) else {
            return PeerBenchmark::default();
        };

        let mut moves = Vec::with_capacity(selection.tickers.len());
        for peer in &selection.tickers {
            if Instant::now() >= deadline {
                tracing::warn!("Peer budget exhausted after {} of {} peers", moves.len(), selection.tickers.len());
                break;
            }
            let light = match timeout_at(deadline, self.cascade.fetch_light(peer, state)).await {
                Ok(light) => light,
                Err(_) => {
                    tracing::warn!("Peer budget exhausted while pricing {}", peer);
                    break;
                }
            };
            if let Some(m) = light.and_then(|l| self.indicators.light(&closes(&l.points)).day_move_pct) {
                moves.push(m);
            }
        }

        let size = Some(selection.tickers.len());
        if moves.is_empty() {
            return PeerBenchmark {
                size,
                ..Default::default()
            };
        }
        let avg = moves.iter().sum::<f64>() / moves.len() as f64;
        PeerBenchmark {
            label: Some(selection.tier.label().to_string()),
            size,
            avg_move: finite(avg),
        }
    }

    /// Fill every comparative field of a snapshot whose day move is already known.
    pub async fn apply(&self, snapshot: &mut MarketSnapshot, state: &RequestState) {
        snapshot.sp500_performance_today = self.sp500_move(state).await;

        let sector = Sector::from_raw(snapshot.sector.as_deref());
        snapshot.sector_performance_today = self.sector_move(sector, state).await;
        snapshot.relative_strength = relative_strength(snapshot.day_move_pct, snapshot.sector_performance_today);

        if let Some(benchmark) = IndustryBenchmark::classify(snapshot.industry.as_deref()) {
            snapshot.industry_benchmark = Some(benchmark.label());
            snapshot.industry_performance_today = self.industry_move(benchmark, state).await;
        }
        snapshot.relative_strength_vs_industry =
            relative_strength(snapshot.day_move_pct, snapshot.industry_performance_today);

        let peers = self
            .peer_benchmark(
                &snapshot.ticker,
                snapshot.sector.as_deref(),
                snapshot.industry.as_deref(),
                state,
            )
            .await;
        snapshot.peer_group_label = peers.label;
        snapshot.peer_group_size = peers.size;
        snapshot.peer_avg_move_today = peers.avg_move;
        snapshot.relative_strength_vs_peers = relative_strength(snapshot.day_move_pct, snapshot.peer_avg_move_today);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_strength() {
        assert_eq!(relative_strength(Some(2.0), Some(0.5)), Some(1.5));
        assert_eq!(relative_strength(Some(0.0), Some(0.0)), Some(0.0));
        assert_eq!(relative_strength(None, Some(0.5)), None);
        assert_eq!(relative_strength(Some(1.0), None), None);
    }
}
