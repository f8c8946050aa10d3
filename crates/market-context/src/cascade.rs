//! Primary/secondary fallback cascade.
//!
//! Every provider call yields a classified [`FetchError`] on failure and the
//! cascade decides by matching on it: `RateLimited` abandons the provider for
//! the rest of the request, `DataAbsent` falls straight through, `Transient`
//! may be retried. Calls are issued one at a time.

use market_core::{
    canonicalize_points, canonicalize_rows, DataSource, FetchError, FetchWindow, OhlcvRow, PricePoint,
    PriceProvider, TickerProfile,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Attempts per window of the widening ladder
const ATTEMPTS_PER_WINDOW: usize = 2;

/// Provider health observed during one logical request.
///
/// Once the primary signals throttling it is skipped for every later call
/// made on behalf of the same request.
#[derive(Debug, Default)]
pub struct RequestState {
    primary_throttled: AtomicBool,
}

impl RequestState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn primary_throttled(&self) -> bool {
        self.primary_throttled.load(Ordering::SeqCst)
    }

    fn note(&self, err: &FetchError) {
        if err.is_rate_limited() {
            self.primary_throttled.store(true, Ordering::SeqCst);
        }
    }
}

/// Outcome of the full-ticker path
#[derive(Debug, Clone, PartialEq)]
pub enum FullFetch {
    Ohlcv { rows: Vec<OhlcvRow>, source: DataSource },
    /// Only the secondary close-only series was available
    CloseOnly(Vec<PricePoint>),
    Nothing,
}

/// Outcome of the light-ticker path
#[derive(Debug, Clone, PartialEq)]
pub struct LightFetch {
    pub points: Vec<PricePoint>,
    pub source: DataSource,
}

pub struct DataSourceCascade {
    primary: Arc<dyn PriceProvider>,
    secondary: Arc<dyn PriceProvider>,
    retry_delay: Duration,
}

fn non_empty_rows(rows: Vec<OhlcvRow>, provider: &str) -> Result<Vec<OhlcvRow>, FetchError> {
    let rows = canonicalize_rows(rows);
    if rows.is_empty() {
        Err(FetchError::data_absent(provider))
    } else {
        Ok(rows)
    }
}

fn non_empty_points(points: Vec<PricePoint>, provider: &str) -> Result<Vec<PricePoint>, FetchError> {
    let points = canonicalize_points(points);
    if points.is_empty() {
        Err(FetchError::data_absent(provider))
    } else {
        Ok(points)
    }
}

impl DataSourceCascade {
    pub fn new(primary: Arc<dyn PriceProvider>, secondary: Arc<dyn PriceProvider>, retry_delay: Duration) -> Self {
        Self {
            primary,
            secondary,
            retry_delay,
        }
    }

    /// One primary OHLCV call, skipped once the request has seen the primary throttle.
    pub async fn primary_ohlcv(
        &self,
        ticker: &str,
        window: FetchWindow,
        state: &RequestState,
    ) -> Result<Vec<OhlcvRow>, FetchError> {
        if state.primary_throttled() {
            return Err(FetchError::rate_limited(self.primary.name()));
        }
        let result = match self.primary.fetch_ohlcv(ticker, window).await {
            Ok(rows) => non_empty_rows(rows, self.primary.name()),
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            state.note(e);
        }
        result
    }

    pub async fn secondary_ohlcv(&self, ticker: &str, window: FetchWindow) -> Result<Vec<OhlcvRow>, FetchError> {
        let rows = self.secondary.fetch_ohlcv(ticker, window).await?;
        non_empty_rows(rows, self.secondary.name())
    }

    pub async fn secondary_closes(&self, ticker: &str) -> Result<Vec<PricePoint>, FetchError> {
        let points = self.secondary.fetch_close_series(ticker).await?;
        non_empty_points(points, self.secondary.name())
    }

    /// Primary OHLCV over progressively wider windows.
    ///
    /// Transient failures are retried within a window before widening. A
    /// rate-limit or an empty answer ends the ladder at once.
    pub async fn primary_with_ladder(&self, ticker: &str, state: &RequestState) -> Result<Vec<OhlcvRow>, FetchError> {
        let mut last_err = FetchError::data_absent(self.primary.name());

        if state.primary_throttled() {
            return Err(FetchError::rate_limited(self.primary.name()));
        }

        for window in FetchWindow::LADDER {
            for attempt in 1..=ATTEMPTS_PER_WINDOW {
                tokio::time::sleep(self.retry_delay).await;
                match self.primary_ohlcv(ticker, window, state).await {
                    Ok(rows) => return Ok(rows),
                    Err(e) if e.is_rate_limited() => {
                        tracing::warn!("{} rate limited on {}; abandoning retries", self.primary.name(), ticker);
                        return Err(e);
                    }
                    Err(e @ FetchError::DataAbsent { .. }) => return Err(e),
                    Err(e) => {
                        tracing::debug!(
                            "{} attempt {}/{} for {} ({}) failed: {}",
                            self.primary.name(),
                            attempt,
                            ATTEMPTS_PER_WINDOW,
                            ticker,
                            window.as_range(),
                            e
                        );
                        last_err = e;
                    }
                }
            }
        }

        Err(last_err)
    }

    /// Full-ticker path: primary 1y, secondary OHLCV, secondary close-only.
    pub async fn fetch_full(&self, ticker: &str, state: &RequestState) -> FullFetch {
        match self.primary_ohlcv(ticker, FetchWindow::OneYear, state).await {
            Ok(rows) => {
                return FullFetch::Ohlcv {
                    rows,
                    source: DataSource::Primary,
                }
            }
            Err(e) => tracing::warn!("Primary history unavailable for {}: {}", ticker, e),
        }

        match self.secondary_ohlcv(ticker, FetchWindow::OneYear).await {
            Ok(rows) => {
                return FullFetch::Ohlcv {
                    rows,
                    source: DataSource::Secondary,
                }
            }
            Err(e) => tracing::warn!("Secondary history unavailable for {}: {}", ticker, e),
        }

        match self.secondary_closes(ticker).await {
            Ok(points) => FullFetch::CloseOnly(points),
            Err(e) => {
                tracing::warn!("No price data for {}: {}", ticker, e);
                FullFetch::Nothing
            }
        }
    }

    /// Light-ticker path: a single primary 1-month call, then the secondary close series.
    pub async fn fetch_light(&self, ticker: &str, state: &RequestState) -> Option<LightFetch> {
        match self.primary_ohlcv(ticker, FetchWindow::OneMonth, state).await {
            Ok(rows) => {
                return Some(LightFetch {
                    points: rows.iter().map(PricePoint::from).collect(),
                    source: DataSource::Primary,
                })
            }
            Err(e) => tracing::debug!("Light primary fetch failed for {}: {}", ticker, e),
        }

        match self.secondary_closes(ticker).await {
            Ok(points) => Some(LightFetch {
                points,
                source: DataSource::Secondary,
            }),
            Err(e) => {
                tracing::debug!("Light secondary fetch failed for {}: {}", ticker, e);
                None
            }
        }
    }

    /// Provider profile, primary first unless the request has seen it throttle.
    pub async fn fetch_profile(&self, ticker: &str, state: &RequestState) -> Result<TickerProfile, FetchError> {
        if !state.primary_throttled() {
            match self.primary.fetch_profile(ticker).await {
                Ok(profile) if !profile.is_empty() => return Ok(profile),
                Ok(_) => tracing::debug!("Empty primary profile for {}", ticker),
                Err(e) => {
                    tracing::debug!("Primary profile failed for {}: {}", ticker, e);
                    state.note(&e);
                }
            }
        }
        let profile = self.secondary.fetch_profile(ticker).await?;
        if profile.is_empty() {
            return Err(FetchError::data_absent(self.secondary.name()));
        }
        Ok(profile)
    }
}
