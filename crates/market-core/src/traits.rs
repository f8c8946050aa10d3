use async_trait::async_trait;

use crate::{FetchError, FetchWindow, OhlcvRow, PricePoint, SecurityRecord, TickerProfile};

/// One upstream price-data source.
///
/// Implementations return rows ascending by date, or a classified failure.
/// An empty answer is reported as [`FetchError::DataAbsent`], never as `Ok(vec![])`.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Daily OHLCV history covering `window`.
    async fn fetch_ohlcv(&self, ticker: &str, window: FetchWindow) -> Result<Vec<OhlcvRow>, FetchError>;

    /// Compact close-only series (about a month of sessions).
    async fn fetch_close_series(&self, ticker: &str) -> Result<Vec<PricePoint>, FetchError>;

    /// Company profile. Most providers gate this behind a slower endpoint.
    async fn fetch_profile(&self, _ticker: &str) -> Result<TickerProfile, FetchError> {
        Err(FetchError::data_absent(self.name()))
    }

    fn name(&self) -> &'static str;
}

/// Read-only offline directory of known securities.
pub trait SecurityDirectory: Send + Sync {
    fn list_all(&self) -> Vec<SecurityRecord>;

    /// `(sector, industry)` for a normalized ticker, if the directory knows it.
    fn lookup_profile(&self, ticker: &str) -> Option<(Option<String>, Option<String>)>;
}
