use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use market_core::{
    canonicalize_rows, FetchError, FetchWindow, OhlcvRow, PricePoint, PriceProvider, TickerProfile,
    SURFACED_SERIES_LEN,
};
use reqwest::Client;
use serde::Deserialize;

use crate::http::{build_client, decode, send};
use crate::{ProviderSettings, RateLimiter};

const BASE_URL: &str = "https://query1.finance.yahoo.com";
const PROVIDER: &str = "yahoo";

/// Primary adapter: long-window daily OHLCV with volume from the Yahoo chart API.
///
/// Closes are split/dividend adjusted; open/high/low are scaled by the same factor.
#[derive(Clone)]
pub struct YahooChartProvider {
    client: Client,
    base_url: String,
    rate_limiter: RateLimiter,
}

impl YahooChartProvider {
    pub fn new(settings: &ProviderSettings) -> Self {
        Self {
            client: build_client(settings),
            base_url: BASE_URL.to_string(),
            rate_limiter: RateLimiter::per_minute(settings.requests_per_minute),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl PriceProvider for YahooChartProvider {
    async fn fetch_ohlcv(&self, ticker: &str, window: FetchWindow) -> Result<Vec<OhlcvRow>, FetchError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);
        let response = send(
            PROVIDER,
            &self.rate_limiter,
            self.client.get(&url).query(&[
                ("range", window.as_range()),
                ("interval", "1d"),
                ("includeAdjustedClose", "true"),
            ]),
        )
        .await?;

        let chart: ChartResponse = decode(PROVIDER, response).await?;
        let rows = parse_chart(chart)?;
        tracing::debug!("{}: {} rows for {} ({})", PROVIDER, rows.len(), ticker, window.as_range());
        Ok(rows)
    }

    async fn fetch_close_series(&self, ticker: &str) -> Result<Vec<PricePoint>, FetchError> {
        let rows = self.fetch_ohlcv(ticker, FetchWindow::OneMonth).await?;
        let skip = rows.len().saturating_sub(SURFACED_SERIES_LEN);
        Ok(rows[skip..].iter().map(PricePoint::from).collect())
    }

    async fn fetch_profile(&self, ticker: &str) -> Result<TickerProfile, FetchError> {
        let url = format!("{}/v10/finance/quoteSummary/{}", self.base_url, ticker);
        let response = send(
            PROVIDER,
            &self.rate_limiter,
            self.client
                .get(&url)
                .query(&[("modules", "assetProfile,summaryDetail,price")]),
        )
        .await?;

        let summary: QuoteSummaryResponse = decode(PROVIDER, response).await?;
        parse_quote_summary(summary)
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}

fn chart_error(error: &ChartError) -> FetchError {
    let text = format!(
        "{} {}",
        error.code.as_deref().unwrap_or_default(),
        error.description.as_deref().unwrap_or_default()
    );
    let lower = text.to_lowercase();
    if lower.contains("not found") || lower.contains("delisted") || lower.contains("no data") {
        FetchError::data_absent(PROVIDER)
    } else {
        FetchError::classify_message(PROVIDER, &text)
    }
}

/// Turn a chart payload into canonical ascending rows, skipping malformed sessions.
pub(crate) fn parse_chart(chart: ChartResponse) -> Result<Vec<OhlcvRow>, FetchError> {
    if let Some(error) = chart.chart.error.as_ref() {
        return Err(chart_error(error));
    }

    let result = chart
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| FetchError::data_absent(PROVIDER))?;

    let offset = result.meta.as_ref().and_then(|m| m.gmtoffset).unwrap_or(0);
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let adjclose = result
        .indicators
        .adjclose
        .and_then(|a| a.into_iter().next())
        .map(|a| a.adjclose)
        .unwrap_or_default();

    let mut rows = Vec::with_capacity(result.timestamp.len());
    let mut skipped = 0usize;
    for (i, &ts) in result.timestamp.iter().enumerate() {
        match parse_session(ts + offset, i, &quote, &adjclose) {
            Ok(row) => rows.push(row),
            Err(e) => {
                skipped += 1;
                tracing::debug!("Skipping row: {}", e);
            }
        }
    }
    if skipped > 0 {
        tracing::debug!("{}: skipped {} malformed rows", PROVIDER, skipped);
    }

    let rows = canonicalize_rows(rows);
    if rows.is_empty() {
        return Err(FetchError::data_absent(PROVIDER));
    }
    Ok(rows)
}

fn at(series: &[Option<f64>], i: usize) -> Option<f64> {
    series.get(i).copied().flatten().filter(|v| v.is_finite())
}

fn parse_session(ts: i64, i: usize, quote: &QuoteBlock, adjclose: &[Option<f64>]) -> Result<OhlcvRow, FetchError> {
    let date: NaiveDate = DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| FetchError::malformed(PROVIDER, format!("bad timestamp {}", ts)))?;

    let raw_close = at(&quote.close, i)
        .filter(|c| *c > 0.0)
        .ok_or_else(|| FetchError::malformed(PROVIDER, format!("missing close on {}", date)))?;

    let close = at(adjclose, i).filter(|c| *c > 0.0).unwrap_or(raw_close);
    let factor = close / raw_close;

    Ok(OhlcvRow {
        date,
        open: at(&quote.open, i).map(|v| v * factor),
        high: at(&quote.high, i).map(|v| v * factor),
        low: at(&quote.low, i).map(|v| v * factor),
        close,
        volume: at(&quote.volume, i),
    })
}

pub(crate) fn parse_quote_summary(summary: QuoteSummaryResponse) -> Result<TickerProfile, FetchError> {
    let result = summary
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| FetchError::data_absent(PROVIDER))?;

    let asset = result.asset_profile.unwrap_or_default();
    let detail = result.summary_detail.unwrap_or_default();
    let price = result.price.unwrap_or_default();

    Ok(TickerProfile {
        sector: asset.sector,
        industry: asset.industry,
        market_cap: price.market_cap.and_then(|v| v.raw),
        beta: detail.beta.and_then(|v| v.raw),
        pe_ratio: detail.trailing_pe.and_then(|v| v.raw),
    })
}

// Chart response structures
#[derive(Debug, Deserialize)]
pub(crate) struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
    #[serde(default)]
    adjclose: Option<Vec<AdjCloseBlock>>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseBlock {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

// quoteSummary response structures
#[derive(Debug, Deserialize)]
pub(crate) struct QuoteSummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummaryBody,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryBody {
    #[serde(default)]
    result: Option<Vec<QuoteSummaryResult>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResult {
    #[serde(default)]
    asset_profile: Option<AssetProfile>,
    #[serde(default)]
    summary_detail: Option<SummaryDetail>,
    #[serde(default)]
    price: Option<PriceModule>,
}

#[derive(Debug, Default, Deserialize)]
struct AssetProfile {
    sector: Option<String>,
    industry: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SummaryDetail {
    beta: Option<RawValue>,
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    market_cap: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chart(value: serde_json::Value) -> ChartResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_chart_adjusts_and_skips_null_sessions() {
        let payload = chart(json!({
            "chart": {
                "result": [{
                    "meta": { "gmtoffset": -14400 },
                    "timestamp": [1709649000, 1709735400, 1709821800],
                    "indicators": {
                        "quote": [{
                            "open": [100.0, null, 102.0],
                            "high": [101.0, null, 104.0],
                            "low": [99.0, null, 101.0],
                            "close": [100.0, null, 103.0],
                            "volume": [1000.0, null, 1500.0]
                        }],
                        "adjclose": [{ "adjclose": [50.0, null, 51.5] }]
                    }
                }],
                "error": null
            }
        }));

        let rows = parse_chart(payload).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].date < rows[1].date);
        assert!((rows[0].close - 50.0).abs() < 1e-9);
        assert!((rows[0].high.unwrap() - 50.5).abs() < 1e-9);
        assert_eq!(rows[1].volume, Some(1500.0));
    }

    #[test]
    fn test_chart_error_not_found_is_data_absent() {
        let payload = chart(json!({
            "chart": {
                "result": null,
                "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
            }
        }));
        assert_eq!(parse_chart(payload), Err(FetchError::data_absent(PROVIDER)));
    }

    #[test]
    fn test_chart_with_only_malformed_rows_is_data_absent() {
        let payload = chart(json!({
            "chart": {
                "result": [{
                    "timestamp": [1709649000],
                    "indicators": { "quote": [{ "close": [null] }] }
                }],
                "error": null
            }
        }));
        assert_eq!(parse_chart(payload), Err(FetchError::data_absent(PROVIDER)));
    }

    #[test]
    fn test_parse_quote_summary() {
        let summary: QuoteSummaryResponse = serde_json::from_value(json!({
            "quoteSummary": {
                "result": [{
                    "assetProfile": { "sector": "Technology", "industry": "Consumer Electronics" },
                    "summaryDetail": { "beta": { "raw": 1.24 }, "trailingPE": { "raw": 29.5 } },
                    "price": { "marketCap": { "raw": 2.9e12 } }
                }],
                "error": null
            }
        }))
        .unwrap();

        let profile = parse_quote_summary(summary).unwrap();
        assert_eq!(profile.sector.as_deref(), Some("Technology"));
        assert_eq!(profile.industry.as_deref(), Some("Consumer Electronics"));
        assert_eq!(profile.beta, Some(1.24));
        assert_eq!(profile.pe_ratio, Some(29.5));
        assert_eq!(profile.market_cap, Some(2.9e12));
    }

    #[tokio::test]
    #[ignore] // Hits the live Yahoo endpoint
    async fn test_fetch_live_history() {
        let provider = YahooChartProvider::new(&ProviderSettings::default());
        let rows = provider.fetch_ohlcv("AAPL", FetchWindow::OneMonth).await.unwrap();
        assert!(!rows.is_empty());
    }
}
