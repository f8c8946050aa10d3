//! Secondary adapter backed by Alpha Vantage.
//!
//! Only the non-premium endpoints are used: `TIME_SERIES_DAILY` with
//! `outputsize=compact` (about 100 sessions) and `OVERVIEW`. The free tier is
//! throttled hard, so throttling notes in the payload are reported as
//! `RateLimited` and never retried.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use market_core::{
    canonicalize_rows, FetchError, FetchWindow, OhlcvRow, PricePoint, PriceProvider, TickerProfile,
    SURFACED_SERIES_LEN,
};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::http::{build_client, decode, send};
use crate::{ProviderSettings, RateLimiter};

const BASE_URL: &str = "https://www.alphavantage.co/query";
const PROVIDER: &str = "alpha_vantage";

#[derive(Clone)]
pub struct AlphaVantageProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    rate_limiter: RateLimiter,
}

impl AlphaVantageProvider {
    pub fn new(api_key: Option<String>, settings: &ProviderSettings) -> Self {
        Self {
            client: build_client(settings),
            base_url: BASE_URL.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            rate_limiter: RateLimiter::per_minute(settings.requests_per_minute),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn query<T: serde::de::DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<T, FetchError> {
        // Without a key there is nothing to ask; behave like an empty answer.
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(FetchError::data_absent(PROVIDER));
        };

        tracing::debug!("Alpha Vantage request: {:?}", params);
        let response = send(
            PROVIDER,
            &self.rate_limiter,
            self.client.get(&self.base_url).query(params).query(&[("apikey", api_key)]),
        )
        .await?;
        decode(PROVIDER, response).await
    }

    async fn compact_daily(&self, ticker: &str) -> Result<Vec<OhlcvRow>, FetchError> {
        let payload: TimeSeriesResponse = self
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", ticker),
                ("outputsize", "compact"),
            ])
            .await?;
        parse_time_series(payload)
    }
}

#[async_trait]
impl PriceProvider for AlphaVantageProvider {
    async fn fetch_ohlcv(&self, ticker: &str, window: FetchWindow) -> Result<Vec<OhlcvRow>, FetchError> {
        let rows = self.compact_daily(ticker).await?;
        let rows = trim_to_window(rows, window);
        if rows.is_empty() {
            return Err(FetchError::data_absent(PROVIDER));
        }
        Ok(rows)
    }

    async fn fetch_close_series(&self, ticker: &str) -> Result<Vec<PricePoint>, FetchError> {
        let rows = self.compact_daily(ticker).await?;
        let skip = rows.len().saturating_sub(SURFACED_SERIES_LEN);
        Ok(rows[skip..].iter().map(PricePoint::from).collect())
    }

    async fn fetch_profile(&self, ticker: &str) -> Result<TickerProfile, FetchError> {
        let payload: OverviewResponse = self.query(&[("function", "OVERVIEW"), ("symbol", ticker)]).await?;
        parse_overview(payload)
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}

/// Map payload-level notes to a classified failure.
fn check_api_error(
    error_message: &Option<String>,
    note: &Option<String>,
    information: &Option<String>,
) -> Result<(), FetchError> {
    if error_message.is_some() {
        return Err(FetchError::data_absent(PROVIDER));
    }
    let Some(msg) = note.as_ref().or(information.as_ref()) else {
        return Ok(());
    };
    let lower = msg.to_lowercase();
    if lower.contains("api call frequency") || lower.contains("rate limit") || lower.contains("requests per") {
        return Err(FetchError::rate_limited(PROVIDER));
    }
    tracing::warn!("Alpha Vantage note: {}", msg);
    Err(FetchError::transient(PROVIDER, msg.clone()))
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_row(date_str: &str, value: &Value) -> Result<OhlcvRow, FetchError> {
    let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .map_err(|_| FetchError::malformed(PROVIDER, format!("bad date {}", date_str)))?;
    let quote = DailyQuote::deserialize(value)
        .map_err(|e| FetchError::malformed(PROVIDER, format!("bad row on {}: {}", date_str, e)))?;
    let close = quote
        .close
        .as_deref()
        .and_then(parse_number)
        .filter(|c| *c > 0.0)
        .ok_or_else(|| FetchError::malformed(PROVIDER, format!("bad close on {}", date_str)))?;

    Ok(OhlcvRow {
        date,
        open: quote.open.as_deref().and_then(parse_number),
        high: quote.high.as_deref().and_then(parse_number),
        low: quote.low.as_deref().and_then(parse_number),
        close,
        volume: quote.volume.as_deref().and_then(parse_number),
    })
}

pub(crate) fn parse_time_series(payload: TimeSeriesResponse) -> Result<Vec<OhlcvRow>, FetchError> {
    check_api_error(&payload.error_message, &payload.note, &payload.information)?;

    let series = payload.time_series.unwrap_or_default();
    let mut rows = Vec::with_capacity(series.len());
    for (date_str, value) in &series {
        match parse_row(date_str, value) {
            Ok(row) => rows.push(row),
            Err(e) => tracing::debug!("Skipping row: {}", e),
        }
    }

    let rows = canonicalize_rows(rows);
    if rows.is_empty() {
        return Err(FetchError::data_absent(PROVIDER));
    }
    Ok(rows)
}

/// Keep the rows that fall inside `window`, measured back from the latest session.
fn trim_to_window(rows: Vec<OhlcvRow>, window: FetchWindow) -> Vec<OhlcvRow> {
    let Some(last) = rows.last().map(|r| r.date) else {
        return rows;
    };
    let cutoff = last - Duration::days(window.calendar_days());
    rows.into_iter().filter(|r| r.date > cutoff).collect()
}

fn profile_field(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != "None" && v != "-")
}

pub(crate) fn parse_overview(payload: OverviewResponse) -> Result<TickerProfile, FetchError> {
    check_api_error(&payload.error_message, &payload.note, &payload.information)?;

    let profile = TickerProfile {
        sector: profile_field(payload.sector),
        industry: profile_field(payload.industry),
        market_cap: payload.market_cap.as_deref().and_then(parse_number),
        beta: payload.beta.as_deref().and_then(parse_number),
        pe_ratio: payload.pe_ratio.as_deref().and_then(parse_number),
    };
    if profile.is_empty() {
        return Err(FetchError::data_absent(PROVIDER));
    }
    Ok(profile)
}

#[derive(Debug, Deserialize)]
pub(crate) struct TimeSeriesResponse {
    // Rows are decoded one by one so a bad row cannot sink the payload
    #[serde(rename = "Time Series (Daily)")]
    time_series: Option<HashMap<String, Value>>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DailyQuote {
    #[serde(rename = "1. open")]
    open: Option<String>,
    #[serde(rename = "2. high")]
    high: Option<String>,
    #[serde(rename = "3. low")]
    low: Option<String>,
    #[serde(rename = "4. close")]
    close: Option<String>,
    #[serde(rename = "5. volume")]
    volume: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OverviewResponse {
    #[serde(rename = "Sector")]
    sector: Option<String>,
    #[serde(rename = "Industry")]
    industry: Option<String>,
    #[serde(rename = "MarketCapitalization")]
    market_cap: Option<String>,
    #[serde(rename = "Beta")]
    beta: Option<String>,
    #[serde(rename = "PERatio")]
    pe_ratio: Option<String>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}
