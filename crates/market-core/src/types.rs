use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Number of trailing closes surfaced on a snapshot's price chart
pub const SURFACED_SERIES_LEN: usize = 32;

/// One point of the surfaced close series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// OHLCV bar for one daily session, in the canonical form every adapter produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvRow {
    pub date: NaiveDate,
    #[serde(default)]
    pub open: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    pub close: f64,
    #[serde(default)]
    pub volume: Option<f64>,
}

impl OhlcvRow {
    pub fn close_only(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
        }
    }
}

impl From<&OhlcvRow> for PricePoint {
    fn from(row: &OhlcvRow) -> Self {
        PricePoint {
            date: row.date,
            close: row.close,
        }
    }
}

/// Sort ascending by date, drop rows without a usable close, keep the last row seen per date.
pub fn canonicalize_rows(rows: Vec<OhlcvRow>) -> Vec<OhlcvRow> {
    let mut rows: Vec<OhlcvRow> = rows
        .into_iter()
        .filter(|r| r.close.is_finite() && r.close > 0.0)
        .collect();
    rows.sort_by_key(|r| r.date);

    let mut out: Vec<OhlcvRow> = Vec::with_capacity(rows.len());
    for row in rows {
        match out.last_mut() {
            Some(last) if last.date == row.date => *last = row,
            _ => out.push(row),
        }
    }
    out
}

/// Same contract as [`canonicalize_rows`] for close-only series.
pub fn canonicalize_points(points: Vec<PricePoint>) -> Vec<PricePoint> {
    let rows = points
        .into_iter()
        .map(|p| OhlcvRow::close_only(p.date, p.close))
        .collect();
    canonicalize_rows(rows).iter().map(PricePoint::from).collect()
}

/// Requested history window for an OHLCV fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FetchWindow {
    FiveDays,
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
}

impl FetchWindow {
    /// Progressively wider windows tried by the retry ladder
    pub const LADDER: [FetchWindow; 4] = [
        FetchWindow::OneMonth,
        FetchWindow::ThreeMonths,
        FetchWindow::SixMonths,
        FetchWindow::OneYear,
    ];

    /// Range token in the period notation most chart APIs accept
    pub fn as_range(&self) -> &'static str {
        match self {
            FetchWindow::FiveDays => "5d",
            FetchWindow::OneMonth => "1mo",
            FetchWindow::ThreeMonths => "3mo",
            FetchWindow::SixMonths => "6mo",
            FetchWindow::OneYear => "1y",
        }
    }

    pub fn calendar_days(&self) -> i64 {
        match self {
            FetchWindow::FiveDays => 5,
            FetchWindow::OneMonth => 31,
            FetchWindow::ThreeMonths => 92,
            FetchWindow::SixMonths => 183,
            FetchWindow::OneYear => 366,
        }
    }
}

/// Which provider tier produced the snapshot's history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Primary,
    Secondary,
    #[default]
    #[serde(rename = "none")]
    NoData,
}

/// Coarse classification of 20-day realized volatility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolatilityRegime {
    Low,
    Normal,
    High,
    #[default]
    Unknown,
}

impl VolatilityRegime {
    /// `vol_20d` is in percent: below 1% is low, above 3% is high.
    pub fn classify(vol_20d: Option<f64>) -> Self {
        match vol_20d {
            Some(v) if !v.is_finite() => VolatilityRegime::Unknown,
            Some(v) if v < 1.0 => VolatilityRegime::Low,
            Some(v) if v > 3.0 => VolatilityRegime::High,
            Some(_) => VolatilityRegime::Normal,
            None => VolatilityRegime::Unknown,
        }
    }
}

/// Provider-sourced company profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickerProfile {
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub market_cap: Option<f64>,
    pub beta: Option<f64>,
    pub pe_ratio: Option<f64>,
}

impl TickerProfile {
    pub fn is_empty(&self) -> bool {
        self == &TickerProfile::default()
    }
}

/// One entry of the offline security directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityRecord {
    pub ticker: String,
    pub name: String,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
}

/// Per-ticker market context handed to the article-analysis pipeline.
///
/// Every float is `None` rather than NaN or infinite once it leaves the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub ticker: String,
    pub price_series: Vec<PricePoint>,
    pub day_move_pct: Option<f64>,
    pub vol_20d: Option<f64>,
    pub move_zscore: Option<f64>,
    pub data_source: DataSource,
    pub last_close_date: Option<NaiveDate>,
    pub price_series_days: usize,
    pub current_price: Option<f64>,

    // 52-week range
    pub week_52_high: Option<f64>,
    pub week_52_low: Option<f64>,
    pub pct_from_52w_high: Option<f64>,
    pub pct_from_52w_low: Option<f64>,

    // Profile
    pub market_cap: Option<f64>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub beta: Option<f64>,
    pub pe_ratio: Option<f64>,

    // Comparative
    pub sector_performance_today: Option<f64>,
    pub sp500_performance_today: Option<f64>,
    pub relative_strength: Option<f64>,
    pub industry_benchmark: Option<String>,
    pub industry_performance_today: Option<f64>,
    pub relative_strength_vs_industry: Option<f64>,
    pub peer_group_label: Option<String>,
    pub peer_group_size: Option<usize>,
    pub peer_avg_move_today: Option<f64>,
    pub relative_strength_vs_peers: Option<f64>,

    // Technical
    pub rsi_14d: Option<f64>,
    pub ma_50d: Option<f64>,
    pub ma_200d: Option<f64>,
    pub unusual_volume: bool,
    pub near_52w_high: bool,
    pub volatility_regime: VolatilityRegime,
    pub average_volume_20d: Option<f64>,
    pub current_volume: Option<f64>,
}

impl MarketSnapshot {
    /// The universal safe fallback: no history, every metric null.
    pub fn empty(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            ..Default::default()
        }
    }

    /// Install a close series and the metadata derived from it.
    pub fn set_price_series(&mut self, series: Vec<PricePoint>) {
        self.last_close_date = series.last().map(|p| p.date);
        self.price_series_days = series.len();
        self.price_series = series;
    }

    pub fn apply_profile(&mut self, profile: &TickerProfile) {
        self.sector = profile.sector.clone();
        self.industry = profile.industry.clone();
        self.market_cap = profile.market_cap;
        self.beta = profile.beta;
        self.pe_ratio = profile.pe_ratio;
    }

    /// Replace every non-finite float with `None`.
    pub fn sanitize(&mut self) {
        for v in [
            &mut self.day_move_pct,
            &mut self.vol_20d,
            &mut self.move_zscore,
            &mut self.current_price,
            &mut self.week_52_high,
            &mut self.week_52_low,
            &mut self.pct_from_52w_high,
            &mut self.pct_from_52w_low,
            &mut self.market_cap,
            &mut self.beta,
            &mut self.pe_ratio,
            &mut self.sector_performance_today,
            &mut self.sp500_performance_today,
            &mut self.relative_strength,
            &mut self.industry_performance_today,
            &mut self.relative_strength_vs_industry,
            &mut self.peer_avg_move_today,
            &mut self.relative_strength_vs_peers,
            &mut self.rsi_14d,
            &mut self.ma_50d,
            &mut self.ma_200d,
            &mut self.average_volume_20d,
            &mut self.current_volume,
        ] {
            *v = v.and_then(finite);
        }
        self.price_series.retain(|p| p.close.is_finite());
        self.price_series_days = self.price_series.len();
        self.last_close_date = self.price_series.last().map(|p| p.date);
    }
}

/// `Some(v)` only when `v` would serialize as a JSON number.
pub fn finite(v: f64) -> Option<f64> {
    if v.is_finite() {
        Some(v)
    } else {
        None
    }
}

/// Percent change from `prev` to `cur`; `None` when `prev` is zero or the result is not finite.
pub fn pct_change(prev: f64, cur: f64) -> Option<f64> {
    if prev == 0.0 {
        return None;
    }
    finite((cur - prev) / prev * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn test_canonicalize_sorts_and_dedups() {
        let rows = vec![
            OhlcvRow::close_only(d(3), 12.0),
            OhlcvRow::close_only(d(1), 10.0),
            OhlcvRow::close_only(d(2), 11.0),
            OhlcvRow::close_only(d(2), 11.5),
            OhlcvRow::close_only(d(4), f64::NAN),
        ];
        let out = canonicalize_rows(rows);
        let dates: Vec<_> = out.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![d(1), d(2), d(3)]);
        assert_eq!(out[1].close, 11.5);
    }

    #[test]
    fn test_sanitize_nulls_non_finite_values() {
        let mut snap = MarketSnapshot::empty("AAPL");
        snap.day_move_pct = Some(f64::NAN);
        snap.vol_20d = Some(f64::INFINITY);
        snap.rsi_14d = Some(55.0);
        snap.sanitize();
        assert_eq!(snap.day_move_pct, None);
        assert_eq!(snap.vol_20d, None);
        assert_eq!(snap.rsi_14d, Some(55.0));
    }

    #[test]
    fn test_snapshot_serializes_nulls_and_lowercase_enums() {
        let snap = MarketSnapshot::empty("ZZZZ");
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["data_source"], "none");
        assert_eq!(json["volatility_regime"], "unknown");
        assert!(json["day_move_pct"].is_null());
        assert_eq!(json["price_series"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_volatility_regime_thresholds() {
        assert_eq!(VolatilityRegime::classify(Some(0.5)), VolatilityRegime::Low);
        assert_eq!(VolatilityRegime::classify(Some(1.0)), VolatilityRegime::Normal);
        assert_eq!(VolatilityRegime::classify(Some(3.0)), VolatilityRegime::Normal);
        assert_eq!(VolatilityRegime::classify(Some(3.01)), VolatilityRegime::High);
        assert_eq!(VolatilityRegime::classify(None), VolatilityRegime::Unknown);
    }

    #[test]
    fn test_pct_change() {
        assert!((pct_change(100.0, 105.0).unwrap() - 5.0).abs() < 1e-9);
        assert_eq!(pct_change(0.0, 5.0), None);
    }
}
