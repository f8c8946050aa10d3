use market_core::{
    finite, pct_change, MarketSnapshot, OhlcvRow, PricePoint, VolatilityRegime, SURFACED_SERIES_LEN,
};

use crate::indicators::*;

/// Sessions used for return statistics
const STATS_WINDOW: usize = 60;
const VOL_WINDOW: usize = 20;
const YEAR_SESSIONS: usize = 252;
const RSI_PERIOD: usize = 14;
const VOLUME_WINDOW: usize = 20;
const WINSOR_LO: f64 = 0.01;
const WINSOR_HI: f64 = 0.99;
/// Within this many percent of the 52-week high counts as "near"
const NEAR_HIGH_PCT: f64 = -5.0;
const UNUSUAL_VOLUME_MULTIPLE: f64 = 2.0;

/// Everything derived from one OHLCV history
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TechnicalMetrics {
    pub price_series: Vec<PricePoint>,
    pub day_move_pct: Option<f64>,
    pub vol_20d: Option<f64>,
    pub move_zscore: Option<f64>,
    pub current_price: Option<f64>,
    pub week_52_high: Option<f64>,
    pub week_52_low: Option<f64>,
    pub pct_from_52w_high: Option<f64>,
    pub pct_from_52w_low: Option<f64>,
    pub near_52w_high: bool,
    pub rsi_14d: Option<f64>,
    pub ma_50d: Option<f64>,
    pub ma_200d: Option<f64>,
    pub unusual_volume: bool,
    pub average_volume_20d: Option<f64>,
    pub current_volume: Option<f64>,
    pub volatility_regime: VolatilityRegime,
    /// False when the history had fewer than two closes
    pub has_returns: bool,
}

impl TechnicalMetrics {
    pub fn apply_to(&self, snapshot: &mut MarketSnapshot) {
        snapshot.set_price_series(self.price_series.clone());
        snapshot.day_move_pct = self.day_move_pct;
        snapshot.vol_20d = self.vol_20d;
        snapshot.move_zscore = self.move_zscore;
        snapshot.current_price = self.current_price;
        snapshot.week_52_high = self.week_52_high;
        snapshot.week_52_low = self.week_52_low;
        snapshot.pct_from_52w_high = self.pct_from_52w_high;
        snapshot.pct_from_52w_low = self.pct_from_52w_low;
        snapshot.near_52w_high = self.near_52w_high;
        snapshot.rsi_14d = self.rsi_14d;
        snapshot.ma_50d = self.ma_50d;
        snapshot.ma_200d = self.ma_200d;
        snapshot.unusual_volume = self.unusual_volume;
        snapshot.average_volume_20d = self.average_volume_20d;
        snapshot.current_volume = self.current_volume;
        snapshot.volatility_regime = self.volatility_regime;
    }
}

/// Day move and short-horizon volatility only, for secondary tickers and peers
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LightMetrics {
    pub day_move_pct: Option<f64>,
    pub vol_20d: Option<f64>,
    pub move_zscore: Option<f64>,
}

/// Stateless indicator computation over canonical (ascending, de-duplicated) rows.
pub struct TechnicalIndicatorEngine;

impl Default for TechnicalIndicatorEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TechnicalIndicatorEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn compute(&self, rows: &[OhlcvRow]) -> TechnicalMetrics {
        if rows.is_empty() {
            return TechnicalMetrics::default();
        }

        let raw: Vec<f64> = rows.iter().map(|r| r.close).collect();
        let closes = winsorize(&raw, WINSOR_LO, WINSOR_HI);

        let skip = rows.len().saturating_sub(SURFACED_SERIES_LEN);
        let price_series: Vec<PricePoint> = rows[skip..]
            .iter()
            .zip(&closes[skip..])
            .map(|(row, &close)| PricePoint { date: row.date, close })
            .collect();

        let current_price = closes.last().copied().and_then(finite);
        let returns = pct_returns(tail(&closes, STATS_WINDOW));
        if returns.is_empty() {
            return TechnicalMetrics {
                price_series,
                current_price,
                ..Default::default()
            };
        }

        let (vol_20d, move_zscore) = return_stats(&returns);

        let (week_52_high, week_52_low) = match extrema(tail(&closes, YEAR_SESSIONS)) {
            Some((high, low)) => (finite(high), finite(low)),
            None => (None, None),
        };
        let pct_from_52w_high = match (current_price, week_52_high) {
            (Some(cur), Some(high)) => pct_change(high, cur),
            _ => None,
        };
        let pct_from_52w_low = match (current_price, week_52_low) {
            (Some(cur), Some(low)) => pct_change(low, cur),
            _ => None,
        };

        let volumes: Vec<Option<f64>> = rows.iter().map(|r| r.volume).collect();
        let (average_volume_20d, current_volume, unusual_volume) = match volume_profile(&volumes, VOLUME_WINDOW) {
            Some((avg, cur)) => (
                finite(avg),
                cur,
                cur.is_some_and(|c| avg > 0.0 && c > avg * UNUSUAL_VOLUME_MULTIPLE),
            ),
            None => (None, None, false),
        };

        TechnicalMetrics {
            price_series,
            day_move_pct: day_move(&raw),
            vol_20d,
            move_zscore,
            current_price,
            week_52_high,
            week_52_low,
            pct_from_52w_high,
            pct_from_52w_low,
            near_52w_high: pct_from_52w_high.is_some_and(|p| p >= NEAR_HIGH_PCT),
            rsi_14d: rolling_rsi(&closes, RSI_PERIOD),
            ma_50d: trailing_mean(&closes, 50).and_then(finite),
            ma_200d: trailing_mean(&closes, 200).and_then(finite),
            unusual_volume,
            average_volume_20d,
            current_volume,
            volatility_regime: VolatilityRegime::classify(vol_20d),
            has_returns: true,
        }
    }

    /// Day move, vol_20d and z-score over raw closes, without winsorization.
    pub fn light(&self, closes: &[f64]) -> LightMetrics {
        let returns = pct_returns(tail(closes, STATS_WINDOW));
        let (vol_20d, move_zscore) = if returns.is_empty() {
            (None, None)
        } else {
            return_stats(&returns)
        };
        LightMetrics {
            day_move_pct: day_move(closes),
            vol_20d,
            move_zscore,
        }
    }
}

/// Percent move between the last two closes
pub fn day_move(closes: &[f64]) -> Option<f64> {
    match closes {
        [.., prev, last] => pct_change(*prev, *last),
        _ => None,
    }
}

/// `(vol_20d in percent, z-score of the latest return)`
fn return_stats(returns: &[f64]) -> (Option<f64>, Option<f64>) {
    let vol = population_std_dev(tail(returns, VOL_WINDOW));
    let vol_20d = vol.and_then(|v| finite(v * 100.0));
    let zscore = match (vol, returns.last()) {
        (Some(v), Some(&last)) if v > 0.0 => finite(last / v),
        _ => None,
    };
    (vol_20d, zscore)
}
