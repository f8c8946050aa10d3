use statrs::statistics::Statistics;

/// Trailing `n` elements of a slice (the whole slice when it is shorter)
pub fn tail(data: &[f64], n: usize) -> &[f64] {
    &data[data.len().saturating_sub(n)..]
}

/// Simple Moving Average
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return vec![];
    }

    let mut result = Vec::with_capacity(data.len() - period + 1);
    for i in period - 1..data.len() {
        let sum: f64 = data[i + 1 - period..=i].iter().sum();
        result.push(sum / period as f64);
    }
    result
}

/// Mean of the trailing `period` values; `None` unless that many observations exist
pub fn trailing_mean(data: &[f64], period: usize) -> Option<f64> {
    sma(tail(data, period), period).last().copied()
}

/// Quantile with linear interpolation between closest ranks
pub fn quantile(data: &[f64], q: f64) -> Option<f64> {
    if data.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let mut sorted: Vec<f64> = data.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Clip values to the `[lo_q, hi_q]` quantile band.
///
/// Single bad prints from low-quality feeds otherwise dominate the 52-week range.
/// A degenerate band (non-positive or non-increasing bounds) leaves the data untouched.
pub fn winsorize(data: &[f64], lo_q: f64, hi_q: f64) -> Vec<f64> {
    let (Some(lo), Some(hi)) = (quantile(data, lo_q), quantile(data, hi_q)) else {
        return data.to_vec();
    };
    if lo <= 0.0 || hi <= 0.0 || lo >= hi {
        return data.to_vec();
    }
    data.iter().map(|v| v.clamp(lo, hi)).collect()
}

/// Fractional period-over-period returns; pairs with a zero base are skipped
pub fn pct_returns(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .filter(|r| r.is_finite())
        .collect()
}

/// Population standard deviation (ddof = 0); `None` for an empty sample
pub fn population_std_dev(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    let std = data.iter().population_std_dev();
    if std.is_finite() {
        Some(std)
    } else {
        None
    }
}

/// Relative Strength Index over the trailing `period` price changes.
///
/// Gains and losses are averaged with a plain rolling mean. Needs `period + 1`
/// observations. A window with no losses reads 100; a flat window has no RSI.
pub fn rolling_rsi(data: &[f64], period: usize) -> Option<f64> {
    if period == 0 || data.len() < period + 1 {
        return None;
    }

    let window = tail(data, period + 1);
    let mut gain = 0.0;
    let mut loss = 0.0;
    for w in window.windows(2) {
        let change = w[1] - w[0];
        if change > 0.0 {
            gain += change;
        } else {
            loss += change.abs();
        }
    }
    let avg_gain = gain / period as f64;
    let avg_loss = loss / period as f64;

    if avg_loss == 0.0 {
        return if avg_gain > 0.0 { Some(100.0) } else { None };
    }

    let rs = avg_gain / avg_loss;
    let rsi = 100.0 - (100.0 / (1.0 + rs));
    if rsi.is_finite() {
        Some(rsi.clamp(0.0, 100.0))
    } else {
        None
    }
}

/// Highest and lowest value of a slice
pub fn extrema(data: &[f64]) -> Option<(f64, f64)> {
    if data.is_empty() {
        return None;
    }
    let high = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let low = data.iter().copied().fold(f64::INFINITY, f64::min);
    Some((high, low))
}

/// Latest session's volume against the trailing average of reported volumes.
///
/// Returns `(average, current)` once `period` reported volumes exist. The
/// current figure belongs to the last session only, so it is `None` when that
/// session reported no volume.
pub fn volume_profile(volumes: &[Option<f64>], period: usize) -> Option<(f64, Option<f64>)> {
    let reported: Vec<f64> = volumes.iter().flatten().copied().filter(|v| v.is_finite()).collect();
    if period == 0 || reported.len() < period {
        return None;
    }
    let avg = tail(&reported, period).iter().mean();
    let current = volumes.last().copied().flatten().filter(|v| v.is_finite());
    Some((avg, current))
}
