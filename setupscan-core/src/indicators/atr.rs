//! Average True Range (ATR).
//!
//! True Range for the pair (i-1, i): max(high-low, |high-prev_close|, |low-prev_close|).
//! ATR here is the plain arithmetic mean of the trailing `period` true ranges,
//! recomputed on every detection pass. No smoothing, no warmup NaNs.

use crate::domain::Candle;

/// Default ATR lookback in candle pairs.
pub const ATR_PERIOD: usize = 14;

/// True range of `current` against the previous candle's close.
pub fn true_range(previous: &Candle, current: &Candle) -> f64 {
    let prev_close = previous.close;
    (current.high - current.low)
        .max((current.high - prev_close).abs())
        .max((current.low - prev_close).abs())
}

/// True ranges for every adjacent pair. Length is `candles.len() - 1`.
pub fn true_ranges(candles: &[Candle]) -> Vec<f64> {
    candles
        .windows(2)
        .map(|pair| true_range(&pair[0], &pair[1]))
        .collect()
}

/// Mean true range over the most recent `period` pairs.
///
/// Uses every available pair when the series is shorter than `period + 1`.
/// Returns 0.0 with fewer than two candles; a zero ATR means stops cannot be
/// sized and detectors treat it as no detection.
pub fn compute_atr(candles: &[Candle], period: usize) -> f64 {
    if candles.len() < 2 || period == 0 {
        return 0.0;
    }
    let start = candles.len().saturating_sub(period + 1);
    let ranges = true_ranges(&candles[start..]);
    ranges.iter().sum::<f64>() / ranges.len() as f64
}
