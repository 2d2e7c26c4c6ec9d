//! Volatility indicators shared by the pattern detectors.
//!
//! Every detector scales its stop and target distances by the same ATR, so
//! the estimator lives here rather than inside any one detector.

pub mod atr;

pub use atr::{compute_atr, true_range, true_ranges, ATR_PERIOD};

/// Create candles from `(open, high, low, close)` tuples for testing.
///
/// Timestamps start at 2024-01-02 09:00 UTC and step by the timeframe width.
#[cfg(test)]
pub fn make_candles(
    timeframe: crate::domain::Timeframe,
    data: &[(f64, f64, f64, f64)],
) -> Vec<crate::domain::Candle> {
    use chrono::TimeZone;
    let start = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| crate::domain::Candle {
            symbol: "TEST".to_string(),
            timeframe,
            open,
            high,
            low,
            close,
            volume: Some(1000.0),
            timestamp: start + timeframe.duration() * i as i32,
        })
        .collect()
}

/// Flat candles where open = high = low = close = `price`.
#[cfg(test)]
pub fn flat_candles(
    timeframe: crate::domain::Timeframe,
    price: f64,
    n: usize,
) -> Vec<crate::domain::Candle> {
    make_candles(timeframe, &vec![(price, price, price, price); n])
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
