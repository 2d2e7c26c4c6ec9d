//! OHLC candles and window helpers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Timeframe;

/// OHLC candle for a single symbol on a single timeframe.
///
/// Candles are immutable once stored. Within a series, timestamps are
/// strictly increasing after [`sort_chronological`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// Why a candle failed the OHLC consistency check.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CandleError {
    #[error("{symbol} {timestamp}: non-finite price")]
    NonFinite {
        symbol: String,
        timestamp: DateTime<Utc>,
    },

    #[error("{symbol} {timestamp}: low {low} above high {high}")]
    LowAboveHigh {
        symbol: String,
        timestamp: DateTime<Utc>,
        low: f64,
        high: f64,
    },

    #[error("{symbol} {timestamp}: open/close outside [{low}, {high}]")]
    BodyOutsideRange {
        symbol: String,
        timestamp: DateTime<Utc>,
        low: f64,
        high: f64,
    },
}

impl Candle {
    /// Returns true if any OHLC field is NaN or infinite.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite())
    }

    /// Basic OHLC sanity check: low <= open, close <= high.
    pub fn is_sane(&self) -> bool {
        self.validate().is_ok()
    }

    /// Like [`is_sane`](Self::is_sane), but reports the first violation.
    pub fn validate(&self) -> Result<(), CandleError> {
        if self.is_void() {
            return Err(CandleError::NonFinite {
                symbol: self.symbol.clone(),
                timestamp: self.timestamp,
            });
        }
        if self.low > self.high {
            return Err(CandleError::LowAboveHigh {
                symbol: self.symbol.clone(),
                timestamp: self.timestamp,
                low: self.low,
                high: self.high,
            });
        }
        let body_inside = self.low <= self.open
            && self.open <= self.high
            && self.low <= self.close
            && self.close <= self.high;
        if !body_inside {
            return Err(CandleError::BodyOutsideRange {
                symbol: self.symbol.clone(),
                timestamp: self.timestamp,
                low: self.low,
                high: self.high,
            });
        }
        Ok(())
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// Absolute size of the candle body.
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// High-to-low spread.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}

/// Sort a fetched window oldest-first.
///
/// Stores may hand back candles in any order. Candles sharing a timestamp
/// are collapsed to the first one seen so the series is strictly increasing.
pub fn sort_chronological(candles: &mut Vec<Candle>) {
    candles.sort_by_key(|c| c.timestamp);
    candles.dedup_by_key(|c| c.timestamp);
}

/// Borrow the most recent `n` candles of an ascending series.
///
/// Returns the whole series if it is shorter than `n`.
pub fn tail(candles: &[Candle], n: usize) -> &[Candle] {
    &candles[candles.len().saturating_sub(n)..]
}
