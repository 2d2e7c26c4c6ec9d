//! Candle store trait and an in-memory implementation.
//!
//! The scanner never owns candle data; it asks a [`CandleStore`] for the most
//! recent window on every pass. Stores are free to return candles in any
//! order; the scanner sorts before use.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::{Candle, CandleError, Timeframe};

/// Candles kept per (symbol, timeframe) by [`MemoryCandleStore`].
pub const DEFAULT_SERIES_CAPACITY: usize = 1000;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("rejected candle: {0}")]
    InvalidCandle(#[from] CandleError),

    #[error("duplicate {symbol} {timeframe} candle at {timestamp}")]
    DuplicateCandle {
        symbol: String,
        timeframe: Timeframe,
        timestamp: DateTime<Utc>,
    },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("candle store lock poisoned")]
    Poisoned,
}

/// Source of recent candles for one (symbol, timeframe).
pub trait CandleStore: Send + Sync {
    /// Up to `limit` of the most recent candles. Order is unspecified.
    fn recent_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, StoreError>;
}

impl<T: CandleStore + ?Sized> CandleStore for Arc<T> {
    fn recent_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, StoreError> {
        (**self).recent_candles(symbol, timeframe, limit)
    }
}

impl<T: CandleStore + ?Sized> CandleStore for &T {
    fn recent_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, StoreError> {
        (**self).recent_candles(symbol, timeframe, limit)
    }
}

type SeriesKey = (String, Timeframe);

/// Thread-safe in-memory candle store.
///
/// Candles are validated on the way in, so detectors only ever see
/// consistent OHLC data. A series holds at most one candle per timestamp;
/// the first one inserted wins. Each series is capped at `capacity`, dropping the
/// oldest candles first.
#[derive(Debug)]
pub struct MemoryCandleStore {
    series: RwLock<HashMap<SeriesKey, Vec<Candle>>>,
    capacity: usize,
}

impl Default for MemoryCandleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCandleStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SERIES_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            series: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Validate and append one candle.
    ///
    /// A candle whose timestamp is already present in its series is rejected
    /// and the stored one is left untouched.
    pub fn insert(&self, candle: Candle) -> Result<(), StoreError> {
        candle.validate()?;
        let mut series = self.series.write().map_err(|_| StoreError::Poisoned)?;
        let entry = series
            .entry((candle.symbol.clone(), candle.timeframe))
            .or_default();
        if entry.iter().any(|c| c.timestamp == candle.timestamp) {
            return Err(StoreError::DuplicateCandle {
                symbol: candle.symbol,
                timeframe: candle.timeframe,
                timestamp: candle.timestamp,
            });
        }
        entry.push(candle);
        if entry.len() > self.capacity {
            entry.sort_by_key(|c| c.timestamp);
            let excess = entry.len() - self.capacity;
            entry.drain(..excess);
        }
        Ok(())
    }

    /// Insert every candle, stopping at the first invalid one.
    ///
    /// Returns the number inserted.
    pub fn extend<I>(&self, candles: I) -> Result<usize, StoreError>
    where
        I: IntoIterator<Item = Candle>,
    {
        let mut count = 0;
        for candle in candles {
            self.insert(candle)?;
            count += 1;
        }
        Ok(count)
    }

    /// Number of candles held for one series.
    pub fn series_len(&self, symbol: &str, timeframe: Timeframe) -> usize {
        self.series
            .read()
            .map(|s| {
                s.get(&(symbol.to_string(), timeframe))
                    .map_or(0, Vec::len)
            })
            .unwrap_or(0)
    }

    /// Distinct symbols with at least one candle, sorted.
    pub fn symbols(&self) -> Vec<String> {
        let Ok(series) = self.series.read() else {
            return Vec::new();
        };
        let mut symbols: Vec<String> = series.keys().map(|(s, _)| s.clone()).collect();
        symbols.sort();
        symbols.dedup();
        symbols
    }
}

impl CandleStore for MemoryCandleStore {
    /// Newest candle first.
    fn recent_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, StoreError> {
        let series = self.series.read().map_err(|_| StoreError::Poisoned)?;
        let Some(candles) = series.get(&(symbol.to_string(), timeframe)) else {
            return Ok(Vec::new());
        };
        let mut recent = candles.clone();
        recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        recent.truncate(limit);
        Ok(recent)
    }
}
