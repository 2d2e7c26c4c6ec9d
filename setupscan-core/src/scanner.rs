//! Market scanner. Runs every detector over every timeframe for a symbol.
//!
//! Each pass fetches a fresh window per timeframe, sorts it oldest-first and
//! hands it to each enabled detector. The scanner keeps no state between
//! passes, so two passes over unchanged store contents return identical
//! detections.
//!
//! Failures are isolated: a store error skips one timeframe, a detector
//! error skips one detector. Neither aborts the pass.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{sort_chronological, Candle, Detection, Signal, Timeframe, TradingSession};
use crate::patterns::PatternKind;
use crate::store::CandleStore;

/// Detections below this probability are dropped by `analyze_market`.
pub const ADMISSION_FLOOR: u8 = 65;
/// Candles fetched per timeframe.
pub const DEFAULT_CANDLE_LIMIT: usize = 50;
/// Timeframes with fewer candles than this are skipped.
pub const MIN_SCAN_CANDLES: usize = 10;

/// Scanner tuning. Every field has a default, so a partial TOML table works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub candle_limit: usize,
    pub min_candles: usize,
    pub admission_floor: u8,
    /// Enabled detectors, run in this order.
    pub strategies: Vec<PatternKind>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            candle_limit: DEFAULT_CANDLE_LIMIT,
            min_candles: MIN_SCAN_CANDLES,
            admission_floor: ADMISSION_FLOOR,
            strategies: PatternKind::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MarketScanner<S> {
    store: S,
    config: ScannerConfig,
}

impl<S: CandleStore> MarketScanner<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, ScannerConfig::default())
    }

    pub fn with_config(store: S, config: ScannerConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Scan `symbol` across `timeframes` and return admitted detections.
    ///
    /// Output order is timeframe order, then detector order. Detections
    /// are independent: several strategies may fire on one timeframe.
    pub fn analyze_market(&self, symbol: &str, timeframes: &[Timeframe]) -> Vec<Detection> {
        let mut detections = Vec::new();

        for &timeframe in timeframes {
            let mut candles =
                match self
                    .store
                    .recent_candles(symbol, timeframe, self.config.candle_limit)
                {
                    Ok(candles) => candles,
                    Err(e) => {
                        warn!(%symbol, %timeframe, error = %e, "candle fetch failed, skipping timeframe");
                        continue;
                    }
                };

            sort_chronological(&mut candles);
            if candles.len() < self.config.min_candles {
                debug!(
                    %symbol,
                    %timeframe,
                    candles = candles.len(),
                    "not enough candles, skipping timeframe"
                );
                continue;
            }

            detections.extend(self.analyze_window(symbol, timeframe, &candles));
        }

        detections.retain(|d| d.probability >= self.config.admission_floor);
        detections
    }

    /// Run the enabled detectors over one ascending window. No floor applied.
    pub fn analyze_window(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        candles: &[Candle],
    ) -> Vec<Detection> {
        let mut found = Vec::new();

        for kind in &self.config.strategies {
            match kind.detect(candles, timeframe) {
                Ok(Some(mut detection)) => {
                    debug!(
                        %symbol,
                        %timeframe,
                        strategy = %kind,
                        probability = detection.probability,
                        "setup detected"
                    );
                    detection.symbol = Some(symbol.to_string());
                    found.push(detection);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(%symbol, %timeframe, strategy = %kind, error = %e, "detector failed");
                }
            }
        }

        found
    }

    /// Convenience wrapper around [`generate_signal`].
    pub fn generate_signal(
        &self,
        detection: &Detection,
        symbol: &str,
        session: TradingSession,
        created_at: DateTime<Utc>,
    ) -> Signal {
        generate_signal(detection, symbol, session, created_at)
    }
}

/// Turn a detection into a storable signal. `sent_to_telegram` starts false.
pub fn generate_signal(
    detection: &Detection,
    symbol: &str,
    session: TradingSession,
    created_at: DateTime<Utc>,
) -> Signal {
    Signal::from_detection(detection, symbol, session, created_at)
}
