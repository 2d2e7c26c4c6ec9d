//! SetupScan Core: candle domain types, ATR, pattern detectors, market scanner.
//!
//! This crate contains the detection engine:
//! - Domain types (candles, timeframes, detections, signals, trading sessions)
//! - ATR volatility estimator shared by every detector
//! - Four stateless pattern detectors behind the `PatternKind` enum
//! - Candle store and signal sink seams, with in-memory implementations
//! - Market scanner: multi-timeframe pass with an admission floor

pub mod domain;
pub mod indicators;
pub mod patterns;
pub mod scanner;
pub mod sink;
pub mod store;

pub use domain::{Bias, Candle, Detection, Signal, SignalDirection, Timeframe, TradingSession};
pub use patterns::{DetectError, PatternKind};
pub use scanner::{generate_signal, MarketScanner, ScannerConfig, ADMISSION_FLOOR};
pub use sink::{MemorySignalSink, SignalSink};
pub use store::{CandleStore, MemoryCandleStore, StoreError};
