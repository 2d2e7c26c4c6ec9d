//! SetupScan Runner: configuration, candle loading, scan passes, signal history.
//!
//! This crate builds on `setupscan-core` to provide:
//! - TOML scan configuration with defaults
//! - Candle loading from CSV, with a synthetic random-walk fallback
//! - Parallel multi-symbol scan passes and a watch loop
//! - JSONL signal history
//! - Scan events and the broadcaster seam

pub mod config;
pub mod data_loader;
pub mod events;
pub mod history;
pub mod pass;

pub use config::{ConfigError, ScanConfig, DEFAULT_INTERVAL_SECS, SIGNAL_FLOOR};
pub use data_loader::{generate_synthetic_candles, load_csv, read_candles, seed_synthetic, LoadError};
pub use events::{Broadcaster, JsonLineBroadcaster, MemoryBroadcaster, NullBroadcaster, ScanEvent};
pub use history::{HistoryError, SignalHistory};
pub use pass::{ScanPass, ScanReport, SymbolReport};
