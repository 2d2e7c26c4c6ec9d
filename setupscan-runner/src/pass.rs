//! One scan pass: a sweep of every configured symbol.
//!
//! Symbols are scanned in parallel. For each symbol the scanner returns its
//! admitted detections; those at or above the signal floor become signals,
//! go to the sink and are broadcast. A failure in one symbol never stops
//! the others.

use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use setupscan_core::domain::{current_session, session_status, Signal, Timeframe, TradingSession};
use setupscan_core::scanner::{generate_signal, MarketScanner};
use setupscan_core::sink::SignalSink;
use setupscan_core::store::CandleStore;

use crate::config::SIGNAL_FLOOR;
use crate::events::{Broadcaster, ScanEvent};

/// Outcome for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolReport {
    pub symbol: String,
    /// Detections that cleared the admission floor.
    pub detections: usize,
    /// Signals emitted (detections that also cleared the signal floor).
    pub signals: Vec<Signal>,
}

/// Outcome of one pass, symbols in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub scanned_at: DateTime<Utc>,
    pub session: TradingSession,
    pub symbols: Vec<SymbolReport>,
}

impl ScanReport {
    pub fn total_detections(&self) -> usize {
        self.symbols.iter().map(|s| s.detections).sum()
    }

    pub fn total_signals(&self) -> usize {
        self.symbols.iter().map(|s| s.signals.len()).sum()
    }

    pub fn signals(&self) -> impl Iterator<Item = &Signal> {
        self.symbols.iter().flat_map(|s| s.signals.iter())
    }
}

pub struct ScanPass<S, K, B> {
    scanner: MarketScanner<S>,
    sink: K,
    broadcaster: B,
    timeframes: Vec<Timeframe>,
    signal_floor: u8,
}

impl<S, K, B> ScanPass<S, K, B>
where
    S: CandleStore,
    K: SignalSink,
    B: Broadcaster,
{
    pub fn new(scanner: MarketScanner<S>, sink: K, broadcaster: B) -> Self {
        Self {
            scanner,
            sink,
            broadcaster,
            timeframes: Timeframe::DEFAULT_SCAN.to_vec(),
            signal_floor: SIGNAL_FLOOR,
        }
    }

    pub fn with_timeframes(mut self, timeframes: Vec<Timeframe>) -> Self {
        self.timeframes = timeframes;
        self
    }

    pub fn with_signal_floor(mut self, floor: u8) -> Self {
        self.signal_floor = floor;
        self
    }

    pub fn scanner(&self) -> &MarketScanner<S> {
        &self.scanner
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Scan every symbol once, stamping signals with `now`.
    pub fn run(&self, symbols: &[String], now: DateTime<Utc>) -> ScanReport {
        let session = current_session(now);

        let reports: Vec<SymbolReport> = symbols
            .par_iter()
            .map(|symbol| self.scan_symbol(symbol, session, now))
            .collect();

        let report = ScanReport {
            scanned_at: now,
            session,
            symbols: reports,
        };
        info!(
            symbols = symbols.len(),
            detections = report.total_detections(),
            signals = report.total_signals(),
            %session,
            "scan pass complete"
        );
        report
    }

    fn scan_symbol(&self, symbol: &str, session: TradingSession, now: DateTime<Utc>) -> SymbolReport {
        let detections = self.scanner.analyze_market(symbol, &self.timeframes);
        let mut signals = Vec::new();

        for detection in &detections {
            if detection.probability < self.signal_floor {
                debug!(
                    %symbol,
                    strategy = %detection.strategy,
                    probability = detection.probability,
                    "below signal floor"
                );
                continue;
            }
            let signal = generate_signal(detection, symbol, session, now);
            self.sink.accept(signal.clone());
            self.broadcaster
                .publish(&ScanEvent::StrategyDetection(detection.clone()));
            signals.push(signal);
        }

        SymbolReport {
            symbol: symbol.to_string(),
            detections: detections.len(),
            signals,
        }
    }

    /// Repeat [`run`](Self::run) every `interval`.
    ///
    /// Publishes a session status event before each pass and hands every
    /// report to `on_report`. Runs forever when `iterations` is `None`.
    pub fn watch<F>(
        &self,
        symbols: &[String],
        interval: Duration,
        iterations: Option<usize>,
        mut on_report: F,
    ) where
        F: FnMut(&ScanReport),
    {
        let mut done = 0usize;
        loop {
            let now = Utc::now();
            self.broadcaster
                .publish(&ScanEvent::SessionStatus(session_status(now)));
            let report = self.run(symbols, now);
            on_report(&report);

            done += 1;
            if iterations.is_some_and(|n| done >= n) {
                break;
            }
            thread::sleep(interval);
        }
    }
}
