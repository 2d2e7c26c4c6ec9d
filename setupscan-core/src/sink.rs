//! Signal sink trait and an in-memory implementation.

use std::sync::{Arc, Mutex};

use crate::domain::Signal;

/// Destination for admitted signals. Fire-and-forget: the scanner does not
/// look at what the sink does with a signal.
pub trait SignalSink: Send + Sync {
    fn accept(&self, signal: Signal);
}

impl<T: SignalSink + ?Sized> SignalSink for Arc<T> {
    fn accept(&self, signal: Signal) {
        (**self).accept(signal)
    }
}

impl<T: SignalSink + ?Sized> SignalSink for &T {
    fn accept(&self, signal: Signal) {
        (**self).accept(signal)
    }
}

/// Keeps every accepted signal in memory.
#[derive(Debug, Default)]
pub struct MemorySignalSink {
    signals: Mutex<Vec<Signal>>,
}

impl MemorySignalSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Up to `limit` signals, newest `created_at` first.
    pub fn recent(&self, limit: usize) -> Vec<Signal> {
        let mut signals = self.all();
        signals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        signals.truncate(limit);
        signals
    }

    /// Every signal in acceptance order.
    pub fn all(&self) -> Vec<Signal> {
        self.signals
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.signals
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SignalSink for MemorySignalSink {
    fn accept(&self, signal: Signal) {
        self.signals
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(signal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bias, Detection, Timeframe, TradingSession};
    use crate::patterns::PatternKind;
    use chrono::{TimeZone, Utc};

    fn signal_at(minute: u32) -> Signal {
        let detection = Detection {
            strategy: PatternKind::OrderBlock,
            strategy_name: PatternKind::OrderBlock.display_name().into(),
            probability: 72,
            bias: Bias::Bullish,
            confluences: vec![],
            entry: 10.0,
            stop_loss: 9.0,
            take_profit: 12.0,
            timeframe: Timeframe::M1,
            description: String::new(),
            symbol: None,
        };
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, minute, 0).unwrap();
        Signal::from_detection(&detection, "EURUSD", TradingSession::London, at)
    }

    #[test]
    fn recent_is_newest_first() {
        let sink = MemorySignalSink::new();
        sink.accept(signal_at(1));
        sink.accept(signal_at(5));
        sink.accept(signal_at(3));

        let recent = sink.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].created_at, signal_at(5).created_at);
        assert_eq!(recent[1].created_at, signal_at(3).created_at);
        assert_eq!(sink.len(), 3);
    }

    #[test]
    fn shared_sink_through_arc() {
        let sink = Arc::new(MemorySignalSink::new());
        let handle: Arc<dyn SignalSink> = sink.clone();
        handle.accept(signal_at(0));
        assert!(!sink.is_empty());
    }
}
