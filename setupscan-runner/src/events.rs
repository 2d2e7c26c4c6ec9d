//! Scan events and the broadcaster seam.
//!
//! Events serialise as `{"type": "...", "data": {...}}`, the shape live
//! dashboards subscribe to.

use std::io::Write;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::warn;

use setupscan_core::domain::{Detection, SessionStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ScanEvent {
    /// A detection that cleared the signal floor.
    StrategyDetection(Detection),
    /// Session clock snapshot, published once per watch iteration.
    SessionStatus(SessionStatus),
}

/// Fan-out of scan events to whoever is listening. Fire-and-forget.
pub trait Broadcaster: Send + Sync {
    fn publish(&self, event: &ScanEvent);
}

impl<T: Broadcaster + ?Sized> Broadcaster for &T {
    fn publish(&self, event: &ScanEvent) {
        (**self).publish(event)
    }
}

impl<T: Broadcaster + ?Sized> Broadcaster for std::sync::Arc<T> {
    fn publish(&self, event: &ScanEvent) {
        (**self).publish(event)
    }
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBroadcaster;

impl Broadcaster for NullBroadcaster {
    fn publish(&self, _event: &ScanEvent) {}
}

/// Records events in publish order.
#[derive(Debug, Default)]
pub struct MemoryBroadcaster {
    events: Mutex<Vec<ScanEvent>>,
}

impl MemoryBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ScanEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Broadcaster for MemoryBroadcaster {
    fn publish(&self, event: &ScanEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event.clone());
    }
}

/// Writes each event as one JSON line.
#[derive(Debug)]
pub struct JsonLineBroadcaster<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonLineBroadcaster<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> Broadcaster for JsonLineBroadcaster<W> {
    fn publish(&self, event: &ScanEvent) {
        let json = match serde_json::to_string(event) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "failed to encode scan event");
                return;
            }
        };
        let mut out = self
            .out
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = writeln!(out, "{json}").and_then(|_| out.flush()) {
            warn!(error = %e, "failed to write scan event");
        }
    }
}
