//! Signals: admitted detection packaged for storage and delivery.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Detection, Timeframe, TradingSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalDirection {
    Buy,
    Sell,
}

impl fmt::Display for SignalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => f.write_str("BUY"),
            Self::Sell => f.write_str("SELL"),
        }
    }
}

/// A trade signal. Immutable after creation; owned by the signal sink.
///
/// Price fields are shortest round-trip decimal strings, so parsing one back
/// yields the exact `f64` the detector produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    pub id: String,
    pub symbol: String,
    pub direction: SignalDirection,
    pub entry_price: String,
    pub stop_loss: String,
    pub take_profit: String,
    pub probability: u8,
    pub strategies: Vec<String>,
    pub confluences: Vec<String>,
    pub timeframe: Timeframe,
    pub session: TradingSession,
    pub sent_to_telegram: bool,
    pub created_at: DateTime<Utc>,
}

/// Render a price as the shortest decimal that parses back to the same value.
///
/// Never rounds: sub-cent instruments keep every significant digit.
pub fn format_price(price: f64) -> String {
    price.to_string()
}

impl Signal {
    /// Build a signal from a detection. Pure: the clock is passed in.
    pub fn from_detection(
        detection: &Detection,
        symbol: &str,
        session: TradingSession,
        created_at: DateTime<Utc>,
    ) -> Self {
        let entry_price = format_price(detection.entry);
        let stop_loss = format_price(detection.stop_loss);
        let take_profit = format_price(detection.take_profit);

        let id = signal_id(
            symbol,
            detection,
            &entry_price,
            &stop_loss,
            &take_profit,
            created_at,
        );

        Self {
            id,
            symbol: symbol.to_string(),
            direction: detection.direction(),
            entry_price,
            stop_loss,
            take_profit,
            probability: detection.probability,
            strategies: vec![detection.strategy_name.clone()],
            confluences: detection.confluences.clone(),
            timeframe: detection.timeframe,
            session,
            sent_to_telegram: false,
            created_at,
        }
    }
}

/// BLAKE3 over the fields that identify a signal.
fn signal_id(
    symbol: &str,
    detection: &Detection,
    entry: &str,
    stop: &str,
    target: &str,
    created_at: DateTime<Utc>,
) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(symbol.as_bytes());
    hasher.update(detection.timeframe.as_str().as_bytes());
    hasher.update(detection.strategy_name.as_bytes());
    hasher.update(entry.as_bytes());
    hasher.update(stop.as_bytes());
    hasher.update(target.as_bytes());
    hasher.update(created_at.to_rfc3339().as_bytes());
    hasher.finalize().to_hex().to_string()
}
