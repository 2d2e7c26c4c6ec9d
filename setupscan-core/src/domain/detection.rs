//! Detector output for one window.

use serde::{Deserialize, Serialize};

use super::{SignalDirection, Timeframe};
use crate::patterns::PatternKind;

/// Which way a detected setup leans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bias {
    Bullish,
    Bearish,
}

impl Bias {
    /// Title-case label used in descriptions.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Bullish => "Bullish",
            Self::Bearish => "Bearish",
        }
    }

    /// Lower-case label used in descriptions.
    pub fn lower(&self) -> &'static str {
        match self {
            Self::Bullish => "bullish",
            Self::Bearish => "bearish",
        }
    }
}

/// A setup found by a single detector call.
///
/// Created once, consumed by the scanner, never mutated. `symbol` is `None`
/// straight out of a detector and filled in by the scanner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub strategy: PatternKind,
    pub strategy_name: String,
    /// Fixed per strategy, 0..=100.
    pub probability: u8,
    pub bias: Bias,
    pub confluences: Vec<String>,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub timeframe: Timeframe,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

impl Detection {
    /// BUY iff the target sits above the entry.
    pub fn direction(&self) -> SignalDirection {
        if self.take_profit > self.entry {
            SignalDirection::Buy
        } else {
            SignalDirection::Sell
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(entry: f64, stop_loss: f64, take_profit: f64) -> Detection {
        Detection {
            strategy: PatternKind::StructureBreak,
            strategy_name: PatternKind::StructureBreak.display_name().into(),
            probability: 78,
            bias: Bias::Bullish,
            confluences: vec!["Break of Structure".into()],
            entry,
            stop_loss,
            take_profit,
            timeframe: Timeframe::M15,
            description: "test".into(),
            symbol: None,
        }
    }

    #[test]
    fn direction_follows_target() {
        assert_eq!(detection(100.0, 99.0, 102.0).direction(), SignalDirection::Buy);
        assert_eq!(detection(100.0, 101.0, 98.0).direction(), SignalDirection::Sell);
    }

    #[test]
    fn flat_target_is_sell() {
        assert_eq!(detection(100.0, 99.0, 100.0).direction(), SignalDirection::Sell);
    }

    #[test]
    fn symbol_omitted_when_unset() {
        let json = serde_json::to_string(&detection(1.0, 0.5, 2.0)).unwrap();
        assert!(!json.contains("symbol"));
    }
}
