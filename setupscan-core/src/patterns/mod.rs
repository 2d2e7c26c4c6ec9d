//! Pattern detectors.
//!
//! Four stateless detectors share one contract: take an ascending candle
//! window, re-slice it to their own tail length, and return zero or one
//! [`Detection`]. The set is closed, so it is an enum rather than a trait
//! object registry; the scanner walks [`PatternKind::ALL`] in order.
//!
//! Within each detector the scan is chronological and stops at the first
//! qualifying candle. That ordering decides which pattern is reported when
//! several qualify and must not be changed.

pub mod imbalance;
pub mod liquidity_sweep;
pub mod order_block;
pub mod structure_break;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Bias, Candle, Detection, Timeframe};

/// Errors a detector can raise on malformed input.
///
/// Short windows are not errors; they yield `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectError {
    #[error("{pattern}: non-finite price in {timeframe} window at position {index}")]
    NonFinite {
        pattern: PatternKind,
        timeframe: Timeframe,
        index: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown strategy '{0}'")]
pub struct ParsePatternError(pub String);

/// The closed set of setups the scanner knows how to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatternKind {
    #[serde(alias = "ICT")]
    LiquiditySweep,
    #[serde(alias = "SMC")]
    OrderBlock,
    #[serde(alias = "FUSION")]
    ImbalanceSnapback,
    #[serde(alias = "BOS")]
    StructureBreak,
}

impl PatternKind {
    /// Scan order used by the market scanner.
    pub const ALL: [PatternKind; 4] = [
        PatternKind::LiquiditySweep,
        PatternKind::OrderBlock,
        PatternKind::ImbalanceSnapback,
        PatternKind::StructureBreak,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::LiquiditySweep => "ICT Liquidity Sweep",
            Self::OrderBlock => "SMC Order Block",
            Self::ImbalanceSnapback => "Fusion LVS Setup",
            Self::StructureBreak => "BOS Detection",
        }
    }

    /// Fixed confidence score attached to every detection of this kind.
    pub fn probability(&self) -> u8 {
        match self {
            Self::LiquiditySweep => liquidity_sweep::PROBABILITY,
            Self::OrderBlock => order_block::PROBABILITY,
            Self::ImbalanceSnapback => imbalance::PROBABILITY,
            Self::StructureBreak => structure_break::PROBABILITY,
        }
    }

    /// Shortest window the detector will look at.
    pub fn min_candles(&self) -> usize {
        match self {
            Self::LiquiditySweep => liquidity_sweep::MIN_CANDLES,
            Self::OrderBlock => order_block::MIN_CANDLES,
            Self::ImbalanceSnapback => imbalance::MIN_CANDLES,
            Self::StructureBreak => structure_break::MIN_CANDLES,
        }
    }

    pub fn confluences(&self) -> &'static [&'static str] {
        match self {
            Self::LiquiditySweep => &["Liquidity Sweep", "BOS Confirmed", "High Volume"],
            Self::OrderBlock => &[
                "Order Block Respected",
                "Institutional Candle",
                "Pullback Entry",
            ],
            Self::ImbalanceSnapback => &[
                "Liquidity Void Gap",
                "Imbalance Zone",
                "Snapback Potential",
                "FVG Entry",
            ],
            Self::StructureBreak => &["Break of Structure", "New High/Low", "Momentum Shift"],
        }
    }

    /// Run this detector over an ascending window.
    pub fn detect(
        &self,
        candles: &[Candle],
        timeframe: Timeframe,
    ) -> Result<Option<Detection>, DetectError> {
        match self {
            Self::LiquiditySweep => liquidity_sweep::detect(candles, timeframe),
            Self::OrderBlock => order_block::detect(candles, timeframe),
            Self::ImbalanceSnapback => imbalance::detect(candles, timeframe),
            Self::StructureBreak => structure_break::detect(candles, timeframe),
        }
    }

    fn short_code(&self) -> &'static str {
        match self {
            Self::LiquiditySweep => "ICT",
            Self::OrderBlock => "SMC",
            Self::ImbalanceSnapback => "FUSION",
            Self::StructureBreak => "BOS",
        }
    }

    fn config_name(&self) -> &'static str {
        match self {
            Self::LiquiditySweep => "LIQUIDITY_SWEEP",
            Self::OrderBlock => "ORDER_BLOCK",
            Self::ImbalanceSnapback => "IMBALANCE_SNAPBACK",
            Self::StructureBreak => "STRUCTURE_BREAK",
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for PatternKind {
    type Err = ParsePatternError;

    /// Accepts the config name (`ORDER_BLOCK`) or the short code (`SMC`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase().replace('-', "_");
        PatternKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.config_name() == wanted || kind.short_code() == wanted)
            .ok_or_else(|| ParsePatternError(s.to_string()))
    }
}

/// Entry, stop and target of a detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Levels {
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

pub(crate) fn ensure_finite(
    pattern: PatternKind,
    timeframe: Timeframe,
    window: &[Candle],
) -> Result<(), DetectError> {
    match window.iter().position(Candle::is_void) {
        Some(index) => Err(DetectError::NonFinite {
            pattern,
            timeframe,
            index,
        }),
        None => Ok(()),
    }
}

pub(crate) fn build_detection(
    pattern: PatternKind,
    bias: Bias,
    levels: Levels,
    timeframe: Timeframe,
    description: String,
) -> Detection {
    Detection {
        strategy: pattern,
        strategy_name: pattern.display_name().to_string(),
        probability: pattern.probability(),
        bias,
        confluences: pattern.confluences().iter().map(|c| c.to_string()).collect(),
        entry: levels.entry,
        stop_loss: levels.stop_loss,
        take_profit: levels.take_profit,
        timeframe,
        description,
        symbol: None,
    }
}
