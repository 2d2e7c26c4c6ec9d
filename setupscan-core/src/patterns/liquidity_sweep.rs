//! Liquidity sweep: a wick through the window extreme that reverses at once.
//!
//! A high sweep takes out every earlier high in the window and the next
//! candle closes below the sweeping candle's low (bearish). A low sweep is
//! the mirror image (bullish). Only the last few candles are candidates.

use crate::domain::{tail, Bias, Candle, Detection, Timeframe};
use crate::indicators::{compute_atr, ATR_PERIOD};

use super::{build_detection, ensure_finite, DetectError, Levels, PatternKind};

pub const MIN_CANDLES: usize = 20;
pub const PROBABILITY: u8 = 87;

/// How far back from the end a sweeping candle may sit.
const SCAN_DEPTH: usize = 5;
const STOP_ATR: f64 = 0.5;
const TARGET_ATR: f64 = 2.0;

/// Which extreme was swept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepSide {
    High,
    Low,
}

impl SweepSide {
    pub fn bias(&self) -> Bias {
        match self {
            Self::High => Bias::Bearish,
            Self::Low => Bias::Bullish,
        }
    }
}

/// Earliest sweep among the candidate candles, with its window index.
///
/// The last candle is never a candidate since it has no follow-through
/// candle. At a given index the high sweep is tested before the low sweep.
pub fn find_sweep(window: &[Candle]) -> Option<(usize, SweepSide)> {
    let n = window.len();
    if n < 2 {
        return None;
    }

    for i in n.saturating_sub(SCAN_DEPTH)..n - 1 {
        let current = &window[i];
        let next = &window[i + 1];
        let prior = &window[..i];

        let max_high = prior.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
        if current.high > max_high && next.close < current.low {
            return Some((i, SweepSide::High));
        }

        let min_low = prior.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
        if current.low < min_low && next.close > current.high {
            return Some((i, SweepSide::Low));
        }
    }

    None
}

pub fn detect(candles: &[Candle], timeframe: Timeframe) -> Result<Option<Detection>, DetectError> {
    if candles.len() < MIN_CANDLES {
        return Ok(None);
    }
    let window = tail(candles, MIN_CANDLES);
    ensure_finite(PatternKind::LiquiditySweep, timeframe, window)?;

    let Some((_, side)) = find_sweep(window) else {
        return Ok(None);
    };

    let atr = compute_atr(window, ATR_PERIOD);
    if atr <= 0.0 {
        return Ok(None);
    }

    let entry = window[window.len() - 1].close;
    let levels = match side {
        SweepSide::High => Levels {
            entry,
            stop_loss: entry + atr * STOP_ATR,
            take_profit: entry - atr * TARGET_ATR,
        },
        SweepSide::Low => Levels {
            entry,
            stop_loss: entry - atr * STOP_ATR,
            take_profit: entry + atr * TARGET_ATR,
        },
    };

    let bias = side.bias();
    Ok(Some(build_detection(
        PatternKind::LiquiditySweep,
        bias,
        levels,
        timeframe,
        format!("{} liquidity sweep detected with BOS confirmation", bias.label()),
    )))
}
