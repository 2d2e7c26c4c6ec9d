//! Break of structure (BOS): the latest candle clears the recent swing range.
//!
//! The swing range is the high/low over the window minus its last two
//! candles. A new high is checked before a new low, so a candle that breaks
//! both ways is reported as bullish.

use crate::domain::{tail, Bias, Candle, Detection, Timeframe};
use crate::indicators::{compute_atr, ATR_PERIOD};

use super::{build_detection, ensure_finite, DetectError, Levels, PatternKind};

pub const MIN_CANDLES: usize = 10;
pub const PROBABILITY: u8 = 78;

/// Candles at the end of the window excluded from the swing range.
const EXCLUDED_TAIL: usize = 2;
const STOP_ATR: f64 = 0.5;
const TARGET_ATR: f64 = 2.0;

/// Swing high and low of the window, excluding its last two candles.
pub fn swing_range(window: &[Candle]) -> Option<(f64, f64)> {
    let reference = &window[..window.len().checked_sub(EXCLUDED_TAIL)?];
    if reference.is_empty() {
        return None;
    }
    let high = reference.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
    let low = reference.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
    Some((high, low))
}

pub fn detect(candles: &[Candle], timeframe: Timeframe) -> Result<Option<Detection>, DetectError> {
    if candles.len() < MIN_CANDLES {
        return Ok(None);
    }
    let window = tail(candles, MIN_CANDLES);
    ensure_finite(PatternKind::StructureBreak, timeframe, window)?;

    let Some((recent_high, recent_low)) = swing_range(window) else {
        return Ok(None);
    };
    let latest = &window[window.len() - 1];

    let bias = if latest.high > recent_high {
        Bias::Bullish
    } else if latest.low < recent_low {
        Bias::Bearish
    } else {
        return Ok(None);
    };

    let atr = compute_atr(window, ATR_PERIOD);
    if atr <= 0.0 {
        return Ok(None);
    }

    let entry = latest.close;
    let levels = match bias {
        Bias::Bullish => Levels {
            entry,
            stop_loss: recent_high - atr * STOP_ATR,
            take_profit: entry + atr * TARGET_ATR,
        },
        Bias::Bearish => Levels {
            entry,
            stop_loss: recent_low + atr * STOP_ATR,
            take_profit: entry - atr * TARGET_ATR,
        },
    };

    Ok(Some(build_detection(
        PatternKind::StructureBreak,
        bias,
        levels,
        timeframe,
        format!("{} break of structure confirmed", bias.label()),
    )))
}
