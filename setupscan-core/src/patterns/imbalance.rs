//! Imbalance snapback ("Fusion LVS"): price returning into a body gap.
//!
//! A gap opens when a candle opens away from the previous close by more than
//! 0.3 ATR, measured over the candles up to and including the gap. The first
//! such gap defines a void; the setup fires when the latest close sits
//! within 1% of that void.

use crate::domain::{tail, Bias, Candle, Detection, Timeframe};
use crate::indicators::{compute_atr, ATR_PERIOD};

use super::{build_detection, ensure_finite, DetectError, Levels, PatternKind};

pub const MIN_CANDLES: usize = 10;
pub const PROBABILITY: u8 = 94;

/// A gap must be strictly larger than this fraction of ATR.
pub const GAP_ATR_FRACTION: f64 = 0.3;
const LOWER_TOLERANCE: f64 = 0.99;
const UPPER_TOLERANCE: f64 = 1.01;
const STOP_ATR: f64 = 0.3;
const TARGET_ATR: f64 = 1.5;

/// Price void between two consecutive candle bodies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gap {
    /// Window index of the candle that opened the gap.
    pub index: usize,
    pub bottom: f64,
    pub top: f64,
}

impl Gap {
    pub fn midpoint(&self) -> f64 {
        (self.top + self.bottom) / 2.0
    }

    /// Whether `price` is inside the void, widened by 1% on each side.
    pub fn contains_near(&self, price: f64) -> bool {
        price >= self.bottom * LOWER_TOLERANCE && price <= self.top * UPPER_TOLERANCE
    }
}

/// First qualifying gap in chronological order.
///
/// The latest candle is not considered as a gap candle.
pub fn find_gap(window: &[Candle]) -> Option<Gap> {
    let n = window.len();
    for i in 1..n.saturating_sub(1) {
        let prev_close = window[i - 1].close;
        let open = window[i].open;
        if open == prev_close {
            continue;
        }

        let (bottom, top) = if open > prev_close {
            (prev_close, open)
        } else {
            (open, prev_close)
        };

        let atr = compute_atr(&window[..=i], ATR_PERIOD);
        if top - bottom > atr * GAP_ATR_FRACTION {
            return Some(Gap {
                index: i,
                bottom,
                top,
            });
        }
    }
    None
}

pub fn detect(candles: &[Candle], timeframe: Timeframe) -> Result<Option<Detection>, DetectError> {
    if candles.len() < MIN_CANDLES {
        return Ok(None);
    }
    let window = tail(candles, MIN_CANDLES);
    ensure_finite(PatternKind::ImbalanceSnapback, timeframe, window)?;

    let Some(gap) = find_gap(window) else {
        return Ok(None);
    };

    let entry = window[window.len() - 1].close;
    if !gap.contains_near(entry) {
        return Ok(None);
    }

    let atr = compute_atr(window, ATR_PERIOD);
    if atr <= 0.0 {
        return Ok(None);
    }

    let bias = if entry < gap.midpoint() {
        Bias::Bullish
    } else {
        Bias::Bearish
    };
    let levels = match bias {
        Bias::Bullish => Levels {
            entry,
            stop_loss: gap.bottom - atr * STOP_ATR,
            take_profit: gap.top + atr * TARGET_ATR,
        },
        Bias::Bearish => Levels {
            entry,
            stop_loss: gap.top + atr * STOP_ATR,
            take_profit: gap.bottom - atr * TARGET_ATR,
        },
    };

    Ok(Some(build_detection(
        PatternKind::ImbalanceSnapback,
        bias,
        levels,
        timeframe,
        format!("Liquidity void snapback setup with {} bias", bias.lower()),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles, DEFAULT_EPSILON};

    /// Flat at 100, then a candle opening at `gap_open` whose high is 110 so
    /// the gap-pair ATR is exactly 10, then a drift back to 101.
    fn gap_window(gap_open: f64) -> Vec<Candle> {
        let mut data = vec![(100.0, 100.0, 100.0, 100.0)];
        data.push((gap_open, 110.0, gap_open, 105.0));
        data.push((105.0, 105.0, 101.0, 101.0));
        data.extend(vec![(101.0, 101.0, 101.0, 101.0); 7]);
        make_candles(Timeframe::M30, &data)
    }

    #[test]
    fn gap_at_threshold_does_not_trigger() {
        // gap = 3.0, ATR = 10.0, 0.3 * ATR = 3.0 → not strictly greater
        let candles = gap_window(103.0);
        assert_eq!(find_gap(&candles), None);
        assert_eq!(detect(&candles, Timeframe::M30).unwrap(), None);
    }

    #[test]
    fn gap_above_threshold_triggers() {
        // gap = 3.1 = 0.31 * ATR
        let candles = gap_window(103.1);
        let gap = find_gap(&candles).unwrap();
        assert_eq!(gap.index, 1);
        assert_approx(gap.bottom, 100.0, DEFAULT_EPSILON);
        assert_approx(gap.top, 103.1, DEFAULT_EPSILON);

        let d = detect(&candles, Timeframe::M30).unwrap().unwrap();
        let atr = compute_atr(&candles, ATR_PERIOD);
        assert_eq!(d.probability, 94);
        // 101 is below the midpoint 101.55
        assert_eq!(d.bias, Bias::Bullish);
        assert_approx(d.stop_loss, 100.0 - 0.3 * atr, DEFAULT_EPSILON);
        assert_approx(d.take_profit, 103.1 + 1.5 * atr, DEFAULT_EPSILON);
        assert_eq!(d.description, "Liquidity void snapback setup with bullish bias");
    }

    #[test]
    fn price_away_from_void_does_not_trigger() {
        let mut data = vec![(100.0, 100.0, 100.0, 100.0)];
        data.push((103.1, 110.0, 103.1, 109.0));
        data.push((109.0, 120.0, 109.0, 119.0));
        data.extend(vec![(119.0, 119.0, 119.0, 119.0); 7]);
        let candles = make_candles(Timeframe::M30, &data);
        assert!(find_gap(&candles).is_some());
        assert_eq!(detect(&candles, Timeframe::M30).unwrap(), None);
    }

    #[test]
    fn bearish_gap_upper_half_is_bearish() {
        // Gap down from 100 to 96; price returns to 99 (above midpoint 98).
        let mut data = vec![(100.0, 100.0, 100.0, 100.0)];
        data.push((96.0, 96.0, 92.0, 94.0));
        data.push((94.0, 99.0, 94.0, 99.0));
        data.extend(vec![(99.0, 99.0, 99.0, 99.0); 7]);
        let candles = make_candles(Timeframe::M30, &data);

        let gap = find_gap(&candles).unwrap();
        assert_approx(gap.bottom, 96.0, DEFAULT_EPSILON);
        assert_approx(gap.top, 100.0, DEFAULT_EPSILON);

        let d = detect(&candles, Timeframe::M30).unwrap().unwrap();
        let atr = compute_atr(&candles, ATR_PERIOD);
        assert_eq!(d.bias, Bias::Bearish);
        assert_approx(d.stop_loss, 100.0 + 0.3 * atr, DEFAULT_EPSILON);
        assert_approx(d.take_profit, 96.0 - 1.5 * atr, DEFAULT_EPSILON);
    }

    #[test]
    fn gap_on_latest_candle_is_ignored() {
        let mut data = vec![(100.0, 100.0, 100.0, 100.0); 9];
        data.push((105.0, 106.0, 105.0, 105.5));
        let candles = make_candles(Timeframe::M30, &data);
        assert_eq!(find_gap(&candles), None);
    }
}
