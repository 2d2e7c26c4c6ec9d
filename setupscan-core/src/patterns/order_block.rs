//! Order block: a high-conviction candle that price later comes back into.
//!
//! A candidate is a candle whose body fills more than 70% of its range. A
//! bullish candidate is confirmed when a later candle's low lands inside
//! [open, high]; a bearish one when a later candle's high lands inside
//! [low, open].

use crate::domain::{tail, Bias, Candle, Detection, Timeframe};
use crate::indicators::{compute_atr, ATR_PERIOD};

use super::{build_detection, ensure_finite, DetectError, Levels, PatternKind};

pub const MIN_CANDLES: usize = 15;
pub const PROBABILITY: u8 = 72;

/// Body-to-range ratio a candle must exceed to count as institutional.
pub const BODY_RATIO: f64 = 0.7;
/// Candidates sit in `[len - EARLIEST_OFFSET, len - LATEST_OFFSET)`.
const EARLIEST_OFFSET: usize = 8;
const LATEST_OFFSET: usize = 3;
const STOP_ATR: f64 = 0.8;
const TARGET_ATR: f64 = 2.5;

fn is_institutional(candle: &Candle) -> bool {
    let range = candle.range();
    range > 0.0 && candle.body() / range > BODY_RATIO
}

/// First confirmed block in chronological order, with its window index.
pub fn find_order_block(window: &[Candle]) -> Option<(usize, Bias)> {
    let n = window.len();
    if n < EARLIEST_OFFSET {
        return None;
    }

    for i in n - EARLIEST_OFFSET..n - LATEST_OFFSET {
        let block = &window[i];
        if !is_institutional(block) {
            continue;
        }
        let later = &window[i + 1..];

        if block.is_bullish()
            && later
                .iter()
                .any(|c| c.low <= block.high && c.low >= block.open)
        {
            return Some((i, Bias::Bullish));
        }

        if block.is_bearish()
            && later
                .iter()
                .any(|c| c.high >= block.low && c.high <= block.open)
        {
            return Some((i, Bias::Bearish));
        }
    }

    None
}

pub fn detect(candles: &[Candle], timeframe: Timeframe) -> Result<Option<Detection>, DetectError> {
    if candles.len() < MIN_CANDLES {
        return Ok(None);
    }
    let window = tail(candles, MIN_CANDLES);
    ensure_finite(PatternKind::OrderBlock, timeframe, window)?;

    let Some((_, bias)) = find_order_block(window) else {
        return Ok(None);
    };

    let atr = compute_atr(window, ATR_PERIOD);
    if atr <= 0.0 {
        return Ok(None);
    }

    let entry = window[window.len() - 1].close;
    let levels = match bias {
        Bias::Bullish => Levels {
            entry,
            stop_loss: entry - atr * STOP_ATR,
            take_profit: entry + atr * TARGET_ATR,
        },
        Bias::Bearish => Levels {
            entry,
            stop_loss: entry + atr * STOP_ATR,
            take_profit: entry - atr * TARGET_ATR,
        },
    };

    Ok(Some(build_detection(
        PatternKind::OrderBlock,
        bias,
        levels,
        timeframe,
        format!("{} order block entry opportunity", bias.label()),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles, DEFAULT_EPSILON};

    fn flat(price: f64, n: usize) -> Vec<(f64, f64, f64, f64)> {
        vec![(price, price, price, price); n]
    }

    #[test]
    fn bullish_block_with_pullback() {
        // 15 candles; candidates are indices 7..12.
        let mut data = flat(100.0, 8);
        data.push((100.0, 110.0, 99.0, 109.0)); // idx 8: body 9 / range 11
        data.push((109.0, 112.0, 105.0, 111.0)); // idx 9: low 105 inside [100, 110]
        data.extend(flat(111.0, 5));
        let candles = make_candles(Timeframe::H1, &data);

        assert_eq!(find_order_block(&candles), Some((8, Bias::Bullish)));

        let d = detect(&candles, Timeframe::H1).unwrap().unwrap();
        let atr = compute_atr(&candles, ATR_PERIOD);
        assert_eq!(d.probability, 72);
        assert_approx(d.entry, 111.0, DEFAULT_EPSILON);
        assert_approx(d.stop_loss, 111.0 - 0.8 * atr, DEFAULT_EPSILON);
        assert_approx(d.take_profit, 111.0 + 2.5 * atr, DEFAULT_EPSILON);
        assert_eq!(d.description, "Bullish order block entry opportunity");
    }

    #[test]
    fn bearish_block_with_pullback() {
        let mut data = flat(100.0, 8);
        data.push((100.0, 101.0, 90.0, 91.0)); // body 9 / range 11
        data.push((91.0, 95.0, 89.0, 90.0)); // high 95 inside [90, 100]
        data.extend(flat(90.0, 5));
        let candles = make_candles(Timeframe::H1, &data);

        let d = detect(&candles, Timeframe::H1).unwrap().unwrap();
        assert_eq!(d.bias, Bias::Bearish);
        assert!(d.stop_loss > d.entry);
        assert!(d.take_profit < d.entry);
    }

    #[test]
    fn weak_body_is_not_a_block() {
        let mut data = flat(100.0, 8);
        data.push((100.0, 110.0, 95.0, 105.0)); // body 5 / range 15
        data.push((105.0, 108.0, 101.0, 107.0));
        data.extend(flat(107.0, 5));
        let candles = make_candles(Timeframe::H1, &data);
        assert_eq!(find_order_block(&candles), None);
    }

    #[test]
    fn block_without_return_is_ignored() {
        let mut data = flat(100.0, 8);
        data.push((100.0, 110.0, 99.0, 109.0));
        data.push((112.0, 120.0, 111.0, 114.0)); // gaps above the block
        data.extend(flat(114.0, 5));
        let candles = make_candles(Timeframe::H1, &data);
        assert_eq!(find_order_block(&candles), None);
    }

    #[test]
    fn candidate_too_recent_is_skipped() {
        // Strong candle at idx 12 is outside [7, 12).
        let mut data = flat(100.0, 12);
        data.push((100.0, 110.0, 99.0, 109.0));
        data.push((109.0, 112.0, 105.0, 111.0));
        data.push((111.0, 111.0, 111.0, 111.0));
        let candles = make_candles(Timeframe::H1, &data);
        assert_eq!(find_order_block(&candles), None);
    }

    #[test]
    fn first_confirmed_candidate_wins() {
        let mut data = flat(100.0, 7);
        data.push((100.0, 101.0, 90.0, 91.0)); // idx 7 bearish block
        data.push((91.0, 95.0, 89.0, 90.0)); // confirms idx 7
        data.push((90.0, 100.0, 89.5, 99.0)); // idx 9 bullish block
        data.push((99.0, 101.0, 95.0, 100.0)); // confirms idx 9
        data.extend(flat(100.0, 4));
        let candles = make_candles(Timeframe::H1, &data);
        assert_eq!(find_order_block(&candles), Some((7, Bias::Bearish)));
    }
}
