//! Candle timeframes.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bar width of a candle series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Timeframe {
    M1,
    M5,
    M15,
    M30,
    H1,
    H4,
    D1,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown timeframe '{0}' (expected one of M1, M5, M15, M30, H1, H4, D1)")]
pub struct ParseTimeframeError(pub String);

impl Timeframe {
    /// Timeframes the market scanner walks when none are given.
    pub const DEFAULT_SCAN: [Timeframe; 5] = [
        Timeframe::M1,
        Timeframe::M5,
        Timeframe::M15,
        Timeframe::M30,
        Timeframe::H1,
    ];

    pub const ALL: [Timeframe; 7] = [
        Timeframe::M1,
        Timeframe::M5,
        Timeframe::M15,
        Timeframe::M30,
        Timeframe::H1,
        Timeframe::H4,
        Timeframe::D1,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::M1 => "M1",
            Self::M5 => "M5",
            Self::M15 => "M15",
            Self::M30 => "M30",
            Self::H1 => "H1",
            Self::H4 => "H4",
            Self::D1 => "D1",
        }
    }

    /// Wall-clock width of one candle.
    pub fn duration(&self) -> Duration {
        match self {
            Self::M1 => Duration::minutes(1),
            Self::M5 => Duration::minutes(5),
            Self::M15 => Duration::minutes(15),
            Self::M30 => Duration::minutes(30),
            Self::H1 => Duration::hours(1),
            Self::H4 => Duration::hours(4),
            Self::D1 => Duration::days(1),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = ParseTimeframeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Timeframe::ALL
            .iter()
            .copied()
            .find(|tf| tf.as_str() == upper)
            .ok_or_else(|| ParseTimeframeError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_roundtrip() {
        for tf in Timeframe::ALL {
            assert_eq!(tf.as_str().parse::<Timeframe>().unwrap(), tf);
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("m15".parse::<Timeframe>().unwrap(), Timeframe::M15);
    }

    #[test]
    fn parse_rejects_unknown() {
        assert!("W1".parse::<Timeframe>().is_err());
    }

    #[test]
    fn serde_uses_uppercase_names() {
        let json = serde_json::to_string(&Timeframe::H1).unwrap();
        assert_eq!(json, "\"H1\"");
    }

    #[test]
    fn durations_increase() {
        let widths: Vec<_> = Timeframe::ALL.iter().map(|tf| tf.duration()).collect();
        assert!(widths.windows(2).all(|w| w[0] < w[1]));
    }
}
