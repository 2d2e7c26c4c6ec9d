//! Trading-session clock.
//!
//! Sessions are derived from the UTC hour alone:
//! - London: 08:00–17:00
//! - New York: 13:00–22:00 (London wins during the 13:00–17:00 overlap)
//! - Asia: everything else
//!
//! All functions take `now` explicitly so callers (and tests) control the clock.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradingSession {
    #[serde(rename = "LONDON")]
    London,
    #[serde(rename = "NY")]
    NewYork,
    #[serde(rename = "ASIA")]
    Asia,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown session '{0}' (expected LONDON, NY or ASIA)")]
pub struct ParseSessionError(pub String);

impl TradingSession {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::London => "LONDON",
            Self::NewYork => "NY",
            Self::Asia => "ASIA",
        }
    }
}

impl fmt::Display for TradingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradingSession {
    type Err = ParseSessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LONDON" => Ok(Self::London),
            "NY" | "NEW_YORK" => Ok(Self::NewYork),
            "ASIA" => Ok(Self::Asia),
            _ => Err(ParseSessionError(s.to_string())),
        }
    }
}

/// Display state of a single session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionState {
    Active,
    Opening,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFlag {
    pub active: bool,
    pub status: SessionState,
}

/// Snapshot of all three sessions at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub current: TradingSession,
    pub london: SessionFlag,
    pub ny: SessionFlag,
    pub asia: SessionFlag,
}

/// The next session to open and how long until it does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionChange {
    pub session: TradingSession,
    pub time_until: Duration,
}

fn london_open(hour: u32) -> bool {
    (8..17).contains(&hour)
}

fn ny_open(hour: u32) -> bool {
    (13..22).contains(&hour)
}

fn asia_open(hour: u32) -> bool {
    hour >= 23 || hour < 8
}

/// Session in force at `now`.
pub fn current_session(now: DateTime<Utc>) -> TradingSession {
    let hour = now.hour();
    if london_open(hour) {
        TradingSession::London
    } else if ny_open(hour) {
        TradingSession::NewYork
    } else {
        TradingSession::Asia
    }
}

pub fn session_status(now: DateTime<Utc>) -> SessionStatus {
    let hour = now.hour();

    let london = SessionFlag {
        active: london_open(hour),
        status: if london_open(hour) {
            SessionState::Active
        } else {
            SessionState::Closed
        },
    };
    let ny = SessionFlag {
        active: ny_open(hour),
        status: if ny_open(hour) {
            SessionState::Active
        } else if hour < 13 {
            SessionState::Opening
        } else {
            SessionState::Closed
        },
    };
    let asia = SessionFlag {
        active: asia_open(hour),
        status: if asia_open(hour) {
            SessionState::Active
        } else {
            SessionState::Opening
        },
    };

    SessionStatus {
        current: current_session(now),
        london,
        ny,
        asia,
    }
}

/// London open (08–10 UTC) and the New York open overlap (13–15 UTC).
pub fn is_high_volatility_period(now: DateTime<Utc>) -> bool {
    let hour = now.hour();
    (8..10).contains(&hour) || (13..15).contains(&hour)
}

pub fn next_session_change(now: DateTime<Utc>) -> SessionChange {
    let hour = now.hour() as i64;
    let minute = now.minute() as i64;

    let (session, hours_until) = if hour < 8 {
        (TradingSession::London, 8 - hour)
    } else if hour < 13 {
        (TradingSession::NewYork, 13 - hour)
    } else if hour < 23 {
        (TradingSession::Asia, 23 - hour)
    } else {
        (TradingSession::London, 24 - hour + 8)
    };

    SessionChange {
        session,
        time_until: Duration::minutes(hours_until * 60 - minute),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, hour, minute, 0).unwrap()
    }

    #[test]
    fn current_session_boundaries() {
        assert_eq!(current_session(at(7, 59)), TradingSession::Asia);
        assert_eq!(current_session(at(8, 0)), TradingSession::London);
        assert_eq!(current_session(at(14, 0)), TradingSession::London);
        assert_eq!(current_session(at(17, 0)), TradingSession::NewYork);
        assert_eq!(current_session(at(21, 59)), TradingSession::NewYork);
        assert_eq!(current_session(at(22, 0)), TradingSession::Asia);
        assert_eq!(current_session(at(23, 30)), TradingSession::Asia);
    }

    #[test]
    fn status_during_overlap() {
        let status = session_status(at(14, 0));
        assert_eq!(status.current, TradingSession::London);
        assert!(status.london.active);
        assert!(status.ny.active);
        assert!(!status.asia.active);
        assert_eq!(status.asia.status, SessionState::Opening);
    }

    #[test]
    fn ny_opening_before_one_pm() {
        let status = session_status(at(9, 0));
        assert_eq!(status.ny.status, SessionState::Opening);
        let late = session_status(at(22, 30));
        assert_eq!(late.ny.status, SessionState::Closed);
        assert_eq!(late.london.status, SessionState::Closed);
    }

    #[test]
    fn asia_active_around_midnight() {
        assert!(session_status(at(23, 0)).asia.active);
        assert!(session_status(at(3, 0)).asia.active);
        // 22:00 belongs to no named session but the clock reports ASIA
        assert!(!session_status(at(22, 0)).asia.active);
    }

    #[test]
    fn high_volatility_windows() {
        assert!(is_high_volatility_period(at(8, 15)));
        assert!(!is_high_volatility_period(at(10, 0)));
        assert!(is_high_volatility_period(at(14, 59)));
        assert!(!is_high_volatility_period(at(20, 0)));
    }

    #[test]
    fn next_change_counts_minutes() {
        let change = next_session_change(at(6, 30));
        assert_eq!(change.session, TradingSession::London);
        assert_eq!(change.time_until, Duration::minutes(90));

        let change = next_session_change(at(23, 10));
        assert_eq!(change.session, TradingSession::London);
        assert_eq!(change.time_until, Duration::minutes(9 * 60 - 10));
    }

    #[test]
    fn session_parses_and_serializes() {
        assert_eq!("ny".parse::<TradingSession>().unwrap(), TradingSession::NewYork);
        assert_eq!(
            serde_json::to_string(&TradingSession::London).unwrap(),
            "\"LONDON\""
        );
        assert!("TOKYO".parse::<TradingSession>().is_err());
    }
}
