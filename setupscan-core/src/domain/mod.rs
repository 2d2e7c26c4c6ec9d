//! Domain types for SetupScan

pub mod candle;
pub mod detection;
pub mod session;
pub mod signal;
pub mod timeframe;

pub use candle::{sort_chronological, tail, Candle, CandleError};
pub use detection::{Bias, Detection};
pub use session::{
    current_session, is_high_volatility_period, next_session_change, session_status,
    SessionChange, SessionFlag, SessionState, SessionStatus, TradingSession,
};
pub use signal::{format_price, Signal, SignalDirection};
pub use timeframe::{ParseTimeframeError, Timeframe};
