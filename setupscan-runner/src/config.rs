//! Serializable scan configuration.
//!
//! Loaded from TOML. Every field has a default, so an empty file is a valid
//! configuration:
//!
//! ```toml
//! symbols = ["XAU/USD", "BTC/USD"]
//! timeframes = ["M1", "M5", "M15", "M30", "H1"]
//! signal_floor = 75
//! interval_secs = 60
//! history_path = "data/signals.jsonl"
//!
//! [scanner]
//! candle_limit = 50
//! admission_floor = 65
//! strategies = ["ICT", "SMC", "FUSION", "BOS"]
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use setupscan_core::domain::Timeframe;
use setupscan_core::scanner::ScannerConfig;

/// Detections must reach this probability before a signal is generated.
pub const SIGNAL_FLOOR: u8 = 75;
/// Seconds between scan passes in watch mode.
pub const DEFAULT_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Symbols scanned on every pass, in report order.
    pub symbols: Vec<String>,
    pub timeframes: Vec<Timeframe>,
    pub signal_floor: u8,
    pub interval_secs: u64,
    /// JSONL file that receives generated signals. `None` keeps them in memory.
    pub history_path: Option<PathBuf>,
    pub scanner: ScannerConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            symbols: vec!["XAU/USD".to_string(), "BTC/USD".to_string()],
            timeframes: Timeframe::DEFAULT_SCAN.to_vec(),
            signal_floor: SIGNAL_FLOOR,
            interval_secs: DEFAULT_INTERVAL_SECS,
            history_path: None,
            scanner: ScannerConfig::default(),
        }
    }
}

impl ScanConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: ScanConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbols.is_empty() {
            return Err(ConfigError::Invalid("symbols must not be empty".into()));
        }
        if self.timeframes.is_empty() {
            return Err(ConfigError::Invalid("timeframes must not be empty".into()));
        }
        if self.signal_floor > 100 || self.scanner.admission_floor > 100 {
            return Err(ConfigError::Invalid(
                "probability floors must be in 0..=100".into(),
            ));
        }
        if self.interval_secs == 0 {
            return Err(ConfigError::Invalid("interval_secs must be positive".into()));
        }
        if self.scanner.candle_limit < self.scanner.min_candles {
            return Err(ConfigError::Invalid(format!(
                "candle_limit ({}) is below min_candles ({})",
                self.scanner.candle_limit, self.scanner.min_candles
            )));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use setupscan_core::patterns::PatternKind;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = ScanConfig::from_toml_str("").unwrap();
        assert_eq!(config, ScanConfig::default());
        assert_eq!(config.signal_floor, 75);
        assert_eq!(config.interval_secs, 60);
        assert_eq!(config.scanner.admission_floor, 65);
        assert_eq!(config.scanner.candle_limit, 50);
        assert_eq!(config.timeframes, Timeframe::DEFAULT_SCAN.to_vec());
    }

    #[test]
    fn overrides_are_applied() {
        let toml = r#"
            symbols = ["EURUSD"]
            timeframes = ["M15", "H4"]
            signal_floor = 80
            history_path = "out/signals.jsonl"

            [scanner]
            admission_floor = 70
            strategies = ["BOS", "ORDER_BLOCK"]
        "#;
        let config = ScanConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.symbols, vec!["EURUSD".to_string()]);
        assert_eq!(config.timeframes, vec![Timeframe::M15, Timeframe::H4]);
        assert_eq!(config.signal_floor, 80);
        assert_eq!(config.interval_secs, 60);
        assert_eq!(config.history_path, Some(PathBuf::from("out/signals.jsonl")));
        assert_eq!(config.scanner.admission_floor, 70);
        assert_eq!(config.scanner.candle_limit, 50);
        assert_eq!(
            config.scanner.strategies,
            vec![PatternKind::StructureBreak, PatternKind::OrderBlock]
        );
    }

    #[test]
    fn rejects_empty_symbols() {
        let err = ScanConfig::from_toml_str("symbols = []").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_interval() {
        let err = ScanConfig::from_toml_str("interval_secs = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_unknown_timeframe() {
        let err = ScanConfig::from_toml_str(r#"timeframes = ["M3"]"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_missing_file_reports_path() {
        let err = ScanConfig::load(Path::new("/nonexistent/setupscan.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/setupscan.toml"));
    }
}
