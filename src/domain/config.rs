//! Validated tracker configuration.
//!
//! Raw key access goes through [`ConfigPort`]; everything is validated here
//! before the tracker starts, so bad values fail up front with the offending
//! section and key named.

use crate::domain::error::TickwatchError;
use crate::domain::ledger::MAX_INITIAL_CAPITAL;
use crate::domain::market_clock::EXCHANGE_UTC_OFFSET_MINUTES;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_INITIAL_CAPITAL: f64 = 5_000_000.0;
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    pub initial_capital: f64,
    pub watchlist: Vec<String>,
    pub refresh_interval_ms: u64,
    /// When true, refresh ticks outside the trading session are skipped.
    pub respect_session: bool,
    pub utc_offset_minutes: i32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            watchlist: Vec::new(),
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            respect_session: true,
            utc_offset_minutes: EXCHANGE_UTC_OFFSET_MINUTES,
        }
    }
}

impl TrackerConfig {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TickwatchError> {
        let defaults = TrackerConfig::default();

        let initial_capital =
            config.get_double("portfolio", "initial_capital", defaults.initial_capital);
        validate_capital(initial_capital)?;

        let refresh_interval_ms = config.get_int(
            "refresh",
            "interval_ms",
            defaults.refresh_interval_ms as i64,
        );
        if refresh_interval_ms <= 0 {
            return Err(TickwatchError::ConfigInvalid {
                section: "refresh".to_string(),
                key: "interval_ms".to_string(),
                reason: "interval_ms must be positive".to_string(),
            });
        }

        let utc_offset_minutes = config.get_int(
            "exchange",
            "utc_offset_minutes",
            defaults.utc_offset_minutes as i64,
        );
        // UTC offsets beyond ±18h do not exist.
        if utc_offset_minutes.abs() > 18 * 60 {
            return Err(TickwatchError::ConfigInvalid {
                section: "exchange".to_string(),
                key: "utc_offset_minutes".to_string(),
                reason: "offset must be within +/-1080 minutes".to_string(),
            });
        }

        Ok(TrackerConfig {
            initial_capital,
            watchlist: config.get_list("watchlist", "symbols"),
            refresh_interval_ms: refresh_interval_ms as u64,
            respect_session: config.get_bool("refresh", "respect_session", true),
            utc_offset_minutes: utc_offset_minutes as i32,
        })
    }
}

fn validate_capital(value: f64) -> Result<(), TickwatchError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(TickwatchError::ConfigInvalid {
            section: "portfolio".to_string(),
            key: "initial_capital".to_string(),
            reason: "initial_capital must be positive".to_string(),
        });
    }
    if value > MAX_INITIAL_CAPITAL {
        return Err(TickwatchError::ConfigInvalid {
            section: "portfolio".to_string(),
            key: "initial_capital".to_string(),
            reason: format!("initial_capital exceeds maximum of {MAX_INITIAL_CAPITAL}"),
        });
    }
    Ok(())
}
