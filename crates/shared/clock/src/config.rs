//! Clock selection
//!
//! Lets a process pick its time source from JSON or the environment:
//!
//! ```json
//! { "mode": "system" }
//! { "mode": "simulated", "start": "2021-03-22T00:00:00Z" }
//! ```
//!
//! Environment variables:
//! - `TEMPO_CLOCK`: `system` (default) or `simulated`
//! - `TEMPO_CLOCK_START`: RFC 3339 start time for the simulated clock

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tempo_core::Timestamp;
use tempo_ports::Clock;
use thiserror::Error;

use crate::{SimulatedClock, SystemClock};

pub const ENV_CLOCK: &str = "TEMPO_CLOCK";
pub const ENV_CLOCK_START: &str = "TEMPO_CLOCK_START";

/// Which clock a process should run against
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ClockConfig {
    /// Real wall-clock time
    #[default]
    System,
    /// Manually advanced time, starting at `start`
    Simulated {
        #[serde(default = "default_start")]
        start: Timestamp,
    },
}

/// Unix epoch, so runs are reproducible unless a start is given
fn default_start() -> Timestamp {
    Timestamp::default()
}

impl ClockConfig {
    /// Simulated clock starting at the Unix epoch
    pub fn simulated() -> Self {
        Self::Simulated {
            start: default_start(),
        }
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::from_json(&content)
    }

    /// Parse configuration from JSON string
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read `TEMPO_CLOCK` / `TEMPO_CLOCK_START` from the process environment
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClockConfig::from_env`] with a custom variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let mode = lookup(ENV_CLOCK).unwrap_or_else(|| "system".to_string());
        let normalized = mode.trim().to_ascii_lowercase();

        match normalized.as_str() {
            "" | "system" | "real" => Ok(Self::System),
            "simulated" | "sim" => {
                let start = match lookup(ENV_CLOCK_START) {
                    Some(raw) => DateTime::parse_from_rfc3339(raw.trim())
                        .map_err(|e| ConfigError::InvalidStart(format!("{raw}: {e}")))?
                        .with_timezone(&Utc),
                    None => default_start(),
                };
                Ok(Self::Simulated { start })
            }
            _ => Err(ConfigError::InvalidMode(mode)),
        }
    }

    /// Construct the configured clock
    pub fn build(&self) -> ClockHandle {
        match self {
            Self::System => ClockHandle::System(Arc::new(SystemClock::new())),
            Self::Simulated { start } => ClockHandle::Simulated(SimulatedClock::new(*start)),
        }
    }
}

/// A built clock, keeping the simulated driver reachable
#[derive(Clone)]
pub enum ClockHandle {
    System(Arc<SystemClock>),
    Simulated(SimulatedClock),
}

impl ClockHandle {
    /// The clock for application code
    pub fn clock(&self) -> Arc<dyn Clock> {
        match self {
            Self::System(clock) => clock.clone(),
            Self::Simulated(clock) => Arc::new(clock.clone()),
        }
    }

    /// The simulated clock, for the code driving time forward
    pub fn simulated(&self) -> Option<&SimulatedClock> {
        match self {
            Self::System(_) => None,
            Self::Simulated(clock) => Some(clock),
        }
    }
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid simulated start time: {0}")]
    InvalidStart(String),

    #[error("Unknown clock mode: {0}")]
    InvalidMode(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_is_system() {
        assert_eq!(ClockConfig::default(), ClockConfig::System);
        assert_eq!(ClockConfig::from_lookup(lookup(&[])).unwrap(), ClockConfig::System);
    }

    #[test]
    fn test_parse_system_json() {
        let config = ClockConfig::from_json(r#"{ "mode": "system" }"#).unwrap();
        assert_eq!(config, ClockConfig::System);
    }

    #[test]
    fn test_parse_simulated_json() {
        let config =
            ClockConfig::from_json(r#"{ "mode": "simulated", "start": "2021-03-22T00:00:00Z" }"#)
                .unwrap();
        assert_eq!(
            config,
            ClockConfig::Simulated {
                start: Utc.with_ymd_and_hms(2021, 3, 22, 0, 0, 0).unwrap()
            }
        );
    }

    #[test]
    fn test_simulated_start_defaults_to_epoch() {
        let config = ClockConfig::from_json(r#"{ "mode": "simulated" }"#).unwrap();
        assert_eq!(config, ClockConfig::simulated());
    }

    #[test]
    fn test_parse_rejects_unknown_mode() {
        let err = ClockConfig::from_json(r#"{ "mode": "sundial" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_json_round_trip() {
        let config = ClockConfig::Simulated {
            start: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(ClockConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_from_lookup_simulated_with_offset_start() {
        let config = ClockConfig::from_lookup(lookup(&[
            (ENV_CLOCK, "Simulated"),
            (ENV_CLOCK_START, "2021-03-22T02:00:00+02:00"),
        ]))
        .unwrap();
        assert_eq!(
            config,
            ClockConfig::Simulated {
                start: Utc.with_ymd_and_hms(2021, 3, 22, 0, 0, 0).unwrap()
            }
        );
    }

    #[test]
    fn test_from_lookup_rejects_bad_input() {
        let err = ClockConfig::from_lookup(lookup(&[(ENV_CLOCK, "sundial")])).unwrap_err();
        assert_eq!(err, ConfigError::InvalidMode("sundial".to_string()));

        let err = ClockConfig::from_lookup(lookup(&[
            (ENV_CLOCK, "simulated"),
            (ENV_CLOCK_START, "yesterday"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidStart(_)));
    }

    #[test]
    fn test_from_file_missing() {
        let err = ClockConfig::from_file("/nonexistent/tempo-clock.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_build_simulated_handle() {
        let start = Utc.with_ymd_and_hms(2021, 3, 22, 0, 0, 0).unwrap();
        let handle = ClockConfig::Simulated { start }.build();
        let clock = handle.clock();

        let driver = handle.simulated().expect("simulated handle");
        driver.advance(Duration::seconds(3));
        assert_eq!(clock.now(), start + Duration::seconds(3));
        assert_eq!(clock.name(), "SimulatedClock");
    }

    #[test]
    fn test_build_system_handle() {
        let handle = ClockConfig::System.build();
        assert!(handle.simulated().is_none());
        assert_eq!(handle.clock().name(), "SystemClock");
    }
}
