//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` and implement
//! [`Default`] with production values. `#[serde(default)]` lets a settings
//! file name only the fields it changes.

use std::time::Duration;

use cachereplay_core::constants::{DEFAULT_SWEEP_INTERVAL_MS, DEFAULT_WINDOW_SECS};
use cachereplay_core::logging::{self, LogFormat};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings type for the replay subsystem.
///
/// # JSON Format
///
/// ```json
/// {
///   "retention": { "windowSecs": 60, "sweepIntervalMs": 500 },
///   "logging": { "level": "info" }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReplaySettings {
    /// Retention window and eviction sweep.
    pub retention: RetentionSettings,
    /// Subscriber bootstrap.
    pub logging: LoggingSettings,
}

impl ReplaySettings {
    /// Reject values the replay log cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.retention.window_secs == 0 {
            return Err(SettingsError::InvalidValue(
                "retention.windowSecs must be >= 1".into(),
            ));
        }
        if self.retention.sweep_interval_ms == 0 {
            return Err(SettingsError::InvalidValue(
                "retention.sweepIntervalMs must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

/// How long notifications stay replayable and how often the head is swept.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetentionSettings {
    /// Retention window in seconds.
    pub window_secs: u64,
    /// Background sweep period in milliseconds.
    pub sweep_interval_ms: u64,
    /// Whether to run the background sweep at all. Eviction still happens
    /// lazily on every snapshot.
    pub sweep_enabled: bool,
}

impl RetentionSettings {
    /// Sweep period as a [`Duration`].
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

impl Default for RetentionSettings {
    fn default() -> Self {
        Self {
            window_secs: DEFAULT_WINDOW_SECS,
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
            sweep_enabled: true,
        }
    }
}

/// Logging settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of compact text.
    pub json: bool,
}

impl LoggingSettings {
    /// Output format selected by `json`.
    pub fn format(&self) -> LogFormat {
        if self.json {
            LogFormat::Json
        } else {
            LogFormat::Compact
        }
    }

    /// Install the global subscriber. Later calls are no-ops.
    pub fn init(&self) {
        logging::init_subscriber_with_format(&self.level, self.format());
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
        }
    }
}
