//! # cachereplay-settings
//!
//! Configuration for the notification replay log.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`ReplaySettings::default()`]
//! 2. **Settings file**: an optional JSON file, deep-merged over defaults
//! 3. **Environment variables**: `CACHEREPLAY_*` overrides (highest priority)
//!
//! There is no process-wide settings instance. Callers load a
//! [`ReplaySettings`] value and hand it to the service they construct.
//!
//! # Usage
//!
//! ```no_run
//! use cachereplay_settings::load_settings;
//!
//! let settings = load_settings().unwrap_or_default();
//! println!("retention window: {}s", settings.retention.window_secs);
//! ```

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    SETTINGS_PATH_ENV, apply_env_overrides, apply_overrides_from, deep_merge, load_settings,
    load_settings_from_path,
};
pub use types::*;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
