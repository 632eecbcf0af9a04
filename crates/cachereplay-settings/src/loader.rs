//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`ReplaySettings::default()`]
//! 2. If a settings file exists, deep-merge its values over defaults
//! 3. Apply `CACHEREPLAY_*` environment overrides
//! 4. Validate the result
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::types::ReplaySettings;

/// Env var naming the settings file read by [`load_settings`].
pub const SETTINGS_PATH_ENV: &str = "CACHEREPLAY_SETTINGS";

/// Load settings from the file named by `CACHEREPLAY_SETTINGS` (if set),
/// then apply env overrides.
pub fn load_settings() -> Result<ReplaySettings> {
    match std::env::var(SETTINGS_PATH_ENV) {
        Ok(path) if !path.is_empty() => load_settings_from_path(Path::new(&path)),
        _ => {
            debug!("no settings file configured, using defaults");
            let mut settings = ReplaySettings::default();
            apply_env_overrides(&mut settings);
            settings.validate()?;
            Ok(settings)
        }
    }
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults. Invalid JSON or an invalid merged value
/// is an error.
pub fn load_settings_from_path(path: &Path) -> Result<ReplaySettings> {
    let defaults = serde_json::to_value(ReplaySettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: ReplaySettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply process environment overrides to loaded settings.
pub fn apply_env_overrides(settings: &mut ReplaySettings) {
    apply_overrides_from(settings, |name| std::env::var(name).ok());
}

/// Apply overrides read through `lookup`.
///
/// Invalid values are ignored with a warning (falling back to file/default):
/// - `CACHEREPLAY_WINDOW_SECS`: 1..=86400
/// - `CACHEREPLAY_SWEEP_INTERVAL_MS`: 10..=3600000
/// - `CACHEREPLAY_SWEEP_ENABLED`, `CACHEREPLAY_LOG_JSON`: boolean
/// - `CACHEREPLAY_LOG_LEVEL`: any non-empty filter directive
pub fn apply_overrides_from<F>(settings: &mut ReplaySettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let env = EnvReader { lookup };

    if let Some(v) = env.u64_in("CACHEREPLAY_WINDOW_SECS", 1, 86_400) {
        settings.retention.window_secs = v;
    }
    if let Some(v) = env.u64_in("CACHEREPLAY_SWEEP_INTERVAL_MS", 10, 3_600_000) {
        settings.retention.sweep_interval_ms = v;
    }
    if let Some(v) = env.boolean("CACHEREPLAY_SWEEP_ENABLED") {
        settings.retention.sweep_enabled = v;
    }
    if let Some(v) = env.string("CACHEREPLAY_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = env.boolean("CACHEREPLAY_LOG_JSON") {
        settings.logging.json = v;
    }
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u64` within an inclusive range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.is_empty())
    }

    fn boolean(&self, name: &str) -> Option<bool> {
        let val = (self.lookup)(name)?;
        let result = parse_bool(&val);
        if result.is_none() {
            warn!(key = name, value = %val, "invalid boolean env var, ignoring");
        }
        result
    }

    fn u64_in(&self, name: &str, min: u64, max: u64) -> Option<u64> {
        let val = (self.lookup)(name)?;
        let result = parse_u64_range(&val, min, max);
        if result.is_none() {
            warn!(key = name, value = %val, min, max, "invalid integer env var, ignoring");
        }
        result
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
