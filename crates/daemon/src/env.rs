// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tl_core::{Config, ConfigError, HangPolicy};

/// Optional TOML config file, applied over the built-in defaults.
pub fn config_path() -> Option<PathBuf> {
    std::env::var("TL_CONFIG").ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

/// Defaults, then `TL_CONFIG`, then per-field `TL_*` overrides, validated.
pub fn load_config() -> Result<Config, ConfigError> {
    let mut config = match config_path() {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    apply_overrides(&mut config)?;
    config.validate()?;
    Ok(config)
}

/// Apply `TL_*` overrides to `config`. Set but unparsable values are errors.
pub fn apply_overrides(config: &mut Config) -> Result<(), ConfigError> {
    if let Some(period) = millis_var("TL_TICK_MS")? {
        config.clock.tick_period = period;
    }
    if let Some(threshold) = millis_var("TL_CONTINUITY_MS")? {
        config.filter.continuity_threshold = threshold;
    }
    if let Some(count) = parse_var::<u32>("TL_DROP_THRESHOLD")? {
        config.filter.drop_threshold = count;
    }
    if let Some(period) = millis_var("TL_PROBE_MS")? {
        config.watchdog.probe_period = period;
    }
    if let Some(timeout) = millis_var("TL_PROBE_TIMEOUT_MS")? {
        config.watchdog.probe_timeout = timeout;
    }
    if let Some(period) = millis_var("TL_STRESS_MS")? {
        config.watchdog.stress_period = Some(period);
    }
    if let Some(policy) = parse_var::<HangPolicy>("TL_HANG_POLICY")? {
        config.watchdog.on_hang = policy;
    }
    Ok(())
}

/// Stop on its own after this long (default: run until ctrl-c).
pub fn run_for() -> Option<Duration> {
    std::env::var("TL_RUN_FOR_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Shutdown drain timeout (default 5s, configurable via `TL_DRAIN_TIMEOUT_MS`).
pub fn drain_timeout() -> Duration {
    std::env::var("TL_DRAIN_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

fn parse_var<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    let Ok(value) = std::env::var(key) else {
        return Ok(None);
    };
    value
        .trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| ConfigError::InvalidValue { key: key.to_string(), value })
}

fn millis_var(key: &str) -> Result<Option<Duration>, ConfigError> {
    Ok(parse_var::<u64>(key)?.map(Duration::from_millis))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
