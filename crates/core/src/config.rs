// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Construction-time configuration.
//!
//! Durations are written as integer milliseconds in TOML:
//!
//! ```toml
//! [clock]
//! tick_period_ms = 10
//!
//! [filter]
//! continuity_threshold_ms = 100
//! drop_threshold = 3
//!
//! [watchdog]
//! probe_period_ms = 50
//! probe_timeout_ms = 1000
//! stress_period_ms = 10
//! on_hang = "abort"
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(10);
pub const DEFAULT_CONTINUITY_THRESHOLD: Duration = Duration::from_millis(100);
pub const DEFAULT_DROP_THRESHOLD: u32 = 3;
pub const DEFAULT_PROBE_PERIOD: Duration = Duration::from_millis(50);
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub clock: ClockConfig,
    pub filter: FilterConfig,
    pub watchdog: WatchdogConfig,
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file. Does not validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        non_zero("clock.tick_period_ms", self.clock.tick_period)?;
        non_zero("filter.continuity_threshold_ms", self.filter.continuity_threshold)?;
        non_zero("watchdog.probe_period_ms", self.watchdog.probe_period)?;
        non_zero("watchdog.probe_timeout_ms", self.watchdog.probe_timeout)?;
        if let Some(stress) = self.watchdog.stress_period {
            non_zero("watchdog.stress_period_ms", stress)?;
        }
        Ok(())
    }
}

fn non_zero(field: &'static str, value: Duration) -> Result<(), ConfigError> {
    if value.is_zero() {
        return Err(ConfigError::ZeroDuration { field });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClockConfig {
    #[serde(rename = "tick_period_ms", with = "millis")]
    pub tick_period: Duration,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self { tick_period: DEFAULT_TICK_PERIOD }
    }
}

impl ClockConfig {
    crate::setters! {
        tick_period: Duration,
    }
}

/// Continuity filter tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterConfig {
    /// Largest background advance accepted without corroboration.
    #[serde(rename = "continuity_threshold_ms", with = "millis")]
    pub continuity_threshold: Duration,
    /// Consecutive implausible samples tolerated before one is let through.
    pub drop_threshold: u32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            continuity_threshold: DEFAULT_CONTINUITY_THRESHOLD,
            drop_threshold: DEFAULT_DROP_THRESHOLD,
        }
    }
}

impl FilterConfig {
    crate::setters! {
        continuity_threshold: Duration,
        drop_threshold: u32,
    }
}

/// What the watchdog does once the owner context misses a probe deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HangPolicy {
    /// Terminate the process immediately.
    #[default]
    Abort,
    /// Log the hang and keep probing.
    Report,
}

crate::simple_display! {
    HangPolicy {
        Abort => "abort",
        Report => "report",
    }
}

impl FromStr for HangPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(HangPolicy::Abort),
            "report" => Ok(HangPolicy::Report),
            _ => Err(ConfigError::InvalidValue { key: "on_hang".to_string(), value: s.to_string() }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchdogConfig {
    #[serde(rename = "probe_period_ms", with = "millis")]
    pub probe_period: Duration,
    #[serde(rename = "probe_timeout_ms", with = "millis")]
    pub probe_timeout: Duration,
    /// Synthetic user-action period; `None` disables the stress probe.
    #[serde(rename = "stress_period_ms", with = "opt_millis")]
    pub stress_period: Option<Duration>,
    pub on_hang: HangPolicy,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            probe_period: DEFAULT_PROBE_PERIOD,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            stress_period: None,
            on_hang: HangPolicy::Abort,
        }
    }
}

impl WatchdogConfig {
    crate::setters! {
        probe_period: Duration,
        probe_timeout: Duration,
        stress_period: Option<Duration>,
        on_hang: HangPolicy,
    }

    /// Worst-case delay between a hang starting and the watchdog noticing it.
    pub fn detection_bound(&self) -> Duration {
        self.probe_timeout.saturating_add(self.probe_period)
    }
}

mod millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

mod opt_millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
