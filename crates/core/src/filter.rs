// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Continuity filter for time values arriving from several threads.
//!
//! Background ticks can reach the consumer late or out of order. A single
//! implausible forward jump is treated as noise and suppressed; a run of
//! them longer than the drop threshold is taken as a real jump the filter
//! was not told about, and let through. Foreground values (an explicit seek
//! made from the consuming context) are always authoritative.

use crate::config::FilterConfig;
use parking_lot::Mutex;
use std::time::Duration;

/// Which kind of caller produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProducerClass {
    /// Periodic tick, delivered from another thread.
    Background,
    /// Produced synchronously on the consuming context itself.
    Foreground,
}

crate::simple_display! {
    ProducerClass {
        Background => "background",
        Foreground => "foreground",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Plausible value, or foreground, or first value ever seen.
    Accepted,
    /// Implausible, but the run of rejections passed the drop threshold.
    Admitted,
    /// Implausible; previous value kept.
    Rejected,
}

crate::simple_display! {
    Verdict {
        Accepted => "accepted",
        Admitted => "admitted",
        Rejected => "rejected",
    }
}

/// Result of one filter step: the value to show and how it was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterOutcome {
    pub value: Duration,
    pub verdict: Verdict,
}

impl FilterOutcome {
    pub fn is_rejected(&self) -> bool {
        self.verdict == Verdict::Rejected
    }
}

#[derive(Debug, Default)]
struct FilterState {
    accepted: Option<Duration>,
    consecutive_rejections: u32,
}

impl FilterState {
    fn take(&mut self, value: Duration) -> Duration {
        self.accepted = Some(value);
        self.consecutive_rejections = 0;
        value
    }
}

/// Per-consumer filter. Each call is atomic; concurrent callers are
/// serialized and the last one to take the lock decides `accepted`.
#[derive(Debug)]
pub struct ContinuityFilter {
    config: FilterConfig,
    state: Mutex<FilterState>,
}

impl ContinuityFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self { config, state: Mutex::new(FilterState::default()) }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Filter `sample` and return the value the consumer should show.
    pub fn filter(&self, sample: Duration, origin: ProducerClass) -> Duration {
        self.evaluate(sample, origin).value
    }

    pub fn evaluate(&self, sample: Duration, origin: ProducerClass) -> FilterOutcome {
        let mut state = self.state.lock();

        let previous = match (origin, state.accepted) {
            (ProducerClass::Foreground, _) | (ProducerClass::Background, None) => {
                return accepted(state.take(sample));
            }
            (ProducerClass::Background, Some(previous)) => previous,
        };

        // A backwards step has a negative diff, which is always within bounds.
        let plausible = sample
            .checked_sub(previous)
            .map_or(true, |diff| diff < self.config.continuity_threshold);
        if plausible {
            return accepted(state.take(sample));
        }

        state.consecutive_rejections = state.consecutive_rejections.saturating_add(1);
        if state.consecutive_rejections > self.config.drop_threshold {
            return FilterOutcome { value: state.take(sample), verdict: Verdict::Admitted };
        }
        FilterOutcome { value: previous, verdict: Verdict::Rejected }
    }

    /// Last accepted value, zero if none.
    pub fn current(&self) -> Duration {
        self.accepted().unwrap_or_default()
    }

    pub fn accepted(&self) -> Option<Duration> {
        self.state.lock().accepted
    }

    pub fn consecutive_rejections(&self) -> u32 {
        self.state.lock().consecutive_rejections
    }

    /// Forget everything; the next value of any origin is accepted.
    pub fn clear(&self) {
        *self.state.lock() = FilterState::default();
    }
}

impl Default for ContinuityFilter {
    fn default() -> Self {
        Self::new(FilterConfig::default())
    }
}

fn accepted(value: Duration) -> FilterOutcome {
    FilterOutcome { value, verdict: Verdict::Accepted }
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
