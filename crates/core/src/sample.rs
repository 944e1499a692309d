// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Time samples and the epoch that tags them.
//!
//! Every `Reset` starts a new clock generation. Samples carry the generation
//! they were produced in, so a consumer can throw away anything produced
//! before the latest reset even if it is still in flight when the reset lands.

use std::fmt;
use std::time::Duration;

/// Clock generation counter. Incremented once per reset, never otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Epoch(u64);

impl Epoch {
    /// Generation of a freshly constructed clock.
    pub const INITIAL: Epoch = Epoch(0);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// The generation that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Epoch {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// An elapsed-time reading, immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeSample {
    elapsed: Duration,
    epoch: Epoch,
}

impl TimeSample {
    pub const fn new(elapsed: Duration, epoch: Epoch) -> Self {
        Self { elapsed, epoch }
    }

    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub const fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// True when the sample belongs to `current`.
    pub fn is_current(&self, current: Epoch) -> bool {
        self.epoch == current
    }

    /// True when a reset has happened since this sample was produced.
    pub fn is_stale(&self, current: Epoch) -> bool {
        self.epoch < current
    }
}

/// Everything a clock subscriber can receive, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    /// A new elapsed value from a tick or a seek.
    Sample(TimeSample),
    /// First playing tick after a reset has fired. Always delivered before
    /// that tick's sample.
    ResetComplete { epoch: Epoch },
}

impl ClockEvent {
    /// Epoch the event was emitted under.
    pub fn epoch(&self) -> Epoch {
        match self {
            ClockEvent::Sample(sample) => sample.epoch(),
            ClockEvent::ResetComplete { epoch } => *epoch,
        }
    }

    pub fn as_sample(&self) -> Option<&TimeSample> {
        match self {
            ClockEvent::Sample(sample) => Some(sample),
            ClockEvent::ResetComplete { .. } => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ClockEvent::Sample(_) => "sample",
            ClockEvent::ResetComplete { .. } => "reset_complete",
        }
    }
}

#[cfg(test)]
#[path = "sample_tests.rs"]
mod tests;
