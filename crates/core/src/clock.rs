// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wall-clock source used to measure tick deltas.
//!
//! The engine never calls `Instant::now()` directly; it asks a [`Clock`].
//! Production wires in [`SystemClock`], tests wire in [`FakeClock`] and move
//! time by hand so tick arithmetic is exact.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A source of monotonic instants
pub trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> Instant;
}

/// Real monotonic clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually driven clock. Clones observe the same instant.
#[derive(Clone, Debug)]
pub struct FakeClock {
    current: Arc<Mutex<Instant>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(start: Instant) -> Self {
        Self { current: Arc::new(Mutex::new(start)) }
    }

    /// Move time forward by `by`.
    pub fn advance(&self, by: Duration) {
        *self.current.lock() += by;
    }

    /// Jump to `instant`. Moving backwards is ignored; instants are monotonic.
    pub fn set(&self, instant: Instant) {
        let mut current = self.current.lock();
        if instant > *current {
            *current = instant;
        }
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        *self.current.lock()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
