// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{ClockEvent, Epoch, TimeSample};
use std::time::Duration;

// ── Proptest strategies ─────────────────────────────────────────────────

pub mod strategies {
    use crate::{Epoch, ProducerClass};
    use proptest::prelude::*;
    use std::time::Duration;

    pub fn arb_producer_class() -> impl Strategy<Value = ProducerClass> {
        prop_oneof![Just(ProducerClass::Background), Just(ProducerClass::Foreground)]
    }

    pub fn arb_epoch() -> impl Strategy<Value = Epoch> {
        (0u64..1_000).prop_map(Epoch::new)
    }

    /// Millisecond-granular durations up to ten minutes.
    pub fn arb_elapsed() -> impl Strategy<Value = Duration> {
        (0u64..600_000).prop_map(Duration::from_millis)
    }
}

// ── Event factory functions ─────────────────────────────────────────────────

pub fn sample_ms(elapsed_ms: u64, epoch: u64) -> TimeSample {
    TimeSample::new(Duration::from_millis(elapsed_ms), Epoch::new(epoch))
}

pub fn sample_event_ms(elapsed_ms: u64, epoch: u64) -> ClockEvent {
    ClockEvent::Sample(sample_ms(elapsed_ms, epoch))
}

pub fn reset_complete_event(epoch: u64) -> ClockEvent {
    ClockEvent::ResetComplete { epoch: Epoch::new(epoch) }
}
