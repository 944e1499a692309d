// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Synthetic user action driven by the watchdog's stress probe.

use std::sync::Arc;
use std::time::Duration;

use tl_core::Clock;
use tl_engine::{StressAction, TimelineConsumer};
use tracing::trace;

/// Owner-side work done between recording the ceiling and resetting.
pub const SIMULATED_COMPUTATION: Duration = Duration::from_millis(10);

/// The reset button: record the displayed value as the ceiling, spend
/// `computation` on the owner thread while ticks keep arriving, then reset.
/// A paused clock is started instead.
pub fn button_click<C: Clock>(consumer: Arc<TimelineConsumer<C>>, computation: Duration) -> StressAction {
    Arc::new(move || {
        let engine = consumer.engine();
        if !engine.is_playing() {
            trace!("stress click: clock paused, playing");
            engine.play();
            return;
        }
        let previous = consumer.reset_with_ceiling(|| std::thread::sleep(computation));
        trace!(?previous, "stress click: reset");
    })
}

#[cfg(test)]
#[path = "stress_tests.rs"]
mod tests;
