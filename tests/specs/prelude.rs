// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared imports and helpers for specs.

pub use std::sync::Arc;
pub use std::time::{Duration, Instant};

pub use parking_lot::Mutex;
pub use tl_core::{ClockEvent, Config, Epoch, FakeClock, FilterConfig, HangPolicy, WatchdogConfig};
pub use tl_engine::{
    ClockEngine, DeadlockWatchdog, FakeOwner, OwnerContext, OwnerThread, RecordingAbort,
    TimelineConsumer, Workers,
};

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Record every event `engine` emits.
pub fn record<C: tl_core::Clock>(engine: &ClockEngine<C>) -> Arc<Mutex<Vec<ClockEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    engine.subscribe(move |event| sink.lock().push(*event));
    events
}

/// Watchdog config with short periods so hangs show up quickly.
pub fn fast_watchdog(on_hang: HangPolicy) -> WatchdogConfig {
    WatchdogConfig::default().probe_period(ms(10)).probe_timeout(ms(100)).on_hang(on_hang)
}
