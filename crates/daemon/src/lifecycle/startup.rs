// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup: wire the owner thread, clock, consumer and watchdog.

use std::sync::Arc;
use std::time::Instant;

use tl_core::Config;
use tl_engine::{Abort, ClockEngine, DeadlockWatchdog, OwnerThread, TimelineConsumer, Workers};
use tracing::info;

use crate::stress::{button_click, SIMULATED_COMPUTATION};

use super::{DaemonState, LifecycleError};

/// Name of the owner thread, as it appears in logs.
pub const OWNER_THREAD_NAME: &str = "tl-owner";

/// Start the daemon. Must be called from within a tokio runtime.
///
/// The clock is playing when this returns.
pub fn startup<A: Abort>(config: Config, abort: Arc<A>) -> Result<DaemonState, LifecycleError> {
    // 1. Refuse bad tuning before anything starts
    config.validate()?;

    // 2. Owner context, then the clock and its consumer
    let owner = OwnerThread::spawn(OWNER_THREAD_NAME)?;
    let engine = Arc::new(ClockEngine::system());
    let consumer = TimelineConsumer::attach(Arc::clone(&engine), Arc::clone(&owner), config.filter);

    // 3. Background workers: tick, liveness probe, optional stress probe
    let workers = Workers::new();
    engine.start(&workers, config.clock.tick_period);

    let mut watchdog = DeadlockWatchdog::new(Arc::clone(&owner), abort, config.watchdog.clone());
    if config.watchdog.stress_period.is_some() {
        watchdog = watchdog.with_stress_action(button_click(Arc::clone(&consumer), SIMULATED_COMPUTATION));
    }
    let watchdog = Arc::new(watchdog);
    watchdog.start(&workers);

    engine.play();
    info!(
        tick_period = ?config.clock.tick_period,
        continuity_threshold = ?config.filter.continuity_threshold,
        drop_threshold = config.filter.drop_threshold,
        "daemon started"
    );

    Ok(DaemonState { config, engine, owner, consumer, watchdog, workers, start_time: Instant::now() })
}
