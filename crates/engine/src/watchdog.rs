// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deadlock watchdog for the owner context.
//!
//! A liveness probe submits a no-op through `run_sync` every probe period
//! and waits at most the probe timeout. A probe that does not come back in
//! time means the owner is hung; the configured [`HangPolicy`] decides what
//! happens next. An optional stress probe pushes a synthetic user action
//! through the same path to provoke latent lock-order bugs.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tl_core::{HangPolicy, WatchdogConfig};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::owner::{OwnerContext, OwnerError};
use crate::workers::Workers;

/// Terminal action taken when the owner context is declared hung.
pub trait Abort: Send + Sync + 'static {
    fn abort(&self, reason: &str);
}

/// Ends the process immediately, without unwinding or cleanup.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessAbort;

impl Abort for ProcessAbort {
    fn abort(&self, reason: &str) {
        error!(reason, "owner context deadlocked, aborting process");
        std::process::abort();
    }
}

/// Synthetic user action run on the owner thread by the stress probe.
pub type StressAction = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Default)]
struct Counters {
    probes_completed: AtomicU64,
    hangs_detected: AtomicU64,
    stress_runs: AtomicU64,
}

pub struct DeadlockWatchdog {
    owner: Arc<dyn OwnerContext>,
    abort: Arc<dyn Abort>,
    config: WatchdogConfig,
    stress: Option<StressAction>,
    counters: Counters,
    /// Set while a probe's blocking call is parked on the owner, so a hung
    /// owner costs one blocking thread, not one per period.
    probe_in_flight: Arc<AtomicBool>,
    stress_in_flight: Arc<AtomicBool>,
}

impl DeadlockWatchdog {
    pub fn new<O: OwnerContext, A: Abort>(owner: Arc<O>, abort: Arc<A>, config: WatchdogConfig) -> Self {
        Self {
            owner,
            abort,
            config,
            stress: None,
            counters: Counters::default(),
            probe_in_flight: Arc::new(AtomicBool::new(false)),
            stress_in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Action the stress probe runs when `stress_period` is configured.
    pub fn with_stress_action(mut self, action: StressAction) -> Self {
        self.stress = Some(action);
        self
    }

    pub fn config(&self) -> &WatchdogConfig {
        &self.config
    }

    /// Register the probe workers.
    pub fn start(self: &Arc<Self>, workers: &Workers) {
        let token = workers.token();
        let watchdog = Arc::clone(self);
        workers.spawn_periodic("liveness-probe", self.config.probe_period, move || {
            let watchdog = Arc::clone(&watchdog);
            let token = token.clone();
            async move { watchdog.probe(&token).await }
        });

        match (self.config.stress_period, &self.stress) {
            (Some(period), Some(_)) => {
                let watchdog = Arc::clone(self);
                workers.spawn_periodic("stress-probe", period, move || {
                    let watchdog = Arc::clone(&watchdog);
                    async move { watchdog.stress().await }
                });
            }
            (Some(_), None) => warn!("stress period configured without a stress action"),
            (None, _) => {}
        }

        info!(
            probe_period = ?self.config.probe_period,
            probe_timeout = ?self.config.probe_timeout,
            stress = self.config.stress_period.is_some(),
            on_hang = %self.config.on_hang,
            "deadlock watchdog started"
        );
    }

    pub fn probes_completed(&self) -> u64 {
        self.counters.probes_completed.load(Ordering::Relaxed)
    }

    pub fn hangs_detected(&self) -> u64 {
        self.counters.hangs_detected.load(Ordering::Relaxed)
    }

    pub fn stress_runs(&self) -> u64 {
        self.counters.stress_runs.load(Ordering::Relaxed)
    }

    async fn probe(&self, token: &CancellationToken) {
        if self.probe_in_flight.swap(true, Ordering::AcqRel) {
            trace!("previous probe still parked on owner");
            return;
        }
        let owner = Arc::clone(&self.owner);
        let in_flight = Arc::clone(&self.probe_in_flight);
        let started = Instant::now();
        let call = tokio::task::spawn_blocking(move || {
            let result = owner.run_sync(Box::new(|| {}));
            in_flight.store(false, Ordering::Release);
            result
        });

        match tokio::time::timeout(self.config.probe_timeout, call).await {
            Ok(Ok(Ok(()))) => {
                self.counters.probes_completed.fetch_add(1, Ordering::Relaxed);
                trace!(latency = ?started.elapsed(), "probe completed");
            }
            Ok(Ok(Err(OwnerError::Closed))) if token.is_cancelled() => {
                debug!("owner closed during shutdown");
            }
            Ok(Ok(Err(e))) => self.on_hang(token, &format!("probe failed: {e}")),
            Ok(Err(e)) => self.on_hang(token, &format!("probe task failed: {e}")),
            Err(_) => self.on_hang(
                token,
                &format!("probe did not complete within {:?}", self.config.probe_timeout),
            ),
        }
    }

    fn on_hang(&self, token: &CancellationToken, reason: &str) {
        if token.is_cancelled() {
            info!(reason, "owner unresponsive during shutdown, not treated as deadlock");
            return;
        }
        self.counters.hangs_detected.fetch_add(1, Ordering::Relaxed);
        match self.config.on_hang {
            HangPolicy::Abort => self.abort.abort(reason),
            HangPolicy::Report => error!(reason, "owner context unresponsive"),
        }
    }

    async fn stress(&self) {
        let Some(action) = self.stress.clone() else { return };
        if self.stress_in_flight.swap(true, Ordering::AcqRel) {
            return;
        }
        let owner = Arc::clone(&self.owner);
        let in_flight = Arc::clone(&self.stress_in_flight);
        let call = tokio::task::spawn_blocking(move || {
            let result = owner.run_sync(Box::new(move || action()));
            in_flight.store(false, Ordering::Release);
            result
        });

        match call.await {
            Ok(Ok(())) => {
                self.counters.stress_runs.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Err(e)) => debug!(error = %e, "stress action not run"),
            Err(e) => warn!(error = %e, "stress task failed"),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::Abort;
    use parking_lot::Mutex;
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Abort that records reasons instead of ending the process.
    #[derive(Default)]
    pub struct RecordingAbort {
        reasons: Mutex<Vec<String>>,
        notify: Notify,
    }

    impl RecordingAbort {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reasons(&self) -> Vec<String> {
            self.reasons.lock().clone()
        }

        pub fn count(&self) -> usize {
            self.reasons.lock().len()
        }

        /// Wait until at least one abort has been recorded. Returns false on
        /// timeout.
        pub async fn wait(&self, within: Duration) -> bool {
            tokio::time::timeout(within, async {
                loop {
                    let notified = self.notify.notified();
                    if self.count() > 0 {
                        return;
                    }
                    notified.await;
                }
            })
            .await
            .is_ok()
        }
    }

    impl Abort for RecordingAbort {
        fn abort(&self, reason: &str) {
            self.reasons.lock().push(reason.to_string());
            self.notify.notify_waiters();
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::RecordingAbort;

#[cfg(test)]
#[path = "watchdog_tests.rs"]
mod tests;
