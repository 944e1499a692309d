// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cooperative scheduler for background workers.
//!
//! The composition root owns one `Workers`. Every periodic activity (clock
//! tick, liveness probe, stress probe) is registered here, and a single
//! `shutdown` cancels all of them with a bounded wait.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ShutdownError {
    #[error("{remaining} worker(s) still running after {waited:?}")]
    Timeout { remaining: usize, waited: Duration },
}

/// Owner of all background workers
#[derive(Debug, Clone, Default)]
pub struct Workers {
    cancel: CancellationToken,
    tracker: TaskTracker,
}

impl Workers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token cancelled when shutdown begins.
    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Number of workers that have not finished yet.
    pub fn running(&self) -> usize {
        self.tracker.len()
    }

    /// Run `future` until it completes or shutdown begins.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(&self, name: &'static str, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let cancel = self.cancel.clone();
        self.tracker.spawn(async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {}
                _ = future => {}
            }
            debug!(worker = name, "worker stopped");
        });
    }

    /// Call `body` once per `period` until shutdown.
    ///
    /// The body is never re-entered. When a run overruns the period, the
    /// ticks it missed are skipped rather than queued. A body in progress
    /// when shutdown begins is dropped at its next await point.
    pub fn spawn_periodic<F, Fut>(&self, name: &'static str, period: Duration, mut body: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = self.cancel.clone();
        self.tracker.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            debug!(worker = name, ?period, "worker started");
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {}
                }
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = body() => {}
                }
            }
            debug!(worker = name, "worker stopped");
        });
    }

    /// Cancel every worker and wait up to `timeout` for them to finish.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), ShutdownError> {
        info!(running = self.tracker.len(), "stopping workers");
        self.cancel.cancel();
        self.tracker.close();
        if tokio::time::timeout(timeout, self.tracker.wait()).await.is_err() {
            let remaining = self.tracker.len();
            warn!(remaining, ?timeout, "workers did not stop in time");
            return Err(ShutdownError::Timeout { remaining, waited: timeout });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "workers_tests.rs"]
mod tests;
