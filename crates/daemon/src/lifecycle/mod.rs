// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, run, shutdown.

mod startup;
pub use startup::startup;

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tl_core::{Config, ConfigError};
use tl_engine::{
    Abort, ClockEngine, ConsumerStats, DeadlockWatchdog, OwnerError, OwnerThread, ShutdownError,
    TimelineConsumer, Workers,
};
use tracing::{error, info, warn};

/// Daemon state during operation.
pub struct DaemonState {
    pub config: Config,
    pub engine: Arc<ClockEngine>,
    pub owner: Arc<OwnerThread>,
    pub consumer: Arc<TimelineConsumer>,
    pub watchdog: Arc<DeadlockWatchdog>,
    pub workers: Workers,
    /// When daemon started
    pub start_time: Instant,
}

impl DaemonState {
    /// Stop every worker, then the owner thread.
    ///
    /// Workers are cancelled first so the watchdog never observes the owner
    /// going away. The owner is stopped even when the drain times out. Both
    /// waits are bounded by `drain_timeout`; an owner stuck in a job is left
    /// behind and reported as [`OwnerError::Timeout`].
    pub async fn shutdown(self, drain_timeout: Duration) -> Result<ConsumerStats, LifecycleError> {
        info!("Shutting down daemon...");
        self.engine.pause();

        let drained = self.workers.shutdown(drain_timeout).await;
        if let Err(e) = &drained {
            warn!(error = %e, "continuing shutdown with workers still running");
        }

        self.consumer.detach();
        let owner = Arc::clone(&self.owner);
        let stopped = match tokio::task::spawn_blocking(move || owner.shutdown_timeout(drain_timeout)).await {
            Ok(stopped) => stopped,
            Err(e) => {
                warn!(error = %e, "owner thread shutdown task failed");
                Ok(())
            }
        };
        if let Err(e) = &stopped {
            error!(error = %e, "owner thread did not stop");
        }

        let stats = self.consumer.stats();
        info!(
            uptime = ?self.start_time.elapsed(),
            accepted = stats.accepted,
            admitted = stats.admitted,
            rejected = stats.rejected,
            stale = stats.stale,
            resets = stats.resets_observed,
            ceiling_violations = stats.ceiling_violations,
            probes = self.watchdog.probes_completed(),
            hangs = self.watchdog.hangs_detected(),
            stress_runs = self.watchdog.stress_runs(),
            "Daemon shutdown complete"
        );
        drained?;
        stopped?;
        Ok(stats)
    }
}

/// Start, wait for ctrl-c or `run_for`, then shut down.
pub async fn run<A: Abort>(
    config: Config,
    abort: Arc<A>,
    run_for: Option<Duration>,
    drain_timeout: Duration,
) -> Result<ConsumerStats, LifecycleError> {
    let daemon = startup(config, abort)?;
    wait_for_stop(run_for).await;
    daemon.shutdown(drain_timeout).await
}

async fn wait_for_stop(run_for: Option<Duration>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };
    match run_for {
        Some(limit) => tokio::select! {
            _ = tokio::time::sleep(limit) => info!(?limit, "run time elapsed"),
            _ = ctrl_c => info!("interrupted"),
        },
        None => {
            ctrl_c.await;
            info!("interrupted");
        }
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Owner thread error: {0}")]
    Owner(#[from] OwnerError),

    #[error("Failed to build async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("Shutdown error: {0}")]
    Shutdown(#[from] ShutdownError),
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
