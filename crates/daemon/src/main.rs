// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timeline daemon (tld)

use std::process::ExitCode;
use std::sync::Arc;

use tl_daemon::{env, lifecycle, logging, LifecycleError};
use tl_engine::ProcessAbort;
use tracing::{error, info};

fn main() -> ExitCode {
    let _log_guard = logging::init();
    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "daemon failed");
            ExitCode::FAILURE
        }
    }
}

fn try_main() -> Result<(), LifecycleError> {
    let config = env::load_config()?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("tl-worker")
        .build()
        .map_err(LifecycleError::Runtime)?;

    let drain_timeout = env::drain_timeout();
    let result = runtime.block_on(lifecycle::run(
        config,
        Arc::new(ProcessAbort),
        env::run_for(),
        drain_timeout,
    ));
    // A probe parked on a hung owner would otherwise keep the runtime alive.
    runtime.shutdown_timeout(drain_timeout);

    let stats = result?;
    info!(accepted = stats.accepted, stale = stats.stale, "exiting");
    Ok(())
}
