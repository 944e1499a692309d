// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon shutdown specs
//!
//! Graceful shutdown and a genuine deadlock both leave the owner
//! unresponsive for a while; only the second may abort. Shutdown itself
//! never waits on the owner longer than the drain timeout.

use crate::prelude::*;
use tl_daemon::{startup, LifecycleError};
use tl_engine::OwnerError;

fn config() -> Config {
    let mut config = Config::default();
    config.watchdog = fast_watchdog(HangPolicy::Abort);
    config
}

/// Occupy the owner thread for `busy`.
fn occupy(owner: &OwnerThread, busy: Duration) {
    owner.run_async(Box::new(move || std::thread::sleep(busy))).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn busy_owner_during_shutdown_does_not_abort() {
    let abort = Arc::new(RecordingAbort::new());
    let daemon = startup(config(), Arc::clone(&abort)).unwrap();
    tokio::time::sleep(ms(50)).await;

    occupy(&daemon.owner, ms(300));
    let stats = daemon.shutdown(Duration::from_secs(2)).await.unwrap();
    tokio::time::sleep(ms(100)).await;

    assert_eq!(abort.count(), 0);
    assert!(stats.accepted > 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn busy_owner_while_running_aborts() {
    let abort = Arc::new(RecordingAbort::new());
    let daemon = startup(config(), Arc::clone(&abort)).unwrap();
    tokio::time::sleep(ms(50)).await;

    occupy(&daemon.owner, ms(300));
    assert!(abort.wait(ms(600)).await, "hang not detected");
    assert_eq!(daemon.watchdog.hangs_detected(), 1);

    daemon.shutdown(Duration::from_secs(2)).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stuck_owner_does_not_hold_shutdown_past_drain_timeout() {
    let abort = Arc::new(RecordingAbort::new());
    let daemon = startup(config(), Arc::clone(&abort)).unwrap();
    tokio::time::sleep(ms(50)).await;

    let (release, parked) = std::sync::mpsc::channel::<()>();
    daemon
        .owner
        .run_async(Box::new(move || {
            let _ = parked.recv();
        }))
        .unwrap();

    let started = Instant::now();
    let result = tokio::time::timeout(Duration::from_secs(3), daemon.shutdown(ms(200)))
        .await
        .unwrap();

    assert!(matches!(result, Err(LifecycleError::Owner(OwnerError::Timeout(_)))), "{result:?}");
    assert!(started.elapsed() < Duration::from_secs(2), "took {:?}", started.elapsed());

    // Let the stuck job and any probe parked behind it finish.
    drop(release);
}
