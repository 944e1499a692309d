// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watchdog hang specs
//!
//! A real owner thread stuck inside a job is detected within the probe
//! timeout plus one probe period.

use crate::prelude::*;
use std::sync::mpsc;

/// Park `owner` inside a job until the returned sender is dropped or used.
fn wedge(owner: &OwnerThread) -> mpsc::Sender<()> {
    let (release, parked) = mpsc::channel::<()>();
    owner
        .run_async(Box::new(move || {
            let _ = parked.recv();
        }))
        .unwrap();
    release
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stuck_owner_aborts_within_bound() {
    let owner = OwnerThread::spawn("wedged-owner").unwrap();
    let abort = Arc::new(RecordingAbort::new());
    let config = fast_watchdog(HangPolicy::Abort);
    let bound = config.detection_bound();
    let watchdog = Arc::new(DeadlockWatchdog::new(Arc::clone(&owner), Arc::clone(&abort), config));
    let workers = Workers::new();
    watchdog.start(&workers);

    tokio::time::sleep(ms(50)).await;
    assert!(watchdog.probes_completed() > 0);

    let onset = Instant::now();
    let release = wedge(&owner);
    assert!(abort.wait(bound + ms(500)).await, "hang not detected");
    let detected = onset.elapsed();

    assert!(detected >= ms(100), "detected after {detected:?}");
    assert!(detected <= bound + ms(500), "detected after {detected:?}");
    assert_eq!(watchdog.hangs_detected(), 1);

    drop(release);
    workers.shutdown(ms(500)).await.unwrap();
    owner.shutdown();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn slow_but_live_owner_is_not_a_deadlock() {
    let owner = OwnerThread::spawn("slow-owner").unwrap();
    let abort = Arc::new(RecordingAbort::new());
    let watchdog =
        Arc::new(DeadlockWatchdog::new(Arc::clone(&owner), Arc::clone(&abort), fast_watchdog(HangPolicy::Abort)));
    let workers = Workers::new();
    watchdog.start(&workers);

    // Jobs well under the probe timeout.
    for _ in 0..10 {
        owner.run_async(Box::new(|| std::thread::sleep(ms(20)))).unwrap();
    }
    tokio::time::sleep(ms(300)).await;

    assert_eq!(abort.count(), 0);
    assert!(watchdog.probes_completed() > 0);
    workers.shutdown(ms(500)).await.unwrap();
    owner.shutdown();
}
