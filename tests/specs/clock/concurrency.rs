// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Concurrency specs
//!
//! Commands from many threads race the tick worker while a real owner
//! thread consumes. Nothing deadlocks and the consumer settles on the
//! authoritative value.

use crate::prelude::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn command_storm_settles_on_authoritative_value() {
    let engine = Arc::new(ClockEngine::system());
    let owner = OwnerThread::spawn("storm-owner").unwrap();
    let consumer = TimelineConsumer::attach(Arc::clone(&engine), Arc::clone(&owner), FilterConfig::default());
    let workers = Workers::new();
    engine.start(&workers, ms(1));
    engine.play();

    // A listener calling back into the engine on every event.
    let reentrant = Arc::downgrade(&engine);
    engine.subscribe(move |_| {
        if let Some(engine) = reentrant.upgrade() {
            let _ = engine.snapshot();
        }
    });

    let storm: Vec<_> = (0..4u64)
        .map(|i| {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                for step in 0..200u64 {
                    match (i * 7 + step) % 4 {
                        0 => engine.seek(ms(step * 37)),
                        1 => {
                            engine.reset();
                        }
                        2 => engine.pause(),
                        _ => engine.play(),
                    }
                    if step % 25 == 0 {
                        std::thread::sleep(ms(1));
                    }
                }
            })
        })
        .collect();
    let storm = tokio::task::spawn_blocking(move || storm.into_iter().all(|t| t.join().is_ok()));
    assert!(tokio::time::timeout(Duration::from_secs(10), storm).await.unwrap().unwrap());

    // Each thread resets on exactly a quarter of its steps.
    assert_eq!(engine.reset_epoch(), Epoch::new(4 * 50));

    // A foreground seek from the owner thread is authoritative.
    engine.pause();
    tokio::time::sleep(ms(20)).await;
    let (seeker, on_owner) = (Arc::clone(&engine), Arc::clone(&owner));
    tokio::task::spawn_blocking(move || on_owner.run_sync(Box::new(move || seeker.seek(ms(42)))))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(consumer.displayed(), ms(42));

    let stats = consumer.stats();
    assert!(stats.accepted > 0);
    assert_eq!(stats.ceiling_violations, 0);

    workers.shutdown(ms(500)).await.unwrap();
    owner.shutdown();
}

#[test]
fn owner_thread_seek_is_foreground_and_others_are_background() {
    let clock = FakeClock::new();
    let engine = Arc::new(ClockEngine::new(clock.clone()));
    let owner = OwnerThread::spawn("class-owner").unwrap();
    let consumer = TimelineConsumer::attach(Arc::clone(&engine), Arc::clone(&owner), FilterConfig::default());
    let sync = |owner: &OwnerThread| owner.run_sync(Box::new(|| {})).unwrap();

    engine.seek(ms(100));
    sync(&owner);
    assert_eq!(consumer.displayed(), ms(100));

    // Background jump: suppressed
    engine.seek(ms(90_000));
    sync(&owner);
    assert_eq!(consumer.displayed(), ms(100));

    // Same jump from the owner thread: taken immediately
    let seeker = Arc::clone(&engine);
    owner.run_sync(Box::new(move || seeker.seek(ms(90_000)))).unwrap();
    assert_eq!(consumer.displayed(), ms(90_000));

    owner.shutdown();
}
