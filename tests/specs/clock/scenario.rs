// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock scenario specs
//!
//! Play, seek, reset and resume against a virtual clock, with a consumer
//! whose owner delivers events late.

use crate::prelude::*;

struct Timeline {
    clock: FakeClock,
    engine: Arc<ClockEngine<FakeClock>>,
    owner: Arc<FakeOwner>,
    consumer: Arc<TimelineConsumer<FakeClock>>,
    events: Arc<Mutex<Vec<ClockEvent>>>,
}

impl Timeline {
    fn new() -> Self {
        let clock = FakeClock::new();
        let engine = Arc::new(ClockEngine::new(clock.clone()));
        let events = record(&engine);
        let owner = Arc::new(FakeOwner::queued());
        let consumer =
            TimelineConsumer::attach(Arc::clone(&engine), Arc::clone(&owner), FilterConfig::default());
        Self { clock, engine, owner, consumer, events }
    }

    /// Let `span` of wall time pass in 10ms ticks.
    fn run_for(&self, span: Duration) {
        let mut waited = Duration::ZERO;
        while waited < span {
            self.clock.advance(ms(10));
            self.engine.tick();
            waited += ms(10);
        }
    }
}

#[test]
fn play_seek_reset_resume() {
    let t = Timeline::new();

    // Play for 100ms
    t.engine.play();
    t.engine.tick();
    t.run_for(ms(100));
    assert_eq!(t.engine.elapsed(), Some(ms(100)));

    // Seek lands exactly, epoch unchanged
    t.engine.seek(ms(5_000));
    assert_eq!(t.engine.elapsed(), Some(ms(5_000)));
    assert_eq!(t.engine.reset_epoch(), Epoch::INITIAL);
    assert_eq!(t.events.lock().last().and_then(ClockEvent::as_sample).map(|s| s.elapsed()), Some(ms(5_000)));

    // Reset returns the pre-reset value and bumps the epoch
    let in_flight = t.owner.queued_len();
    assert_eq!(t.engine.reset(), ms(5_000));
    assert_eq!(t.engine.reset_epoch(), Epoch::new(1));
    assert_eq!(t.engine.elapsed(), Some(Duration::ZERO));

    // Resume for 20ms; every new event carries the new epoch
    let before_resume = t.events.lock().len();
    t.run_for(ms(20));
    let after: Vec<ClockEvent> = t.events.lock()[before_resume..].to_vec();
    assert!(!after.is_empty());
    assert!(matches!(after[0], ClockEvent::ResetComplete { epoch } if epoch == Epoch::new(1)));
    assert!(after.iter().all(|event| event.epoch() == Epoch::new(1)));

    // The late owner finally drains: everything from epoch 0 is discarded
    t.owner.drain();
    let stats = t.consumer.stats();
    assert_eq!(stats.stale, in_flight as u64);
    assert_eq!(stats.resets_observed, 1);
    // The first tick after a reset starts from zero.
    assert_eq!(t.consumer.displayed(), ms(10));
}

#[test]
fn seek_is_the_next_sample_for_any_target() {
    let t = Timeline::new();
    t.engine.play();
    t.engine.tick();

    for target in [0, 7, 123_456, 1, 99_999_999] {
        t.run_for(ms(30));
        t.engine.seek(ms(target));
        let last = *t.events.lock().last().unwrap();
        assert_eq!(last, ClockEvent::Sample(tl_core::TimeSample::new(ms(target), Epoch::INITIAL)));
    }
}

#[test]
fn paused_clock_ignores_any_number_of_ticks() {
    let t = Timeline::new();
    t.engine.play();
    t.engine.tick();
    t.run_for(ms(50));
    t.engine.pause();
    t.engine.pause();

    let emitted = t.events.lock().len();
    t.run_for(ms(10_000));

    assert!(!t.engine.is_playing());
    assert_eq!(t.engine.elapsed(), Some(ms(50)));
    assert_eq!(t.events.lock().len(), emitted);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn real_time_playback_tracks_wall_clock() {
    let engine = Arc::new(ClockEngine::system());
    let owner = OwnerThread::spawn("scenario-owner").unwrap();
    let consumer = TimelineConsumer::attach(Arc::clone(&engine), Arc::clone(&owner), FilterConfig::default());
    let workers = Workers::new();
    engine.start(&workers, ms(10));

    engine.play();
    tokio::time::sleep(ms(100)).await;
    let elapsed = engine.elapsed().unwrap();
    assert!(elapsed >= ms(70) && elapsed <= ms(400), "elapsed {elapsed:?}");

    engine.seek(ms(5_000));
    let previous = engine.reset();
    assert!(previous >= ms(5_000) && previous < ms(5_300), "previous {previous:?}");
    assert_eq!(engine.reset_epoch(), Epoch::new(1));

    tokio::time::sleep(ms(50)).await;
    // Flush whatever the owner still has queued.
    let barrier = Arc::clone(&owner);
    tokio::task::spawn_blocking(move || barrier.run_sync(Box::new(|| {})))
        .await
        .unwrap()
        .unwrap();

    assert!(consumer.displayed() < ms(1_000), "displayed {:?}", consumer.displayed());
    assert_eq!(consumer.stats().resets_observed, 1);
    workers.shutdown(ms(500)).await.unwrap();
    consumer.detach();
    owner.shutdown();
}
