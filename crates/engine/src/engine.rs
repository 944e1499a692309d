// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The clock engine: authoritative elapsed time, play state and reset epoch.
//!
//! All state lives behind one mutex. Every command and every tick performs
//! its full read-modify-write under that lock, builds the events it needs
//! to emit, releases the lock, and only then calls listeners. Listeners can
//! therefore call back into the engine from inside a callback.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tl_core::{Clock, ClockEvent, Epoch, SystemClock, TimeSample};
use tracing::{debug, info, trace};

use crate::listeners::{Listener, Listeners, SubscriptionId};
use crate::workers::Workers;

#[derive(Debug, Default)]
struct ClockState {
    /// `None` until the first tick or seek after construction.
    elapsed: Option<Duration>,
    is_playing: bool,
    /// Cleared whenever playback stops so a resume never counts the pause.
    last_tick_wallclock: Option<Instant>,
    epoch: Epoch,
    /// Set by reset, consumed by the next playing tick.
    reset_pending: bool,
}

/// Point-in-time copy of the engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockSnapshot {
    pub elapsed: Option<Duration>,
    pub is_playing: bool,
    pub epoch: Epoch,
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Another tick was still running; this one was dropped.
    Skipped,
    /// Paused; nothing advanced or emitted.
    Idle,
    /// Time advanced and this sample was emitted.
    Advanced { sample: TimeSample, reset_completed: bool },
}

/// Periodically ticked logical clock, safe to drive from any thread.
pub struct ClockEngine<C: Clock = SystemClock> {
    clock: C,
    state: Mutex<ClockState>,
    listeners: Listeners,
    ticking: AtomicBool,
}

impl ClockEngine<SystemClock> {
    pub fn system() -> Self {
        Self::new(SystemClock)
    }
}

impl<C: Clock> ClockEngine<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            state: Mutex::new(ClockState::default()),
            listeners: Listeners::default(),
            ticking: AtomicBool::new(false),
        }
    }

    /// Start advancing on each tick. No-op if already playing.
    pub fn play(&self) {
        let changed = {
            let mut state = self.state.lock();
            !std::mem::replace(&mut state.is_playing, true)
        };
        if changed {
            debug!("clock playing");
        }
    }

    /// Stop advancing. Elapsed time is kept as is.
    pub fn pause(&self) {
        let changed = {
            let mut state = self.state.lock();
            state.last_tick_wallclock = None;
            std::mem::replace(&mut state.is_playing, false)
        };
        if changed {
            debug!("clock paused");
        }
    }

    /// Jump to `target` and emit the new value synchronously, on the caller's
    /// stack. Play state and epoch are unchanged.
    pub fn seek(&self, target: Duration) {
        let sample = {
            let mut state = self.state.lock();
            state.elapsed = Some(target);
            TimeSample::new(target, state.epoch)
        };
        debug!(?target, epoch = %sample.epoch(), "clock seek");
        self.listeners.dispatch(&[ClockEvent::Sample(sample)]);
    }

    /// Zero the clock and start a new epoch.
    ///
    /// Returns the elapsed value just before the reset (zero if the clock had
    /// never run), usable as the ceiling any late pre-reset sample can reach.
    /// The next playing tick emits `ResetComplete` ahead of its sample.
    pub fn reset(&self) -> Duration {
        let (previous, epoch) = {
            let mut state = self.state.lock();
            let previous = state.elapsed.replace(Duration::ZERO).unwrap_or_default();
            state.epoch = state.epoch.next();
            state.reset_pending = true;
            state.last_tick_wallclock = None;
            (previous, state.epoch)
        };
        info!(%epoch, ?previous, "clock reset");
        previous
    }

    /// Advance by the wall time since the previous tick and emit a sample.
    ///
    /// Driven by the tick worker; public so tests and virtual-time drivers can
    /// step the clock themselves. Ticks never overlap: one that starts while
    /// another is running returns [`TickOutcome::Skipped`].
    pub fn tick(&self) -> TickOutcome {
        if self
            .ticking
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            trace!("tick skipped, previous tick still running");
            return TickOutcome::Skipped;
        }
        let _gate = TickGate(&self.ticking);

        let now = self.clock.now();
        let (sample, reset_completed) = {
            let mut state = self.state.lock();
            if !state.is_playing {
                state.last_tick_wallclock = None;
                return TickOutcome::Idle;
            }
            let delta = state
                .last_tick_wallclock
                .map_or(Duration::ZERO, |last| now.saturating_duration_since(last));
            let elapsed = state.elapsed.unwrap_or_default().saturating_add(delta);
            state.elapsed = Some(elapsed);
            state.last_tick_wallclock = Some(now);
            let reset_completed = std::mem::take(&mut state.reset_pending);
            (TimeSample::new(elapsed, state.epoch), reset_completed)
        };

        trace!(elapsed = ?sample.elapsed(), epoch = %sample.epoch(), "tick");
        if reset_completed {
            debug!(epoch = %sample.epoch(), "reset completed");
            self.listeners.dispatch(&[
                ClockEvent::ResetComplete { epoch: sample.epoch() },
                ClockEvent::Sample(sample),
            ]);
        } else {
            self.listeners.dispatch(&[ClockEvent::Sample(sample)]);
        }
        TickOutcome::Advanced { sample, reset_completed }
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().is_playing
    }

    pub fn reset_epoch(&self) -> Epoch {
        self.state.lock().epoch
    }

    pub fn elapsed(&self) -> Option<Duration> {
        self.state.lock().elapsed
    }

    pub fn snapshot(&self) -> ClockSnapshot {
        let state = self.state.lock();
        ClockSnapshot { elapsed: state.elapsed, is_playing: state.is_playing, epoch: state.epoch }
    }

    /// Register `listener` for every future event.
    ///
    /// Listeners run on whichever thread emitted the event: the tick worker
    /// for ticks, the caller for seeks. They must return promptly.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&ClockEvent) + Send + Sync + 'static,
    {
        let listener: Listener = Arc::new(listener);
        self.listeners.add(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners.remove(id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Register the periodic tick worker.
    pub fn start(self: &Arc<Self>, workers: &Workers, period: Duration) {
        let engine = Arc::clone(self);
        workers.spawn_periodic("clock-tick", period, move || {
            engine.tick();
            std::future::ready(())
        });
    }
}

struct TickGate<'a>(&'a AtomicBool);

impl Drop for TickGate<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
