// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Owner-side consumer of clock events.
//!
//! Every event reaches the consumer on the owner context. Events raised on
//! the owner thread (a seek made from there) are handled inline and count as
//! foreground; everything else is marshalled with `run_async` and counts as
//! background. Samples from an epoch other than the engine's current one are
//! dropped before they reach the continuity filter.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tl_core::{
    Clock, ClockEvent, ContinuityFilter, Epoch, FilterConfig, ProducerClass, SystemClock,
    TimeSample, Verdict,
};
use tracing::{debug, trace, warn};

use crate::engine::ClockEngine;
use crate::listeners::SubscriptionId;
use crate::owner::OwnerContext;

/// Accepted values below this are treated as a fresh start and clear the
/// reset ceiling.
pub const CEILING_CLEAR_BELOW: Duration = Duration::from_millis(100);

/// Running totals of what the consumer did with incoming events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    pub accepted: u64,
    pub admitted: u64,
    pub rejected: u64,
    /// Samples dropped because a reset happened after they were produced.
    pub stale: u64,
    pub resets_observed: u64,
    /// Accepted values above the ceiling recorded by `reset_with_ceiling`.
    pub ceiling_violations: u64,
}

#[derive(Debug, Default)]
struct ConsumerState {
    stats: ConsumerStats,
    ceiling: Option<Duration>,
    subscription: Option<SubscriptionId>,
}

pub struct TimelineConsumer<C: Clock = SystemClock> {
    engine: Arc<ClockEngine<C>>,
    owner: Arc<dyn OwnerContext>,
    filter: ContinuityFilter,
    state: Mutex<ConsumerState>,
}

impl<C: Clock> TimelineConsumer<C> {
    /// Subscribe a new consumer to `engine`, delivering through `owner`.
    pub fn attach<O: OwnerContext>(
        engine: Arc<ClockEngine<C>>,
        owner: Arc<O>,
        filter: FilterConfig,
    ) -> Arc<Self> {
        let consumer = Arc::new(Self {
            engine,
            owner,
            filter: ContinuityFilter::new(filter),
            state: Mutex::new(ConsumerState::default()),
        });

        let weak: Weak<Self> = Arc::downgrade(&consumer);
        let id = consumer.engine.subscribe(move |event| {
            if let Some(consumer) = weak.upgrade() {
                consumer.deliver(*event);
            }
        });
        consumer.state.lock().subscription = Some(id);
        debug!(subscription = %id, "timeline consumer attached");
        consumer
    }

    /// Stop receiving events. Returns false if already detached.
    pub fn detach(&self) -> bool {
        let Some(id) = self.state.lock().subscription.take() else {
            return false;
        };
        debug!(subscription = %id, "timeline consumer detached");
        self.engine.unsubscribe(id)
    }

    /// The value currently shown.
    pub fn displayed(&self) -> Duration {
        self.filter.current()
    }

    pub fn stats(&self) -> ConsumerStats {
        self.state.lock().stats
    }

    pub fn ceiling(&self) -> Option<Duration> {
        self.state.lock().ceiling
    }

    pub fn engine(&self) -> &Arc<ClockEngine<C>> {
        &self.engine
    }

    /// Record the displayed value as the ceiling, run `work`, then reset the
    /// engine. Returns the elapsed value the reset replaced.
    ///
    /// Any sample accepted afterwards that exceeds the ceiling, before the
    /// clock has visibly restarted, is counted in `ceiling_violations`.
    pub fn reset_with_ceiling(&self, work: impl FnOnce()) -> Duration {
        let ceiling = self.displayed();
        self.state.lock().ceiling = Some(ceiling);
        work();
        let previous = self.engine.reset();
        debug!(?ceiling, ?previous, "reset with ceiling");
        previous
    }

    fn deliver(self: &Arc<Self>, event: ClockEvent) {
        if self.owner.is_owner_thread() {
            self.handle(event, ProducerClass::Foreground);
            return;
        }
        let consumer = Arc::clone(self);
        let job = Box::new(move || consumer.handle(event, ProducerClass::Background));
        if let Err(e) = self.owner.run_async(job) {
            trace!(event = event.name(), error = %e, "owner unavailable, event dropped");
        }
    }

    fn handle(&self, event: ClockEvent, origin: ProducerClass) {
        match event {
            ClockEvent::ResetComplete { epoch } => self.on_reset_complete(epoch),
            ClockEvent::Sample(sample) => self.on_sample(sample, origin),
        }
    }

    fn on_reset_complete(&self, epoch: Epoch) {
        if epoch != self.engine.reset_epoch() {
            trace!(%epoch, "superseded reset completion ignored");
            return;
        }
        self.filter.clear();
        self.state.lock().stats.resets_observed += 1;
        debug!(%epoch, "reset observed, filter cleared");
    }

    fn on_sample(&self, sample: TimeSample, origin: ProducerClass) {
        let current = self.engine.reset_epoch();
        if !sample.is_current(current) {
            self.state.lock().stats.stale += 1;
            trace!(sample_epoch = %sample.epoch(), %current, "stale sample dropped");
            return;
        }

        let outcome = self.filter.evaluate(sample.elapsed(), origin);
        let mut state = self.state.lock();
        match outcome.verdict {
            Verdict::Accepted => state.stats.accepted += 1,
            Verdict::Admitted => state.stats.admitted += 1,
            Verdict::Rejected => {
                state.stats.rejected += 1;
                trace!(sample = ?sample.elapsed(), %origin, "sample rejected");
                return;
            }
        }

        let value = outcome.value;
        if origin == ProducerClass::Foreground || value < CEILING_CLEAR_BELOW {
            state.ceiling = None;
        }
        if let Some(ceiling) = state.ceiling.filter(|ceiling| value > *ceiling) {
            state.stats.ceiling_violations += 1;
            warn!(
                ?value,
                ?ceiling,
                epoch = %sample.epoch(),
                "accepted value above reset ceiling"
            );
        }
    }
}

#[cfg(test)]
#[path = "consumer_tests.rs"]
mod tests;
