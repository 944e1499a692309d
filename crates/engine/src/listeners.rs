// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscriber registry for clock events.
//!
//! Dispatch works on a snapshot of the registry, so callbacks may subscribe
//! or unsubscribe (themselves included) without deadlocking.

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tl_core::ClockEvent;

/// Callback invoked for every clock event.
pub type Listener = Arc<dyn Fn(&ClockEvent) + Send + Sync>;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

#[derive(Default)]
pub(crate) struct Listeners {
    next_id: AtomicU64,
    entries: Mutex<Vec<(SubscriptionId, Listener)>>,
}

impl Listeners {
    pub(crate) fn add(&self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.lock().push((id, listener));
        id
    }

    pub(crate) fn remove(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|(entry, _)| *entry != id);
        entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Deliver `events` in order to every listener registered right now.
    pub(crate) fn dispatch(&self, events: &[ClockEvent]) {
        if events.is_empty() {
            return;
        }
        let snapshot: Vec<Listener> =
            self.entries.lock().iter().map(|(_, listener)| Arc::clone(listener)).collect();
        for listener in &snapshot {
            for event in events {
                listener(event);
            }
        }
    }
}
