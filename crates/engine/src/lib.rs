// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tl-engine: the concurrent timeline clock, its owner-side consumer and the
//! deadlock watchdog

mod listeners;

pub mod consumer;
pub mod engine;
pub mod owner;
pub mod watchdog;
pub mod workers;

pub use consumer::{ConsumerStats, TimelineConsumer, CEILING_CLEAR_BELOW};
pub use engine::{ClockEngine, ClockSnapshot, TickOutcome};
pub use listeners::{Listener, SubscriptionId};
pub use owner::{Job, OwnerContext, OwnerError, OwnerThread};
pub use watchdog::{Abort, DeadlockWatchdog, ProcessAbort, StressAction};
pub use workers::{ShutdownError, Workers};

#[cfg(any(test, feature = "test-support"))]
pub use owner::FakeOwner;
#[cfg(any(test, feature = "test-support"))]
pub use watchdog::RecordingAbort;
