// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tl-core: runtime-free building blocks for the timeline clock

pub mod macros;

pub mod clock;
pub mod config;
pub mod filter;
pub mod sample;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{ClockConfig, Config, ConfigError, FilterConfig, HangPolicy, WatchdogConfig};
pub use filter::{ContinuityFilter, FilterOutcome, ProducerClass, Verdict};
pub use sample::{ClockEvent, Epoch, TimeSample};
