// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-threaded owner context.
//!
//! State that belongs to the consumer is only ever touched from the owner
//! thread. Other threads hand it work with `run_async` (fire and forget) or
//! `run_sync` (block until the job has run).

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{JoinHandle, ThreadId};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

/// Unit of work marshalled onto the owner thread.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Error)]
pub enum OwnerError {
    #[error("owner context is closed")]
    Closed,
    #[error("job was dropped before it completed")]
    Dropped,
    #[error("failed to spawn owner thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("owner thread did not stop within {0:?}")]
    Timeout(Duration),
}

/// A context that runs jobs one at a time on a single thread.
pub trait OwnerContext: Send + Sync + 'static {
    /// Queue `job` and return immediately.
    fn run_async(&self, job: Job) -> Result<(), OwnerError>;

    /// Run `job` and wait for it to finish.
    ///
    /// Blocks the calling thread; from async code, wrap it in
    /// `spawn_blocking`. Called from the owner thread itself, the job runs
    /// inline.
    fn run_sync(&self, job: Job) -> Result<(), OwnerError>;

    /// True when called from the owner thread.
    fn is_owner_thread(&self) -> bool;
}

enum Message {
    Run(Job),
    Stop,
}

/// Set once the owner loop has returned.
#[derive(Default)]
struct Exited {
    done: Mutex<bool>,
    cond: Condvar,
}

impl Exited {
    fn mark(&self) {
        *self.done.lock() = true;
        self.cond.notify_all();
    }

    /// Returns false if the thread is still running after `timeout`.
    fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut done = self.done.lock();
        while !*done {
            if self.cond.wait_until(&mut done, deadline).timed_out() {
                return *done;
            }
        }
        true
    }
}

struct MarkExited(Arc<Exited>);

impl Drop for MarkExited {
    fn drop(&mut self) {
        self.0.mark();
    }
}

/// Dedicated OS thread draining a job queue in order.
pub struct OwnerThread {
    name: String,
    sender: mpsc::UnboundedSender<Message>,
    thread_id: ThreadId,
    closed: AtomicBool,
    exited: Arc<Exited>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl OwnerThread {
    pub fn spawn(name: impl Into<String>) -> Result<Arc<Self>, OwnerError> {
        let name = name.into();
        let (sender, mut receiver) = mpsc::unbounded_channel::<Message>();
        let thread_name = name.clone();
        let exited = Arc::new(Exited::default());
        let on_exit = MarkExited(Arc::clone(&exited));
        let handle = std::thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                let _on_exit = on_exit;
                debug!(owner = %thread_name, "owner thread started");
                while let Some(message) = receiver.blocking_recv() {
                    match message {
                        Message::Run(job) => run_job(&thread_name, job),
                        Message::Stop => break,
                    }
                }
                debug!(owner = %thread_name, "owner thread stopped");
            })
            .map_err(OwnerError::Spawn)?;

        Ok(Arc::new(Self {
            name,
            sender,
            thread_id: handle.thread().id(),
            closed: AtomicBool::new(false),
            exited,
            handle: Mutex::new(Some(handle)),
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Stop accepting jobs, let queued ones finish, and join the thread.
    ///
    /// Jobs still waiting in `run_sync` when the thread exits get
    /// [`OwnerError::Dropped`]. Safe to call more than once; only the first
    /// call waits.
    pub fn shutdown(&self) {
        let _ = self.stop(None);
    }

    /// Like [`OwnerThread::shutdown`], but give up after `timeout`.
    ///
    /// A thread stuck in a job is left running detached and
    /// [`OwnerError::Timeout`] is returned.
    pub fn shutdown_timeout(&self, timeout: Duration) -> Result<(), OwnerError> {
        self.stop(Some(timeout))
    }

    fn stop(&self, timeout: Option<Duration>) -> Result<(), OwnerError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let _ = self.sender.send(Message::Stop);
        if self.is_owner_thread() {
            // Joining ourselves would never return; the loop exits after this job.
            return Ok(());
        }
        if let Some(timeout) = timeout {
            if !self.exited.wait(timeout) {
                warn!(owner = %self.name, ?timeout, "owner thread still busy, leaving it detached");
                return Err(OwnerError::Timeout(timeout));
            }
        }
        let Some(handle) = self.handle.lock().take() else {
            return Ok(());
        };
        if handle.join().is_err() {
            warn!(owner = %self.name, "owner thread exited by panic");
        }
        Ok(())
    }

    fn send(&self, job: Job) -> Result<(), OwnerError> {
        if self.is_closed() {
            return Err(OwnerError::Closed);
        }
        self.sender.send(Message::Run(job)).map_err(|_| OwnerError::Closed)
    }
}

impl OwnerContext for OwnerThread {
    fn run_async(&self, job: Job) -> Result<(), OwnerError> {
        self.send(job)
    }

    fn run_sync(&self, job: Job) -> Result<(), OwnerError> {
        if self.is_owner_thread() {
            job();
            return Ok(());
        }
        let (done_tx, done_rx) = oneshot::channel();
        self.send(Box::new(move || {
            job();
            let _ = done_tx.send(());
        }))?;
        done_rx.blocking_recv().map_err(|_| OwnerError::Dropped)
    }

    fn is_owner_thread(&self) -> bool {
        std::thread::current().id() == self.thread_id
    }
}

impl Drop for OwnerThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_job(owner: &str, job: Job) {
    if catch_unwind(AssertUnwindSafe(job)).is_err() {
        error!(owner, "owner job panicked");
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{Job, OwnerContext, OwnerError};
    use parking_lot::{Condvar, Mutex};
    use std::collections::VecDeque;
    use std::thread::ThreadId;

    #[derive(Default)]
    struct FakeOwnerState {
        hung: bool,
        closed: bool,
        defer_async: bool,
        queue: VecDeque<Job>,
        owner: Option<ThreadId>,
        jobs_run: usize,
    }

    /// Owner context for tests.
    ///
    /// Jobs run one at a time on the calling thread, which counts as the
    /// owner thread for the duration of the job. `hang()` makes every
    /// `run_sync` block until `release()` or `close()`; `queued()` defers
    /// `run_async` jobs until `drain()`, to model late delivery.
    #[derive(Default)]
    pub struct FakeOwner {
        state: Mutex<FakeOwnerState>,
        wake: Condvar,
        running: Mutex<()>,
    }

    impl FakeOwner {
        pub fn new() -> Self {
            Self::default()
        }

        /// An owner whose `run_async` jobs wait for [`FakeOwner::drain`].
        pub fn queued() -> Self {
            let owner = Self::default();
            owner.state.lock().defer_async = true;
            owner
        }

        pub fn hang(&self) {
            self.state.lock().hung = true;
        }

        /// Unblock waiting `run_sync` callers.
        pub fn release(&self) {
            self.state.lock().hung = false;
            self.wake.notify_all();
        }

        /// Refuse further jobs and fail any blocked `run_sync` with `Closed`.
        pub fn close(&self) {
            let mut state = self.state.lock();
            state.closed = true;
            state.hung = false;
            state.queue.clear();
            drop(state);
            self.wake.notify_all();
        }

        /// Run every deferred `run_async` job in order. Returns how many ran.
        pub fn drain(&self) -> usize {
            let mut ran = 0;
            loop {
                let next = self.state.lock().queue.pop_front();
                let Some(job) = next else { return ran };
                self.run(job);
                ran += 1;
            }
        }

        /// Run `f` as if on the owner thread.
        pub fn enter<R>(&self, f: impl FnOnce() -> R) -> R {
            let current = std::thread::current().id();
            let previous = self.state.lock().owner.replace(current);
            let result = f();
            self.state.lock().owner = previous;
            result
        }

        pub fn queued_len(&self) -> usize {
            self.state.lock().queue.len()
        }

        pub fn jobs_run(&self) -> usize {
            self.state.lock().jobs_run
        }

        fn run(&self, job: Job) {
            if self.is_owner_thread() {
                job();
            } else {
                let _running = self.running.lock();
                self.enter(job);
            }
            self.state.lock().jobs_run += 1;
        }
    }

    impl OwnerContext for FakeOwner {
        fn run_async(&self, job: Job) -> Result<(), OwnerError> {
            let mut state = self.state.lock();
            if state.closed {
                return Err(OwnerError::Closed);
            }
            if state.hung || state.defer_async {
                state.queue.push_back(job);
                return Ok(());
            }
            drop(state);
            self.run(job);
            Ok(())
        }

        fn run_sync(&self, job: Job) -> Result<(), OwnerError> {
            if self.is_owner_thread() {
                job();
                return Ok(());
            }
            let mut state = self.state.lock();
            while state.hung && !state.closed {
                self.wake.wait(&mut state);
            }
            if state.closed {
                return Err(OwnerError::Closed);
            }
            drop(state);
            self.run(job);
            Ok(())
        }

        fn is_owner_thread(&self) -> bool {
            self.state.lock().owner == Some(std::thread::current().id())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeOwner;

#[cfg(test)]
#[path = "owner_tests.rs"]
mod tests;
