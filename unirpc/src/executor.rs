// (c) 2026 The unirpc developers

//! Task submission
//!
//! The session never runs application code on the transport's completion path.
//! Instead it packages the rest of the call as a [`Task`] and hands it to a [`TaskSubmitter`].
//! Anything that can eventually run a boxed closure will do: a thread pool, an event loop,
//! an async runtime's blocking pool, or (for tests) the current thread.
use std::sync::Arc;

use tokio::runtime::{Handle, TryCurrentError};
use tracing::trace;

/// A unit of work handed to a [`TaskSubmitter`]
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Something that runs tasks.
///
/// Implementations should run every task they accept, exactly once.
/// A task that is dropped without running fails its call with an `unavailable` status.
pub trait TaskSubmitter: Send + Sync + 'static {
    /// Schedules a task to run
    fn submit(&self, task: Task);
}

impl<T: TaskSubmitter + ?Sized> TaskSubmitter for Arc<T> {
    fn submit(&self, task: Task) {
        (**self).submit(task);
    }
}

impl<T: TaskSubmitter + ?Sized> TaskSubmitter for Box<T> {
    fn submit(&self, task: Task) {
        (**self).submit(task);
    }
}

/// Runs each task immediately, on the submitting thread
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineSubmitter;

impl TaskSubmitter for InlineSubmitter {
    fn submit(&self, task: Task) {
        task();
    }
}

/// Runs each task on the blocking thread pool of a tokio runtime.
///
/// Application code is synchronous and may be slow, so it belongs on the blocking pool
/// rather than on the runtime's worker threads.
#[derive(Debug, Clone)]
pub struct TokioSubmitter {
    handle: Handle,
}

impl TokioSubmitter {
    /// Constructor for a given runtime
    #[must_use]
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Constructor for the runtime we are running in.
    /// Fails if called outside of a tokio runtime.
    pub fn current() -> Result<Self, TryCurrentError> {
        Ok(Self::new(Handle::try_current()?))
    }
}

impl TaskSubmitter for TokioSubmitter {
    fn submit(&self, task: Task) {
        trace!("spawning blocking task");
        // Detached. A task the runtime never runs is dropped, and reports that itself.
        drop(self.handle.spawn_blocking(task));
    }
}
