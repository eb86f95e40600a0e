//! Executors run work off the owning thread.
//!
//! An [`Executor`] accepts boxed tasks and runs them somewhere, typically on
//! a worker thread. Tasks report back to the owning thread through a
//! [`Mailbox`](crate::mailbox::Mailbox); the executor itself never sees results.
//!
//! Two implementations ship with this crate:
//!
//! - [`ThreadPool`](crate::threadpool::ThreadPool): rayon-backed worker pool
//! - [`InlineExecutor`]: runs the task immediately on the calling thread

use std::sync::Arc;

use crate::error::ExecutorError;

/// A unit of work handed to an executor.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Something that can run tasks, usually on another thread.
///
/// Implementations either accept the task (and eventually run it to
/// completion) or reject it synchronously.
pub trait Executor: Send + Sync {
    /// Submit a task for execution.
    ///
    /// Returns an error if the executor cannot accept work. A rejected task is
    /// dropped without running.
    fn submit(&self, task: Task) -> Result<(), ExecutorError>;
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn submit(&self, task: Task) -> Result<(), ExecutorError> {
        (**self).submit(task)
    }
}

impl<E: Executor + ?Sized> Executor for &'static E {
    fn submit(&self, task: Task) -> Result<(), ExecutorError> {
        (**self).submit(task)
    }
}

/// An executor that runs each task on the calling thread before `submit` returns.
///
/// Useful for tests and for small lists where a thread hop costs more than the
/// work itself. Results still travel through the mailbox, so they are applied
/// on the next drain, exactly as with a real pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn submit(&self, task: Task) -> Result<(), ExecutorError> {
        task();
        Ok(())
    }
}
