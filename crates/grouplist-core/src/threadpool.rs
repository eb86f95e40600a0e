//! A rayon-backed [`Executor`] for diff computations.
//!
//! Adapters created without an explicit executor share
//! [`ThreadPool::global`]. A pool that has been shut down rejects new work
//! with [`ExecutorError::ShutDown`].
//!
//! # Example
//!
//! ```no_run
//! use grouplist_core::{Executor, ThreadPool, ThreadPoolConfig};
//!
//! let pool = ThreadPool::new(ThreadPoolConfig::with_threads(2).thread_name("feed-diff"))?;
//! pool.submit(Box::new(|| {
//!     // diff two snapshots
//! }))?;
//! # Ok::<(), grouplist_core::ExecutorError>(())
//! ```

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use rayon::{ThreadPool as RayonThreadPool, ThreadPoolBuilder};

use crate::error::ExecutorError;
use crate::executor::{Executor, Task};
use crate::logging::targets;

static GLOBAL: OnceLock<ThreadPool> = OnceLock::new();

/// How to build a [`ThreadPool`].
#[derive(Debug, Clone)]
pub struct ThreadPoolConfig {
    /// Worker count. `None` lets rayon pick one per CPU core.
    pub workers: Option<usize>,
    /// Worker names are `{thread_name}-{index}`.
    pub thread_name: String,
    /// Worker stack size in bytes. `None` keeps rayon's default.
    pub stack_size: Option<usize>,
}

impl Default for ThreadPoolConfig {
    fn default() -> Self {
        Self {
            workers: None,
            thread_name: "grouplist-diff".to_string(),
            stack_size: None,
        }
    }
}

impl ThreadPoolConfig {
    /// Default configuration with exactly `workers` threads.
    pub fn with_threads(workers: usize) -> Self {
        Self {
            workers: Some(workers),
            ..Self::default()
        }
    }

    /// Set the worker name prefix.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Set the worker stack size in bytes.
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }
}

/// Work-stealing pool that runs submitted tasks on its workers.
pub struct ThreadPool {
    pool: RayonThreadPool,
    in_flight: Arc<AtomicUsize>,
    closed: AtomicBool,
}

impl ThreadPool {
    /// The shared pool, built with the default configuration on first use.
    ///
    /// Falls back to a single worker if the default pool cannot be built.
    pub fn global() -> &'static ThreadPool {
        GLOBAL.get_or_init(|| {
            ThreadPool::new(ThreadPoolConfig::default()).unwrap_or_else(|err| {
                tracing::warn!(target: targets::EXECUTOR, %err, "falling back to a single diff thread");
                ThreadPool::new(ThreadPoolConfig::with_threads(1))
                    .expect("a single-threaded rayon pool can always be built")
            })
        })
    }

    /// Build a pool from `config`.
    pub fn new(config: ThreadPoolConfig) -> Result<Self, ExecutorError> {
        let ThreadPoolConfig {
            workers,
            thread_name,
            stack_size,
        } = config;

        let mut builder =
            ThreadPoolBuilder::new().thread_name(move |index| format!("{thread_name}-{index}"));
        if let Some(workers) = workers {
            builder = builder.num_threads(workers);
        }
        if let Some(bytes) = stack_size {
            builder = builder.stack_size(bytes);
        }

        let pool = builder
            .build()
            .map_err(|err| ExecutorError::CreationFailed(err.to_string()))?;
        tracing::debug!(
            target: targets::EXECUTOR,
            workers = pool.current_num_threads(),
            "thread pool started"
        );

        Ok(Self {
            pool,
            in_flight: Arc::new(AtomicUsize::new(0)),
            closed: AtomicBool::new(false),
        })
    }

    /// Number of workers.
    pub fn worker_count(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Tasks accepted but not finished yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Reject new tasks from now on. Accepted tasks still run.
    pub fn shutdown(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!(
                target: targets::EXECUTOR,
                in_flight = self.in_flight(),
                "thread pool closed"
            );
        }
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    pub fn is_shut_down(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Executor for ThreadPool {
    fn submit(&self, task: Task) -> Result<(), ExecutorError> {
        if self.is_shut_down() {
            return Err(ExecutorError::ShutDown);
        }

        let in_flight = self.in_flight.clone();
        in_flight.fetch_add(1, Ordering::AcqRel);
        self.pool.spawn(move || {
            task();
            in_flight.fetch_sub(1, Ordering::AcqRel);
        });
        Ok(())
    }
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("workers", &self.worker_count())
            .field("in_flight", &self.in_flight())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use std::time::Duration;

    #[test]
    fn test_task_runs_off_the_calling_thread() {
        let config = ThreadPoolConfig::with_threads(2).thread_name("pool-test");
        let pool = ThreadPool::new(config).unwrap();
        let (tx, rx) = bounded(1);

        pool.submit(Box::new(move || {
            let me = std::thread::current();
            let _ = tx.send((me.id(), me.name().map(str::to_string)));
        }))
        .unwrap();

        let (worker, name) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_ne!(worker, std::thread::current().id());
        assert!(name.is_some_and(|name| name.starts_with("pool-test-")));
    }

    #[test]
    fn test_closed_pool_rejects_work() {
        let pool = ThreadPool::new(ThreadPoolConfig::with_threads(1)).unwrap();
        pool.shutdown();
        pool.shutdown();

        assert!(pool.is_shut_down());
        assert_eq!(pool.submit(Box::new(|| {})), Err(ExecutorError::ShutDown));
        assert_eq!(pool.in_flight(), 0);
    }

    #[test]
    fn test_worker_count_and_stack_size() {
        let config = ThreadPoolConfig::with_threads(3).stack_size(256 * 1024);
        let pool = ThreadPool::new(config).unwrap();
        assert_eq!(pool.worker_count(), 3);
    }

    #[test]
    fn test_global_pool_is_shared() {
        assert!(std::ptr::eq(ThreadPool::global(), ThreadPool::global()));

        let (tx, rx) = bounded(1);
        ThreadPool::global()
            .submit(Box::new(move || {
                let _ = tx.send(42);
            }))
            .unwrap();
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 42);
    }
}
