//! Background diffing with generation-based staleness.
//!
//! # How It Works
//!
//! 1. On submission the owning thread snapshots the old and new flat item
//!    lists, bumps the generation counter and stores the new groups as the
//!    single pending update.
//! 2. The diff runs on an [`Executor`]. Its result, tagged with the
//!    generation, is posted to a [`Mailbox`].
//! 3. The owning thread drains the mailbox. A result whose generation is not
//!    the pending one is stale and is dropped without side effects. The
//!    current one is applied: groups are replaced, the script is published
//!    and the completion sink is called.
//!
//! Only the latest submission is ever applied; superseded submissions never
//! hear back.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, warn};

use grouplist_core::{Executor, Mailbox, PerfSpan, Task, span_names, targets};

use crate::diff::{DiffResult, calculate_diff};
use crate::error::{AdapterError, Result};
use crate::flatten;
use crate::group::GroupRef;
use crate::item::ItemRef;

/// Called on the owning thread once an asynchronous update has been applied
/// (or has failed).
pub type CompletionSink = Box<dyn FnOnce(Result<()>) + Send + 'static>;

/// Where the latest asynchronous update is in its lifecycle.
///
/// The state is stored together with the generation it belongs to, so a
/// worker only moves its own submission from `Scheduled` to `Computing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AsyncDiffState {
    /// Nothing is pending.
    Idle = 0,
    /// Submitted, waiting for a worker.
    Scheduled = 1,
    /// A worker is computing the diff.
    Computing = 2,
    /// The result is being applied on the owning thread.
    Applying = 3,
    /// A result arrived for a superseded submission and was discarded.
    Dropped = 4,
}

impl AsyncDiffState {
    fn from_bits(value: u64) -> Self {
        match value {
            1 => Self::Scheduled,
            2 => Self::Computing,
            3 => Self::Applying,
            4 => Self::Dropped,
            _ => Self::Idle,
        }
    }
}

const STATE_BITS: u32 = 8;
const STATE_MASK: u64 = (1 << STATE_BITS) - 1;

/// Generation in the high bits, state in the low byte.
fn pack(generation: u64, state: AsyncDiffState) -> u64 {
    (generation << STATE_BITS) | state as u64
}

struct DiffOutcome {
    generation: u64,
    result: std::result::Result<DiffResult, String>,
}

struct PendingUpdate {
    generation: u64,
    new_groups: Vec<GroupRef>,
    completion: Option<CompletionSink>,
}

/// Schedules diffs off the owning thread and applies only the latest result.
pub struct AsyncDiffController {
    executor: Arc<dyn Executor>,
    mailbox: Mailbox<DiffOutcome>,
    status: Arc<AtomicU64>,
    pending: Mutex<Option<PendingUpdate>>,
    applied: AtomicU64,
    dropped: AtomicU64,
}

impl AsyncDiffController {
    /// Create a controller that runs diffs on `executor`.
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self {
            executor,
            mailbox: Mailbox::new(),
            status: Arc::new(AtomicU64::new(pack(0, AsyncDiffState::Idle))),
            pending: Mutex::new(None),
            applied: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// The generation of the most recent accepted submission.
    pub fn generation(&self) -> u64 {
        self.status.load(Ordering::Acquire) >> STATE_BITS
    }

    /// The state of the most recent submission.
    pub fn state(&self) -> AsyncDiffState {
        AsyncDiffState::from_bits(self.status.load(Ordering::Acquire) & STATE_MASK)
    }

    /// Whether a submission is waiting to be applied.
    pub fn has_pending(&self) -> bool {
        self.pending.lock().is_some()
    }

    /// Number of results applied so far.
    pub fn applied_count(&self) -> u64 {
        self.applied.load(Ordering::Relaxed)
    }

    /// Number of stale results discarded so far.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn set_state(&self, state: AsyncDiffState) {
        let _ = self.status.fetch_update(Ordering::AcqRel, Ordering::Acquire, |packed| {
            Some((packed & !STATE_MASK) | state as u64)
        });
    }

    /// Schedule a diff from `old_items` to the items of `new_groups`.
    ///
    /// Returns the submission's generation. If the executor rejects the work
    /// nothing changes: the generation is not advanced and any previous
    /// pending submission stays pending.
    pub(crate) fn submit(
        &self,
        old_items: Vec<ItemRef>,
        new_groups: Vec<GroupRef>,
        detect_moves: bool,
        completion: Option<CompletionSink>,
    ) -> Result<u64> {
        let new_items = flatten::flatten(&new_groups);
        let previous = self.status.load(Ordering::Acquire);
        let generation = (previous >> STATE_BITS) + 1;

        let superseded = self.pending.lock().replace(PendingUpdate {
            generation,
            new_groups,
            completion,
        });
        self.status
            .store(pack(generation, AsyncDiffState::Scheduled), Ordering::Release);

        let sender = self.mailbox.sender();
        let status = self.status.clone();
        let task: Task = Box::new(move || {
            // Fails once a newer submission has replaced this generation.
            let _ = status.compare_exchange(
                pack(generation, AsyncDiffState::Scheduled),
                pack(generation, AsyncDiffState::Computing),
                Ordering::AcqRel,
                Ordering::Acquire,
            );
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                calculate_diff(&old_items, &new_items, detect_moves)
            }))
            .map_err(panic_message);
            sender.post(DiffOutcome { generation, result });
        });

        if let Err(err) = self.executor.submit(task) {
            *self.pending.lock() = superseded;
            self.status.store(previous, Ordering::Release);
            warn!(target: targets::ASYNC_DIFF, %err, generation, "diff rejected by executor");
            return Err(AdapterError::SchedulerUnavailable(err));
        }

        if let Some(superseded) = superseded {
            debug!(
                target: targets::ASYNC_DIFF,
                superseded = superseded.generation,
                generation,
                "pending update superseded"
            );
        }
        debug!(target: targets::ASYNC_DIFF, generation, "diff scheduled");
        Ok(generation)
    }

    /// Forget the pending submission so its result will be treated as stale.
    pub(crate) fn supersede(&self) {
        if let Some(pending) = self.pending.lock().take() {
            let generation = self.generation() + 1;
            self.status
                .store(pack(generation, AsyncDiffState::Idle), Ordering::Release);
            debug!(
                target: targets::ASYNC_DIFF,
                superseded = pending.generation,
                generation,
                "pending update superseded by a synchronous update"
            );
        }
    }

    /// Handle every result that has arrived, without blocking.
    ///
    /// `apply` receives the new groups and the script of the current
    /// submission. Returns the number of submissions that finished.
    pub(crate) fn process_pending(&self, apply: &mut dyn FnMut(Vec<GroupRef>, &DiffResult)) -> usize {
        let mut finished = 0;
        while let Some(outcome) = self.mailbox.try_take() {
            if self.handle(outcome, apply) {
                finished += 1;
            }
        }
        finished
    }

    /// Wait up to `timeout` for the current submission to finish.
    ///
    /// Stale results that arrive meanwhile are discarded. Returns whether the
    /// current submission finished.
    pub(crate) fn wait_for_pending(
        &self,
        timeout: Duration,
        apply: &mut dyn FnMut(Vec<GroupRef>, &DiffResult),
    ) -> bool {
        let deadline = Instant::now() + timeout;
        while self.has_pending() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let Some(outcome) = self.mailbox.take_timeout(remaining) else {
                return false;
            };
            if self.handle(outcome, apply) {
                return true;
            }
        }
        false
    }

    fn handle(&self, outcome: DiffOutcome, apply: &mut dyn FnMut(Vec<GroupRef>, &DiffResult)) -> bool {
        let current = {
            let mut pending = self.pending.lock();
            match pending.as_ref() {
                Some(update) if update.generation == outcome.generation => pending.take(),
                _ => None,
            }
        };

        let Some(update) = current else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            debug!(
                target: targets::ASYNC_DIFF,
                generation = outcome.generation,
                latest = self.generation(),
                state = ?AsyncDiffState::Dropped,
                "discarding stale diff"
            );
            if !self.has_pending() {
                self.set_state(AsyncDiffState::Idle);
            }
            return false;
        };

        self.set_state(AsyncDiffState::Applying);
        let outcome = match outcome.result {
            Ok(diff) => {
                let _span = PerfSpan::new(span_names::APPLY);
                apply(update.new_groups, &diff);
                self.applied.fetch_add(1, Ordering::Relaxed);
                debug!(
                    target: targets::ASYNC_DIFF,
                    generation = update.generation,
                    events = diff.events().len(),
                    "diff applied"
                );
                Ok(())
            }
            Err(message) => {
                warn!(
                    target: targets::ASYNC_DIFF,
                    generation = update.generation,
                    %message,
                    "diff computation failed"
                );
                Err(AdapterError::DiffFailed(message))
            }
        };
        self.set_state(AsyncDiffState::Idle);

        if let Some(completion) = update.completion {
            completion(outcome);
        }
        true
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "diff computation panicked".to_string()
    }
}

impl std::fmt::Debug for AsyncDiffController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncDiffController")
            .field("generation", &self.generation())
            .field("state", &self.state())
            .field("has_pending", &self.has_pending())
            .field("applied", &self.applied_count())
            .field("dropped", &self.dropped_count())
            .finish()
    }
}

static_assertions::assert_impl_all!(AsyncDiffController: Send, Sync);
