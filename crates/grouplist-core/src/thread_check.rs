//! Owning-thread verification for Grouplist.
//!
//! A list adapter is single-threaded: every query, mutation and observer
//! callback must run on the thread that constructed it. Only diff
//! computations leave that thread. [`ThreadAffinity`] records the owning
//! thread and offers cheap checks.
//!
//! Checks run in debug builds by default. Call [`ThreadAffinity::strict`] to
//! keep them in release builds as well.
//!
//! # Example
//!
//! ```
//! use grouplist_core::thread_check::ThreadAffinity;
//!
//! struct Counter {
//!     affinity: ThreadAffinity,
//!     value: std::cell::Cell<i32>,
//! }
//!
//! impl Counter {
//!     fn bump(&self) {
//!         self.affinity.check("Counter::bump");
//!         self.value.set(self.value.get() + 1);
//!     }
//! }
//!
//! let counter = Counter {
//!     affinity: ThreadAffinity::current(),
//!     value: Default::default(),
//! };
//! counter.bump();
//! ```

use std::thread::ThreadId;

/// The thread an object belongs to.
#[derive(Debug, Clone, Copy)]
pub struct ThreadAffinity {
    owner: ThreadId,
    strict: bool,
}

impl Default for ThreadAffinity {
    fn default() -> Self {
        Self::current()
    }
}

impl ThreadAffinity {
    /// Bind to the calling thread.
    #[inline]
    pub fn current() -> Self {
        Self {
            owner: std::thread::current().id(),
            strict: false,
        }
    }

    /// Keep checks active in release builds too.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// The owning thread.
    #[inline]
    pub fn thread_id(&self) -> ThreadId {
        self.owner
    }

    /// Whether the calling thread is the owner.
    #[inline]
    pub fn is_same_thread(&self) -> bool {
        std::thread::current().id() == self.owner
    }

    /// Panic unless called on the owning thread, in every build profile.
    pub fn assert_same_thread(&self, operation: &str) {
        if !self.is_same_thread() {
            self.violation(operation);
        }
    }

    /// Like [`assert_same_thread`](Self::assert_same_thread), but only in
    /// debug builds unless the affinity is [`strict`](Self::strict).
    #[inline]
    pub fn check(&self, operation: &str) {
        if cfg!(debug_assertions) || self.strict {
            self.assert_same_thread(operation);
        }
    }

    #[cold]
    #[inline(never)]
    fn violation(&self, operation: &str) -> ! {
        let caller = std::thread::current();
        panic!(
            "\n\
            ────────────────────────────────────────────────────────────\n\
            wrong thread: {operation}\n\
            ────────────────────────────────────────────────────────────\n\
            owner:  {:?}\n\
            caller: {:?} ({})\n\
            \n\
            Adapters and their groups may only be used on the thread that\n\
            created the adapter. Run diffs with update_async() and apply\n\
            them there with process_pending_updates().\n",
            self.owner,
            caller.id(),
            caller.name().unwrap_or("unnamed"),
        )
    }
}
