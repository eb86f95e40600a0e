//! Runtime support for Grouplist.
//!
//! This crate provides the pieces of the list adapter that are not about lists:
//!
//! - **Signal/Slot System**: Type-safe fan-out of notifications
//! - **Thread Affinity**: Checks that single-threaded objects stay on their owning thread
//! - **Executors**: The [`Executor`] seam plus a rayon-backed [`ThreadPool`]
//! - **Mailboxes**: Channels that carry worker results back to the owning thread
//! - **Logging**: Tracing targets and performance spans
//!
//! # Worker Round Trip
//!
//! ```
//! use grouplist_core::{Executor, InlineExecutor, Mailbox};
//!
//! let mailbox = Mailbox::new();
//! let sender = mailbox.sender();
//!
//! InlineExecutor
//!     .submit(Box::new(move || {
//!         sender.post(6 * 7);
//!     }))
//!     .unwrap();
//!
//! // Back on the owning thread.
//! assert_eq!(mailbox.try_take(), Some(42));
//! ```

mod error;
pub mod executor;
pub mod logging;
pub mod mailbox;
pub mod signal;
pub mod thread_check;
pub mod threadpool;

pub use error::ExecutorError;
pub use executor::{Executor, InlineExecutor, Task};
pub use logging::{PerfSpan, span_names, targets};
pub use mailbox::{Mailbox, MailboxSender};
pub use signal::{ConnectionId, Signal};
pub use thread_check::ThreadAffinity;
pub use threadpool::{ThreadPool, ThreadPoolConfig};
