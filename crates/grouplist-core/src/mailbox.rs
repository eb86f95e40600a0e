//! Mailboxes deliver worker results back to the owning thread.
//!
//! # How It Works
//!
//! 1. The owning thread creates a [`Mailbox`] and hands a [`MailboxSender`]
//!    to each task it submits to an executor.
//! 2. When the task finishes on its worker thread, it posts its result.
//! 3. The owning thread drains the mailbox whenever it is convenient, usually
//!    once per frame, and applies results in arrival order.
//!
//! Nothing is ever executed on the posting thread, so results may carry data
//! that is only meaningful on the owning thread once received.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, unbounded};

/// The receiving end of a mailbox, owned by the owning thread.
#[derive(Debug)]
pub struct Mailbox<T> {
    sender: Sender<T>,
    receiver: Receiver<T>,
}

/// The posting end of a mailbox. Cheap to clone and safe to send to workers.
#[derive(Debug)]
pub struct MailboxSender<T> {
    sender: Sender<T>,
}

impl<T> Clone for MailboxSender<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T> MailboxSender<T> {
    /// Post a result.
    ///
    /// Returns `false` if the mailbox has been dropped, in which case the
    /// value is discarded.
    pub fn post(&self, value: T) -> bool {
        self.sender.send(value).is_ok()
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Mailbox<T> {
    /// Create an empty mailbox.
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    /// Create a sender that posts into this mailbox.
    pub fn sender(&self) -> MailboxSender<T> {
        MailboxSender {
            sender: self.sender.clone(),
        }
    }

    /// Take the next result without blocking.
    pub fn try_take(&self) -> Option<T> {
        match self.receiver.try_recv() {
            Ok(value) => Some(value),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Wait up to `timeout` for the next result.
    pub fn take_timeout(&self, timeout: Duration) -> Option<T> {
        match self.receiver.recv_timeout(timeout) {
            Ok(value) => Some(value),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Take every result that is currently waiting.
    pub fn drain(&self) -> Vec<T> {
        self.receiver.try_iter().collect()
    }

    /// Get the number of results waiting to be taken.
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }
}
