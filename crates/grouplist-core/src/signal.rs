//! Fan-out notifications.
//!
//! A [`Signal`] holds any number of slots and calls each of them, in
//! connection order, on every emission. Grouplist uses signals to hand list
//! update notifications to several listeners at once (see
//! `grouplist::SignalSink`).
//!
//! Slots run on the emitting thread. List adapters stay on their owning
//! thread, so there is no queued delivery.
//!
//! # Example
//!
//! ```
//! use grouplist_core::Signal;
//!
//! let inserted = Signal::<(usize, usize)>::new();
//!
//! let id = inserted.connect(|(position, count)| {
//!     println!("{count} rows inserted at {position}");
//! });
//!
//! inserted.emit((0, 3));
//! inserted.disconnect(id);
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::logging::targets;

new_key_type! {
    /// Handle returned by [`Signal::connect`]; pass it to
    /// [`Signal::disconnect`] to remove the slot.
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// Calls every connected slot with a borrowed `Args` on each emission.
///
/// Use a tuple for several values, `()` for none.
pub struct Signal<Args> {
    slots: Mutex<SlotMap<ConnectionId, Slot<Args>>>,
}

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: 'static> Signal<Args> {
    /// A signal without slots.
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(SlotMap::with_key()),
        }
    }

    /// Add `slot`, called on every later emission.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.slots.lock().insert(Arc::new(slot))
    }

    /// Remove the slot behind `id`. Returns whether it was still connected.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.slots.lock().remove(id).is_some()
    }

    /// Remove every slot.
    pub fn disconnect_all(&self) {
        self.slots.lock().clear();
    }

    /// Number of connected slots.
    pub fn slot_count(&self) -> usize {
        self.slots.lock().len()
    }

    /// Call every slot with `args`.
    ///
    /// Slots are called on a snapshot taken before the first call, so a slot
    /// may connect or disconnect without deadlocking. Such changes apply from
    /// the next emission on.
    pub fn emit(&self, args: Args) {
        let slots: Vec<Slot<Args>> = self.slots.lock().values().cloned().collect();
        tracing::trace!(target: targets::SIGNAL, slots = slots.len(), "emit");

        for slot in slots {
            slot(&args);
        }
    }
}

impl<Args> std::fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("slots", &self.slots.lock().len())
            .finish()
    }
}

static_assertions::assert_impl_all!(Signal<(usize, usize)>: Send, Sync);
