use std::sync::Weak;

use parking_lot::Mutex;
use tracing::trace;

use grouplist_core::targets;

use super::{Group, GroupChange, ObserverHandle};

/// The set of observers attached to one group.
///
/// Observers are held weakly and compared by identity. Notification takes a
/// snapshot of the live observers and releases the lock before calling any
/// of them, so observers may attach or detach from inside a callback.
#[derive(Default)]
pub struct ObserverSet {
    observers: Mutex<Vec<ObserverHandle>>,
}

impl ObserverSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer. Returns `false` if it was already registered.
    pub fn attach(&self, observer: ObserverHandle) -> bool {
        let mut observers = self.observers.lock();
        if observers.iter().any(|existing| Weak::ptr_eq(existing, &observer)) {
            return false;
        }
        observers.push(observer);
        true
    }

    /// Unregister an observer. Returns `false` if it was not registered.
    pub fn detach(&self, observer: &ObserverHandle) -> bool {
        let mut observers = self.observers.lock();
        let before = observers.len();
        observers.retain(|existing| !Weak::ptr_eq(existing, observer));
        observers.len() != before
    }

    /// Whether `observer` is registered.
    pub fn contains(&self, observer: &ObserverHandle) -> bool {
        self.observers
            .lock()
            .iter()
            .any(|existing| Weak::ptr_eq(existing, observer))
    }

    /// Number of registered observers that are still alive.
    pub fn len(&self) -> usize {
        self.observers
            .lock()
            .iter()
            .filter(|observer| observer.strong_count() > 0)
            .count()
    }

    /// Whether no live observer is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `change` from `group` to every live observer.
    pub fn notify(&self, group: &dyn Group, change: GroupChange) {
        let live: Vec<_> = {
            let mut observers = self.observers.lock();
            observers.retain(|observer| observer.strong_count() > 0);
            observers.iter().filter_map(Weak::upgrade).collect()
        };

        trace!(
            target: targets::GROUP,
            observers = live.len(),
            ?change,
            "notifying group observers"
        );

        for observer in live {
            observer.on_group_change(group, change.clone());
        }
    }
}

impl std::fmt::Debug for ObserverSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverSet")
            .field("observers", &self.len())
            .finish()
    }
}
