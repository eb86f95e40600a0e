use std::sync::Arc;

use parking_lot::RwLock;

use super::{Group, GroupChange, ObserverHandle, ObserverSet};
use crate::item::{Item, ItemRef, Payload, is_same_instance};

/// A group holding exactly one item.
///
/// Headers, footers and standalone rows are usually `ItemGroup`s.
pub struct ItemGroup {
    item: RwLock<ItemRef>,
    observers: ObserverSet,
}

impl ItemGroup {
    /// Create a group around `item`.
    pub fn new(item: ItemRef) -> Arc<Self> {
        Arc::new(Self {
            item: RwLock::new(item),
            observers: ObserverSet::new(),
        })
    }

    /// The current item.
    pub fn item(&self) -> ItemRef {
        self.item.read().clone()
    }

    /// Replace the item and notify a change at position 0.
    ///
    /// The payload comes from the previous item's
    /// [`change_payload`](Item::change_payload).
    pub fn set_item(&self, item: ItemRef) {
        let previous = std::mem::replace(&mut *self.item.write(), item.clone());
        let payload = previous.change_payload(item.as_ref());
        self.observers.notify(self, GroupChange::item_changed(0, payload));
    }

    /// Notify that the item changed in place.
    pub fn notify_changed(&self, payload: Option<Payload>) {
        self.observers.notify(self, GroupChange::item_changed(0, payload));
    }
}

impl Group for ItemGroup {
    fn item_count(&self) -> usize {
        1
    }

    fn item_at(&self, position: usize) -> Option<ItemRef> {
        (position == 0).then(|| self.item())
    }

    fn position_of(&self, item: &dyn Item) -> Option<usize> {
        is_same_instance(self.item.read().as_ref(), item).then_some(0)
    }

    fn attach(&self, observer: ObserverHandle) {
        self.observers.attach(observer);
    }

    fn detach(&self, observer: &ObserverHandle) {
        self.observers.detach(observer);
    }
}

impl std::fmt::Debug for ItemGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemGroup")
            .field("item_id", &self.item.read().id())
            .field("observers", &self.observers)
            .finish()
    }
}

static_assertions::assert_impl_all!(ItemGroup: Send, Sync);
