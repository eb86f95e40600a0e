//! A flat, mutable list of items.

use std::sync::Arc;

use parking_lot::RwLock;

use super::{Group, GroupChange, ObserverHandle, ObserverSet};
use crate::diff::calculate_diff;
use crate::error::{AdapterError, Result};
use crate::item::{Item, ItemRef, is_same_instance};
use crate::sink::UpdateEvent;

/// A group of items stored in a vector.
///
/// Every mutation notifies attached observers with the narrowest change that
/// describes it. [`update`](ListGroup::update) replaces the whole list and
/// reports the minimal set of changes computed by the diff engine.
///
/// # Example
///
/// ```
/// use grouplist::{Group, ListGroup};
/// # use std::sync::Arc;
/// # use std::any::Any;
/// # use grouplist::{Item, LayoutKey};
/// # struct Row(u64);
/// # impl Item for Row {
/// #     fn id(&self) -> u64 { self.0 }
/// #     fn layout_key(&self) -> LayoutKey { LayoutKey(0) }
/// #     fn content_equals(&self, _: &dyn Item) -> bool { true }
/// #     fn as_any(&self) -> &dyn Any { self }
/// # }
///
/// let group = ListGroup::empty();
/// group.push(Arc::new(Row(1)));
/// group.push(Arc::new(Row(2)));
/// assert_eq!(group.item_count(), 2);
/// ```
pub struct ListGroup {
    items: RwLock<Vec<ItemRef>>,
    observers: ObserverSet,
}

impl ListGroup {
    /// Create a group holding `items`.
    pub fn new(items: Vec<ItemRef>) -> Arc<Self> {
        Arc::new(Self {
            items: RwLock::new(items),
            observers: ObserverSet::new(),
        })
    }

    /// Create an empty group.
    pub fn empty() -> Arc<Self> {
        Self::new(Vec::new())
    }

    /// Get the number of items.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Check if the group is empty.
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// A snapshot of the items.
    pub fn items(&self) -> Vec<ItemRef> {
        self.items.read().clone()
    }

    /// Append an item.
    pub fn push(&self, item: ItemRef) {
        let position = {
            let mut items = self.items.write();
            items.push(item);
            items.len() - 1
        };
        self.notify(GroupChange::item_inserted(position));
    }

    /// Append several items, reported as one inserted range.
    pub fn extend(&self, new_items: impl IntoIterator<Item = ItemRef>) {
        let (start, count) = {
            let mut items = self.items.write();
            let start = items.len();
            items.extend(new_items);
            (start, items.len() - start)
        };
        if count > 0 {
            self.notify(GroupChange::ItemRangeInserted { start, count });
        }
    }

    /// Insert an item at `index`.
    pub fn insert(&self, index: usize, item: ItemRef) -> Result<()> {
        {
            let mut items = self.items.write();
            if index > items.len() {
                return Err(AdapterError::OutOfRange {
                    index,
                    len: items.len(),
                });
            }
            items.insert(index, item);
        }
        self.notify(GroupChange::item_inserted(index));
        Ok(())
    }

    /// Remove and return the item at `index`.
    pub fn remove(&self, index: usize) -> Result<ItemRef> {
        let removed = {
            let mut items = self.items.write();
            if index >= items.len() {
                return Err(AdapterError::OutOfRange {
                    index,
                    len: items.len(),
                });
            }
            items.remove(index)
        };
        self.notify(GroupChange::item_removed(index));
        Ok(removed)
    }

    /// Remove this exact item instance.
    pub fn remove_item(&self, item: &dyn Item) -> Result<ItemRef> {
        let index = self
            .position_of(item)
            .ok_or_else(|| AdapterError::InvalidArgument("item is not in this group".into()))?;
        self.remove(index)
    }

    /// Replace the item at `index`.
    ///
    /// The change payload comes from the previous item's
    /// [`change_payload`](Item::change_payload).
    pub fn replace(&self, index: usize, item: ItemRef) -> Result<ItemRef> {
        let previous = {
            let mut items = self.items.write();
            let len = items.len();
            let slot = items
                .get_mut(index)
                .ok_or(AdapterError::OutOfRange { index, len })?;
            std::mem::replace(slot, item.clone())
        };
        let payload = previous.change_payload(item.as_ref());
        self.notify(GroupChange::item_changed(index, payload));
        Ok(previous)
    }

    /// Move the item at `from` so that it ends up at `to`.
    pub fn move_item(&self, from: usize, to: usize) -> Result<()> {
        {
            let mut items = self.items.write();
            let len = items.len();
            if from >= len {
                return Err(AdapterError::OutOfRange { index: from, len });
            }
            if to >= len {
                return Err(AdapterError::OutOfRange { index: to, len });
            }
            if from == to {
                return Ok(());
            }
            let item = items.remove(from);
            items.insert(to, item);
        }
        self.notify(GroupChange::ItemMoved { from, to });
        Ok(())
    }

    /// Remove every item.
    pub fn clear(&self) {
        let count = std::mem::take(&mut *self.items.write()).len();
        if count > 0 {
            self.notify(GroupChange::ItemRangeRemoved { start: 0, count });
        }
    }

    /// Replace the contents with `items`, notifying the minimal changes.
    pub fn update(&self, items: Vec<ItemRef>, detect_moves: bool) {
        let old = std::mem::replace(&mut *self.items.write(), items.clone());
        let diff = calculate_diff(&old, &items, detect_moves);
        for event in diff.events() {
            self.notify(local_change(event));
        }
    }

    /// Notify that every item may have changed.
    pub fn notify_changed(&self) {
        self.notify(GroupChange::Changed);
    }

    fn notify(&self, change: GroupChange) {
        self.observers.notify(self, change);
    }
}

fn local_change(event: &UpdateEvent) -> GroupChange {
    match event {
        UpdateEvent::Inserted { position, count } => GroupChange::ItemRangeInserted {
            start: *position,
            count: *count,
        },
        UpdateEvent::Removed { position, count } => GroupChange::ItemRangeRemoved {
            start: *position,
            count: *count,
        },
        UpdateEvent::Moved { from, to } => GroupChange::ItemMoved { from: *from, to: *to },
        UpdateEvent::Changed {
            position,
            count,
            payload,
        } => GroupChange::ItemRangeChanged {
            start: *position,
            count: *count,
            payload: payload.clone(),
        },
        UpdateEvent::Reset => GroupChange::Changed,
    }
}

impl Group for ListGroup {
    fn item_count(&self) -> usize {
        self.len()
    }

    fn item_at(&self, position: usize) -> Option<ItemRef> {
        self.items.read().get(position).cloned()
    }

    fn position_of(&self, item: &dyn Item) -> Option<usize> {
        self.items
            .read()
            .iter()
            .position(|candidate| is_same_instance(candidate.as_ref(), item))
    }

    fn attach(&self, observer: ObserverHandle) {
        self.observers.attach(observer);
    }

    fn detach(&self, observer: &ObserverHandle) {
        self.observers.detach(observer);
    }

    fn append_items(&self, out: &mut Vec<ItemRef>) {
        out.extend(self.items.read().iter().cloned());
    }
}

impl std::fmt::Debug for ListGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListGroup")
            .field("len", &self.len())
            .field("observers", &self.observers)
            .finish()
    }
}

static_assertions::assert_impl_all!(ListGroup: Send, Sync);
