//! Groups of groups.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::trace;

use grouplist_core::targets;

use super::{Group, GroupChange, GroupObserver, GroupRef, ObserverHandle, ObserverSet, index_of_group};
use crate::error::{AdapterError, Result};
use crate::item::{Item, ItemRef};

/// A group whose items are the concatenation of its child groups.
///
/// A `NestedGroup` observes its children and re-publishes their changes
/// shifted by the child's offset, so trees of groups look like a single
/// flat group to whoever observes the root.
pub struct NestedGroup {
    children: RwLock<Vec<GroupRef>>,
    observers: ObserverSet,
    this: Weak<NestedGroup>,
}

impl NestedGroup {
    /// Create an empty nested group.
    pub fn new() -> Arc<Self> {
        Self::with_children(Vec::new())
    }

    /// Create a nested group holding `children`.
    pub fn with_children(children: Vec<GroupRef>) -> Arc<Self> {
        let group = Arc::new_cyclic(|this| Self {
            children: RwLock::new(Vec::new()),
            observers: ObserverSet::new(),
            this: this.clone(),
        });
        for child in &children {
            child.attach(group.handle());
        }
        *group.children.write() = children;
        group
    }

    fn handle(&self) -> ObserverHandle {
        let weak: Weak<NestedGroup> = self.this.clone();
        weak
    }

    /// Number of direct children.
    pub fn child_count(&self) -> usize {
        self.children.read().len()
    }

    /// The child at `index`.
    pub fn child_at(&self, index: usize) -> Option<GroupRef> {
        self.children.read().get(index).cloned()
    }

    /// A snapshot of the children.
    pub fn children(&self) -> Vec<GroupRef> {
        self.children.read().clone()
    }

    /// Append a child.
    pub fn add(&self, child: GroupRef) {
        child.attach(self.handle());
        let count = child.item_count();
        let start = {
            let mut children = self.children.write();
            let start = flat_count(&children);
            children.push(child);
            start
        };
        self.notify_inserted(start, count);
    }

    /// Insert a child at `index`.
    pub fn add_at(&self, index: usize, child: GroupRef) -> Result<()> {
        let len = self.child_count();
        if index > len {
            return Err(AdapterError::GroupOutOfRange { index, len });
        }
        child.attach(self.handle());
        let count = child.item_count();
        let start = {
            let mut children = self.children.write();
            let start = flat_count(&children[..index]);
            children.insert(index, child);
            start
        };
        self.notify_inserted(start, count);
        Ok(())
    }

    /// Remove the first occurrence of `child`.
    pub fn remove(&self, child: &dyn Group) -> Result<GroupRef> {
        let index = index_of_group(&self.children.read(), child)
            .ok_or_else(|| AdapterError::InvalidArgument("group is not a child".into()))?;
        self.remove_at(index)
    }

    /// Remove the child at `index`.
    pub fn remove_at(&self, index: usize) -> Result<GroupRef> {
        let (start, removed, still_present) = {
            let mut children = self.children.write();
            let len = children.len();
            if index >= len {
                return Err(AdapterError::GroupOutOfRange { index, len });
            }
            let start = flat_count(&children[..index]);
            let removed = children.remove(index);
            let still_present = index_of_group(&children, removed.as_ref()).is_some();
            (start, removed, still_present)
        };
        if !still_present {
            removed.detach(&self.handle());
        }
        let count = removed.item_count();
        if count > 0 {
            self.observers
                .notify(self, GroupChange::ItemRangeRemoved { start, count });
        }
        Ok(removed)
    }

    /// Remove every child.
    pub fn clear(&self) {
        let removed = std::mem::take(&mut *self.children.write());
        let handle = self.handle();
        for child in &removed {
            child.detach(&handle);
        }
        let count = flat_count(&removed);
        if count > 0 {
            self.observers
                .notify(self, GroupChange::ItemRangeRemoved { start: 0, count });
        }
    }

    fn notify_inserted(&self, start: usize, count: usize) {
        if count > 0 {
            self.observers
                .notify(self, GroupChange::ItemRangeInserted { start, count });
        }
    }
}

fn flat_count(children: &[GroupRef]) -> usize {
    children.iter().map(|child| child.item_count()).sum()
}

impl Group for NestedGroup {
    fn item_count(&self) -> usize {
        flat_count(&self.children.read())
    }

    fn item_at(&self, position: usize) -> Option<ItemRef> {
        let children = self.children.read();
        let mut remaining = position;
        for child in children.iter() {
            let count = child.item_count();
            if remaining < count {
                return child.item_at(remaining);
            }
            remaining -= count;
        }
        None
    }

    fn position_of(&self, item: &dyn Item) -> Option<usize> {
        let children = self.children.read();
        let mut offset = 0;
        for child in children.iter() {
            if let Some(local) = child.position_of(item) {
                return Some(offset + local);
            }
            offset += child.item_count();
        }
        None
    }

    fn attach(&self, observer: ObserverHandle) {
        self.observers.attach(observer);
    }

    fn detach(&self, observer: &ObserverHandle) {
        self.observers.detach(observer);
    }

    fn append_items(&self, out: &mut Vec<ItemRef>) {
        for child in self.children.read().iter() {
            child.append_items(out);
        }
    }
}

impl GroupObserver for NestedGroup {
    fn on_group_change(&self, group: &dyn Group, change: GroupChange) {
        let offset = {
            let children = self.children.read();
            index_of_group(&children, group).map(|index| flat_count(&children[..index]))
        };
        let Some(offset) = offset else {
            trace!(target: targets::GROUP, "ignoring change from a detached child");
            return;
        };

        let change = match change {
            GroupChange::Changed => GroupChange::ItemRangeChanged {
                start: offset,
                count: group.item_count(),
                payload: None,
            },
            other => other.offset_by(offset),
        };
        self.observers.notify(self, change);
    }
}

impl std::fmt::Debug for NestedGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NestedGroup")
            .field("children", &self.child_count())
            .field("observers", &self.observers)
            .finish()
    }
}

static_assertions::assert_impl_all!(NestedGroup: Send, Sync);
