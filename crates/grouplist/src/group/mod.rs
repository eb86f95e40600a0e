//! Groups: ordered containers of items that report their own changes.
//!
//! A [`Group`] exposes a flat, locally indexed view of its items and
//! notifies attached [`GroupObserver`]s whenever that view changes. The
//! adapter is one such observer; a [`NestedGroup`] is another, which is how
//! groups compose into trees.
//!
//! # Observer Contract
//!
//! - Groups hold observers weakly; a dropped observer is pruned on the next
//!   notification.
//! - Attaching the same observer twice registers it once.
//! - Change positions are local to the notifying group and are valid in the
//!   group's state *after* the change.
//! - Groups release their own locks before notifying, so observers may query
//!   the group from inside the callback.

mod item_group;
mod list_group;
mod nested;
mod observers;

use std::sync::{Arc, Weak};

use crate::item::{ItemRef, Payload};

pub use item_group::ItemGroup;
pub use list_group::ListGroup;
pub use nested::NestedGroup;
pub use observers::ObserverSet;

/// A shared, thread-safe handle to a group.
pub type GroupRef = Arc<dyn Group>;

/// A weak handle to a group observer.
pub type ObserverHandle = Weak<dyn GroupObserver>;

/// An ordered container of items.
pub trait Group: Send + Sync {
    /// Number of items in this group, including those of nested groups.
    fn item_count(&self) -> usize;

    /// The item at a group-local position, or `None` if out of range.
    fn item_at(&self, position: usize) -> Option<ItemRef>;

    /// The group-local position of this exact item instance.
    fn position_of(&self, item: &dyn crate::Item) -> Option<usize>;

    /// Register an observer. Registering an already-attached observer is a no-op.
    fn attach(&self, observer: ObserverHandle);

    /// Unregister an observer. Unknown observers are ignored.
    fn detach(&self, observer: &ObserverHandle);

    /// Append every item, in order, to `out`.
    fn append_items(&self, out: &mut Vec<ItemRef>) {
        out.extend((0..self.item_count()).filter_map(|position| self.item_at(position)));
    }
}

/// Receives change notifications from groups.
pub trait GroupObserver: Send + Sync {
    /// Called after `group` changed.
    fn on_group_change(&self, group: &dyn Group, change: GroupChange);
}

/// A change reported by a group, in group-local positions.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupChange {
    /// Every item of the group may have changed; the count is unchanged.
    Changed,
    /// `count` items were inserted starting at `start`.
    ItemRangeInserted {
        /// First inserted position.
        start: usize,
        /// Number of inserted items.
        count: usize,
    },
    /// `count` items were removed starting at `start`.
    ItemRangeRemoved {
        /// First removed position.
        start: usize,
        /// Number of removed items.
        count: usize,
    },
    /// `count` items starting at `start` changed in place.
    ItemRangeChanged {
        /// First changed position.
        start: usize,
        /// Number of changed items.
        count: usize,
        /// What changed, if the group knows.
        payload: Option<Payload>,
    },
    /// One item moved from `from` to `to`.
    ItemMoved {
        /// Position before the move.
        from: usize,
        /// Position after the move.
        to: usize,
    },
}

impl GroupChange {
    /// A single item was inserted.
    pub fn item_inserted(position: usize) -> Self {
        Self::ItemRangeInserted { start: position, count: 1 }
    }

    /// A single item was removed.
    pub fn item_removed(position: usize) -> Self {
        Self::ItemRangeRemoved { start: position, count: 1 }
    }

    /// A single item changed.
    pub fn item_changed(position: usize, payload: Option<Payload>) -> Self {
        Self::ItemRangeChanged { start: position, count: 1, payload }
    }

    /// Shift every position by `offset`.
    ///
    /// `Changed` has no positions and is returned as is.
    pub fn offset_by(self, offset: usize) -> Self {
        match self {
            Self::Changed => Self::Changed,
            Self::ItemRangeInserted { start, count } => Self::ItemRangeInserted {
                start: start + offset,
                count,
            },
            Self::ItemRangeRemoved { start, count } => Self::ItemRangeRemoved {
                start: start + offset,
                count,
            },
            Self::ItemRangeChanged { start, count, payload } => Self::ItemRangeChanged {
                start: start + offset,
                count,
                payload,
            },
            Self::ItemMoved { from, to } => Self::ItemMoved {
                from: from + offset,
                to: to + offset,
            },
        }
    }
}

/// Whether `a` and `b` are the same group instance.
pub fn is_same_group(a: &dyn Group, b: &dyn Group) -> bool {
    std::ptr::addr_eq(a as *const dyn Group, b as *const dyn Group)
}

/// Index of the first occurrence of `group` in `groups`, by identity.
pub(crate) fn index_of_group(groups: &[GroupRef], group: &dyn Group) -> Option<usize> {
    groups
        .iter()
        .position(|candidate| is_same_group(candidate.as_ref(), group))
}
