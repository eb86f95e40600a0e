//! Mapping between flat positions and `(group, local position)` pairs.
//!
//! These are pure functions over a slice of groups. Every call walks the
//! groups from the front, so lookups are linear in the number of groups.

use crate::error::{AdapterError, Result};
use crate::group::{Group, GroupRef, is_same_group};
use crate::item::{Item, ItemRef};

/// Total number of items across `groups`.
pub fn total_count(groups: &[GroupRef]) -> usize {
    groups.iter().map(|group| group.item_count()).sum()
}

/// The item at flat `position`.
pub fn item_at(groups: &[GroupRef], position: usize) -> Result<ItemRef> {
    let (index, local) = locate(groups, position)?;
    let group = &groups[index];
    group.item_at(local).ok_or(AdapterError::OutOfRange {
        index: local,
        len: group.item_count(),
    })
}

/// Index of the group holding flat `position`.
pub fn group_index_at(groups: &[GroupRef], position: usize) -> Result<usize> {
    locate(groups, position).map(|(index, _)| index)
}

/// Number of items in groups before `group_index`.
///
/// Indices past the end count every group.
pub fn flat_index_before(groups: &[GroupRef], group_index: usize) -> usize {
    total_count(&groups[..group_index.min(groups.len())])
}

/// Flat position of the first item of the first occurrence of `group`.
pub fn flat_index_of_group(groups: &[GroupRef], group: &dyn Group) -> Option<usize> {
    let mut offset = 0;
    for candidate in groups {
        if is_same_group(candidate.as_ref(), group) {
            return Some(offset);
        }
        offset += candidate.item_count();
    }
    None
}

/// Flat position of `item`, searching groups in order.
pub fn flat_index_of_item(groups: &[GroupRef], item: &dyn Item) -> Option<usize> {
    let mut offset = 0;
    for group in groups {
        if let Some(local) = group.position_of(item) {
            return Some(offset + local);
        }
        offset += group.item_count();
    }
    None
}

/// Index of the first group containing `item`.
pub fn group_containing_item(groups: &[GroupRef], item: &dyn Item) -> Option<usize> {
    groups
        .iter()
        .position(|group| group.position_of(item).is_some())
}

/// Every item of every group, in flat order.
pub fn flatten(groups: &[GroupRef]) -> Vec<ItemRef> {
    let mut items = Vec::with_capacity(total_count(groups));
    for group in groups {
        group.append_items(&mut items);
    }
    items
}

fn locate(groups: &[GroupRef], position: usize) -> Result<(usize, usize)> {
    let mut remaining = position;
    for (index, group) in groups.iter().enumerate() {
        let count = group.item_count();
        if remaining < count {
            return Ok((index, remaining));
        }
        remaining -= count;
    }
    Err(AdapterError::OutOfRange {
        index: position,
        len: position - remaining,
    })
}
