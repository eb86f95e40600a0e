//! The one-slot view-type cache.
//!
//! List views ask for a view type per position and then, separately, for a
//! view of that type. The second call only carries the type, so the adapter
//! remembers the last item whose type it reported and checks it first.

use crate::error::{AdapterError, Result};
use crate::item::ItemRef;

/// Remembers the item most recently asked for its view type.
#[derive(Default)]
pub struct ViewTypeCache {
    last_item: Option<ItemRef>,
    hits: u64,
    misses: u64,
}

impl ViewTypeCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember `item` as the last one asked for its view type.
    pub fn remember(&mut self, item: ItemRef) {
        self.last_item = Some(item);
    }

    /// The remembered item, if any.
    pub fn last_item(&self) -> Option<&ItemRef> {
        self.last_item.as_ref()
    }

    /// Forget the remembered item.
    pub fn clear(&mut self) {
        self.last_item = None;
    }

    /// Find an item with `view_type`.
    ///
    /// The remembered item is returned if its type matches. Otherwise
    /// `scan()` is searched front to back.
    pub fn lookup<I>(&mut self, view_type: i32, scan: impl FnOnce() -> I) -> Result<ItemRef>
    where
        I: IntoIterator<Item = ItemRef>,
    {
        if let Some(item) = &self.last_item {
            if item.view_type() == view_type {
                self.hits += 1;
                return Ok(item.clone());
            }
        }

        self.misses += 1;
        scan()
            .into_iter()
            .find(|item| item.view_type() == view_type)
            .ok_or(AdapterError::UnknownViewType(view_type))
    }

    /// Number of lookups answered by the remembered item.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Number of lookups that had to scan.
    pub fn misses(&self) -> u64 {
        self.misses
    }
}

impl std::fmt::Debug for ViewTypeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewTypeCache")
            .field("last_view_type", &self.last_item.as_ref().map(|item| item.view_type()))
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .finish()
    }
}
