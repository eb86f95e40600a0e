//! Items: the leaf cells of a list.
//!
//! An [`Item`] owns everything the adapter needs to know about one row: a
//! stable identity, a view type, content equality, and how to describe what
//! changed between two versions of itself.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::holder::{HostView, ViewHolder};

/// A shared, thread-safe handle to an item.
///
/// Snapshots of `ItemRef`s are what the diff engine works on, so items must
/// be `Send + Sync`.
pub type ItemRef = Arc<dyn Item>;

/// Opaque key identifying the view template an item is drawn with.
///
/// Hosts map it to whatever they inflate views from (a layout resource, a
/// widget constructor, ...). By default an item's view type is its layout key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayoutKey(pub i32);

impl LayoutKey {
    /// The view type derived from this layout key.
    pub const fn view_type(self) -> i32 {
        self.0
    }
}

/// An opaque description of what changed between two versions of an item.
///
/// Payloads are produced by [`Item::change_payload`] and passed through to
/// the update sink and to [`Item::bind`] untouched.
#[derive(Clone)]
pub struct Payload(Arc<dyn Any + Send + Sync>);

impl Payload {
    /// Wrap a value as a payload.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Borrow the payload as `T`, if that is what it holds.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Whether both handles refer to the same payload value.
    pub fn ptr_eq(&self, other: &Payload) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Payload {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Payload(..)")
    }
}

/// A single cell in the list.
///
/// # Implementation Requirements
///
/// At minimum, implement:
/// - [`id`](Item::id) - stable identity for the item's lifetime
/// - [`layout_key`](Item::layout_key) - which view template draws it
/// - [`content_equals`](Item::content_equals) - value equality with another item
/// - [`as_any`](Item::as_any) - for downcasting in `content_equals`
///
/// # Example
///
/// ```
/// use std::any::Any;
/// use grouplist::{Item, LayoutKey};
///
/// struct Contact {
///     id: u64,
///     name: String,
/// }
///
/// impl Item for Contact {
///     fn id(&self) -> u64 {
///         self.id
///     }
///
///     fn layout_key(&self) -> LayoutKey {
///         LayoutKey(1)
///     }
///
///     fn content_equals(&self, other: &dyn Item) -> bool {
///         other
///             .as_any()
///             .downcast_ref::<Contact>()
///             .is_some_and(|other| other.name == self.name)
///     }
///
///     fn as_any(&self) -> &dyn Any {
///         self
///     }
/// }
/// ```
pub trait Item: Send + Sync + 'static {
    /// Stable identity of this item.
    fn id(&self) -> u64;

    /// The view template this item is drawn with.
    fn layout_key(&self) -> LayoutKey;

    /// Whether this item has the same contents as `other`.
    ///
    /// Only called on items that are the same entity
    /// ([`is_same_as`](Item::is_same_as)); a `false` makes the diff engine
    /// emit a change for the pair.
    fn content_equals(&self, other: &dyn Item) -> bool;

    /// Get this as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    // -------------------------------------------------------------------------
    // Optional methods with default implementations
    // -------------------------------------------------------------------------

    /// The view type reported to the list view. Defaults to the layout key.
    fn view_type(&self) -> i32 {
        self.layout_key().view_type()
    }

    /// Whether `other` represents the same entity as this item.
    ///
    /// The default compares view type and id.
    fn is_same_as(&self, other: &dyn Item) -> bool {
        self.view_type() == other.view_type() && self.id() == other.id()
    }

    /// Describe what changed between this item and its `newer` version.
    ///
    /// Returning `None` asks the list view for a full rebind.
    fn change_payload(&self, _newer: &dyn Item) -> Option<Payload> {
        None
    }

    /// How many grid columns this item spans at `position`.
    fn span_size(&self, span_count: usize, _position: usize) -> usize {
        span_count
    }

    /// Whether clicks on the item's root view reach the click listener.
    fn is_clickable(&self) -> bool {
        true
    }

    /// Whether long clicks on the item's root view reach the long-click listener.
    fn is_long_clickable(&self) -> bool {
        true
    }

    /// Whether the item's view may be recycled even if it has transient state.
    fn is_recyclable(&self) -> bool {
        true
    }

    /// Wrap a freshly inflated view in a holder.
    fn create_view_holder(&self, view: HostView) -> ViewHolder {
        ViewHolder::new(view)
    }

    /// Populate `holder` for `position`.
    ///
    /// `payloads` is empty for a full bind, otherwise it carries the change
    /// payloads accumulated since the last bind.
    fn bind(&self, _holder: &mut ViewHolder, _position: usize, _payloads: &[Payload]) {}

    /// Release anything `bind` set up.
    fn unbind(&self, _holder: &mut ViewHolder) {}
}

impl fmt::Debug for dyn Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("id", &self.id())
            .field("view_type", &self.view_type())
            .finish()
    }
}

/// Whether `a` and `b` are the very same item instance.
pub fn is_same_instance(a: &dyn Item, b: &dyn Item) -> bool {
    std::ptr::addr_eq(a as *const dyn Item, b as *const dyn Item)
}
