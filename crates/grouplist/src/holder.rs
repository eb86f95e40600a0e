//! View holders and the host-facing view protocol.
//!
//! The adapter never draws anything. The host inflates a view for a
//! [`LayoutKey`](crate::LayoutKey) through a [`ViewFactory`], the item wraps
//! it in a [`ViewHolder`], and the adapter wires click listeners and binding
//! through the holder.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::item::{ItemRef, LayoutKey};

/// A host view, opaque to the adapter.
pub type HostView = Box<dyn Any + Send>;

/// Called when a bound item's view is clicked: `(item, flat_position)`.
pub type ItemClickListener = Arc<dyn Fn(&ItemRef, usize) + Send + Sync>;

/// Called when a bound item's view is long-clicked: `(item, flat_position)`.
///
/// Returns whether the long click was consumed.
pub type ItemLongClickListener = Arc<dyn Fn(&ItemRef, usize) -> bool + Send + Sync>;

/// Inflates host views for layout keys.
pub trait ViewFactory {
    /// Create a fresh view for `layout`.
    fn inflate(&self, layout: LayoutKey) -> HostView;
}

impl<F> ViewFactory for F
where
    F: Fn(LayoutKey) -> HostView,
{
    fn inflate(&self, layout: LayoutKey) -> HostView {
        self(layout)
    }
}

/// Holds a host view together with the item currently bound to it.
pub struct ViewHolder {
    view: HostView,
    item: Option<ItemRef>,
    position: Option<usize>,
    on_click: Option<ItemClickListener>,
    on_long_click: Option<ItemLongClickListener>,
}

impl ViewHolder {
    /// Wrap a host view.
    pub fn new(view: HostView) -> Self {
        Self {
            view,
            item: None,
            position: None,
            on_click: None,
            on_long_click: None,
        }
    }

    /// Borrow the host view as `T`.
    pub fn view<T: Any>(&self) -> Option<&T> {
        self.view.downcast_ref::<T>()
    }

    /// Mutably borrow the host view as `T`.
    pub fn view_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.view.downcast_mut::<T>()
    }

    /// The item currently bound to this holder.
    pub fn item(&self) -> Option<&ItemRef> {
        self.item.as_ref()
    }

    /// The flat position this holder was last bound at.
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    /// Whether an item is bound.
    pub fn is_bound(&self) -> bool {
        self.item.is_some()
    }

    /// Whether a click listener is wired to the root view.
    pub fn has_click_listener(&self) -> bool {
        self.on_click.is_some()
    }

    /// Whether a long-click listener is wired to the root view.
    pub fn has_long_click_listener(&self) -> bool {
        self.on_long_click.is_some()
    }

    /// Deliver a click on the root view.
    ///
    /// Returns `false` if nothing is bound or no listener is wired.
    pub fn perform_click(&self) -> bool {
        match (&self.item, self.position, &self.on_click) {
            (Some(item), Some(position), Some(listener)) => {
                listener(item, position);
                true
            }
            _ => false,
        }
    }

    /// Deliver a long click on the root view. Returns whether it was consumed.
    pub fn perform_long_click(&self) -> bool {
        match (&self.item, self.position, &self.on_long_click) {
            (Some(item), Some(position), Some(listener)) => listener(item, position),
            _ => false,
        }
    }

    pub(crate) fn attach(
        &mut self,
        item: ItemRef,
        position: usize,
        on_click: Option<ItemClickListener>,
        on_long_click: Option<ItemLongClickListener>,
    ) {
        self.on_click = on_click.filter(|_| item.is_clickable());
        self.on_long_click = on_long_click.filter(|_| item.is_long_clickable());
        self.item = Some(item);
        self.position = Some(position);
    }

    pub(crate) fn detach(&mut self) -> Option<ItemRef> {
        self.on_click = None;
        self.on_long_click = None;
        self.position = None;
        self.item.take()
    }
}

impl fmt::Debug for ViewHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewHolder")
            .field("item_id", &self.item.as_ref().map(|item| item.id()))
            .field("position", &self.position)
            .field("has_click_listener", &self.has_click_listener())
            .field("has_long_click_listener", &self.has_long_click_listener())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestItem;
    use parking_lot::Mutex;

    #[test]
    fn test_view_downcast() {
        let mut holder = ViewHolder::new(Box::new(String::from("label")));
        assert_eq!(holder.view::<String>().map(String::as_str), Some("label"));
        holder.view_mut::<String>().unwrap().push('!');
        assert_eq!(holder.view::<String>().map(String::as_str), Some("label!"));
        assert!(holder.view::<u32>().is_none());
    }

    #[test]
    fn test_click_reaches_listener() {
        let clicks = Arc::new(Mutex::new(Vec::new()));
        let clicks_clone = clicks.clone();
        let listener: ItemClickListener = Arc::new(move |item, position| {
            clicks_clone.lock().push((item.id(), position));
        });

        let mut holder = ViewHolder::new(Box::new(()));
        assert!(!holder.perform_click());

        holder.attach(Arc::new(TestItem::new(7, "a")), 3, Some(listener), None);
        assert!(holder.perform_click());
        assert!(!holder.perform_long_click());
        assert_eq!(*clicks.lock(), vec![(7, 3)]);

        let detached = holder.detach();
        assert_eq!(detached.map(|item| item.id()), Some(7));
        assert!(!holder.perform_click());
    }

    #[test]
    fn test_unclickable_item_gets_no_listener() {
        let listener: ItemClickListener = Arc::new(|_, _| {});
        let long_listener: ItemLongClickListener = Arc::new(|_, _| true);

        let mut holder = ViewHolder::new(Box::new(()));
        let item = TestItem::new(1, "a").clickable(false);
        holder.attach(Arc::new(item), 0, Some(listener), Some(long_listener));

        assert!(!holder.has_click_listener());
        assert!(holder.has_long_click_listener());
        assert!(holder.perform_long_click());
    }

    #[test]
    fn test_closure_view_factory() {
        let factory = |layout: LayoutKey| -> HostView { Box::new(layout.0) };
        let view = factory.inflate(LayoutKey(4));
        assert_eq!(view.downcast_ref::<i32>(), Some(&4));
    }
}
