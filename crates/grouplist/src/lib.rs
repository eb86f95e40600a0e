//! Grouplist - hierarchical list adapters for virtualized list views.
//!
//! Items are organized into [`Group`]s: a single item ([`ItemGroup`]), a
//! flat list ([`ListGroup`]) or a group of groups ([`NestedGroup`]). A
//! [`GroupAdapter`] holds an ordered list of top-level groups and presents
//! them as one flat list, forwarding every change as positional
//! notifications to an [`UpdateSink`].
//!
//! Replacing the whole content is a bulk update: the old and new flat lists
//! are diffed and only the minimal set of inserts, removals, moves and
//! changes is reported. The diff can run synchronously or on an
//! [`Executor`], with results applied back on the adapter's own thread.
//!
//! # Example
//!
//! ```
//! use std::any::Any;
//! use std::sync::Arc;
//! use grouplist::{GroupAdapter, GroupRef, Item, LayoutKey, ListGroup, RecordingSink, UpdateEvent};
//!
//! struct Contact {
//!     id: u64,
//!     name: String,
//! }
//!
//! impl Item for Contact {
//!     fn id(&self) -> u64 {
//!         self.id
//!     }
//!
//!     fn layout_key(&self) -> LayoutKey {
//!         LayoutKey(1)
//!     }
//!
//!     fn content_equals(&self, other: &dyn Item) -> bool {
//!         other
//!             .as_any()
//!             .downcast_ref::<Contact>()
//!             .is_some_and(|other| other.name == self.name)
//!     }
//!
//!     fn as_any(&self) -> &dyn Any {
//!         self
//!     }
//! }
//!
//! fn contact(id: u64, name: &str) -> Arc<dyn Item> {
//!     Arc::new(Contact { id, name: name.into() })
//! }
//!
//! let adapter = GroupAdapter::new();
//! let sink = Arc::new(RecordingSink::new());
//! adapter.set_update_sink(Some(sink.clone()));
//!
//! adapter.add(ListGroup::new(vec![contact(1, "Ada"), contact(2, "Grace")]));
//! sink.take();
//!
//! let next: GroupRef = ListGroup::new(vec![contact(1, "Ada"), contact(2, "Grace Hopper")]);
//! adapter.update(vec![next], true);
//! assert_eq!(
//!     sink.take(),
//!     vec![UpdateEvent::Changed { position: 1, count: 1, payload: None }]
//! );
//! ```

mod adapter;
mod async_diff;
mod config;
mod diff;
mod error;
pub mod flatten;
mod group;
mod holder;
mod item;
mod sink;
mod view_type;

#[cfg(test)]
mod testing;

pub use adapter::GroupAdapter;
pub use async_diff::{AsyncDiffState, CompletionSink};
pub use config::AdapterConfig;
pub use diff::{DiffResult, calculate_diff};
pub use error::{AdapterError, Result};
pub use group::{
    Group, GroupChange, GroupObserver, GroupRef, ItemGroup, ListGroup, NestedGroup, ObserverHandle,
    ObserverSet, is_same_group,
};
pub use holder::{
    HostView, ItemClickListener, ItemLongClickListener, ViewFactory, ViewHolder,
};
pub use item::{Item, ItemRef, LayoutKey, Payload, is_same_instance};
pub use sink::{RecordingSink, SignalSink, UpdateEvent, UpdateSink};
pub use view_type::ViewTypeCache;

pub use grouplist_core::{
    Executor, ExecutorError, InlineExecutor, Task, ThreadPool, ThreadPoolConfig,
};
