//! The group adapter.
//!
//! [`GroupAdapter`] owns an ordered list of top-level groups and presents
//! them as one flat, positionally indexed list. It observes every group it
//! holds, translates their local change notifications into flat positions
//! and forwards them to a single [`UpdateSink`].
//!
//! # Threading
//!
//! An adapter belongs to the thread that created it. Every method and every
//! group mutation must happen on that thread; only diff computations run
//! elsewhere. Violations are caught by debug assertions (or always, with
//! [`AdapterConfig::strict_thread_checks`]).
//!
//! # Bulk and Fine-Grained Updates
//!
//! Fine-grained mutations (adding or removing groups, groups changing
//! themselves) are published immediately. Bulk updates replace the whole
//! group list and publish the diff between the old and new flat lists.
//! Interleaving fine-grained mutations with an asynchronous bulk update that
//! has not been applied yet is not reconciled: the sink may be out of sync
//! until the next bulk update.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use grouplist_core::{Executor, ThreadAffinity, ThreadPool, targets};

use crate::async_diff::{AsyncDiffController, AsyncDiffState, CompletionSink};
use crate::config::AdapterConfig;
use crate::diff::{DiffResult, calculate_diff};
use crate::error::{AdapterError, Result};
use crate::flatten;
use crate::group::{Group, GroupChange, GroupObserver, GroupRef, ObserverHandle, index_of_group};
use crate::holder::{ItemClickListener, ItemLongClickListener, ViewFactory, ViewHolder};
use crate::item::{Item, ItemRef, Payload};
use crate::sink::{UpdateEvent, UpdateSink};
use crate::view_type::ViewTypeCache;

/// The state shared with the groups the adapter observes.
struct AdapterInner {
    groups: RwLock<Vec<GroupRef>>,
    sink: RwLock<Option<Arc<dyn UpdateSink>>>,
    affinity: ThreadAffinity,
    this: Weak<AdapterInner>,
}

impl AdapterInner {
    fn handle(&self) -> ObserverHandle {
        let weak: Weak<AdapterInner> = self.this.clone();
        weak
    }

    fn snapshot(&self) -> Vec<GroupRef> {
        self.groups.read().clone()
    }

    fn publish(&self, event: UpdateEvent) {
        let empty = matches!(
            event,
            UpdateEvent::Inserted { count: 0, .. }
                | UpdateEvent::Removed { count: 0, .. }
                | UpdateEvent::Changed { count: 0, .. }
        );
        if empty {
            return;
        }

        let sink = self.sink.read().clone();
        trace!(target: targets::ADAPTER, ?event, "publishing update");
        if let Some(sink) = sink {
            event.dispatch_to(sink.as_ref());
        }
    }

    /// Swap in `new_groups`, moving the registration from the old groups.
    fn replace_groups(&self, new_groups: Vec<GroupRef>) {
        let handle = self.handle();
        let old_groups = std::mem::replace(&mut *self.groups.write(), new_groups.clone());
        for group in &old_groups {
            group.detach(&handle);
        }
        for group in &new_groups {
            group.attach(handle.clone());
        }
    }

    fn apply_diff(&self, new_groups: Vec<GroupRef>, diff: &DiffResult) {
        self.replace_groups(new_groups);
        for event in diff.events() {
            self.publish(event.clone());
        }
    }
}

impl GroupObserver for AdapterInner {
    fn on_group_change(&self, group: &dyn Group, change: GroupChange) {
        self.affinity.check("GroupAdapter::on_group_change");

        let offset = flatten::flat_index_of_group(&self.groups.read(), group);
        let Some(offset) = offset else {
            trace!(target: targets::ADAPTER, ?change, "ignoring change from a group not in the adapter");
            return;
        };

        let event = match change {
            GroupChange::Changed => UpdateEvent::Changed {
                position: offset,
                count: group.item_count(),
                payload: None,
            },
            GroupChange::ItemRangeInserted { start, count } => UpdateEvent::Inserted {
                position: offset + start,
                count,
            },
            GroupChange::ItemRangeRemoved { start, count } => UpdateEvent::Removed {
                position: offset + start,
                count,
            },
            GroupChange::ItemRangeChanged {
                start,
                count,
                payload,
            } => UpdateEvent::Changed {
                position: offset + start,
                count,
                payload,
            },
            GroupChange::ItemMoved { from, to } => UpdateEvent::Moved {
                from: offset + from,
                to: offset + to,
            },
        };
        self.publish(event);
    }
}

/// Presents a list of groups as one flat list.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use grouplist::{GroupAdapter, ListGroup, RecordingSink, UpdateEvent};
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
/// let adapter = GroupAdapter::new();
/// let sink = Arc::new(RecordingSink::new());
/// adapter.set_update_sink(Some(sink.clone()));
///
/// let section = ListGroup::new(vec![Arc::new(Row(1)), Arc::new(Row(2))]);
/// adapter.add(section.clone());
/// section.push(Arc::new(Row(3)));
///
/// assert_eq!(adapter.flat_count(), 3);
/// assert_eq!(
///     sink.take(),
///     vec![
///         UpdateEvent::Inserted { position: 0, count: 2 },
///         UpdateEvent::Inserted { position: 2, count: 1 },
///     ]
/// );
/// ```
pub struct GroupAdapter {
    inner: Arc<AdapterInner>,
    async_diff: AsyncDiffController,
    view_types: Mutex<ViewTypeCache>,
    span_count: AtomicUsize,
    detect_moves: bool,
    on_click: RwLock<Option<ItemClickListener>>,
    on_long_click: RwLock<Option<ItemLongClickListener>>,
}

impl Default for GroupAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupAdapter {
    /// Create an empty adapter with the default configuration.
    ///
    /// Asynchronous diffs run on the global [`ThreadPool`].
    pub fn new() -> Self {
        Self::build(AdapterConfig::default(), Arc::new(ThreadPool::global()))
    }

    /// Create an empty adapter with `config`.
    pub fn with_config(config: AdapterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, Arc::new(ThreadPool::global())))
    }

    /// Create an empty adapter that runs asynchronous diffs on `executor`.
    pub fn with_executor(config: AdapterConfig, executor: Arc<dyn Executor>) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, executor))
    }

    fn build(config: AdapterConfig, executor: Arc<dyn Executor>) -> Self {
        let affinity = ThreadAffinity::current().strict(config.strict_thread_checks);
        Self {
            inner: Arc::new_cyclic(|this| AdapterInner {
                groups: RwLock::new(Vec::new()),
                sink: RwLock::new(None),
                affinity,
                this: this.clone(),
            }),
            async_diff: AsyncDiffController::new(executor),
            view_types: Mutex::new(ViewTypeCache::new()),
            span_count: AtomicUsize::new(config.span_count),
            detect_moves: config.detect_moves,
            on_click: RwLock::new(None),
            on_long_click: RwLock::new(None),
        }
    }

    fn check(&self, operation: &str) {
        self.inner.affinity.check(operation);
    }

    /// Set the sink that receives change notifications.
    pub fn set_update_sink(&self, sink: Option<Arc<dyn UpdateSink>>) {
        *self.inner.sink.write() = sink;
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Total number of items across all groups.
    pub fn flat_count(&self) -> usize {
        flatten::total_count(&self.inner.groups.read())
    }

    /// The item at flat `position`.
    pub fn item_at(&self, position: usize) -> Result<ItemRef> {
        flatten::item_at(&self.inner.groups.read(), position)
    }

    /// Number of top-level groups.
    pub fn group_count(&self) -> usize {
        self.inner.groups.read().len()
    }

    /// The top-level group at `index`.
    pub fn group_at(&self, index: usize) -> Result<GroupRef> {
        let groups = self.inner.groups.read();
        groups.get(index).cloned().ok_or(AdapterError::GroupOutOfRange {
            index,
            len: groups.len(),
        })
    }

    /// Number of items in the top-level group at `index`.
    pub fn item_count_of_group(&self, index: usize) -> Result<usize> {
        self.group_at(index).map(|group| group.item_count())
    }

    /// A snapshot of the top-level groups.
    pub fn groups(&self) -> Vec<GroupRef> {
        self.inner.snapshot()
    }

    /// Flat position of the first item of `group`.
    pub fn flat_index_of_group(&self, group: &dyn Group) -> Option<usize> {
        flatten::flat_index_of_group(&self.inner.groups.read(), group)
    }

    /// Flat position of this exact item instance.
    pub fn flat_index_of_item(&self, item: &dyn Item) -> Option<usize> {
        flatten::flat_index_of_item(&self.inner.groups.read(), item)
    }

    /// The top-level group holding flat `position`.
    pub fn group_at_flat_index(&self, position: usize) -> Result<GroupRef> {
        let groups = self.inner.groups.read();
        flatten::group_index_at(&groups, position).map(|index| groups[index].clone())
    }

    /// The top-level group holding `item`.
    pub fn group_of_item(&self, item: &dyn Item) -> Option<GroupRef> {
        let groups = self.inner.groups.read();
        flatten::group_containing_item(&groups, item).map(|index| groups[index].clone())
    }

    /// The view type at flat `position`.
    ///
    /// Remembers the item so that a following
    /// [`create_view_holder`](Self::create_view_holder) finds it directly.
    pub fn view_type_at(&self, position: usize) -> Result<i32> {
        let item = self.item_at(position)?;
        let view_type = item.view_type();
        self.view_types.lock().remember(item);
        Ok(view_type)
    }

    /// The stable id of the item at flat `position`.
    pub fn stable_id_at(&self, position: usize) -> Result<u64> {
        self.item_at(position).map(|item| item.id())
    }

    /// How many grid columns the item at `position` spans.
    ///
    /// Positions out of range span the full width.
    pub fn span_size_at(&self, position: usize) -> usize {
        let span_count = self.span_count();
        match self.item_at(position) {
            Ok(item) => item.span_size(span_count, position),
            Err(_) => span_count,
        }
    }

    /// Number of grid columns.
    pub fn span_count(&self) -> usize {
        self.span_count.load(Ordering::Relaxed)
    }

    /// Set the number of grid columns.
    pub fn set_span_count(&self, span_count: usize) -> Result<()> {
        if span_count == 0 {
            return Err(AdapterError::InvalidArgument(
                "span count must be at least 1".into(),
            ));
        }
        self.span_count.store(span_count, Ordering::Relaxed);
        Ok(())
    }

    /// An item with `view_type`, preferring the last one asked for its type.
    pub fn item_for_view_type(&self, view_type: i32) -> Result<ItemRef> {
        let groups = self.inner.snapshot();
        self.view_types
            .lock()
            .lookup(view_type, || flatten::flatten(&groups))
    }

    // -------------------------------------------------------------------------
    // Fine-grained updates
    // -------------------------------------------------------------------------

    /// Append a group.
    pub fn add(&self, group: GroupRef) {
        self.check("GroupAdapter::add");
        group.attach(self.inner.handle());
        let count = group.item_count();
        let position = {
            let mut groups = self.inner.groups.write();
            let position = flatten::total_count(&groups);
            groups.push(group);
            position
        };
        debug!(target: targets::ADAPTER, position, count, "group added");
        self.inner.publish(UpdateEvent::Inserted { position, count });
    }

    /// Insert a group at `index`.
    pub fn add_at(&self, index: usize, group: GroupRef) -> Result<()> {
        self.check("GroupAdapter::add_at");
        let len = self.group_count();
        if index > len {
            return Err(AdapterError::GroupOutOfRange { index, len });
        }
        group.attach(self.inner.handle());
        let count = group.item_count();
        let position = {
            let mut groups = self.inner.groups.write();
            let position = flatten::flat_index_before(&groups, index);
            groups.insert(index, group);
            position
        };
        debug!(target: targets::ADAPTER, index, position, count, "group inserted");
        self.inner.publish(UpdateEvent::Inserted { position, count });
        Ok(())
    }

    /// Append several groups, reported as one inserted range.
    pub fn add_all(&self, new_groups: impl IntoIterator<Item = GroupRef>) {
        self.check("GroupAdapter::add_all");
        let new_groups: Vec<GroupRef> = new_groups.into_iter().collect();
        let handle = self.inner.handle();
        for group in &new_groups {
            group.attach(handle.clone());
        }
        let count = flatten::total_count(&new_groups);
        let position = {
            let mut groups = self.inner.groups.write();
            let position = flatten::total_count(&groups);
            groups.extend(new_groups);
            position
        };
        debug!(target: targets::ADAPTER, position, count, "groups added");
        self.inner.publish(UpdateEvent::Inserted { position, count });
    }

    /// Remove the first occurrence of `group`.
    pub fn remove(&self, group: &dyn Group) -> Result<GroupRef> {
        self.check("GroupAdapter::remove");
        let index = index_of_group(&self.inner.groups.read(), group).ok_or_else(|| {
            AdapterError::InvalidArgument("group is not in the adapter".into())
        })?;
        self.remove_index(index)
    }

    /// Remove the group at `index`.
    pub fn remove_at(&self, index: usize) -> Result<GroupRef> {
        self.check("GroupAdapter::remove_at");
        self.remove_index(index)
    }

    /// Remove each of `groups`, in order.
    ///
    /// Fails without removing anything if one of them is not in the adapter.
    pub fn remove_all(&self, groups: &[GroupRef]) -> Result<()> {
        self.check("GroupAdapter::remove_all");
        {
            let current = self.inner.groups.read();
            if groups
                .iter()
                .any(|group| index_of_group(&current, group.as_ref()).is_none())
            {
                return Err(AdapterError::InvalidArgument(
                    "group is not in the adapter".into(),
                ));
            }
        }
        for group in groups {
            self.remove(group.as_ref())?;
        }
        Ok(())
    }

    fn remove_index(&self, index: usize) -> Result<GroupRef> {
        let (position, removed, still_present) = {
            let mut groups = self.inner.groups.write();
            let len = groups.len();
            if index >= len {
                return Err(AdapterError::GroupOutOfRange { index, len });
            }
            let position = flatten::flat_index_before(&groups, index);
            let removed = groups.remove(index);
            let still_present = index_of_group(&groups, removed.as_ref()).is_some();
            (position, removed, still_present)
        };
        if !still_present {
            removed.detach(&self.inner.handle());
        }
        self.view_types.lock().clear();
        let count = removed.item_count();
        debug!(target: targets::ADAPTER, index, position, count, "group removed");
        self.inner.publish(UpdateEvent::Removed { position, count });
        Ok(removed)
    }

    /// Remove every group and tell the sink to reload.
    pub fn clear(&self) {
        self.check("GroupAdapter::clear");
        let removed = std::mem::take(&mut *self.inner.groups.write());
        let handle = self.inner.handle();
        for group in &removed {
            group.detach(&handle);
        }
        self.view_types.lock().clear();
        debug!(target: targets::ADAPTER, groups = removed.len(), "adapter cleared");
        self.inner.publish(UpdateEvent::Reset);
    }

    // -------------------------------------------------------------------------
    // Bulk updates
    // -------------------------------------------------------------------------

    /// Replace every group with `new_groups`, publishing the minimal diff.
    ///
    /// Supersedes any pending asynchronous update. Fine-grained events
    /// published before an earlier asynchronous update was applied are not
    /// reconciled.
    pub fn update(&self, new_groups: Vec<GroupRef>, detect_moves: bool) {
        self.check("GroupAdapter::update");
        let old_items = flatten::flatten(&self.inner.snapshot());
        let new_items = flatten::flatten(&new_groups);
        let diff = calculate_diff(&old_items, &new_items, detect_moves);
        self.async_diff.supersede();
        self.replace_with(new_groups, &diff);
    }

    fn replace_with(&self, new_groups: Vec<GroupRef>, diff: &DiffResult) {
        self.view_types.lock().clear();
        self.inner.apply_diff(new_groups, diff);
    }

    /// [`update`](Self::update) with the configured move detection.
    pub fn update_default(&self, new_groups: Vec<GroupRef>) {
        self.update(new_groups, self.detect_moves);
    }

    /// Replace every group with `new_groups`, diffing on the executor.
    ///
    /// The result is applied on this thread by
    /// [`process_pending_updates`](Self::process_pending_updates) or
    /// [`wait_for_pending_update`](Self::wait_for_pending_update). If another
    /// asynchronous update is submitted before that, this one is dropped and
    /// its `completion` is never called.
    ///
    /// Returns the submission's generation.
    pub fn update_async(
        &self,
        new_groups: Vec<GroupRef>,
        detect_moves: bool,
        completion: Option<CompletionSink>,
    ) -> Result<u64> {
        self.check("GroupAdapter::update_async");
        let old_items = flatten::flatten(&self.inner.snapshot());
        self.async_diff
            .submit(old_items, new_groups, detect_moves, completion)
    }

    /// [`update_async`](Self::update_async) with the configured move detection.
    pub fn update_async_default(
        &self,
        new_groups: Vec<GroupRef>,
        completion: Option<CompletionSink>,
    ) -> Result<u64> {
        self.update_async(new_groups, self.detect_moves, completion)
    }

    /// Apply any asynchronous result that has arrived, without blocking.
    ///
    /// Returns the number of submissions that finished.
    pub fn process_pending_updates(&self) -> usize {
        self.check("GroupAdapter::process_pending_updates");
        self.async_diff
            .process_pending(&mut |groups, diff| self.replace_with(groups, diff))
    }

    /// Block up to `timeout` until the pending asynchronous update finishes.
    ///
    /// Returns whether it finished.
    pub fn wait_for_pending_update(&self, timeout: Duration) -> bool {
        self.check("GroupAdapter::wait_for_pending_update");
        self.async_diff
            .wait_for_pending(timeout, &mut |groups, diff| self.replace_with(groups, diff))
    }

    /// State of the latest asynchronous update.
    pub fn async_state(&self) -> AsyncDiffState {
        self.async_diff.state()
    }

    /// Generation of the latest accepted asynchronous update.
    pub fn async_generation(&self) -> u64 {
        self.async_diff.generation()
    }

    /// Whether an asynchronous update is waiting to be applied.
    pub fn has_pending_update(&self) -> bool {
        self.async_diff.has_pending()
    }

    /// Asynchronous results applied so far.
    pub fn applied_async_updates(&self) -> u64 {
        self.async_diff.applied_count()
    }

    /// Asynchronous results discarded as stale so far.
    pub fn dropped_async_updates(&self) -> u64 {
        self.async_diff.dropped_count()
    }

    // -------------------------------------------------------------------------
    // View holders
    // -------------------------------------------------------------------------

    /// Set the listener for clicks on clickable items.
    pub fn set_on_item_click(&self, listener: Option<ItemClickListener>) {
        *self.on_click.write() = listener;
    }

    /// Set the listener for long clicks on long-clickable items.
    pub fn set_on_item_long_click(&self, listener: Option<ItemLongClickListener>) {
        *self.on_long_click.write() = listener;
    }

    /// Create a holder for `view_type`.
    ///
    /// The view is inflated from the layout key of an item with that type.
    pub fn create_view_holder(&self, view_type: i32, factory: &dyn ViewFactory) -> Result<ViewHolder> {
        let item = self.item_for_view_type(view_type)?;
        let view = factory.inflate(item.layout_key());
        Ok(item.create_view_holder(view))
    }

    /// Bind the item at `position` to `holder`.
    ///
    /// An empty `payloads` slice requests a full bind.
    pub fn bind_view_holder(
        &self,
        holder: &mut ViewHolder,
        position: usize,
        payloads: &[Payload],
    ) -> Result<()> {
        self.check("GroupAdapter::bind_view_holder");
        let item = self.item_at(position)?;
        let on_click = self.on_click.read().clone();
        let on_long_click = self.on_long_click.read().clone();
        holder.attach(item.clone(), position, on_click, on_long_click);
        item.bind(holder, position, payloads);
        Ok(())
    }

    /// Release a holder whose view is being recycled.
    pub fn recycle_view_holder(&self, holder: &mut ViewHolder) {
        if let Some(item) = holder.item().cloned() {
            item.unbind(holder);
        }
        holder.detach();
    }

    /// Whether a holder the list view failed to recycle may be recycled anyway.
    pub fn failed_to_recycle(&self, holder: &ViewHolder) -> bool {
        holder.item().is_some_and(|item| item.is_recyclable())
    }
}

impl std::fmt::Debug for GroupAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupAdapter")
            .field("groups", &self.group_count())
            .field("flat_count", &self.flat_count())
            .field("span_count", &self.span_count())
            .field("async_diff", &self.async_diff)
            .finish()
    }
}

static_assertions::assert_impl_all!(GroupAdapter: Send, Sync);
