//! Test fixtures shared by the unit tests.

use std::any::Any;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::group::{Group, GroupChange, GroupObserver, ObserverHandle};
use crate::holder::ViewHolder;
use crate::item::{Item, ItemRef, LayoutKey, Payload};

pub(crate) struct TestItem {
    pub id: u64,
    pub label: String,
    layout: LayoutKey,
    clickable: bool,
    recyclable: bool,
    span: Option<usize>,
    label_payloads: bool,
    pub binds: Mutex<Vec<(usize, usize)>>,
    pub unbinds: Mutex<usize>,
}

impl TestItem {
    pub fn new(id: u64, label: &str) -> Self {
        Self {
            id,
            label: label.to_string(),
            layout: LayoutKey(1),
            clickable: true,
            recyclable: true,
            span: None,
            label_payloads: false,
            binds: Mutex::new(Vec::new()),
            unbinds: Mutex::new(0),
        }
    }

    pub fn with_layout(mut self, layout: LayoutKey) -> Self {
        self.layout = layout;
        self
    }

    pub fn clickable(mut self, clickable: bool) -> Self {
        self.clickable = clickable;
        self
    }

    pub fn recyclable(mut self, recyclable: bool) -> Self {
        self.recyclable = recyclable;
        self
    }

    pub fn with_span(mut self, span: usize) -> Self {
        self.span = Some(span);
        self
    }

    /// Changes carry the new label as payload.
    pub fn with_label_payloads(mut self) -> Self {
        self.label_payloads = true;
        self
    }
}

impl Item for TestItem {
    fn id(&self) -> u64 {
        self.id
    }

    fn layout_key(&self) -> LayoutKey {
        self.layout
    }

    fn content_equals(&self, other: &dyn Item) -> bool {
        other
            .as_any()
            .downcast_ref::<TestItem>()
            .is_some_and(|other| other.label == self.label)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn change_payload(&self, newer: &dyn Item) -> Option<Payload> {
        if !self.label_payloads {
            return None;
        }
        newer
            .as_any()
            .downcast_ref::<TestItem>()
            .map(|newer| Payload::new(newer.label.clone()))
    }

    fn span_size(&self, span_count: usize, _position: usize) -> usize {
        self.span.unwrap_or(span_count)
    }

    fn is_clickable(&self) -> bool {
        self.clickable
    }

    fn is_recyclable(&self) -> bool {
        self.recyclable
    }

    fn bind(&self, _holder: &mut ViewHolder, position: usize, payloads: &[Payload]) {
        self.binds.lock().push((position, payloads.len()));
    }

    fn unbind(&self, _holder: &mut ViewHolder) {
        *self.unbinds.lock() += 1;
    }
}

pub(crate) fn item(id: u64, label: &str) -> ItemRef {
    Arc::new(TestItem::new(id, label))
}

pub(crate) fn items(ids: &[u64]) -> Vec<ItemRef> {
    ids.iter().map(|&id| item(id, "")).collect()
}

pub(crate) fn ids(items: &[ItemRef]) -> Vec<u64> {
    items.iter().map(|item| item.id()).collect()
}

/// Records every change it observes.
#[derive(Default)]
pub(crate) struct RecordingObserver {
    pub changes: Mutex<Vec<GroupChange>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn handle(self: &Arc<Self>) -> ObserverHandle {
        let weak: Weak<RecordingObserver> = Arc::downgrade(self);
        weak
    }

    pub fn take(&self) -> Vec<GroupChange> {
        std::mem::take(&mut *self.changes.lock())
    }
}

impl GroupObserver for RecordingObserver {
    fn on_group_change(&self, _group: &dyn Group, change: GroupChange) {
        self.changes.lock().push(change);
    }
}
