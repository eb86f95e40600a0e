//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::any::Any;
use std::sync::Arc;

use grouplist::{
    AdapterConfig, GroupAdapter, InlineExecutor, Item, ItemRef, LayoutKey, Payload, RecordingSink,
    UpdateEvent,
};

/// A row with an id and a text body. Changes carry the new body as payload.
#[derive(Debug)]
pub struct Row {
    pub id: u64,
    pub body: String,
}

impl Item for Row {
    fn id(&self) -> u64 {
        self.id
    }

    fn layout_key(&self) -> LayoutKey {
        LayoutKey(1)
    }

    fn content_equals(&self, other: &dyn Item) -> bool {
        other
            .as_any()
            .downcast_ref::<Row>()
            .is_some_and(|other| other.body == self.body)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn change_payload(&self, newer: &dyn Item) -> Option<Payload> {
        newer
            .as_any()
            .downcast_ref::<Row>()
            .map(|newer| Payload::new(newer.body.clone()))
    }
}

pub fn row(id: u64, body: &str) -> ItemRef {
    Arc::new(Row {
        id,
        body: body.to_string(),
    })
}

pub fn rows(ids: &[u64]) -> Vec<ItemRef> {
    ids.iter().map(|&id| row(id, "")).collect()
}

pub fn ids(items: &[ItemRef]) -> Vec<u64> {
    items.iter().map(|item| item.id()).collect()
}

/// Route logs through the test harness. Filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// An adapter that diffs inline, wired to a recording sink.
pub fn recording_adapter() -> (GroupAdapter, Arc<RecordingSink>) {
    init_tracing();
    let adapter = GroupAdapter::with_executor(AdapterConfig::default(), Arc::new(InlineExecutor))
        .expect("default config is valid");
    let sink = Arc::new(RecordingSink::new());
    adapter.set_update_sink(Some(sink.clone()));
    (adapter, sink)
}

/// Replay `events` on a mirror of ids, reading new items from `current`.
pub fn replay(mirror: &mut Vec<u64>, events: &[UpdateEvent], current: &[ItemRef]) {
    for event in events {
        event.apply_to(mirror, |position| current[position].id());
    }
}
