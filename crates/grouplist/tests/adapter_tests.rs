//! End-to-end tests for the group adapter.

mod common;

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use grouplist::{
    AdapterConfig, AdapterError, AsyncDiffState, Executor, ExecutorError, Group, GroupAdapter,
    GroupRef, Item, ItemGroup, ItemRef, LayoutKey, ListGroup, NestedGroup, Result, SignalSink,
    Task, ThreadPool, ThreadPoolConfig, UpdateEvent, flatten,
};

use common::{ids, recording_adapter, replay, row, rows};

/// Holds submitted tasks until the test runs them.
#[derive(Default)]
struct ManualExecutor {
    tasks: Mutex<Vec<Task>>,
}

impl ManualExecutor {
    fn run_all(&self) {
        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            task();
        }
    }
}

impl Executor for ManualExecutor {
    fn submit(&self, task: Task) -> std::result::Result<(), ExecutorError> {
        self.tasks.lock().push(task);
        Ok(())
    }
}

fn flat_ids(adapter: &GroupAdapter) -> Vec<u64> {
    ids(&flatten::flatten(&adapter.groups()))
}

#[test]
fn test_single_group_add() {
    let (adapter, sink) = recording_adapter();
    adapter.add(ListGroup::new(vec![row(1, "x"), row(2, "y")]));

    assert_eq!(sink.take(), vec![UpdateEvent::Inserted { position: 0, count: 2 }]);
    assert_eq!(adapter.flat_count(), 2);
    assert_eq!(adapter.stable_id_at(1), Ok(2));
}

#[test]
fn test_group_removal_with_offset() {
    let (adapter, sink) = recording_adapter();
    let first = ListGroup::new(rows(&[1, 2]));
    adapter.add(first.clone());
    adapter.add(ListGroup::new(rows(&[3, 4, 5])));
    sink.take();

    adapter.remove(first.as_ref()).unwrap();

    assert_eq!(sink.take(), vec![UpdateEvent::Removed { position: 0, count: 2 }]);
    assert_eq!(adapter.flat_count(), 3);
    assert_eq!(adapter.stable_id_at(0), Ok(3));
}

#[test]
fn test_local_mutation_is_offset() {
    let (adapter, sink) = recording_adapter();
    let second = ListGroup::new(rows(&[3]));
    adapter.add(ListGroup::new(rows(&[1, 2])));
    adapter.add(second.clone());
    sink.take();

    second.insert(1, row(4, "")).unwrap();

    assert_eq!(sink.take(), vec![UpdateEvent::Inserted { position: 3, count: 1 }]);
    assert_eq!(adapter.flat_count(), 4);
}

#[test]
fn test_bulk_update_without_moves() {
    let (adapter, sink) = recording_adapter();
    adapter.add(ListGroup::new(rows(&[1, 2, 3])));
    sink.take();

    adapter.update(vec![ListGroup::new(rows(&[1, 3, 4])) as GroupRef], false);

    assert_eq!(
        sink.take(),
        vec![
            UpdateEvent::Removed { position: 1, count: 1 },
            UpdateEvent::Inserted { position: 2, count: 1 },
        ]
    );
}

#[test]
fn test_bulk_update_with_move_and_payload() {
    let (adapter, sink) = recording_adapter();
    adapter.add(ListGroup::new(vec![row(1, "x"), row(2, "y"), row(3, "z")]));
    sink.take();

    let new_items = vec![row(3, "z"), row(1, "x2"), row(2, "y")];
    adapter.update(vec![ListGroup::new(new_items.clone()) as GroupRef], true);

    let events = sink.take();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], UpdateEvent::Moved { from: 2, to: 0 });
    match &events[1] {
        UpdateEvent::Changed {
            position: 1,
            count: 1,
            payload: Some(payload),
        } => assert_eq!(payload.downcast_ref::<String>().map(String::as_str), Some("x2")),
        other => panic!("unexpected event {other:?}"),
    }

    let mut mirror = vec![1, 2, 3];
    replay(&mut mirror, &events, &new_items);
    assert_eq!(mirror, ids(&new_items));
}

#[test]
fn test_stale_async_update_is_dropped() {
    let executor = Arc::new(ManualExecutor::default());
    let adapter = GroupAdapter::with_executor(AdapterConfig::default(), executor.clone()).unwrap();
    let sink = Arc::new(grouplist::RecordingSink::new());
    adapter.set_update_sink(Some(sink.clone()));
    adapter.add(ListGroup::new(rows(&[1])));
    sink.take();

    let completions = Arc::new(Mutex::new(Vec::new()));
    let first_done = completions.clone();
    adapter
        .update_async(
            vec![ListGroup::new(rows(&[1, 2])) as GroupRef],
            true,
            Some(Box::new(move |result: Result<()>| {
                first_done.lock().push(("first", result));
            })),
        )
        .unwrap();
    let second_done = completions.clone();
    adapter
        .update_async(
            vec![ListGroup::new(rows(&[3, 1])) as GroupRef],
            true,
            Some(Box::new(move |result: Result<()>| {
                second_done.lock().push(("second", result));
            })),
        )
        .unwrap();

    executor.run_all();
    assert_eq!(adapter.process_pending_updates(), 1);

    assert_eq!(*completions.lock(), vec![("second", Ok(()))]);
    assert_eq!(sink.take(), vec![UpdateEvent::Inserted { position: 0, count: 1 }]);
    assert_eq!(flat_ids(&adapter), vec![3, 1]);
    assert_eq!(adapter.dropped_async_updates(), 1);
    assert_eq!(adapter.applied_async_updates(), 1);
}

/// A row whose content comparison panics.
struct Corrupt {
    id: u64,
}

impl Item for Corrupt {
    fn id(&self) -> u64 {
        self.id
    }

    fn layout_key(&self) -> LayoutKey {
        LayoutKey(1)
    }

    fn content_equals(&self, _other: &dyn Item) -> bool {
        panic!("boom")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[test]
fn test_failed_diff_leaves_groups_untouched() {
    let (adapter, sink) = recording_adapter();
    let original = ListGroup::new(rows(&[1]));
    adapter.add(original.clone());
    sink.take();

    let outcome = Arc::new(Mutex::new(None));
    let slot = outcome.clone();
    let replacement: Vec<ItemRef> = vec![Arc::new(Corrupt { id: 1 })];
    adapter
        .update_async(
            vec![ListGroup::new(replacement) as GroupRef],
            true,
            Some(Box::new(move |result: Result<()>| *slot.lock() = Some(result))),
        )
        .unwrap();

    assert_eq!(adapter.process_pending_updates(), 1);
    assert!(matches!(
        *outcome.lock(),
        Some(Err(AdapterError::DiffFailed(ref message))) if message == "boom"
    ));
    assert!(sink.is_empty());
    assert_eq!(flat_ids(&adapter), vec![1]);
    assert!(Arc::ptr_eq(&adapter.group_at(0).unwrap(), &(original.clone() as GroupRef)));
    assert_eq!(adapter.async_state(), AsyncDiffState::Idle);
    assert_eq!(adapter.applied_async_updates(), 0);

    // The old groups still report their own changes.
    original.push(row(2, ""));
    assert_eq!(sink.take(), vec![UpdateEvent::Inserted { position: 1, count: 1 }]);
}

#[test]
fn test_rapid_async_updates_apply_once() {
    let pool = ThreadPool::new(ThreadPoolConfig::with_threads(2)).unwrap();
    let adapter = GroupAdapter::with_executor(AdapterConfig::default(), Arc::new(pool)).unwrap();
    let sink = Arc::new(grouplist::RecordingSink::new());
    adapter.set_update_sink(Some(sink.clone()));

    let completions = Arc::new(Mutex::new(Vec::new()));
    let submissions = 5u64;
    for round in 1..=submissions {
        let done = completions.clone();
        adapter
            .update_async(
                vec![ListGroup::new(rows(&[round, round + 100])) as GroupRef],
                true,
                Some(Box::new(move |result: Result<()>| {
                    done.lock().push((round, result));
                })),
            )
            .unwrap();
    }

    assert!(adapter.wait_for_pending_update(Duration::from_secs(10)));
    assert_eq!(adapter.process_pending_updates(), 0);

    assert_eq!(*completions.lock(), vec![(submissions, Ok(()))]);
    assert_eq!(
        sink.take(),
        vec![UpdateEvent::Inserted { position: 0, count: 2 }]
    );
    assert_eq!(flat_ids(&adapter), vec![submissions, submissions + 100]);
}

#[test]
fn test_item_at_matches_flatten() {
    let (adapter, _sink) = recording_adapter();
    adapter.add(ItemGroup::new(row(1, "")));
    adapter.add(NestedGroup::with_children(vec![
        ListGroup::new(rows(&[2, 3])) as GroupRef,
        ListGroup::empty() as GroupRef,
        ItemGroup::new(row(4, "")) as GroupRef,
    ]));
    adapter.add(ListGroup::new(rows(&[5])));

    let flat = flatten::flatten(&adapter.groups());
    assert_eq!(flat.len(), adapter.flat_count());
    for (position, expected) in flat.iter().enumerate() {
        let item = adapter.item_at(position).unwrap();
        assert!(grouplist::is_same_instance(item.as_ref(), expected.as_ref()));
    }
}

#[test]
fn test_flat_index_of_group_is_prefix_sum() {
    let (adapter, _sink) = recording_adapter();
    let groups = vec![
        ListGroup::new(rows(&[1, 2])) as GroupRef,
        ListGroup::empty() as GroupRef,
        ItemGroup::new(row(3, "")) as GroupRef,
        ListGroup::new(rows(&[4, 5, 6])) as GroupRef,
    ];
    adapter.add_all(groups.clone());

    let mut expected = 0;
    for group in &groups {
        assert_eq!(adapter.flat_index_of_group(group.as_ref()), Some(expected));
        expected += group.item_count();
    }

    let stranger = ListGroup::new(rows(&[7]));
    assert_eq!(adapter.flat_index_of_group(stranger.as_ref()), None);
}

#[test]
fn test_clear_unregisters_from_every_group() {
    let (adapter, sink) = recording_adapter();
    let list = ListGroup::new(rows(&[1]));
    let single = ItemGroup::new(row(2, ""));
    let nested_child = ListGroup::new(rows(&[3]));
    let nested = NestedGroup::with_children(vec![nested_child.clone() as GroupRef]);
    adapter.add(list.clone());
    adapter.add(single.clone());
    adapter.add(nested.clone());

    adapter.clear();
    sink.take();

    list.push(row(4, ""));
    single.set_item(row(5, ""));
    nested_child.push(row(6, ""));
    nested.add(ListGroup::new(rows(&[7])));

    assert!(sink.is_empty());
    assert_eq!(adapter.flat_count(), 0);
}

#[test]
fn test_signal_sink_receives_adapter_updates() {
    let adapter = GroupAdapter::with_executor(
        AdapterConfig::default(),
        Arc::new(grouplist::InlineExecutor),
    )
    .unwrap();
    let sink = Arc::new(SignalSink::new());
    let inserted = Arc::new(Mutex::new(Vec::new()));
    let inserted_clone = inserted.clone();
    sink.items_inserted.connect(move |&(position, count)| {
        inserted_clone.lock().push((position, count));
    });
    adapter.set_update_sink(Some(sink));

    let group = ListGroup::new(rows(&[1]));
    adapter.add(group.clone());
    group.extend(rows(&[2, 3]));

    assert_eq!(*inserted.lock(), vec![(0, 1), (1, 2)]);
}

#[test]
fn test_mutation_sequence_replays_to_flat_list() {
    let (adapter, sink) = recording_adapter();
    let mut mirror: Vec<u64> = Vec::new();

    let header = ItemGroup::new(row(100, "title"));
    let body = ListGroup::new(rows(&[1, 2, 3]));
    let footer = NestedGroup::new();

    let mut step = |adapter: &GroupAdapter| {
        let current = flatten::flatten(&adapter.groups());
        replay(&mut mirror, &sink.take(), &current);
        assert_eq!(mirror, ids(&current));
    };

    adapter.add(body.clone());
    step(&adapter);
    adapter.add_at(0, header.clone()).unwrap();
    step(&adapter);
    adapter.add(footer.clone());
    step(&adapter);
    footer.add(ListGroup::new(rows(&[50, 51])));
    step(&adapter);
    body.move_item(0, 2).unwrap();
    step(&adapter);
    body.remove(1).unwrap();
    step(&adapter);
    header.set_item(row(101, "title"));
    step(&adapter);
    body.update(rows(&[4, 1, 3, 5]), true);
    step(&adapter);
    adapter.update(
        vec![
            footer.clone() as GroupRef,
            ListGroup::new(rows(&[3, 9, 1])) as GroupRef,
        ],
        true,
    );
    step(&adapter);
    adapter.remove_at(0).unwrap();
    step(&adapter);
}
