//! Update sinks: where flat-coordinate change notifications go.
//!
//! The adapter reports every change to a single [`UpdateSink`]. Hosts
//! usually forward these to their list view. [`RecordingSink`] keeps the
//! events for later inspection and [`SignalSink`] fans them out to any
//! number of connected slots.

use parking_lot::Mutex;

use grouplist_core::Signal;

use crate::item::Payload;

/// Receives change notifications in flat coordinates.
///
/// Positions are valid in the list as it is after the notification.
pub trait UpdateSink: Send + Sync {
    /// `count` items were inserted at `position`.
    fn inserted(&self, position: usize, count: usize);

    /// `count` items were removed from `position`.
    fn removed(&self, position: usize, count: usize);

    /// One item moved from `from` to `to`.
    fn moved(&self, from: usize, to: usize);

    /// `count` items starting at `position` changed.
    fn changed(&self, position: usize, count: usize, payload: Option<&Payload>);

    /// Everything changed; the consumer should reload.
    fn reset(&self);
}

/// A change notification as a value.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateEvent {
    /// `count` items were inserted at `position`.
    Inserted {
        /// First inserted position.
        position: usize,
        /// Number of inserted items.
        count: usize,
    },
    /// `count` items were removed from `position`.
    Removed {
        /// First removed position.
        position: usize,
        /// Number of removed items.
        count: usize,
    },
    /// One item moved.
    Moved {
        /// Position before the move.
        from: usize,
        /// Position after the move.
        to: usize,
    },
    /// `count` items starting at `position` changed.
    Changed {
        /// First changed position.
        position: usize,
        /// Number of changed items.
        count: usize,
        /// What changed, if known.
        payload: Option<Payload>,
    },
    /// Everything changed.
    Reset,
}

impl UpdateEvent {
    /// Call the matching method on `sink`.
    pub fn dispatch_to(&self, sink: &dyn UpdateSink) {
        match self {
            Self::Inserted { position, count } => sink.inserted(*position, *count),
            Self::Removed { position, count } => sink.removed(*position, *count),
            Self::Moved { from, to } => sink.moved(*from, *to),
            Self::Changed {
                position,
                count,
                payload,
            } => sink.changed(*position, *count, payload.as_ref()),
            Self::Reset => sink.reset(),
        }
    }

    /// Replay this event on a mirror of the list.
    ///
    /// Inserted and changed slots are filled with `fill(position)`. A reset
    /// clears the mirror; the caller repopulates it.
    ///
    /// # Panics
    ///
    /// Panics if the event's positions are out of range for `list`.
    pub fn apply_to<T>(&self, list: &mut Vec<T>, mut fill: impl FnMut(usize) -> T) {
        match *self {
            Self::Inserted { position, count } => {
                for offset in 0..count {
                    list.insert(position + offset, fill(position + offset));
                }
            }
            Self::Removed { position, count } => {
                list.drain(position..position + count);
            }
            Self::Moved { from, to } => {
                let value = list.remove(from);
                list.insert(to, value);
            }
            Self::Changed {
                position, count, ..
            } => {
                for index in position..position + count {
                    list[index] = fill(index);
                }
            }
            Self::Reset => list.clear(),
        }
    }
}

/// A sink that records every event.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<UpdateEvent>>,
}

impl RecordingSink {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the recorded events.
    pub fn events(&self) -> Vec<UpdateEvent> {
        self.events.lock().clone()
    }

    /// Take the recorded events, leaving the recorder empty.
    pub fn take(&self) -> Vec<UpdateEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    fn record(&self, event: UpdateEvent) {
        self.events.lock().push(event);
    }
}

impl UpdateSink for RecordingSink {
    fn inserted(&self, position: usize, count: usize) {
        self.record(UpdateEvent::Inserted { position, count });
    }

    fn removed(&self, position: usize, count: usize) {
        self.record(UpdateEvent::Removed { position, count });
    }

    fn moved(&self, from: usize, to: usize) {
        self.record(UpdateEvent::Moved { from, to });
    }

    fn changed(&self, position: usize, count: usize, payload: Option<&Payload>) {
        self.record(UpdateEvent::Changed {
            position,
            count,
            payload: payload.cloned(),
        });
    }

    fn reset(&self) {
        self.record(UpdateEvent::Reset);
    }
}

/// A sink that re-emits every notification as signals.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use grouplist::{SignalSink, UpdateSink};
///
/// let sink = Arc::new(SignalSink::new());
/// sink.items_inserted.connect(|&(position, count)| {
///     println!("{count} rows at {position}");
/// });
/// sink.inserted(0, 3);
/// ```
#[derive(Debug)]
pub struct SignalSink {
    /// Emitted with `(position, count)` after items are inserted.
    pub items_inserted: Signal<(usize, usize)>,
    /// Emitted with `(position, count)` after items are removed.
    pub items_removed: Signal<(usize, usize)>,
    /// Emitted with `(from, to)` after an item moves.
    pub item_moved: Signal<(usize, usize)>,
    /// Emitted with `(position, count, payload)` after items change.
    pub items_changed: Signal<(usize, usize, Option<Payload>)>,
    /// Emitted when the whole list must be reloaded.
    pub reset: Signal<()>,
    /// Emitted for every notification, after the specific signal.
    pub updated: Signal<UpdateEvent>,
}

impl Default for SignalSink {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalSink {
    /// Create a sink with no connections.
    pub fn new() -> Self {
        Self {
            items_inserted: Signal::new(),
            items_removed: Signal::new(),
            item_moved: Signal::new(),
            items_changed: Signal::new(),
            reset: Signal::new(),
            updated: Signal::new(),
        }
    }
}

impl UpdateSink for SignalSink {
    fn inserted(&self, position: usize, count: usize) {
        self.items_inserted.emit((position, count));
        self.updated.emit(UpdateEvent::Inserted { position, count });
    }

    fn removed(&self, position: usize, count: usize) {
        self.items_removed.emit((position, count));
        self.updated.emit(UpdateEvent::Removed { position, count });
    }

    fn moved(&self, from: usize, to: usize) {
        self.item_moved.emit((from, to));
        self.updated.emit(UpdateEvent::Moved { from, to });
    }

    fn changed(&self, position: usize, count: usize, payload: Option<&Payload>) {
        self.items_changed.emit((position, count, payload.cloned()));
        self.updated.emit(UpdateEvent::Changed {
            position,
            count,
            payload: payload.cloned(),
        });
    }

    fn reset(&self) {
        self.reset.emit(());
        self.updated.emit(UpdateEvent::Reset);
    }
}

static_assertions::assert_impl_all!(RecordingSink: Send, Sync);
static_assertions::assert_impl_all!(SignalSink: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_recording_sink() {
        let sink = RecordingSink::new();
        sink.inserted(0, 2);
        sink.moved(1, 0);
        sink.reset();

        assert_eq!(sink.len(), 3);
        assert_eq!(
            sink.take(),
            vec![
                UpdateEvent::Inserted { position: 0, count: 2 },
                UpdateEvent::Moved { from: 1, to: 0 },
                UpdateEvent::Reset,
            ]
        );
        assert!(sink.is_empty());
    }

    #[test]
    fn test_dispatch_round_trip() {
        let payload = Payload::new(1u8);
        let event = UpdateEvent::Changed {
            position: 4,
            count: 1,
            payload: Some(payload.clone()),
        };
        let sink = RecordingSink::new();
        event.dispatch_to(&sink);
        assert_eq!(sink.events(), vec![event]);
    }

    #[test]
    fn test_apply_to_mirror() {
        let mut list = vec!['a', 'b', 'c', 'd'];

        UpdateEvent::Removed { position: 1, count: 2 }.apply_to(&mut list, |_| '?');
        assert_eq!(list, vec!['a', 'd']);

        UpdateEvent::Inserted { position: 1, count: 2 }.apply_to(&mut list, |p| (b'0' + p as u8) as char);
        assert_eq!(list, vec!['a', '1', '2', 'd']);

        UpdateEvent::Moved { from: 3, to: 0 }.apply_to(&mut list, |_| '?');
        assert_eq!(list, vec!['d', 'a', '1', '2']);

        UpdateEvent::Changed { position: 1, count: 1, payload: None }.apply_to(&mut list, |_| 'A');
        assert_eq!(list, vec!['d', 'A', '1', '2']);

        UpdateEvent::Reset.apply_to(&mut list, |_| '?');
        assert!(list.is_empty());
    }

    #[test]
    fn test_signal_sink_fans_out() {
        let sink = SignalSink::new();
        let inserted = Arc::new(Mutex::new(Vec::new()));
        let all = Arc::new(Mutex::new(Vec::new()));

        let inserted_clone = inserted.clone();
        sink.items_inserted.connect(move |&(position, count)| {
            inserted_clone.lock().push((position, count));
        });
        let all_clone = all.clone();
        sink.updated.connect(move |event| {
            all_clone.lock().push(event.clone());
        });

        sink.inserted(2, 3);
        sink.removed(0, 1);

        assert_eq!(*inserted.lock(), vec![(2, 3)]);
        assert_eq!(
            *all.lock(),
            vec![
                UpdateEvent::Inserted { position: 2, count: 3 },
                UpdateEvent::Removed { position: 0, count: 1 },
            ]
        );
    }
}
