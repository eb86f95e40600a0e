//! The diff engine.
//!
//! [`calculate_diff`] compares two flat item snapshots and produces the
//! sequence of [`UpdateEvent`]s that turns the old list into the new one.
//! Events are meant to be applied in order: every position refers to the
//! list as it is after the previous events.
//!
//! # Script Order
//!
//! 1. Removals, back to front, with consecutive positions coalesced.
//! 2. Moves (only when move detection is on), in ascending order of the
//!    item's new position. Each moved item lands directly after its
//!    predecessor in the new list.
//! 3. Insertions, front to back, with consecutive positions coalesced.
//! 4. Content changes at their final positions. Runs without payload are
//!    coalesced; each payload-carrying change is reported on its own.
//!
//! Items are matched with [`Item::is_same_as`](crate::Item::is_same_as) and
//! compared with [`Item::content_equals`](crate::Item::content_equals).

mod myers;

use tracing::debug;

use grouplist_core::{PerfSpan, span_names, targets};

use crate::item::ItemRef;
use crate::sink::{UpdateEvent, UpdateSink};

/// The outcome of a diff: an ordered update script.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffResult {
    events: Vec<UpdateEvent>,
    old_count: usize,
    new_count: usize,
}

impl DiffResult {
    /// The update script.
    pub fn events(&self) -> &[UpdateEvent] {
        &self.events
    }

    /// Take the update script.
    pub fn into_events(self) -> Vec<UpdateEvent> {
        self.events
    }

    /// Whether the two lists were equivalent.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of items before the update.
    pub fn old_count(&self) -> usize {
        self.old_count
    }

    /// Number of items after the update.
    pub fn new_count(&self) -> usize {
        self.new_count
    }

    /// Deliver every event, in order, to `sink`.
    pub fn dispatch_to(&self, sink: &dyn UpdateSink) {
        for event in &self.events {
            event.dispatch_to(sink);
        }
    }
}

/// Compute the update script turning `old` into `new`.
///
/// With `detect_moves`, an item that left one place and reappeared at
/// another is reported as a single move instead of a removal plus an
/// insertion.
pub fn calculate_diff(old: &[ItemRef], new: &[ItemRef], detect_moves: bool) -> DiffResult {
    let _span = PerfSpan::new(span_names::DIFF);

    let same = |i: usize, j: usize| new[j].is_same_as(old[i].as_ref());

    let mut old_to_new: Vec<Option<usize>> = vec![None; old.len()];
    let mut new_to_old: Vec<Option<usize>> = vec![None; new.len()];
    for (i, j) in myers::common_pairs(old.len(), new.len(), same) {
        old_to_new[i] = Some(j);
        new_to_old[j] = Some(i);
    }

    let mut moved = vec![false; new.len()];
    if detect_moves {
        let mut unpaired_new: Vec<usize> = (0..new.len()).filter(|&j| new_to_old[j].is_none()).collect();
        for i in 0..old.len() {
            if old_to_new[i].is_some() {
                continue;
            }
            if let Some(slot) = unpaired_new.iter().position(|&j| same(i, j)) {
                let j = unpaired_new.remove(slot);
                old_to_new[i] = Some(j);
                new_to_old[j] = Some(i);
                moved[j] = true;
            }
        }
    }

    let mut script = Script::default();

    // Removals, back to front.
    let removed: Vec<usize> = (0..old.len()).rev().filter(|&i| old_to_new[i].is_none()).collect();
    for run in descending_runs(&removed) {
        script.push(UpdateEvent::Removed {
            position: run.start,
            count: run.len(),
        });
    }

    // Moves: the survivors, tracked by their new index, in old order.
    let mut working: Vec<usize> = old_to_new.iter().flatten().copied().collect();
    let mut predecessor: Option<usize> = None;
    for j in 0..new.len() {
        if new_to_old[j].is_none() {
            continue;
        }
        if moved[j] {
            if let Some(from) = working.iter().position(|&slot| slot == j) {
                let to = match predecessor.and_then(|p| working.iter().position(|&slot| slot == p)) {
                    Some(anchor) if from > anchor => anchor + 1,
                    Some(anchor) => anchor,
                    None => 0,
                };
                if from != to {
                    let slot = working.remove(from);
                    working.insert(to, slot);
                    script.push(UpdateEvent::Moved { from, to });
                }
            }
        }
        predecessor = Some(j);
    }

    // Insertions, front to back.
    let inserted: Vec<usize> = (0..new.len()).filter(|&j| new_to_old[j].is_none()).collect();
    for run in ascending_runs(&inserted) {
        script.push(UpdateEvent::Inserted {
            position: run.start,
            count: run.len(),
        });
    }

    // Content changes at final positions.
    let mut pending: Option<(usize, usize)> = None;
    for j in 0..new.len() {
        let Some(i) = new_to_old[j] else {
            script.flush_changes(&mut pending);
            continue;
        };
        if new[j].content_equals(old[i].as_ref()) {
            script.flush_changes(&mut pending);
            continue;
        }
        match old[i].change_payload(new[j].as_ref()) {
            Some(payload) => {
                script.flush_changes(&mut pending);
                script.push(UpdateEvent::Changed {
                    position: j,
                    count: 1,
                    payload: Some(payload),
                });
            }
            None => match &mut pending {
                Some((_, count)) => *count += 1,
                None => pending = Some((j, 1)),
            },
        }
    }
    script.flush_changes(&mut pending);

    debug!(
        target: targets::DIFF,
        old = old.len(),
        new = new.len(),
        detect_moves,
        events = script.events.len(),
        "diff calculated"
    );

    DiffResult {
        events: script.events,
        old_count: old.len(),
        new_count: new.len(),
    }
}

#[derive(Default)]
struct Script {
    events: Vec<UpdateEvent>,
}

impl Script {
    fn push(&mut self, event: UpdateEvent) {
        self.events.push(event);
    }

    fn flush_changes(&mut self, pending: &mut Option<(usize, usize)>) {
        if let Some((position, count)) = pending.take() {
            self.push(UpdateEvent::Changed {
                position,
                count,
                payload: None,
            });
        }
    }
}

/// Group ascending indices into runs of consecutive values.
fn ascending_runs(indices: &[usize]) -> Vec<std::ops::Range<usize>> {
    let mut runs: Vec<std::ops::Range<usize>> = Vec::new();
    for &index in indices {
        match runs.last_mut() {
            Some(run) if run.end == index => run.end += 1,
            _ => runs.push(index..index + 1),
        }
    }
    runs
}

/// Group descending indices into runs of consecutive values.
fn descending_runs(indices: &[usize]) -> Vec<std::ops::Range<usize>> {
    let mut runs: Vec<std::ops::Range<usize>> = Vec::new();
    for &index in indices {
        match runs.last_mut() {
            Some(run) if run.start == index + 1 => run.start = index,
            _ => runs.push(index..index + 1),
        }
    }
    runs
}
