//! Position model: how column order and task order are represented.
//!
//! Order is an integer `position` per item, compared numerically. Positions
//! arriving from the network may be gappy or duplicated; [`reindex`] is the
//! single place a canonical, dense sequence (0, 1, 2, …) is produced.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

use boardsync_common::{Column, ColumnId, Task, TaskId};

/// An item that carries an ordering key.
pub trait Ordered {
    type Id: Copy + Eq + Hash + Debug;

    fn order_id(&self) -> Self::Id;
    fn position(&self) -> i64;
    fn set_position(&mut self, position: i64);
}

impl Ordered for Column {
    type Id = ColumnId;

    fn order_id(&self) -> ColumnId {
        self.id
    }

    fn position(&self) -> i64 {
        self.position
    }

    fn set_position(&mut self, position: i64) {
        self.position = position;
    }
}

impl Ordered for Task {
    type Id = TaskId;

    fn order_id(&self) -> TaskId {
        self.id
    }

    fn position(&self) -> i64 {
        self.position
    }

    fn set_position(&mut self, position: i64) {
        self.position = position;
    }
}

pub fn compare<T: Ordered>(a: &T, b: &T) -> Ordering {
    a.position().cmp(&b.position())
}

/// Sort ascending by position. Equal positions keep their current relative
/// order, so arrival order is the tiebreak.
pub fn sort_stable<T: Ordered>(items: &mut [T]) {
    items.sort_by(compare);
}

/// Assign contiguous positions to `ordered_ids`, first id gets 0.
///
/// A repeated id keeps its first slot; later repeats are skipped so the
/// result is always gap-free.
pub fn reindex<I>(ordered_ids: &[I]) -> Vec<(I, i64)>
where
    I: Copy + Eq + Hash,
{
    let mut seen = HashSet::with_capacity(ordered_ids.len());
    ordered_ids
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .enumerate()
        .map(|(index, id)| (id, index as i64))
        .collect()
}

/// Write an assignment produced by [`reindex`] back onto `items`. Items not
/// named in the assignment are left alone. Returns how many positions
/// actually changed.
pub fn apply_positions<T: Ordered>(items: &mut [T], assignment: &[(T::Id, i64)]) -> usize {
    let lookup: HashMap<T::Id, i64> = assignment.iter().copied().collect();
    let mut changed = 0;
    for item in items.iter_mut() {
        if let Some(&position) = lookup.get(&item.order_id())
            && item.position() != position
        {
            item.set_position(position);
            changed += 1;
        }
    }
    changed
}

pub fn ids_in_order<T: Ordered>(items: &[T]) -> Vec<T::Id> {
    items.iter().map(|item| item.order_id()).collect()
}

/// True when the items, in slice order, hold exactly 0, 1, 2, ….
pub fn is_canonical<T: Ordered>(items: &[T]) -> bool {
    items
        .iter()
        .enumerate()
        .all(|(index, item)| item.position() == index as i64)
}
