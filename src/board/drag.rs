//! Drag session state machine.
//!
//! A gesture moves through `Idle → DraggingColumn | DraggingTask → Idle`.
//! Hover signals splice the dragged item into its prospective slot in the
//! cache immediately (provisional reordering); nothing here talks to the
//! network. The transitions themselves are plain functions on
//! [`DragState`] over a [`BoardOrder`], so they can be exercised without a
//! cache or a pointer.
//!
//! [`DragSession`] wraps those transitions with the gate checks, keeps the
//! pre-drag snapshot for cancel, and turns a drop into either a
//! [`CompletedDrag`] for the mutator or a fully reverted no-op.

use boardsync_common::{ColumnId, TaskId};

use super::access::{Capability, DragGate};
use super::cache::{BoardCache, BoardOrder};
use crate::errors::DragRejection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    Column,
    Task,
}

/// The entity a gesture picked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragItem {
    Column(ColumnId),
    Task(TaskId),
}

impl DragItem {
    pub fn kind(&self) -> DragKind {
        match self {
            DragItem::Column(_) => DragKind::Column,
            DragItem::Task(_) => DragKind::Task,
        }
    }

    fn as_target(&self) -> HoverTarget {
        match *self {
            DragItem::Column(id) => HoverTarget::Column(id),
            DragItem::Task(id) => HoverTarget::Task(id),
        }
    }
}

/// What the pointer or keyboard focus is currently over. A column target
/// means the column's drop surface rather than one of its tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverTarget {
    Column(ColumnId),
    Task(TaskId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    DraggingColumn {
        active: ColumnId,
        over: Option<HoverTarget>,
    },
    DraggingTask {
        active: TaskId,
        current_column: ColumnId,
        over: Option<HoverTarget>,
    },
}

/// Result of one transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub state: DragState,
    pub reordered: bool,
}

impl Step {
    fn unchanged(state: DragState) -> Self {
        Self {
            state,
            reordered: false,
        }
    }
}

impl DragState {
    pub fn is_idle(&self) -> bool {
        matches!(self, DragState::Idle)
    }

    pub fn active_item(&self) -> Option<DragItem> {
        match *self {
            DragState::Idle => None,
            DragState::DraggingColumn { active, .. } => Some(DragItem::Column(active)),
            DragState::DraggingTask { active, .. } => Some(DragItem::Task(active)),
        }
    }

    pub fn active_kind(&self) -> Option<DragKind> {
        self.active_item().map(|item| item.kind())
    }

    pub fn over(&self) -> Option<HoverTarget> {
        match *self {
            DragState::Idle => None,
            DragState::DraggingColumn { over, .. } | DragState::DraggingTask { over, .. } => over,
        }
    }

    /// `Idle → Dragging*`, capturing the item from the board it was picked
    /// up on.
    pub fn start(order: &BoardOrder, item: DragItem) -> Result<DragState, DragRejection> {
        match item {
            DragItem::Column(id) => match order.column_index(id) {
                Some(_) => Ok(DragState::DraggingColumn {
                    active: id,
                    over: None,
                }),
                None => Err(DragRejection::UnknownItem),
            },
            DragItem::Task(id) => match order.task(id) {
                Some(task) => Ok(DragState::DraggingTask {
                    active: id,
                    current_column: task.column_id,
                    over: None,
                }),
                None => Err(DragRejection::UnknownItem),
            },
        }
    }

    /// Apply a hover signal to `order` and return the next state.
    ///
    /// Repeating the last hover target is a no-op, so a pointer resting on
    /// one item does not make the dragged item oscillate around it.
    pub fn hover(self, order: &mut BoardOrder, target: HoverTarget) -> Step {
        if self.over() == Some(target) {
            return Step::unchanged(self);
        }
        match self {
            DragState::Idle => Step::unchanged(self),
            DragState::DraggingColumn { active, .. } => {
                let over_column = match target {
                    HoverTarget::Column(id) => Some(id),
                    HoverTarget::Task(id) => order.task(id).map(|t| t.column_id),
                };
                let reordered = over_column
                    .is_some_and(|over| move_column_over_column(order, active, over));
                Step {
                    state: DragState::DraggingColumn {
                        active,
                        over: Some(target),
                    },
                    reordered,
                }
            }
            DragState::DraggingTask {
                active,
                current_column,
                ..
            } => {
                let reordered = match target {
                    HoverTarget::Task(over) => move_task_over_task(order, active, over),
                    HoverTarget::Column(column) => move_task_to_column(order, active, column),
                };
                let current_column = order
                    .task(active)
                    .map(|t| t.column_id)
                    .unwrap_or(current_column);
                Step {
                    state: DragState::DraggingTask {
                        active,
                        current_column,
                        over: Some(target),
                    },
                    reordered,
                }
            }
        }
    }
}

// ── Splicing primitives ──────────────────────────────────────────────

/// Remove the element at `from` and reinsert it at `to`.
fn array_move<T>(items: &mut Vec<T>, from: usize, to: usize) {
    if from == to {
        return;
    }
    let item = items.remove(from);
    items.insert(to, item);
}

/// Task over task. Within a column the dragged task takes the hovered
/// task's index; across columns it first adopts the hovered task's column
/// and then lands directly before it.
fn move_task_over_task(order: &mut BoardOrder, active: TaskId, over: TaskId) -> bool {
    if active == over {
        return false;
    }
    let (Some(from), Some(to)) = (order.task_index(active), order.task_index(over)) else {
        return false;
    };
    let over_column = order.tasks[to].column_id;
    if order.tasks[from].column_id == over_column {
        array_move(&mut order.tasks, from, to);
    } else {
        order.tasks[from].column_id = over_column;
        let item = order.tasks.remove(from);
        let slot = if from < to { to - 1 } else { to };
        order.tasks.insert(slot, item);
    }
    true
}

/// Task over a column's drop surface: adopt the column, keep the index.
fn move_task_to_column(order: &mut BoardOrder, active: TaskId, column: ColumnId) -> bool {
    if order.column_index(column).is_none() {
        return false;
    }
    match order.tasks.iter_mut().find(|t| t.id == active) {
        Some(task) if task.column_id != column => {
            task.column_id = column;
            true
        }
        _ => false,
    }
}

fn move_column_over_column(order: &mut BoardOrder, active: ColumnId, over: ColumnId) -> bool {
    if active == over {
        return false;
    }
    let (Some(from), Some(to)) = (order.column_index(active), order.column_index(over)) else {
        return false;
    };
    array_move(&mut order.columns, from, to);
    true
}

fn target_exists(order: &BoardOrder, target: HoverTarget) -> bool {
    match target {
        HoverTarget::Column(id) => order.column_index(id).is_some(),
        HoverTarget::Task(id) => order.task_index(id).is_some(),
    }
}

// ── Session ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverOutcome {
    Reordered,
    Unchanged,
    /// No drag in progress, or the board went read-only.
    Ignored,
}

/// A drop that changed the order and must be confirmed with the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletedDrag {
    Columns {
        moved: ColumnId,
        before: Vec<ColumnId>,
        after: Vec<ColumnId>,
    },
    Task {
        task_id: TaskId,
        from_column: ColumnId,
        from_index: usize,
        to_column: ColumnId,
        to_index: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoOpReason {
    NotDragging,
    NoTarget,
    DroppedOnSelf,
    TargetVanished,
    ActiveVanished,
    ReadOnly,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    Committed(CompletedDrag),
    /// Nothing to confirm; the cache holds the pre-drag order again.
    NoOp(NoOpReason),
}

#[derive(Debug)]
pub struct DragSession {
    gate: DragGate,
    state: DragState,
    origin: Option<BoardOrder>,
}

impl DragSession {
    pub fn new(gate: DragGate) -> Self {
        Self {
            gate,
            state: DragState::Idle,
            origin: None,
        }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        !self.state.is_idle()
    }

    pub fn gate(&self) -> &DragGate {
        &self.gate
    }

    pub fn start(&mut self, cache: &mut BoardCache, item: DragItem) -> Result<(), DragRejection> {
        if self.is_active() {
            return Err(DragRejection::AlreadyDragging);
        }
        if self.gate.is_read_only() {
            return Err(DragRejection::ReadOnly);
        }
        let capability = match item.kind() {
            DragKind::Column => Capability::ReorderColumns,
            DragKind::Task => Capability::MoveTasks,
        };
        if !self.gate.permits(capability) {
            return Err(DragRejection::PermissionDenied(capability));
        }

        let state = DragState::start(cache.order(), item)?;
        self.origin = Some(cache.snapshot());
        self.state = state;
        cache.set_dragging(true);
        tracing::debug!(board = %self.gate.board_id(), ?item, "drag started");
        Ok(())
    }

    pub fn hover(&mut self, cache: &mut BoardCache, target: HoverTarget) -> HoverOutcome {
        if !self.is_active() || self.gate.is_read_only() {
            return HoverOutcome::Ignored;
        }
        let step = self.state.hover(cache.order_mut(), target);
        self.state = step.state;
        if step.reordered {
            HoverOutcome::Reordered
        } else {
            HoverOutcome::Unchanged
        }
    }

    /// End the gesture over `target` (`None` = released outside any drop
    /// target). Invalid drops revert to the pre-drag order.
    pub fn drop_on(&mut self, cache: &mut BoardCache, target: Option<HoverTarget>) -> DropOutcome {
        let Some(active) = self.state.active_item() else {
            return DropOutcome::NoOp(NoOpReason::NotDragging);
        };
        if self.gate.is_read_only() {
            return self.revert(cache, NoOpReason::ReadOnly);
        }
        let Some(target) = target else {
            return self.revert(cache, NoOpReason::NoTarget);
        };
        if target == active.as_target() {
            return self.revert(cache, NoOpReason::DroppedOnSelf);
        }
        if !target_exists(cache.order(), target) {
            return self.revert(cache, NoOpReason::TargetVanished);
        }
        if !target_exists(cache.order(), active.as_target()) {
            return self.revert(cache, NoOpReason::ActiveVanished);
        }

        let step = self.state.hover(cache.order_mut(), target);
        self.state = step.state;

        let origin = self.origin.take().unwrap_or_default();
        let completed = match active {
            DragItem::Column(moved) => {
                let before = origin.column_ids();
                let after = cache.order().column_ids();
                (before != after).then_some(CompletedDrag::Columns {
                    moved,
                    before,
                    after,
                })
            }
            DragItem::Task(task_id) => task_relocation(&origin, cache.order(), task_id),
        };

        match completed {
            Some(completed) => {
                self.finish(cache);
                tracing::debug!(board = %self.gate.board_id(), ?completed, "drag dropped");
                DropOutcome::Committed(completed)
            }
            None => {
                cache.restore(origin);
                self.finish(cache);
                DropOutcome::NoOp(NoOpReason::Unchanged)
            }
        }
    }

    /// Abandon the gesture and restore the exact pre-drag order.
    pub fn cancel(&mut self, cache: &mut BoardCache) -> bool {
        if !self.is_active() {
            return false;
        }
        if let Some(origin) = self.origin.take() {
            cache.restore(origin);
        }
        self.finish(cache);
        tracing::debug!(board = %self.gate.board_id(), "drag cancelled");
        true
    }

    fn revert(&mut self, cache: &mut BoardCache, reason: NoOpReason) -> DropOutcome {
        if let Some(origin) = self.origin.take() {
            cache.restore(origin);
        }
        self.finish(cache);
        tracing::debug!(board = %self.gate.board_id(), ?reason, "drop ignored");
        DropOutcome::NoOp(reason)
    }

    fn finish(&mut self, cache: &mut BoardCache) {
        self.state = DragState::Idle;
        self.origin = None;
        cache.set_dragging(false);
    }
}

/// Where `task_id` went between `origin` and `current`, or `None` if it is
/// back in its original column at its original index.
fn task_relocation(origin: &BoardOrder, current: &BoardOrder, task_id: TaskId) -> Option<CompletedDrag> {
    let from_column = origin.task(task_id)?.column_id;
    let from_index = index_in_column(origin, from_column, task_id)?;
    let to_column = current.task(task_id)?.column_id;
    let to_index = index_in_column(current, to_column, task_id)?;
    if from_column == to_column && from_index == to_index {
        return None;
    }
    Some(CompletedDrag::Task {
        task_id,
        from_column,
        from_index,
        to_column,
        to_index,
    })
}

fn index_in_column(order: &BoardOrder, column: ColumnId, task_id: TaskId) -> Option<usize> {
    order
        .task_ids_in_column(column)
        .iter()
        .position(|id| *id == task_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::access::{ArchivedFlag, StaticPermissions};
    use crate::board::testing::{BOARD, column, task};
    use std::sync::Arc;

    fn order() -> BoardOrder {
        BoardOrder {
            columns: vec![column(1, 0), column(2, 1), column(3, 2)],
            tasks: vec![
                task(10, 1, 0),
                task(11, 1, 1),
                task(12, 1, 2),
                task(20, 2, 0),
                task(21, 2, 1),
            ],
        }
    }

    fn cache() -> BoardCache {
        let order = order();
        let mut cache = BoardCache::new(BOARD);
        cache.replace_columns(order.columns);
        cache.replace_tasks(order.tasks);
        cache
    }

    fn ids(order: &BoardOrder, column: i64) -> Vec<i64> {
        order
            .task_ids_in_column(ColumnId(column))
            .into_iter()
            .map(|id| id.0)
            .collect()
    }

    fn dragging_task(id: i64, column: i64) -> DragState {
        DragState::DraggingTask {
            active: TaskId(id),
            current_column: ColumnId(column),
            over: None,
        }
    }

    // ── Pure transitions ────────────────────────────────────────────

    #[test]
    fn start_captures_task_column() {
        let state = DragState::start(&order(), DragItem::Task(TaskId(21))).unwrap();
        assert_eq!(state, dragging_task(21, 2));
        assert_eq!(state.active_kind(), Some(DragKind::Task));
    }

    #[test]
    fn start_rejects_unknown_item() {
        assert_eq!(
            DragState::start(&order(), DragItem::Column(ColumnId(99))),
            Err(DragRejection::UnknownItem)
        );
    }

    #[test]
    fn task_over_later_task_in_same_column_lands_after_it() {
        let mut order = order();
        let step = dragging_task(10, 1).hover(&mut order, HoverTarget::Task(TaskId(11)));
        assert!(step.reordered);
        assert_eq!(ids(&order, 1), vec![11, 10, 12]);
    }

    #[test]
    fn task_over_earlier_task_in_same_column_lands_before_it() {
        let mut order = order();
        dragging_task(12, 1).hover(&mut order, HoverTarget::Task(TaskId(10)));
        assert_eq!(ids(&order, 1), vec![12, 10, 11]);
    }

    #[test]
    fn task_over_task_in_other_column_takes_its_slot() {
        let mut order = order();
        let step = dragging_task(11, 1).hover(&mut order, HoverTarget::Task(TaskId(21)));
        assert!(step.reordered);
        assert_eq!(ids(&order, 1), vec![10, 12]);
        assert_eq!(ids(&order, 2), vec![20, 11, 21]);
        match step.state {
            DragState::DraggingTask { current_column, over, .. } => {
                assert_eq!(current_column, ColumnId(2));
                assert_eq!(over, Some(HoverTarget::Task(TaskId(21))));
            }
            other => panic!("Expected DraggingTask, got {:?}", other),
        }
    }

    #[test]
    fn task_moving_up_into_other_column_lands_before_target() {
        let mut order = order();
        dragging_task(20, 2).hover(&mut order, HoverTarget::Task(TaskId(11)));
        assert_eq!(ids(&order, 1), vec![10, 20, 11, 12]);
        assert_eq!(ids(&order, 2), vec![21]);
    }

    #[test]
    fn task_over_column_surface_adopts_column() {
        let mut order = order();
        let step = dragging_task(12, 1).hover(&mut order, HoverTarget::Column(ColumnId(3)));
        assert!(step.reordered);
        assert_eq!(ids(&order, 3), vec![12]);
        assert_eq!(order.task_index(TaskId(12)), Some(2));
    }

    #[test]
    fn repeated_hover_target_does_not_oscillate() {
        let mut order = order();
        let step = dragging_task(10, 1).hover(&mut order, HoverTarget::Task(TaskId(11)));
        let again = step.state.hover(&mut order, HoverTarget::Task(TaskId(11)));
        assert!(!again.reordered);
        assert_eq!(ids(&order, 1), vec![11, 10, 12]);
    }

    #[test]
    fn column_over_column_moves_to_hovered_index() {
        let mut order = order();
        let state = DragState::DraggingColumn {
            active: ColumnId(1),
            over: None,
        };
        let step = state.hover(&mut order, HoverTarget::Column(ColumnId(3)));
        assert!(step.reordered);
        assert_eq!(order.column_ids(), vec![ColumnId(2), ColumnId(3), ColumnId(1)]);
    }

    #[test]
    fn column_over_task_resolves_to_its_column() {
        let mut order = order();
        let state = DragState::DraggingColumn {
            active: ColumnId(3),
            over: None,
        };
        state.hover(&mut order, HoverTarget::Task(TaskId(10)));
        assert_eq!(order.column_ids(), vec![ColumnId(3), ColumnId(1), ColumnId(2)]);
    }

    #[test]
    fn idle_hover_changes_nothing() {
        let mut order = order();
        let step = DragState::Idle.hover(&mut order, HoverTarget::Task(TaskId(11)));
        assert!(!step.reordered);
        assert_eq!(order, self::order());
    }

    #[test]
    fn hover_over_unknown_target_is_unchanged() {
        let mut order = order();
        let step = dragging_task(10, 1).hover(&mut order, HoverTarget::Task(TaskId(404)));
        assert!(!step.reordered);
        assert_eq!(ids(&order, 1), vec![10, 11, 12]);
    }

    // ── Session ─────────────────────────────────────────────────────

    #[test]
    fn drop_commits_task_relocation() {
        let mut cache = cache();
        let mut session = DragSession::new(DragGate::permissive(BOARD));
        session.start(&mut cache, DragItem::Task(TaskId(10))).unwrap();
        assert!(cache.is_dragging());

        assert_eq!(
            session.hover(&mut cache, HoverTarget::Task(TaskId(11))),
            HoverOutcome::Reordered
        );
        let outcome = session.drop_on(&mut cache, Some(HoverTarget::Task(TaskId(11))));

        assert_eq!(
            outcome,
            DropOutcome::Committed(CompletedDrag::Task {
                task_id: TaskId(10),
                from_column: ColumnId(1),
                from_index: 0,
                to_column: ColumnId(1),
                to_index: 1,
            })
        );
        assert!(!session.is_active());
        assert!(!cache.is_dragging());
    }

    #[test]
    fn cancel_restores_exact_pre_drag_order() {
        let mut cache = cache();
        let before = cache.snapshot();
        let mut session = DragSession::new(DragGate::permissive(BOARD));
        session.start(&mut cache, DragItem::Task(TaskId(10))).unwrap();
        session.hover(&mut cache, HoverTarget::Task(TaskId(21)));
        session.hover(&mut cache, HoverTarget::Column(ColumnId(3)));
        session.hover(&mut cache, HoverTarget::Task(TaskId(12)));
        assert_ne!(cache.snapshot(), before);

        assert!(session.cancel(&mut cache));
        assert_eq!(cache.snapshot(), before);
        assert!(!session.cancel(&mut cache));
    }

    #[test]
    fn drop_outside_any_target_reverts() {
        let mut cache = cache();
        let before = cache.snapshot();
        let mut session = DragSession::new(DragGate::permissive(BOARD));
        session.start(&mut cache, DragItem::Column(ColumnId(1))).unwrap();
        session.hover(&mut cache, HoverTarget::Column(ColumnId(3)));

        let outcome = session.drop_on(&mut cache, None);
        assert_eq!(outcome, DropOutcome::NoOp(NoOpReason::NoTarget));
        assert_eq!(cache.snapshot(), before);
    }

    #[test]
    fn drop_on_self_is_a_reverted_no_op() {
        let mut cache = cache();
        let before = cache.snapshot();
        let mut session = DragSession::new(DragGate::permissive(BOARD));
        session.start(&mut cache, DragItem::Task(TaskId(11))).unwrap();
        session.hover(&mut cache, HoverTarget::Task(TaskId(12)));

        let outcome = session.drop_on(&mut cache, Some(HoverTarget::Task(TaskId(11))));
        assert_eq!(outcome, DropOutcome::NoOp(NoOpReason::DroppedOnSelf));
        assert_eq!(cache.snapshot(), before);
        assert!(!session.is_active());
    }

    #[test]
    fn drop_on_vanished_target_reverts() {
        let mut cache = cache();
        let mut session = DragSession::new(DragGate::permissive(BOARD));
        session.start(&mut cache, DragItem::Column(ColumnId(2))).unwrap();
        let outcome = session.drop_on(&mut cache, Some(HoverTarget::Column(ColumnId(77))));
        assert_eq!(outcome, DropOutcome::NoOp(NoOpReason::TargetVanished));
    }

    #[test]
    fn drop_back_into_original_slot_is_unchanged() {
        let mut cache = cache();
        let before = cache.snapshot();
        let mut session = DragSession::new(DragGate::permissive(BOARD));
        session.start(&mut cache, DragItem::Task(TaskId(10))).unwrap();
        session.hover(&mut cache, HoverTarget::Task(TaskId(11)));
        let outcome = session.drop_on(&mut cache, Some(HoverTarget::Task(TaskId(11))));
        assert!(matches!(outcome, DropOutcome::Committed(_)));

        // Drag it straight back: same column, same index as the new origin.
        let moved = cache.snapshot();
        session.start(&mut cache, DragItem::Task(TaskId(11))).unwrap();
        session.hover(&mut cache, HoverTarget::Column(ColumnId(1)));
        let outcome = session.drop_on(&mut cache, Some(HoverTarget::Column(ColumnId(1))));
        assert_eq!(outcome, DropOutcome::NoOp(NoOpReason::Unchanged));
        assert_eq!(cache.snapshot(), moved);
        assert_ne!(moved, before);
    }

    #[test]
    fn start_is_refused_without_permission() {
        let mut cache = cache();
        let perms = StaticPermissions {
            reorder_columns: false,
            move_tasks: true,
        };
        let gate = DragGate::new(BOARD, Arc::new(perms), ArchivedFlag::default());
        let mut session = DragSession::new(gate);
        assert_eq!(
            session.start(&mut cache, DragItem::Column(ColumnId(1))),
            Err(DragRejection::PermissionDenied(Capability::ReorderColumns))
        );
        assert!(!session.is_active());
        assert!(!cache.is_dragging());
        assert!(session.start(&mut cache, DragItem::Task(TaskId(10))).is_ok());
        assert_eq!(
            session.start(&mut cache, DragItem::Task(TaskId(11))),
            Err(DragRejection::AlreadyDragging)
        );
    }

    #[test]
    fn archiving_mid_gesture_stops_hovers_and_reverts_drop() {
        let mut cache = cache();
        let before = cache.snapshot();
        let flag = ArchivedFlag::new(false);
        let gate = DragGate::new(BOARD, Arc::new(StaticPermissions::allow_all()), flag.clone());
        let mut session = DragSession::new(gate);

        session.start(&mut cache, DragItem::Task(TaskId(10))).unwrap();
        assert_eq!(
            session.hover(&mut cache, HoverTarget::Task(TaskId(11))),
            HoverOutcome::Reordered
        );
        flag.set(true);
        assert_eq!(
            session.hover(&mut cache, HoverTarget::Task(TaskId(12))),
            HoverOutcome::Ignored
        );
        let outcome = session.drop_on(&mut cache, Some(HoverTarget::Task(TaskId(12))));
        assert_eq!(outcome, DropOutcome::NoOp(NoOpReason::ReadOnly));
        assert_eq!(cache.snapshot(), before);
    }

    #[test]
    fn archived_board_refuses_start() {
        let mut cache = cache();
        let gate = DragGate::new(
            BOARD,
            Arc::new(StaticPermissions::allow_all()),
            ArchivedFlag::new(true),
        );
        let mut session = DragSession::new(gate);
        assert_eq!(
            session.start(&mut cache, DragItem::Task(TaskId(10))),
            Err(DragRejection::ReadOnly)
        );
    }

    #[test]
    fn drop_without_drag_is_not_dragging() {
        let mut cache = cache();
        let mut session = DragSession::new(DragGate::permissive(BOARD));
        assert_eq!(
            session.drop_on(&mut cache, Some(HoverTarget::Column(ColumnId(1)))),
            DropOutcome::NoOp(NoOpReason::NotDragging)
        );
    }
}
