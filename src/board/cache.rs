//! Local board cache: the per-board projection the UI renders from.
//!
//! Columns and tasks are held in render order. A wholesale replace (fetch)
//! sorts by position with arrival order as the tiebreak; drag hovers splice
//! items directly in the vectors. Each collection carries its own staleness
//! and a generation counter so a fetch that raced a newer invalidation is
//! recognised and refetched again.
//!
//! [`CacheHandle`] is the injectable container the board view owns and hands
//! to the drag session, the mutator and the realtime applier.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use boardsync_common::{Board, BoardId, Column, ColumnId, Comment, Task, TaskId};
use tokio::sync::watch;

use super::position::{self, Ordered};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Columns,
    Tasks,
}

/// Columns and tasks in render order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardOrder {
    pub columns: Vec<Column>,
    pub tasks: Vec<Task>,
}

impl BoardOrder {
    pub fn column_index(&self, id: ColumnId) -> Option<usize> {
        self.columns.iter().position(|c| c.id == id)
    }

    pub fn task_index(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn column_ids(&self) -> Vec<ColumnId> {
        position::ids_in_order(&self.columns)
    }

    pub fn task_ids_in_column(&self, column_id: ColumnId) -> Vec<TaskId> {
        self.tasks
            .iter()
            .filter(|t| t.column_id == column_id)
            .map(|t| t.id)
            .collect()
    }
}

/// Proof that a fetch was started at a particular generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub collection: Collection,
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchApplied {
    Applied,
    /// Applied, but an invalidation arrived while the fetch was in flight.
    AppliedStillStale,
    /// Discarded because a drag owns the provisional order.
    DeferredByDrag,
    /// Discarded because a command touching the collection is unanswered.
    DeferredByCommand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskPatch {
    Patched,
    Unknown,
    /// Content patched, but the server places the task elsewhere.
    OrderingDiverged,
}

#[derive(Debug, Clone, Copy)]
struct Freshness {
    loaded: bool,
    stale: bool,
    generation: u64,
    pending_commands: usize,
}

impl Default for Freshness {
    fn default() -> Self {
        Self {
            loaded: false,
            stale: true,
            generation: 0,
            pending_commands: 0,
        }
    }
}

#[derive(Debug)]
pub struct BoardCache {
    board_id: BoardId,
    board: Option<Board>,
    order: BoardOrder,
    comments: HashMap<TaskId, Vec<Comment>>,
    columns_state: Freshness,
    tasks_state: Freshness,
    drag_in_progress: bool,
}

impl BoardCache {
    pub fn new(board_id: BoardId) -> Self {
        Self {
            board_id,
            board: None,
            order: BoardOrder::default(),
            comments: HashMap::new(),
            columns_state: Freshness::default(),
            tasks_state: Freshness::default(),
            drag_in_progress: false,
        }
    }

    pub fn board_id(&self) -> BoardId {
        self.board_id
    }

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub fn set_board(&mut self, board: Board) {
        self.board = Some(board);
    }

    pub fn columns(&self) -> &[Column] {
        &self.order.columns
    }

    pub fn tasks(&self) -> &[Task] {
        &self.order.tasks
    }

    pub fn order(&self) -> &BoardOrder {
        &self.order
    }

    pub(crate) fn order_mut(&mut self) -> &mut BoardOrder {
        &mut self.order
    }

    pub fn column(&self, id: ColumnId) -> Option<&Column> {
        self.order.columns.iter().find(|c| c.id == id)
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.order.task(id)
    }

    pub fn column_ids(&self) -> Vec<ColumnId> {
        self.order.column_ids()
    }

    pub fn tasks_in_column(&self, column_id: ColumnId) -> impl Iterator<Item = &Task> + '_ {
        self.order
            .tasks
            .iter()
            .filter(move |t| t.column_id == column_id)
    }

    pub fn task_ids_in_column(&self, column_id: ColumnId) -> Vec<TaskId> {
        self.order.task_ids_in_column(column_id)
    }

    // ── Wholesale replace ───────────────────────────────────────────

    /// Replace the column collection and drop tasks whose column vanished.
    pub fn replace_columns(&mut self, mut columns: Vec<Column>) {
        columns.retain(|c| c.board_id == self.board_id);
        position::sort_stable(&mut columns);
        self.order.columns = columns;
        self.columns_state.loaded = true;
        self.columns_state.stale = false;
        self.prune_orphan_tasks();
    }

    /// Replace the task collection. Tasks pointing at unknown columns are
    /// dropped once columns have been loaded.
    pub fn replace_tasks(&mut self, mut tasks: Vec<Task>) {
        position::sort_stable(&mut tasks);
        self.order.tasks = tasks;
        self.tasks_state.loaded = true;
        self.tasks_state.stale = false;
        self.prune_orphan_tasks();
    }

    fn prune_orphan_tasks(&mut self) {
        if !self.columns_state.loaded {
            return;
        }
        let known: HashSet<ColumnId> = self.order.columns.iter().map(|c| c.id).collect();
        let before = self.order.tasks.len();
        self.order.tasks.retain(|t| known.contains(&t.column_id));
        let dropped = before - self.order.tasks.len();
        if dropped > 0 {
            tracing::debug!(board = %self.board_id, dropped, "dropped tasks without a column");
        }
    }

    // ── Staleness ───────────────────────────────────────────────────

    pub fn invalidate(&mut self, collection: Collection) {
        let state = self.state_mut(collection);
        state.stale = true;
        state.generation += 1;
    }

    pub fn is_stale(&self, collection: Collection) -> bool {
        self.state(collection).stale
    }

    pub fn is_loaded(&self, collection: Collection) -> bool {
        self.state(collection).loaded
    }

    pub fn stale_collections(&self) -> Vec<Collection> {
        [Collection::Columns, Collection::Tasks]
            .into_iter()
            .filter(|c| self.is_stale(*c))
            .collect()
    }

    /// Stale collections a fetch may overwrite right now: none during a
    /// drag, and none with a command still unanswered.
    pub fn refetchable_collections(&self) -> Vec<Collection> {
        if self.drag_in_progress {
            return Vec::new();
        }
        self.stale_collections()
            .into_iter()
            .filter(|c| !self.has_pending_commands(*c))
            .collect()
    }

    pub fn has_pending_commands(&self, collection: Collection) -> bool {
        self.state(collection).pending_commands > 0
    }

    /// A command touching `collection` was sent. Fetch results for it are
    /// held back until the command settles.
    pub(crate) fn begin_command(&mut self, collection: Collection) {
        self.state_mut(collection).pending_commands += 1;
    }

    /// A command touching `collection` answered. With `refetch`, the
    /// collection is invalidated so the next fetch sees the server's state
    /// after the command.
    pub(crate) fn settle_command(&mut self, collection: Collection, refetch: bool) {
        let state = self.state_mut(collection);
        state.pending_commands = state.pending_commands.saturating_sub(1);
        if refetch {
            self.invalidate(collection);
        }
    }

    pub fn begin_fetch(&self, collection: Collection) -> FetchTicket {
        FetchTicket {
            collection,
            generation: self.state(collection).generation,
        }
    }

    pub fn complete_columns_fetch(&mut self, ticket: FetchTicket, columns: Vec<Column>) -> FetchApplied {
        debug_assert_eq!(ticket.collection, Collection::Columns);
        self.complete_fetch(ticket, |cache| cache.replace_columns(columns))
    }

    pub fn complete_tasks_fetch(&mut self, ticket: FetchTicket, tasks: Vec<Task>) -> FetchApplied {
        debug_assert_eq!(ticket.collection, Collection::Tasks);
        self.complete_fetch(ticket, |cache| cache.replace_tasks(tasks))
    }

    fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        replace: impl FnOnce(&mut Self),
    ) -> FetchApplied {
        if self.drag_in_progress {
            self.state_mut(ticket.collection).stale = true;
            return FetchApplied::DeferredByDrag;
        }
        if self.has_pending_commands(ticket.collection) {
            self.state_mut(ticket.collection).stale = true;
            return FetchApplied::DeferredByCommand;
        }
        replace(self);
        let state = self.state_mut(ticket.collection);
        if state.generation != ticket.generation {
            state.stale = true;
            FetchApplied::AppliedStillStale
        } else {
            FetchApplied::Applied
        }
    }

    fn state(&self, collection: Collection) -> &Freshness {
        match collection {
            Collection::Columns => &self.columns_state,
            Collection::Tasks => &self.tasks_state,
        }
    }

    fn state_mut(&mut self, collection: Collection) -> &mut Freshness {
        match collection {
            Collection::Columns => &mut self.columns_state,
            Collection::Tasks => &mut self.tasks_state,
        }
    }

    // ── Point patches ───────────────────────────────────────────────

    /// Patch the content of a known task in place without touching its slot.
    pub fn patch_task(&mut self, update: &Task) -> TaskPatch {
        match self.order.tasks.iter_mut().find(|t| t.id == update.id) {
            Some(task) => {
                task.merge_content_from(update);
                if task.ordering_differs(update) {
                    TaskPatch::OrderingDiverged
                } else {
                    TaskPatch::Patched
                }
            }
            None => TaskPatch::Unknown,
        }
    }

    /// Append a comment to its task's list. Returns false for a repeat.
    pub fn append_comment(&mut self, comment: Comment) -> bool {
        let list = self.comments.entry(comment.task_id).or_default();
        if list.iter().any(|c| c.id == comment.id) {
            return false;
        }
        list.push(comment);
        true
    }

    pub fn comments_for(&self, task_id: TaskId) -> &[Comment] {
        self.comments.get(&task_id).map(Vec::as_slice).unwrap_or(&[])
    }

    // ── Drag support ────────────────────────────────────────────────

    pub fn snapshot(&self) -> BoardOrder {
        self.order.clone()
    }

    pub fn restore(&mut self, snapshot: BoardOrder) {
        self.order = snapshot;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_in_progress
    }

    pub(crate) fn set_dragging(&mut self, dragging: bool) {
        self.drag_in_progress = dragging;
    }

    /// Canonicalise column positions from the current render order.
    pub fn reindex_columns(&mut self) -> Vec<ColumnId> {
        let ids = self.order.column_ids();
        position::apply_positions(&mut self.order.columns, &position::reindex(&ids));
        ids
    }

    /// Canonicalise task positions inside one column from render order.
    pub fn reindex_column_tasks(&mut self, column_id: ColumnId) -> Vec<TaskId> {
        let ids = self.order.task_ids_in_column(column_id);
        let assignment = position::reindex(&ids);
        let lookup: HashMap<TaskId, i64> = assignment.into_iter().collect();
        for task in self
            .order
            .tasks
            .iter_mut()
            .filter(|t| t.column_id == column_id)
        {
            if let Some(&position) = lookup.get(&task.order_id()) {
                task.set_position(position);
            }
        }
        ids
    }
}

/// Shared handle to a [`BoardCache`].
///
/// Every write bumps a revision counter that renderers and the refetch
/// worker can watch.
#[derive(Clone)]
pub struct CacheHandle {
    inner: Arc<Mutex<BoardCache>>,
    revision: Arc<watch::Sender<u64>>,
}

impl CacheHandle {
    pub fn new(cache: BoardCache) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(Mutex::new(cache)),
            revision: Arc::new(revision),
        }
    }

    pub fn read<R>(&self, f: impl FnOnce(&BoardCache) -> R) -> R {
        let guard = self.lock();
        f(&guard)
    }

    pub fn write<R>(&self, f: impl FnOnce(&mut BoardCache) -> R) -> R {
        let result = {
            let mut guard = self.lock();
            f(&mut guard)
        };
        self.revision.send_modify(|rev| *rev += 1);
        result
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    // A panic inside a read/write closure leaves plain data behind; the
    // cache stays usable.
    fn lock(&self) -> MutexGuard<'_, BoardCache> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
