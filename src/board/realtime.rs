//! Realtime event applier.
//!
//! Structural events mark a collection stale (invalidate-and-refetch); the
//! refetch worker picks that up. Point updates to one known entity are
//! patched in place. Events are applied strictly in arrival order.

use boardsync_common::{RealtimeEvent, TaskId};

use super::cache::{BoardCache, CacheHandle, Collection, TaskPatch};

/// What applying one event did to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Invalidated(Collection),
    Patched(TaskId),
    CommentAppended(TaskId),
    /// Repeat delivery of a comment already in the list.
    Duplicate,
    /// Event belongs to another board on the same channel.
    OtherBoard,
}

pub fn apply_event(cache: &mut BoardCache, event: &RealtimeEvent) -> Effect {
    if event.board_id() != cache.board_id() {
        return Effect::OtherBoard;
    }
    match event {
        RealtimeEvent::ColumnCreated { .. }
        | RealtimeEvent::ColumnUpdated { .. }
        | RealtimeEvent::ColumnReordered { .. }
        | RealtimeEvent::ColumnDeleted { .. } => {
            cache.invalidate(Collection::Columns);
            Effect::Invalidated(Collection::Columns)
        }
        RealtimeEvent::TaskCreated { .. }
        | RealtimeEvent::TaskMoved { .. }
        | RealtimeEvent::TaskDeleted { .. } => {
            cache.invalidate(Collection::Tasks);
            Effect::Invalidated(Collection::Tasks)
        }
        RealtimeEvent::TaskUpdated { task, .. } => match cache.patch_task(task) {
            TaskPatch::Patched => Effect::Patched(task.id),
            // Unknown task, or the update also moved it: fall back to a refetch.
            TaskPatch::Unknown | TaskPatch::OrderingDiverged => {
                cache.invalidate(Collection::Tasks);
                Effect::Invalidated(Collection::Tasks)
            }
        },
        RealtimeEvent::CommentAdded { comment, .. } => {
            let task_id = comment.task_id;
            if cache.append_comment(comment.clone()) {
                Effect::CommentAppended(task_id)
            } else {
                Effect::Duplicate
            }
        }
    }
}

/// Writes realtime traffic for one board into its cache.
#[derive(Clone)]
pub struct EventApplier {
    cache: CacheHandle,
}

impl EventApplier {
    pub fn new(cache: CacheHandle) -> Self {
        Self { cache }
    }

    pub fn apply(&self, event: &RealtimeEvent) -> Effect {
        let effect = self.cache.write(|cache| apply_event(cache, event));
        tracing::debug!(event = event.name(), ?effect, "applied realtime event");
        effect
    }

    /// Pushes may have been missed while disconnected.
    pub fn reconnected(&self) {
        self.cache.write(|cache| {
            cache.invalidate(Collection::Columns);
            cache.invalidate(Collection::Tasks);
        });
        tracing::debug!("channel reconnected, board invalidated");
    }
}
