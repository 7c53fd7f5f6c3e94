//! Reconciling mutator: turns a completed drag into a durable change.
//!
//! The order was already applied provisionally during the drag. Here the
//! touched scope is reindexed to canonical positions and the confirming
//! command is sent in the background. Until it answers, fetched data for the
//! touched collection is held back so a refetch cannot put the pre-move
//! order back. A confirmed command or a failed column reorder invalidates
//! the collection; a failed task move is only surfaced. Nothing is rolled
//! back.

use std::sync::Arc;

use boardsync_common::{BoardId, ColumnId, MoveTask, ReorderColumns, TaskId};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::cache::{BoardCache, CacheHandle, Collection};
use super::client::BoardApi;
use super::drag::CompletedDrag;
use super::notify::{Level, Notifier};
use crate::errors::SyncError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardCommand {
    ReorderColumns {
        board_id: BoardId,
        command: ReorderColumns,
    },
    MoveTask(MoveTask),
}

impl BoardCommand {
    /// Collection whose order the command changes.
    pub fn collection(&self) -> Collection {
        match self {
            BoardCommand::ReorderColumns { .. } => Collection::Columns,
            BoardCommand::MoveTask(_) => Collection::Tasks,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            BoardCommand::ReorderColumns { board_id, command } => {
                format!("reorder {} columns on board {}", command.column_ids.len(), board_id)
            }
            BoardCommand::MoveTask(cmd) => format!(
                "move task {} to column {} at {}",
                cmd.task_id, cmd.target_column_id, cmd.target_position
            ),
        }
    }
}

/// Reindex the scope a drop touched and build the command that confirms it.
///
/// Columns: every column of the board gets a contiguous position and the
/// full ordered id list is sent. Tasks: the destination column (and the
/// source column, when different) is reindexed and the task's index in the
/// destination becomes `target_position`.
pub fn prepare(cache: &mut BoardCache, completed: &CompletedDrag) -> Option<BoardCommand> {
    match completed {
        CompletedDrag::Columns { .. } => {
            let column_ids = cache.reindex_columns();
            Some(BoardCommand::ReorderColumns {
                board_id: cache.board_id(),
                command: ReorderColumns { column_ids },
            })
        }
        CompletedDrag::Task {
            task_id,
            from_column,
            to_column,
            ..
        } => {
            let destination = cache.reindex_column_tasks(*to_column);
            if from_column != to_column {
                cache.reindex_column_tasks(*from_column);
            }
            let target_position = destination.iter().position(|id| id == task_id)?;
            Some(BoardCommand::MoveTask(MoveTask {
                task_id: *task_id,
                target_column_id: *to_column,
                target_position,
            }))
        }
    }
}

/// [`prepare`] the command and mark its collection as awaiting an answer.
///
/// Runs under the same cache lock as the drop so no fetch can land between
/// the two.
pub fn stage(cache: &mut BoardCache, completed: &CompletedDrag) -> Option<BoardCommand> {
    let command = prepare(cache, completed)?;
    cache.begin_command(command.collection());
    Some(command)
}

#[derive(Debug)]
pub enum CommandOutcome {
    Confirmed,
    Failed(SyncError),
    /// The owning view was disposed before the response arrived (or the
    /// request task died), so no side effects were applied.
    Muted,
}

/// Handle to a command that has been sent.
#[derive(Debug)]
pub struct InFlight {
    command: BoardCommand,
    handle: JoinHandle<CommandOutcome>,
}

impl InFlight {
    pub fn command(&self) -> &BoardCommand {
        &self.command
    }

    pub async fn wait(self) -> CommandOutcome {
        self.handle.await.unwrap_or(CommandOutcome::Muted)
    }
}

#[derive(Clone)]
pub struct ReconcilingMutator {
    api: Arc<dyn BoardApi>,
    cache: CacheHandle,
    notifier: Notifier,
    shutdown: CancellationToken,
}

impl ReconcilingMutator {
    pub fn new(api: Arc<dyn BoardApi>, cache: CacheHandle, notifier: Notifier) -> Self {
        Self {
            api,
            cache,
            notifier,
            shutdown: CancellationToken::new(),
        }
    }

    /// Finalise a drop: canonical positions go into the cache right away and
    /// the confirming command is dispatched. `None` when the dragged task is
    /// no longer in the cache.
    pub fn commit(&self, completed: &CompletedDrag) -> Option<InFlight> {
        let command = self.cache.write(|cache| stage(cache, completed))?;
        Some(self.send(command))
    }

    /// Send a command that was [`stage`]d on this mutator's cache.
    pub fn send(&self, command: BoardCommand) -> InFlight {
        let muted = self.shutdown.child_token();
        tracing::info!(command = %command.describe(), "sending board command");

        let api = Arc::clone(&self.api);
        let notifier = self.notifier.clone();
        let pending = PendingCommand {
            cache: self.cache.clone(),
            collection: command.collection(),
            refetch: false,
        };
        let sent = command.clone();
        let handle = tokio::spawn(async move {
            let mut pending = pending;
            let result = match &sent {
                BoardCommand::ReorderColumns { board_id, command } => {
                    api.reorder_columns(*board_id, command).await
                }
                BoardCommand::MoveTask(command) => api.move_task(command).await,
            };
            if muted.is_cancelled() {
                tracing::debug!(command = %sent.describe(), "completion muted after dispose");
                return CommandOutcome::Muted;
            }
            match result {
                Ok(()) => {
                    pending.refetch = true;
                    CommandOutcome::Confirmed
                }
                Err(e) => {
                    pending.refetch = on_failure(&sent, &e, &notifier);
                    CommandOutcome::Failed(e)
                }
            }
        });

        InFlight { command, handle }
    }

    /// Mute every in-flight and future completion.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

/// Releases the hold on a command's collection when the request task ends,
/// however it ends.
struct PendingCommand {
    cache: CacheHandle,
    collection: Collection,
    refetch: bool,
}

impl Drop for PendingCommand {
    fn drop(&mut self) {
        let (collection, refetch) = (self.collection, self.refetch);
        self.cache.write(|c| c.settle_command(collection, refetch));
    }
}

/// Surface a failed command. Returns whether the collection should be
/// refetched.
fn on_failure(command: &BoardCommand, error: &SyncError, notifier: &Notifier) -> bool {
    tracing::warn!(command = %command.describe(), error = %error, "board command failed");
    let level = failure_level(error);
    match command {
        BoardCommand::ReorderColumns { .. } => {
            notifier.notify(level, format!("Could not save column order: {error}"));
            true
        }
        BoardCommand::MoveTask(cmd) => {
            notifier.notify(level, format_move_failure(cmd.task_id, cmd.target_column_id, error));
            false
        }
    }
}

/// Failures that may clear up on their own are warnings; the rest are errors.
fn failure_level(error: &SyncError) -> Level {
    if error.is_transient() {
        Level::Warning
    } else {
        Level::Error
    }
}

fn format_move_failure(task_id: TaskId, column_id: ColumnId, error: &SyncError) -> String {
    format!("Could not move task {task_id} to column {column_id}: {error}")
}
