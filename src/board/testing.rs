//! Fixtures and an in-memory `BoardApi` for unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use boardsync_common::{
    Board, BoardId, Column, ColumnId, Comment, CommentId, MoveTask, Priority, ReorderColumns, Task,
    TaskId, UserId, WorkspaceId,
};
use chrono::Utc;
use tokio::sync::Notify;

use super::client::{BoardApi, SyncResult};
use super::mutator::BoardCommand;
use crate::errors::SyncError;

pub const BOARD: BoardId = BoardId(1);

pub fn board() -> Board {
    Board {
        id: BOARD,
        workspace_id: WorkspaceId(1),
        name: "Roadmap".to_string(),
        description: String::new(),
        archived: false,
    }
}

pub fn column(id: i64, position: i64) -> Column {
    Column {
        id: ColumnId(id),
        board_id: BOARD,
        name: format!("Column {id}"),
        position,
    }
}

pub fn task(id: i64, column: i64, position: i64) -> Task {
    Task {
        id: TaskId(id),
        column_id: ColumnId(column),
        title: format!("Task {id}"),
        description: String::new(),
        position,
        assignee_id: None,
        status: None,
        priority: Priority::Medium,
        due_date: None,
    }
}

pub fn comment(id: i64, task_id: i64, body: &str) -> Comment {
    Comment {
        id: CommentId(id),
        task_id: TaskId(task_id),
        author_id: UserId(1),
        body: body.to_string(),
        created_at: Utc::now(),
    }
}

/// Serves whatever is loaded into it and records every command.
#[derive(Default)]
pub struct MockBoardApi {
    pub columns: Mutex<Vec<Column>>,
    pub tasks: Mutex<Vec<Task>>,
    pub commands: Mutex<Vec<BoardCommand>>,
    pub fail_commands: AtomicBool,
    pub fail_fetches: AtomicBool,
    pub fetches: AtomicUsize,
    /// When set, commands wait for `release` before answering.
    pub hold_commands: AtomicBool,
    pub release: Notify,
}

impl MockBoardApi {
    pub fn with(columns: Vec<Column>, tasks: Vec<Task>) -> Self {
        let api = Self::default();
        *api.columns.lock().unwrap() = columns;
        *api.tasks.lock().unwrap() = tasks;
        api
    }

    pub fn set_tasks(&self, tasks: Vec<Task>) {
        *self.tasks.lock().unwrap() = tasks;
    }

    pub fn recorded(&self) -> Vec<BoardCommand> {
        self.commands.lock().unwrap().clone()
    }

    fn fetch_result<T>(&self, endpoint: &str, value: T) -> SyncResult<T> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(SyncError::Status {
                endpoint: endpoint.to_string(),
                status: 503,
            });
        }
        Ok(value)
    }

    async fn command_result(&self, endpoint: &str, command: BoardCommand) -> SyncResult<()> {
        self.commands.lock().unwrap().push(command);
        if self.hold_commands.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        if self.fail_commands.load(Ordering::SeqCst) {
            return Err(SyncError::Status {
                endpoint: endpoint.to_string(),
                status: 500,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl BoardApi for MockBoardApi {
    async fn fetch_board(&self, _board_id: BoardId) -> SyncResult<Board> {
        self.fetch_result("/boards/1", board())
    }

    async fn fetch_columns(&self, _board_id: BoardId) -> SyncResult<Vec<Column>> {
        let columns = self.columns.lock().unwrap().clone();
        self.fetch_result("/boards/1/columns", columns)
    }

    async fn fetch_tasks(&self, _board_id: BoardId) -> SyncResult<Vec<Task>> {
        let tasks = self.tasks.lock().unwrap().clone();
        self.fetch_result("/boards/1/tasks", tasks)
    }

    async fn reorder_columns(&self, board_id: BoardId, command: &ReorderColumns) -> SyncResult<()> {
        let recorded = BoardCommand::ReorderColumns {
            board_id,
            command: command.clone(),
        };
        self.command_result("/boards/1/columns/reorder", recorded).await?;
        for column in self.columns.lock().unwrap().iter_mut() {
            if let Some(index) = command.column_ids.iter().position(|id| *id == column.id) {
                column.position = index as i64;
            }
        }
        Ok(())
    }

    async fn move_task(&self, command: &MoveTask) -> SyncResult<()> {
        self.command_result("/tasks/move", BoardCommand::MoveTask(command.clone()))
            .await?;
        relocate(&mut self.tasks.lock().unwrap(), command);
        Ok(())
    }
}

/// Apply a confirmed move to the served tasks, as the backend would.
fn relocate(tasks: &mut [Task], command: &MoveTask) {
    let Some(source) = tasks.iter().find(|t| t.id == command.task_id).map(|t| t.column_id) else {
        return;
    };
    let ordered = |column: ColumnId| {
        let mut in_column: Vec<&Task> = tasks
            .iter()
            .filter(|t| t.column_id == column && t.id != command.task_id)
            .collect();
        in_column.sort_by_key(|t| t.position);
        in_column.into_iter().map(|t| t.id).collect::<Vec<TaskId>>()
    };
    let mut destination = ordered(command.target_column_id);
    destination.insert(command.target_position.min(destination.len()), command.task_id);
    let remaining = ordered(source);

    for task in tasks.iter_mut() {
        if let Some(index) = destination.iter().position(|id| *id == task.id) {
            task.column_id = command.target_column_id;
            task.position = index as i64;
        } else if let Some(index) = remaining.iter().position(|id| *id == task.id) {
            task.position = index as i64;
        }
    }
}
