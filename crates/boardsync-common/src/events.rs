//! Realtime wire format.
//!
//! Server → client frames are a JSON [`RealtimeEvent`] tagged as
//! `{"type": "...", "data": {...}}`. Client → server frames are
//! [`ChannelRequest`]s that join or leave a scope.

use serde::{Deserialize, Serialize};

use crate::ids::{BoardId, ColumnId, TaskId, WorkspaceId};
use crate::models::{Column, Comment, Task};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all_fields = "camelCase")]
pub enum RealtimeEvent {
    ColumnCreated {
        board_id: BoardId,
        column: Column,
    },
    ColumnUpdated {
        board_id: BoardId,
        column: Column,
    },
    ColumnReordered {
        board_id: BoardId,
        column_ids: Vec<ColumnId>,
    },
    ColumnDeleted {
        board_id: BoardId,
        column_id: ColumnId,
    },
    TaskCreated {
        board_id: BoardId,
        task: Task,
    },
    TaskUpdated {
        board_id: BoardId,
        task: Task,
    },
    TaskMoved {
        board_id: BoardId,
        task_id: TaskId,
        from_column_id: ColumnId,
        to_column_id: ColumnId,
        position: i64,
    },
    TaskDeleted {
        board_id: BoardId,
        task_id: TaskId,
    },
    CommentAdded {
        board_id: BoardId,
        comment: Comment,
    },
}

impl RealtimeEvent {
    pub fn board_id(&self) -> BoardId {
        match self {
            Self::ColumnCreated { board_id, .. }
            | Self::ColumnUpdated { board_id, .. }
            | Self::ColumnReordered { board_id, .. }
            | Self::ColumnDeleted { board_id, .. }
            | Self::TaskCreated { board_id, .. }
            | Self::TaskUpdated { board_id, .. }
            | Self::TaskMoved { board_id, .. }
            | Self::TaskDeleted { board_id, .. }
            | Self::CommentAdded { board_id, .. } => *board_id,
        }
    }

    /// Event name as it appears in the `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ColumnCreated { .. } => "ColumnCreated",
            Self::ColumnUpdated { .. } => "ColumnUpdated",
            Self::ColumnReordered { .. } => "ColumnReordered",
            Self::ColumnDeleted { .. } => "ColumnDeleted",
            Self::TaskCreated { .. } => "TaskCreated",
            Self::TaskUpdated { .. } => "TaskUpdated",
            Self::TaskMoved { .. } => "TaskMoved",
            Self::TaskDeleted { .. } => "TaskDeleted",
            Self::CommentAdded { .. } => "CommentAdded",
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// What a realtime connection is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ChannelScope {
    Board(BoardId),
    Workspace(WorkspaceId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ChannelRequest {
    Join { scope: ChannelScope },
    Leave { scope: ChannelScope },
}

impl ChannelRequest {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
