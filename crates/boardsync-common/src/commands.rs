//! Request bodies for the two ordering commands the engine issues.

use serde::{Deserialize, Serialize};

use crate::ids::{ColumnId, TaskId};

/// Full ordered list of a board's columns. The backend persists positions
/// from the list order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderColumns {
    pub column_ids: Vec<ColumnId>,
}

/// Relocate one task. `target_position` is the zero-based index inside the
/// destination column's current list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveTask {
    pub task_id: TaskId,
    pub target_column_id: ColumnId,
    pub target_position: usize,
}
