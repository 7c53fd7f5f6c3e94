//! Gatekeeping for drag gestures: the permission layer and the archived flag.
//!
//! Neither rule set lives here. The permission layer is consulted through
//! [`PermissionCheck`] before a drag starts; the archived flag is a shared
//! boolean the host flips whenever the board turns read-only, and it is
//! re-read on every drag transition.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use boardsync_common::BoardId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ReorderColumns,
    MoveTasks,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::ReorderColumns => write!(f, "reorder columns"),
            Capability::MoveTasks => write!(f, "move tasks"),
        }
    }
}

/// Boolean capability lookup supplied by the permission layer.
pub trait PermissionCheck: Send + Sync {
    fn can(&self, board_id: BoardId, capability: Capability) -> bool;
}

/// Fixed grants, used by the CLI and tests.
#[derive(Debug, Clone, Copy)]
pub struct StaticPermissions {
    pub reorder_columns: bool,
    pub move_tasks: bool,
}

impl StaticPermissions {
    pub fn allow_all() -> Self {
        Self {
            reorder_columns: true,
            move_tasks: true,
        }
    }
}

impl PermissionCheck for StaticPermissions {
    fn can(&self, _board_id: BoardId, capability: Capability) -> bool {
        match capability {
            Capability::ReorderColumns => self.reorder_columns,
            Capability::MoveTasks => self.move_tasks,
        }
    }
}

/// Shared read-only switch for one board. Clones observe the same value.
#[derive(Debug, Clone, Default)]
pub struct ArchivedFlag(Arc<AtomicBool>);

impl ArchivedFlag {
    pub fn new(archived: bool) -> Self {
        Self(Arc::new(AtomicBool::new(archived)))
    }

    pub fn set(&self, archived: bool) {
        self.0.store(archived, Ordering::SeqCst);
    }

    pub fn is_archived(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything a drag session consults before a transition fires.
#[derive(Clone)]
pub struct DragGate {
    board_id: BoardId,
    permissions: Arc<dyn PermissionCheck>,
    archived: ArchivedFlag,
}

impl DragGate {
    pub fn new(
        board_id: BoardId,
        permissions: Arc<dyn PermissionCheck>,
        archived: ArchivedFlag,
    ) -> Self {
        Self {
            board_id,
            permissions,
            archived,
        }
    }

    /// A gate that grants everything on a writable board.
    pub fn permissive(board_id: BoardId) -> Self {
        Self::new(
            board_id,
            Arc::new(StaticPermissions::allow_all()),
            ArchivedFlag::default(),
        )
    }

    pub fn board_id(&self) -> BoardId {
        self.board_id
    }

    pub fn archived(&self) -> &ArchivedFlag {
        &self.archived
    }

    pub fn is_read_only(&self) -> bool {
        self.archived.is_archived()
    }

    pub fn permits(&self, capability: Capability) -> bool {
        self.permissions.can(self.board_id, capability)
    }
}

impl fmt::Debug for DragGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragGate")
            .field("board_id", &self.board_id)
            .field("archived", &self.archived.is_archived())
            .finish_non_exhaustive()
    }
}
