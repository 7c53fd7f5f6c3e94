//! Shared domain types for boardsync.
//!
//! Everything here is plain data that crosses the wire: board entities, the
//! two ordering commands and the realtime event stream.

pub mod commands;
pub mod events;
pub mod ids;
pub mod models;

pub use commands::{MoveTask, ReorderColumns};
pub use events::{ChannelRequest, ChannelScope, RealtimeEvent};
pub use ids::{BoardId, ColumnId, CommentId, TaskId, UserId, WorkspaceId};
pub use models::{Board, Column, Comment, Priority, Task};
