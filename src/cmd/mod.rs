//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module   | Commands handled               |
//! |----------|--------------------------------|
//! | `show`   | `Show`                         |
//! | `watch`  | `Watch`                        |
//! | `drag`   | `MoveTask`, `ReorderColumn`    |
//! | `config` | `Config`                       |

pub mod config;
pub mod drag;
pub mod show;
pub mod watch;

pub use config::cmd_config;
pub use drag::{cmd_move_task, cmd_reorder_column};
pub use show::cmd_show;
pub use watch::cmd_watch;

use std::sync::Arc;

use anyhow::{Context, Result};
use boardsync::board::{BoardApi, BoardView, ViewOptions};
use boardsync::config::SyncConfig;
use boardsync_common::BoardId;

/// Mount a board without a realtime subscription.
pub(crate) async fn mount_static(config: &SyncConfig, board: i64) -> Result<BoardView> {
    let api: Arc<dyn BoardApi> = Arc::new(config.api_client()?);
    BoardView::mount(BoardId(board), api, ViewOptions::default())
        .await
        .with_context(|| format!("Failed to load board {board} from {}", config.api_url()))
}
