//! Live board follow (`boardsync watch`).

use std::sync::Arc;

use anyhow::{Context, Result};
use boardsync::board::{BoardApi, BoardView, Collection, ViewOptions};
use boardsync::config::SyncConfig;
use boardsync_common::{BoardId, ChannelScope, WorkspaceId};

use super::show::render_board;

pub async fn cmd_watch(config: &SyncConfig, board: i64, workspace: Option<i64>) -> Result<()> {
    let api: Arc<dyn BoardApi> = Arc::new(config.api_client()?);
    let scope = match workspace {
        Some(id) => ChannelScope::Workspace(WorkspaceId(id)),
        None => ChannelScope::Board(BoardId(board)),
    };
    let options = ViewOptions {
        realtime: config
            .realtime_enabled()
            .then(|| (config.realtime_channel(), scope)),
        ..ViewOptions::default()
    };
    if options.realtime.is_none() {
        tracing::warn!("realtime disabled in config; only the initial board is shown");
    }

    let view = BoardView::mount(BoardId(board), api, options)
        .await
        .with_context(|| format!("Failed to load board {board} from {}", config.api_url()))?;
    let mut revisions = view.cache().subscribe();
    let mut notifications = view.notifications();
    let mut last_printed = String::new();

    loop {
        let fresh = view
            .cache()
            .read(|c| !c.is_stale(Collection::Columns) && !c.is_stale(Collection::Tasks));
        if fresh {
            let rendered = view.cache().read(render_board);
            if rendered != last_printed {
                println!("{rendered}");
                last_printed = rendered;
            }
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = revisions.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            Ok(note) = notifications.recv() => {
                eprintln!("[{}] {}", note.level, note.message);
            }
        }
    }

    view.dispose().await;
    Ok(())
}
