//! Board listing (`boardsync show`).

use std::fmt::Write as _;

use anyhow::{Context, Result};
use boardsync::board::BoardCache;
use boardsync::config::SyncConfig;

pub async fn cmd_show(config: &SyncConfig, board: i64, json: bool) -> Result<()> {
    let view = super::mount_static(config, board).await?;
    let output = if json {
        view.cache().read(render_json)?
    } else {
        view.cache().read(render_board)
    };
    print!("{output}");
    view.dispose().await;
    Ok(())
}

/// Columns in render order, each followed by its tasks.
pub fn render_board(cache: &BoardCache) -> String {
    let mut out = String::new();
    let name = cache.board().map(|b| b.name.as_str()).unwrap_or("(unnamed)");
    let _ = writeln!(out, "{} (board {})", name, cache.board_id());
    if cache.board().is_some_and(|b| b.archived) {
        let _ = writeln!(out, "  [archived]");
    }
    for column in cache.columns() {
        let _ = writeln!(out);
        let _ = writeln!(out, "[{}] {} (column {})", column.position, column.name, column.id);
        let mut empty = true;
        for task in cache.tasks_in_column(column.id) {
            empty = false;
            let _ = writeln!(
                out,
                "  {:>3}. {} (task {}, {})",
                task.position,
                task.title,
                task.id,
                task.priority.as_str()
            );
        }
        if empty {
            let _ = writeln!(out, "  (no tasks)");
        }
    }
    out
}

pub fn render_json(cache: &BoardCache) -> Result<String> {
    let value = serde_json::json!({
        "board": cache.board(),
        "columns": cache.columns(),
        "tasks": cache.tasks(),
    });
    let mut rendered = serde_json::to_string_pretty(&value).context("Failed to serialize board")?;
    rendered.push('\n');
    Ok(rendered)
}
