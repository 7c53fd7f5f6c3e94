//! Scripted drags (`boardsync move-task` and `boardsync reorder-column`).
//!
//! Both commands drive the same drag session a pointer would: start, a
//! short series of hovers that walk the item to its slot, then drop.

use anyhow::{Result, bail};
use boardsync::board::{BoardOrder, BoardView, CommandOutcome, DragItem, DropOutcome, HoverTarget};
use boardsync::config::SyncConfig;
use boardsync_common::{ColumnId, TaskId};

/// Hovers that bring `task` to `index` in `column`, and the drop target.
///
/// A column change goes over the column surface first; the task then sits
/// in the destination and a same-column hover places it at `index`.
pub fn plan_task_hovers(
    order: &BoardOrder,
    task: TaskId,
    column: ColumnId,
    index: usize,
) -> Result<(Vec<HoverTarget>, HoverTarget)> {
    let Some(current) = order.task(task) else {
        bail!("Task {task} is not on this board");
    };
    if order.column_index(column).is_none() {
        bail!("Column {column} is not on this board");
    }

    let mut hovers = Vec::new();
    let mut destination = order.task_ids_in_column(column);
    if current.column_id != column {
        hovers.push(HoverTarget::Column(column));
        // Adopting the column keeps the task's slot in the board-wide list.
        let mut moved = order.clone();
        if let Some(t) = moved.tasks.iter_mut().find(|t| t.id == task) {
            t.column_id = column;
        }
        destination = moved.task_ids_in_column(column);
    }

    let index = index.min(destination.len().saturating_sub(1));
    let occupant = destination[index];
    if occupant != task {
        hovers.push(HoverTarget::Task(occupant));
    }
    let drop_target = hovers.last().copied().unwrap_or(HoverTarget::Column(column));
    Ok((hovers, drop_target))
}

/// Hover and drop target that bring `column` to `index`, or `None` when
/// it is already there.
pub fn plan_column_hover(order: &BoardOrder, column: ColumnId, index: usize) -> Result<Option<HoverTarget>> {
    let ids = order.column_ids();
    if !ids.contains(&column) {
        bail!("Column {column} is not on this board");
    }
    let index = index.min(ids.len() - 1);
    Ok((ids[index] != column).then_some(HoverTarget::Column(ids[index])))
}

pub async fn cmd_move_task(config: &SyncConfig, board: i64, task: i64, column: i64, index: usize) -> Result<()> {
    let mut view = super::mount_static(config, board).await?;
    let task = TaskId(task);
    let (hovers, target) = view
        .cache()
        .read(|c| plan_task_hovers(c.order(), task, ColumnId(column), index))?;

    view.begin_drag(DragItem::Task(task))?;
    for hover in hovers {
        view.hover(hover);
    }
    finish(view, target).await
}

pub async fn cmd_reorder_column(config: &SyncConfig, board: i64, column: i64, index: usize) -> Result<()> {
    let mut view = super::mount_static(config, board).await?;
    let column = ColumnId(column);
    let Some(target) = view.cache().read(|c| plan_column_hover(c.order(), column, index))? else {
        println!("Column {column} is already at index {index}");
        view.dispose().await;
        return Ok(());
    };

    view.begin_drag(DragItem::Column(column))?;
    view.hover(target);
    finish(view, target).await
}

async fn finish(mut view: BoardView, target: HoverTarget) -> Result<()> {
    let dropped = view.drop_on(Some(target));
    let result = match (dropped.outcome, dropped.command) {
        (DropOutcome::NoOp(reason), _) => {
            println!("Nothing to do ({reason:?})");
            Ok(())
        }
        (DropOutcome::Committed(_), None) => Ok(()),
        (DropOutcome::Committed(_), Some(in_flight)) => {
            let description = in_flight.command().describe();
            match in_flight.wait().await {
                CommandOutcome::Confirmed => {
                    println!("Done: {description}");
                    Ok(())
                }
                CommandOutcome::Failed(e) => Err(anyhow::Error::new(e).context(format!("Failed to {description}"))),
                CommandOutcome::Muted => Ok(()),
            }
        }
    };
    view.dispose().await;
    result
}
