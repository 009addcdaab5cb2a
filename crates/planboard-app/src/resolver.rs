//! Turns drop targets and explicit move requests into resolved moves.

use planboard_core::placement::{self, Placement};
use planboard_core::{ColumnId, TaskId};
use thiserror::Error;

use crate::board_state::BoardState;

/// What the dragged card was released over.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DropTarget {
    /// Empty space of a column.
    Column(ColumnId),
    /// Another card.
    Task(TaskId),
}

/// A move with both ends known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMove {
    /// Task being moved.
    pub task: TaskId,
    /// Placement before the move.
    pub from: Placement,
    /// Placement after the move.
    pub to: Placement,
}

impl ResolvedMove {
    /// A move that leaves the task where it is.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }

    /// Whether the task changes column.
    #[must_use]
    pub fn changes_column(&self) -> bool {
        self.from.status != self.to.status
    }
}

/// Reasons a move cannot be resolved.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MoveError {
    /// The task id is not on the board.
    #[error("task not found: {0}")]
    UnknownTask(TaskId),
    /// The status names no column.
    #[error("status '{0}' is not a board column")]
    UnknownColumn(ColumnId),
}

/// Resolve a drop target against the full, unfiltered board.
///
/// # Errors
/// Returns [`MoveError`] when either task is unknown or the destination is not a column.
pub fn resolve(board: &BoardState, task: &TaskId, target: &DropTarget) -> Result<ResolvedMove, MoveError> {
    let from = board
        .placement_of(task)
        .ok_or_else(|| MoveError::UnknownTask(task.clone()))?;

    let to = match target {
        DropTarget::Column(column) => {
            ensure_column(board, column)?;
            Placement {
                status: column.clone(),
                index: placement::end_index(board.tasks(), column, task),
            }
        }
        DropTarget::Task(over) if over == task => from.clone(),
        DropTarget::Task(over) => {
            let over_at = board
                .placement_of(over)
                .ok_or_else(|| MoveError::UnknownTask(over.clone()))?;
            ensure_column(board, &over_at.status)?;
            // Same column: array move to the target's index. Other column:
            // insert at the target's index, pushing it down.
            over_at
        }
    };

    Ok(ResolvedMove {
        task: task.clone(),
        from,
        to,
    })
}

/// Resolve an explicit `(status, position)` request.
///
/// # Errors
/// Returns [`MoveError`] when the task is unknown or the status names no column.
pub fn resolve_explicit(
    board: &BoardState,
    task: &TaskId,
    status: &ColumnId,
    position: u32,
) -> Result<ResolvedMove, MoveError> {
    let from = board
        .placement_of(task)
        .ok_or_else(|| MoveError::UnknownTask(task.clone()))?;
    ensure_column(board, status)?;
    let last = placement::end_index(board.tasks(), status, task);
    Ok(ResolvedMove {
        task: task.clone(),
        from,
        to: Placement {
            status: status.clone(),
            index: position.min(last),
        },
    })
}

fn ensure_column(board: &BoardState, column: &ColumnId) -> Result<(), MoveError> {
    if board.has_column(column) {
        Ok(())
    } else {
        Err(MoveError::UnknownColumn(column.clone()))
    }
}
