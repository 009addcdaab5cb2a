//! Drag gesture state machine: `Idle → Dragging → Idle`.
//!
//! Hovering over another column moves the card there provisionally so the
//! lanes re-render while the pointer is still down. Releasing decides
//! whether anything actually moved.

use planboard_core::TaskId;
use planboard_core::placement::Placement;
use thiserror::Error;
use tracing::debug;

use crate::board_state::BoardState;
use crate::resolver::{self, DropTarget, ResolvedMove};

/// Reasons a gesture cannot start.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DragError {
    /// The picked-up card is not on the board.
    #[error("task not found: {0}")]
    UnknownTask(TaskId),
    /// Another card is still being dragged.
    #[error("task {0} is already being dragged")]
    AlreadyDragging(TaskId),
}

/// Result of releasing a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// Released outside any target; the card went back where it started.
    Cancelled,
    /// Released where it started.
    Unchanged,
    /// The card ended somewhere new.
    Moved(ResolvedMove),
}

#[derive(Debug, Clone)]
struct ActiveDrag {
    task: TaskId,
    origin: Placement,
    hovered: Option<DropTarget>,
    // Target of the last provisional move and where it left the card.
    applied: Option<(DropTarget, Placement)>,
}

/// Tracks the card currently being dragged, if any.
#[derive(Debug, Clone, Default)]
pub struct DragController {
    active: Option<ActiveDrag>,
}

impl DragController {
    /// Controller in the idle state.
    #[must_use]
    pub const fn new() -> Self {
        Self { active: None }
    }

    /// Card being dragged.
    #[must_use]
    pub fn active_task(&self) -> Option<&TaskId> {
        self.active.as_ref().map(|drag| &drag.task)
    }

    /// Whether a gesture is in progress.
    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    /// Last target the pointer was over.
    #[must_use]
    pub fn hovered(&self) -> Option<&DropTarget> {
        self.active.as_ref().and_then(|drag| drag.hovered.as_ref())
    }

    /// Pick up a card.
    ///
    /// # Errors
    /// Returns [`DragError`] when the card is unknown or a gesture is already active.
    pub fn drag_start(&mut self, board: &BoardState, task: &TaskId) -> Result<(), DragError> {
        if let Some(active) = &self.active {
            return Err(DragError::AlreadyDragging(active.task.clone()));
        }
        let origin = board
            .placement_of(task)
            .ok_or_else(|| DragError::UnknownTask(task.clone()))?;
        debug!(task = %task, status = %origin.status, index = origin.index, "drag started");
        self.active = Some(ActiveDrag {
            task: task.clone(),
            origin,
            hovered: None,
            applied: None,
        });
        Ok(())
    }

    /// Pointer moved over `target`. Returns true when the card moved column.
    pub fn drag_over(&mut self, board: &mut BoardState, target: &DropTarget) -> bool {
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        active.hovered = Some(target.clone());
        let mv = match resolver::resolve(board, &active.task, target) {
            Ok(mv) => mv,
            Err(err) => {
                debug!(task = %active.task, error = %err, "ignoring hover");
                return false;
            }
        };
        if !mv.changes_column() {
            return false;
        }
        board.apply_move(&mv);
        active.applied = board
            .placement_of(&active.task)
            .map(|placed| (target.clone(), placed));
        debug!(task = %active.task, status = %mv.to.status, index = mv.to.index, "provisional move");
        true
    }

    /// Release the card over `target`, or outside any target when `None`.
    pub fn drag_end(&mut self, board: &mut BoardState, target: Option<&DropTarget>) -> DropOutcome {
        let Some(active) = self.active.take() else {
            return DropOutcome::Cancelled;
        };
        let Some(target) = target else {
            restore(board, &active);
            debug!(task = %active.task, "drag cancelled");
            return DropOutcome::Cancelled;
        };

        // A provisional move on this target counts only while the card is
        // still where it left it; a store move may have run in between.
        let settled = active.applied.as_ref().is_some_and(|(applied, placed)| {
            applied == target && board.placement_of(&active.task).as_ref() == Some(placed)
        });
        if !settled {
            match resolver::resolve(board, &active.task, target) {
                Ok(mv) => {
                    board.apply_move(&mv);
                }
                Err(err) => {
                    restore(board, &active);
                    debug!(task = %active.task, error = %err, "drop target did not resolve");
                    return DropOutcome::Cancelled;
                }
            }
        }

        let Some(placed) = board.placement_of(&active.task) else {
            return DropOutcome::Cancelled;
        };
        if placed == active.origin {
            return DropOutcome::Unchanged;
        }
        debug!(
            task = %active.task,
            from = %active.origin.status,
            to = %placed.status,
            index = placed.index,
            "drag finished"
        );
        DropOutcome::Moved(ResolvedMove {
            task: active.task,
            from: active.origin,
            to: placed,
        })
    }

    /// Abort the gesture, putting the card back. Returns false when idle.
    pub fn cancel(&mut self, board: &mut BoardState) -> bool {
        let Some(active) = self.active.take() else {
            return false;
        };
        restore(board, &active);
        debug!(task = %active.task, "drag cancelled");
        true
    }
}

fn restore(board: &mut BoardState, active: &ActiveDrag) {
    board.place(&active.task, &active.origin);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{board_with, id, lane_order};

    fn start(board: &BoardState, task: &str) -> DragController {
        let mut drag = DragController::new();
        drag.drag_start(board, &id(task))
            .unwrap_or_else(|err| panic!("drag_start: {err}"));
        drag
    }

    #[test]
    fn reorder_within_column() {
        let mut board = board_with(&[("A", "todo"), ("B", "todo"), ("C", "todo")]);
        let mut drag = start(&board, "C");

        assert!(!drag.drag_over(&mut board, &DropTarget::Task(id("A"))));
        assert_eq!(lane_order(&board, "todo"), ["A", "B", "C"]);

        let outcome = drag.drag_end(&mut board, Some(&DropTarget::Task(id("A"))));
        assert_eq!(
            outcome,
            DropOutcome::Moved(ResolvedMove {
                task: id("C"),
                from: Placement::new("todo", 2),
                to: Placement::new("todo", 0),
            })
        );
        assert_eq!(lane_order(&board, "todo"), ["C", "A", "B"]);
        assert!(!drag.is_dragging());
    }

    #[test]
    fn hover_over_other_column_moves_provisionally() {
        let mut board = board_with(&[("A", "todo"), ("D", "todo")]);
        let mut drag = start(&board, "D");

        assert!(drag.drag_over(&mut board, &DropTarget::Column("in_progress".into())));
        assert_eq!(lane_order(&board, "in_progress"), ["D"]);
        assert_eq!(drag.active_task(), Some(&id("D")));

        let outcome = drag.drag_end(&mut board, Some(&DropTarget::Column("in_progress".into())));
        let DropOutcome::Moved(mv) = outcome else {
            panic!("expected a move, got {outcome:?}");
        };
        assert_eq!(mv.from, Placement::new("todo", 1));
        assert_eq!(mv.to, Placement::new("in_progress", 0));
    }

    #[test]
    fn provisional_drop_onto_card_keeps_its_index() {
        let mut board = board_with(&[("A", "todo"), ("B", "todo"), ("X", "done"), ("Y", "done")]);
        let mut drag = start(&board, "A");
        let target = DropTarget::Task(id("Y"));

        assert!(drag.drag_over(&mut board, &target));
        let outcome = drag.drag_end(&mut board, Some(&target));

        assert_eq!(lane_order(&board, "done"), ["X", "A", "Y"]);
        assert_eq!(lane_order(&board, "todo"), ["B"]);
        let DropOutcome::Moved(mv) = outcome else {
            panic!("expected a move, got {outcome:?}");
        };
        assert_eq!(mv.to, Placement::new("done", 1));
    }

    #[test]
    fn drop_re_resolves_when_card_moved_since_hover() {
        let mut board = board_with(&[("A", "todo"), ("B", "todo"), ("X", "done")]);
        let mut drag = start(&board, "A");
        let target = DropTarget::Column("done".into());

        assert!(drag.drag_over(&mut board, &target));
        assert_eq!(lane_order(&board, "done"), ["X", "A"]);

        // Another write relocates the card before the pointer is released.
        board.place(&id("A"), &Placement::new("in_progress", 0));

        let outcome = drag.drag_end(&mut board, Some(&target));
        assert_eq!(
            outcome,
            DropOutcome::Moved(ResolvedMove {
                task: id("A"),
                from: Placement::new("todo", 0),
                to: Placement::new("done", 1),
            })
        );
        assert_eq!(lane_order(&board, "done"), ["X", "A"]);
        assert!(lane_order(&board, "in_progress").is_empty());
    }

    #[test]
    fn release_outside_restores_origin() {
        let mut board = board_with(&[("A", "todo"), ("B", "todo"), ("X", "done")]);
        let before = board.tasks().to_vec();
        let mut drag = start(&board, "A");

        drag.drag_over(&mut board, &DropTarget::Column("done".into()));
        assert_eq!(lane_order(&board, "done"), ["X", "A"]);

        assert_eq!(drag.drag_end(&mut board, None), DropOutcome::Cancelled);
        assert_eq!(lane_order(&board, "todo"), ["A", "B"]);
        assert_eq!(lane_order(&board, "done"), ["X"]);
        let positions: Vec<u32> = board.tasks().iter().map(|t| t.position).collect();
        let original: Vec<u32> = before.iter().map(|t| t.position).collect();
        assert_eq!(positions, original);
    }

    #[test]
    fn unresolvable_drop_is_cancelled() {
        let mut board = board_with(&[("A", "todo"), ("B", "todo")]);
        let mut drag = start(&board, "A");
        let outcome = drag.drag_end(&mut board, Some(&DropTarget::Column("archived".into())));
        assert_eq!(outcome, DropOutcome::Cancelled);
        assert_eq!(lane_order(&board, "todo"), ["A", "B"]);
    }

    #[test]
    fn drop_where_it_started_is_unchanged() {
        let mut board = board_with(&[("A", "todo"), ("B", "todo"), ("C", "todo")]);
        let mut drag = start(&board, "C");
        let outcome = drag.drag_end(&mut board, Some(&DropTarget::Column("todo".into())));
        assert_eq!(outcome, DropOutcome::Unchanged);

        // Out to another column and back to the same slot.
        let mut drag = start(&board, "B");
        assert!(drag.drag_over(&mut board, &DropTarget::Column("done".into())));
        let outcome = drag.drag_end(&mut board, Some(&DropTarget::Task(id("C"))));
        assert_eq!(outcome, DropOutcome::Unchanged);
        assert_eq!(lane_order(&board, "todo"), ["A", "B", "C"]);
    }

    #[test]
    fn start_rejects_unknown_and_concurrent_gestures() {
        let mut board = board_with(&[("A", "todo"), ("B", "todo")]);
        let mut drag = DragController::new();
        assert_eq!(
            drag.drag_start(&board, &id("nope")),
            Err(DragError::UnknownTask(id("nope")))
        );
        drag.drag_start(&board, &id("A"))
            .unwrap_or_else(|err| panic!("drag_start: {err}"));
        assert_eq!(
            drag.drag_start(&board, &id("B")),
            Err(DragError::AlreadyDragging(id("A")))
        );
        assert!(drag.cancel(&mut board));
        assert!(!drag.cancel(&mut board));
        assert!(drag.active_task().is_none());
    }
}
