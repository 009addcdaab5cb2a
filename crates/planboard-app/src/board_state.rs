//! In-memory board owned by the top-level board component.

use planboard_core::placement::{self, Placement};
use planboard_core::{
    BoardColumn, ColumnId, ColumnLane, Task, TaskFilter, TaskId, filter_lanes, group_tasks,
    orphaned_tasks,
};
use tracing::{debug, warn};

use crate::resolver::ResolvedMove;

/// Tasks, columns and the active display filter.
#[derive(Debug, Clone)]
pub struct BoardState {
    columns: Vec<BoardColumn>,
    tasks: Vec<Task>,
    filter: TaskFilter,
}

impl BoardState {
    /// Build the board, normalizing every lane's positions to `0..n`.
    #[must_use]
    pub fn new(columns: Vec<BoardColumn>, mut tasks: Vec<Task>) -> Self {
        let mut statuses: Vec<ColumnId> = tasks.iter().map(|task| task.status.clone()).collect();
        statuses.sort();
        statuses.dedup();
        for status in &statuses {
            placement::renumber(&mut tasks, status);
        }

        let board = Self {
            columns,
            tasks,
            filter: TaskFilter::default(),
        };
        let orphans = board.orphans();
        if !orphans.is_empty() {
            warn!(
                count = orphans.len(),
                statuses = ?orphans.iter().map(|task| task.status.as_str()).collect::<Vec<_>>(),
                "tasks reference statuses with no column and will not be shown"
            );
        }
        debug!(tasks = board.tasks.len(), columns = board.columns.len(), "board loaded");
        board
    }

    /// Columns in display order.
    #[must_use]
    pub fn columns(&self) -> &[BoardColumn] {
        &self.columns
    }

    /// Every task, in storage order.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Look up a task.
    #[must_use]
    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == *id)
    }

    /// Whether a column with this id exists.
    #[must_use]
    pub fn has_column(&self, id: &ColumnId) -> bool {
        self.columns.iter().any(|column| column.id == *id)
    }

    /// Where a task currently sits.
    #[must_use]
    pub fn placement_of(&self, id: &TaskId) -> Option<Placement> {
        placement::placement_of(&self.tasks, id)
    }

    /// Every lane, unfiltered.
    #[must_use]
    pub fn lanes(&self) -> Vec<ColumnLane<'_>> {
        group_tasks(&self.tasks, &self.columns)
    }

    /// Lanes narrowed by the active filter.
    #[must_use]
    pub fn visible_lanes(&self) -> Vec<ColumnLane<'_>> {
        filter_lanes(self.lanes(), &self.filter)
    }

    /// Tasks whose status has no column.
    #[must_use]
    pub fn orphans(&self) -> Vec<&Task> {
        orphaned_tasks(&self.tasks, &self.columns)
    }

    /// The active filter.
    #[must_use]
    pub const fn filter(&self) -> &TaskFilter {
        &self.filter
    }

    /// Replace the active filter.
    pub fn set_filter(&mut self, filter: TaskFilter) {
        self.filter = filter;
    }

    /// Apply a resolved move. Returns false when the task is unknown.
    pub fn apply_move(&mut self, mv: &ResolvedMove) -> bool {
        self.place(&mv.task, &mv.to).is_some()
    }

    /// Relocate a task, returning its previous placement.
    pub fn place(&mut self, id: &TaskId, target: &Placement) -> Option<Placement> {
        placement::relocate(&mut self.tasks, id, target)
    }

    /// Insert a task or replace the one with the same id, then renumber its lane.
    pub fn upsert_task(&mut self, task: Task) {
        let status = task.status.clone();
        if let Some(existing) = self.tasks.iter_mut().find(|existing| existing.id == task.id) {
            *existing = task;
        } else {
            self.tasks.push(task);
        }
        placement::renumber(&mut self.tasks, &status);
    }

    /// Replace a task's metadata while keeping its local placement.
    pub fn refresh_metadata(&mut self, task: Task) -> bool {
        let Some(existing) = self.tasks.iter_mut().find(|existing| existing.id == task.id) else {
            return false;
        };
        let status = existing.status.clone();
        let position = existing.position;
        *existing = Task {
            status,
            position,
            ..task
        };
        true
    }
}
