//! Derivation of per-column lanes from the flat task list.

use std::collections::HashSet;

use crate::column::BoardColumn;
use crate::filter::TaskFilter;
use crate::id::TaskId;
use crate::Task;

/// Tasks of one column in display order.
#[derive(Debug, Clone)]
pub struct ColumnLane<'a> {
    /// Column definition.
    pub column: &'a BoardColumn,
    /// Tasks sorted by position.
    pub tasks: Vec<&'a Task>,
}

impl ColumnLane<'_> {
    /// Number of tasks in the lane.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the lane holds no task.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Whether the lane exceeds its WIP limit.
    #[must_use]
    pub fn is_over_limit(&self) -> bool {
        self.column
            .limit
            .is_some_and(|limit| self.tasks.len() > limit as usize)
    }

    /// Index of a task inside the lane.
    #[must_use]
    pub fn index_of(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == *id)
    }
}

/// Group tasks into lanes following the column order.
///
/// Tasks whose status names no column are left out of every lane.
#[must_use]
pub fn group_tasks<'a>(tasks: &'a [Task], columns: &'a [BoardColumn]) -> Vec<ColumnLane<'a>> {
    columns
        .iter()
        .map(|column| {
            let mut lane: Vec<&Task> = tasks.iter().filter(|task| task.status == column.id).collect();
            lane.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));
            ColumnLane { column, tasks: lane }
        })
        .collect()
}

/// Tasks that no column would render.
#[must_use]
pub fn orphaned_tasks<'a>(tasks: &'a [Task], columns: &[BoardColumn]) -> Vec<&'a Task> {
    let known: HashSet<&str> = columns.iter().map(|column| column.id.as_str()).collect();
    tasks
        .iter()
        .filter(|task| !known.contains(task.status.as_str()))
        .collect()
}

/// Narrow lanes to the tasks matching `filter`.
///
/// An empty filter returns every lane untouched. Otherwise lanes with no
/// matching task are dropped from the output.
#[must_use]
pub fn filter_lanes<'a>(lanes: Vec<ColumnLane<'a>>, filter: &TaskFilter) -> Vec<ColumnLane<'a>> {
    if filter.is_empty() {
        return lanes;
    }
    lanes
        .into_iter()
        .map(|lane| ColumnLane {
            column: lane.column,
            tasks: lane.tasks.into_iter().filter(|task| filter.matches(task)).collect(),
        })
        .filter(|lane| !lane.is_empty())
        .collect()
}
