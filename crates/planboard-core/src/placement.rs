//! Ordering math shared by the board state and stores.
//!
//! Positions are ranks: a task's index inside its status group is what the
//! move operations talk about. Every relocation renumbers the touched groups
//! to `0..n` so ordering never contains ties.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::Task;
use crate::id::{ColumnId, TaskId};

/// Where a task sits on the board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    /// Column key.
    pub status: ColumnId,
    /// Index within the column.
    pub index: u32,
}

impl Placement {
    /// Construct a placement.
    pub fn new(status: impl Into<ColumnId>, index: u32) -> Self {
        Self {
            status: status.into(),
            index,
        }
    }
}

/// Ids of a status group in display order (`position`, then id).
#[must_use]
pub fn lane_ids(tasks: &[Task], status: &ColumnId) -> Vec<TaskId> {
    let mut lane: Vec<&Task> = tasks.iter().filter(|task| task.status == *status).collect();
    lane.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));
    lane.into_iter().map(|task| task.id.clone()).collect()
}

/// Current placement of a task, with the index measured as its rank.
#[must_use]
pub fn placement_of(tasks: &[Task], id: &TaskId) -> Option<Placement> {
    let task = tasks.iter().find(|task| task.id == *id)?;
    let lane = lane_ids(tasks, &task.status);
    let index = lane.iter().position(|candidate| candidate == id)?;
    Some(Placement {
        status: task.status.clone(),
        index: to_u32(index),
    })
}

/// Index that appends to `status`, ignoring `moving` if it already lives there.
#[must_use]
pub fn end_index(tasks: &[Task], status: &ColumnId, moving: &TaskId) -> u32 {
    to_u32(
        tasks
            .iter()
            .filter(|task| task.status == *status && task.id != *moving)
            .count(),
    )
}

/// Position that sorts after every task of a status group.
///
/// Stored positions may have gaps, so this is one past the highest position
/// rather than the group size.
#[must_use]
pub fn append_position(tasks: &[Task], status: &ColumnId) -> u32 {
    tasks
        .iter()
        .filter(|task| task.status == *status)
        .map(|task| task.position.saturating_add(1))
        .max()
        .unwrap_or(0)
}

/// Move `id` to `target`, clamping the index to the lane length.
///
/// Returns the placement the task held before the move, or `None` when the
/// id is unknown. Both the source and target groups are renumbered.
pub fn relocate(tasks: &mut [Task], id: &TaskId, target: &Placement) -> Option<Placement> {
    let previous = placement_of(tasks, id)?;

    let mut lane: Vec<TaskId> = lane_ids(tasks, &target.status)
        .into_iter()
        .filter(|candidate| candidate != id)
        .collect();
    let index = (target.index as usize).min(lane.len());
    lane.insert(index, id.clone());

    if let Some(task) = tasks.iter_mut().find(|task| task.id == *id) {
        task.status = target.status.clone();
    }
    assign_ranks(tasks, &lane);
    if previous.status != target.status {
        renumber(tasks, &previous.status);
    }
    Some(previous)
}

/// Rewrite the positions of a status group to `0..n` keeping its order.
pub fn renumber(tasks: &mut [Task], status: &ColumnId) {
    let lane = lane_ids(tasks, status);
    assign_ranks(tasks, &lane);
}

fn assign_ranks(tasks: &mut [Task], ordered: &[TaskId]) {
    let ranks: HashMap<&TaskId, u32> = ordered
        .iter()
        .enumerate()
        .map(|(rank, id)| (id, to_u32(rank)))
        .collect();
    for task in tasks.iter_mut() {
        if let Some(&rank) = ranks.get(&task.id) {
            task.position = rank;
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn to_u32(value: usize) -> u32 {
    if value > u32::MAX as usize {
        u32::MAX
    } else {
        value as u32
    }
}
