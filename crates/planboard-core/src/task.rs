use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::id::{ColumnId, TaskId};

/// Task priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Nice to have.
    Low,
    /// Regular work.
    #[default]
    Medium,
    /// Should be done soon.
    High,
    /// Drop everything.
    Urgent,
}

impl Priority {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" | "normal" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" | "critical" => Ok(Self::Urgent),
            other => Err(other.to_owned()),
        }
    }
}

/// Checklist completion counters shown on a card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistProgress {
    /// Completed checklist items.
    pub completed: u32,
    /// Total checklist items.
    pub total: u32,
}

/// A task on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier.
    pub id: TaskId,
    /// Column the task belongs to.
    pub status: ColumnId,
    /// Rank inside the status group.
    pub position: u32,
    /// Card title.
    pub title: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Priority badge.
    #[serde(default)]
    pub priority: Priority,
    /// Assigned person.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    /// Tags shown on the card.
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Optional due date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Date>,
    /// Checklist progress.
    #[serde(default)]
    pub checklist: ChecklistProgress,
    /// Name of the user who created the task.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    /// Creation time.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Last modification time.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Task {
    /// Build a task from a creation payload at an explicit position.
    #[must_use]
    pub fn from_new(new: NewTask, status: ColumnId, position: u32) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: TaskId::new(),
            status,
            position,
            title: new.title,
            description: new.description.unwrap_or_default(),
            priority: new.priority.unwrap_or_default(),
            assignee: new.assignee,
            tags: new.tags,
            due_date: new.due_date,
            checklist: ChecklistProgress::default(),
            created_by: new.created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a metadata patch in place. Returns true when anything changed.
    pub fn apply_patch(&mut self, patch: &TaskPatch) -> bool {
        let mut changed = false;
        if let Some(title) = &patch.title
            && *title != self.title
        {
            self.title.clone_from(title);
            changed = true;
        }
        if let Some(description) = &patch.description
            && *description != self.description
        {
            self.description.clone_from(description);
            changed = true;
        }
        if let Some(priority) = patch.priority
            && priority != self.priority
        {
            self.priority = priority;
            changed = true;
        }
        if let Some(assignee) = &patch.assignee
            && *assignee != self.assignee
        {
            self.assignee.clone_from(assignee);
            changed = true;
        }
        if let Some(tags) = &patch.tags
            && *tags != self.tags
        {
            self.tags.clone_from(tags);
            changed = true;
        }
        if let Some(due) = patch.due_date
            && due != self.due_date
        {
            self.due_date = due;
            changed = true;
        }
        if let Some(checklist) = patch.checklist
            && checklist != self.checklist
        {
            self.checklist = checklist;
            changed = true;
        }
        if changed {
            self.updated_at = OffsetDateTime::now_utc();
        }
        changed
    }
}

/// Fields accepted when creating a task. Position is always assigned by the board.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    /// Card title.
    pub title: String,
    /// Target column; `None` uses the configured default.
    #[serde(default)]
    pub status: Option<ColumnId>,
    /// Description body.
    #[serde(default)]
    pub description: Option<String>,
    /// Priority, `medium` when omitted.
    #[serde(default)]
    pub priority: Option<Priority>,
    /// Assigned person.
    #[serde(default)]
    pub assignee: Option<String>,
    /// Tags.
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Due date.
    #[serde(default)]
    pub due_date: Option<Date>,
    /// Creator, stamped from the session.
    #[serde(default)]
    pub created_by: Option<String>,
}

/// Partial metadata update. Status and position are changed through moves only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    /// New title.
    #[serde(default)]
    pub title: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// New priority.
    #[serde(default)]
    pub priority: Option<Priority>,
    /// New assignee (`Some(None)` clears).
    #[serde(default)]
    pub assignee: Option<Option<String>>,
    /// Replacement tag set.
    #[serde(default)]
    pub tags: Option<BTreeSet<String>>,
    /// New due date (`Some(None)` clears).
    #[serde(default)]
    pub due_date: Option<Option<Date>>,
    /// New checklist counters.
    #[serde(default)]
    pub checklist: Option<ChecklistProgress>,
}

impl TaskPatch {
    /// Returns true when the patch carries no changes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.assignee.is_none()
            && self.tags.is_none()
            && self.due_date.is_none()
            && self.checklist.is_none()
    }
}
