use serde::{Deserialize, Serialize};

use crate::id::ColumnId;

/// Classification of board columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Work not yet scheduled.
    Backlog,
    /// Ready to be picked up.
    Todo,
    /// Actively being worked on.
    InProgress,
    /// Waiting for review.
    InReview,
    /// Blocked or waiting on someone else.
    Blocked,
    /// Finished work.
    Done,
}

impl ColumnKind {
    /// String representation used in configuration files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::InReview => "in_review",
            Self::Blocked => "blocked",
            Self::Done => "done",
        }
    }
}

/// A column on the board. Display order is the order of the column list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardColumn {
    /// Column key matched against task statuses.
    pub id: ColumnId,
    /// Display name.
    pub name: String,
    /// Optional work-in-progress cap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Optional display color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Optional classification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ColumnKind>,
}

impl BoardColumn {
    /// Create a column without limit, color or kind.
    pub fn new(id: impl Into<ColumnId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            limit: None,
            color: None,
            kind: None,
        }
    }

    /// Builder-style WIP limit.
    #[must_use]
    pub const fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Builder-style classification.
    #[must_use]
    pub const fn with_kind(mut self, kind: ColumnKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// The four columns a board starts with.
    #[must_use]
    pub fn builtin() -> Vec<Self> {
        vec![
            Self::new("todo", "To Do").with_kind(ColumnKind::Todo),
            Self::new("in_progress", "In Progress").with_kind(ColumnKind::InProgress),
            Self::new("in_review", "In Review").with_kind(ColumnKind::InReview),
            Self::new("completed", "Completed").with_kind(ColumnKind::Done),
        ]
    }
}

/// Find a column by id.
#[must_use]
pub fn find_column<'a>(columns: &'a [BoardColumn], id: &str) -> Option<&'a BoardColumn> {
    columns.iter().find(|column| column.id == id)
}
