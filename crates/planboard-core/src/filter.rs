use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::Task;
use crate::task::Priority;
use crate::text_matcher::TextMatcher;

/// Display filter applied on top of the lanes. It never mutates tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFilter {
    /// Lower-cased search text.
    #[serde(default)]
    pub text: Option<String>,
    /// Tags that must all be present.
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Assignees (any of).
    #[serde(default)]
    pub assignees: BTreeSet<String>,
    /// Priorities (any of).
    #[serde(default)]
    pub priorities: BTreeSet<Priority>,
}

impl TaskFilter {
    /// Filter with only a search query.
    #[must_use]
    pub fn with_text(query: &str) -> Self {
        Self {
            text: TextMatcher::new(query).map(|matcher| matcher.needle().to_owned()),
            ..Self::default()
        }
    }

    /// True when no clause is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.tags.is_empty()
            && self.assignees.is_empty()
            && self.priorities.is_empty()
    }

    /// Evaluate the filter against a task.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(text) = self.text.as_deref()
            && let Some(matcher) = TextMatcher::new(text)
            && !matcher.matches(task)
        {
            return false;
        }
        if !self.tags.iter().all(|tag| task.tags.contains(tag)) {
            return false;
        }
        if !self.assignees.is_empty()
            && !task
                .assignee
                .as_ref()
                .is_some_and(|assignee| self.assignees.contains(assignee))
        {
            return false;
        }
        self.priorities.is_empty() || self.priorities.contains(&task.priority)
    }
}
