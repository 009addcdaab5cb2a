use std::collections::BTreeSet;
use std::fmt::{self, Display};

use planboard_core::{Priority, TaskFilter, TextMatcher};
use thiserror::Error;

/// Error type returned while constructing task filters from user-facing inputs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterBuildError {
    #[error("invalid priority: {token}")]
    InvalidPriority { token: String },
}

/// Result alias for filter construction helpers.
pub type FilterBuildResult<T> = Result<T, FilterBuildError>;

/// Builder that accepts user-facing strings and normalizes them into [`TaskFilter`] values.
#[derive(Debug, Clone, Default)]
pub struct TaskFilterBuilder {
    text: Option<String>,
    tags: Vec<String>,
    assignees: Vec<String>,
    priorities: Vec<Priority>,
}

impl TaskFilterBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the optional search text (whitespace-only inputs become `None`).
    #[must_use]
    pub fn with_text(mut self, text: Option<String>) -> Self {
        self.text = text.and_then(|raw| TextMatcher::new(&raw).map(|matcher| matcher.needle().to_owned()));
        self
    }

    /// Extend the required tag list (logical AND).
    #[must_use]
    pub fn with_tags(mut self, tags: &[String]) -> Self {
        self.tags.extend(normalized(tags));
        self
    }

    /// Extend the assignee filters (logical OR).
    #[must_use]
    pub fn with_assignees(mut self, assignees: &[String]) -> Self {
        self.assignees.extend(normalized(assignees));
        self
    }

    /// Extend the priority filters (logical OR).
    ///
    /// # Errors
    /// Returns an error if any token does not name a priority.
    pub fn with_priorities(mut self, tokens: &[String]) -> FilterBuildResult<Self> {
        self.priorities.extend(parse_priority_tokens(tokens)?);
        Ok(self)
    }

    /// Build the final [`TaskFilter`].
    #[must_use]
    pub fn build(self) -> TaskFilter {
        TaskFilter {
            text: self.text,
            tags: self.tags.into_iter().collect(),
            assignees: self.assignees.into_iter().collect(),
            priorities: self.priorities.into_iter().collect::<BTreeSet<_>>(),
        }
    }
}

/// Convert arbitrary tokens into [`Priority`] values.
///
/// # Errors
/// Returns an error if any token does not match a priority.
pub fn parse_priority_tokens(tokens: &[String]) -> FilterBuildResult<Vec<Priority>> {
    tokens
        .iter()
        .filter(|token| !token.trim().is_empty())
        .map(|token| {
            token
                .parse::<Priority>()
                .map_err(|_| FilterBuildError::InvalidPriority {
                    token: token.clone(),
                })
        })
        .collect()
}

fn normalized(values: &[String]) -> impl Iterator<Item = String> + '_ {
    values
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

impl FilterBuildError {
    /// Convert the error into a message that is friendly for end-users.
    #[must_use]
    pub fn describe_user_facing(&self) -> String {
        match self {
            Self::InvalidPriority { token } => {
                format!("unknown priority '{token}' (expected low, medium, high or urgent)")
            }
        }
    }
}

impl Display for TaskFilterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskFilterBuilder")
            .field("text", &self.text)
            .field("tags", &self.tags)
            .field("assignees", &self.assignees)
            .field("priorities", &self.priorities)
            .finish()
    }
}
