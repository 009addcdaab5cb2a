//! Domain types and pure ordering logic for planboard.

/// Column definitions.
pub mod column;
/// Display filters.
pub mod filter;
/// Lane derivation.
pub mod grouping;
/// Identifier types.
pub mod id;
/// Typed responses of the intelligence service.
pub mod intelligence;
/// Ordering math.
pub mod placement;
/// Task entity and payloads.
pub mod task;
/// Case-insensitive search.
pub mod text_matcher;

pub use column::{BoardColumn, ColumnKind};
pub use filter::TaskFilter;
pub use grouping::{ColumnLane, filter_lanes, group_tasks, orphaned_tasks};
pub use id::{ColumnId, TaskId};
pub use placement::Placement;
pub use task::{ChecklistProgress, NewTask, Priority, Task, TaskPatch};
pub use text_matcher::TextMatcher;
