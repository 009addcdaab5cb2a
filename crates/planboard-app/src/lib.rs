//! Application layer logic for planboard.
//!
//! This crate owns the interactive board state (drag gestures, move
//! resolution, filters) and the service that keeps it in sync with storage.

pub mod async_store;
pub mod board_state;
pub mod config;
pub mod drag;
pub mod filter_util;
pub mod notify;
pub mod resolver;
pub mod service;
pub mod session;

// Re-exports for convenience
pub use async_store::AsyncTaskStore;
pub use board_state::BoardState;
pub use config::{BoardConfig, ProjectConfig, RollbackPolicy, SessionConfig};
pub use drag::{DragController, DragError, DropOutcome};
pub use filter_util::{FilterBuildError, TaskFilterBuilder, parse_priority_tokens};
pub use notify::{Notification, NotificationLevel, NotificationLog, Notifier, TracingNotifier};
pub use resolver::{DropTarget, MoveError, ResolvedMove, resolve, resolve_explicit};
pub use service::{BoardService, LaneView, MoveStatus, ServiceError};
pub use session::{CurrentUser, SessionContext, Theme, UserProvider};
