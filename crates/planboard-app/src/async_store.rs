//! Async storage abstraction behind the board's persistence bridge.

use anyhow::Error;
use planboard_core::{ColumnId, NewTask, Task, TaskId, TaskPatch};
use planboard_store_json::{JsonStore, StoreError};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Backing store the board pushes its changes to.
///
/// Calls carry no timeout or cancellation; each one resolves independently.
#[allow(async_fn_in_trait)]
pub trait AsyncTaskStore: Send + Sync {
    /// Error type bubbled up from the backing store.
    type Error: Into<Error> + Send;

    /// Load every task on the board.
    ///
    /// # Errors
    /// Returns a store-specific error when the tasks cannot be read.
    async fn load_tasks(&self) -> Result<Vec<Task>, Self::Error>;

    /// Persist a move of `task` to `status` at `position`.
    ///
    /// # Errors
    /// Returns a store-specific error when the move cannot be persisted.
    async fn move_task(&self, task: &TaskId, status: &ColumnId, position: u32) -> Result<(), Self::Error>;

    /// Apply a metadata patch and return the stored task.
    ///
    /// # Errors
    /// Returns a store-specific error when the task is unknown or the write fails.
    async fn update_task(&self, task: &TaskId, patch: &TaskPatch) -> Result<Task, Self::Error>;

    /// Create a task at the end of its column and return it.
    ///
    /// # Errors
    /// Returns a store-specific error when the write fails.
    async fn create_task(&self, task: &NewTask) -> Result<Task, Self::Error>;
}

impl AsyncTaskStore for Arc<Mutex<JsonStore>> {
    type Error = StoreError;

    async fn load_tasks(&self) -> Result<Vec<Task>, Self::Error> {
        let guard = self.lock().await;
        Ok(guard.tasks().to_vec())
    }

    async fn move_task(&self, task: &TaskId, status: &ColumnId, position: u32) -> Result<(), Self::Error> {
        // The guard travels into the blocking task so writes stay serialized.
        let mut guard = Arc::clone(self).lock_owned().await;
        let task = task.clone();
        let status = status.clone();
        tokio::task::spawn_blocking(move || guard.move_task(&task, &status, position))
            .await
            .map_err(|e| StoreError::Other(format!("Task join error: {e}")))?
    }

    async fn update_task(&self, task: &TaskId, patch: &TaskPatch) -> Result<Task, Self::Error> {
        let mut guard = Arc::clone(self).lock_owned().await;
        let task = task.clone();
        let patch = patch.clone();
        tokio::task::spawn_blocking(move || guard.update_task(&task, &patch))
            .await
            .map_err(|e| StoreError::Other(format!("Task join error: {e}")))?
    }

    async fn create_task(&self, task: &NewTask) -> Result<Task, Self::Error> {
        let mut guard = Arc::clone(self).lock_owned().await;
        let task = task.clone();
        tokio::task::spawn_blocking(move || guard.create_task(task))
            .await
            .map_err(|e| StoreError::Other(format!("Task join error: {e}")))?
    }
}
