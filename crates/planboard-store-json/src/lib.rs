//! File-backed storage for planboard under `.planboard/tasks.json`.

mod error;

pub use error::StoreError;

use planboard_core::placement::{self, Placement};
use planboard_core::{ColumnId, NewTask, Task, TaskId, TaskPatch};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tracing::{debug, info};

const STORE_DIR: &str = ".planboard";
const STORE_FILE: &str = "tasks.json";
const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct BoardFile {
    version: u32,
    #[serde(default)]
    tasks: Vec<Task>,
}

/// Task storage persisted as a single JSON document.
///
/// Every mutating call rewrites the file before returning.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    tasks: Vec<Task>,
}

impl JsonStore {
    /// Open the board stored under `root/.planboard/tasks.json`.
    ///
    /// A missing file yields an empty board; it is created on first write.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::at_path(root.as_ref().join(STORE_DIR).join(STORE_FILE))
    }

    /// Open a board file at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn at_path(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if !path.exists() {
            debug!(path = %path.display(), "board file missing, starting empty");
            return Ok(Self {
                path,
                tasks: Vec::new(),
            });
        }
        let contents = fs::read_to_string(&path)?;
        let file: BoardFile = serde_json::from_str(&contents).map_err(StoreError::ParseError)?;
        if file.version != FORMAT_VERSION {
            return Err(StoreError::UnsupportedVersion(file.version));
        }
        debug!(path = %path.display(), tasks = file.tasks.len(), "loaded board file");
        Ok(Self {
            path,
            tasks: file.tasks,
        })
    }

    /// Location of the board file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every stored task.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Look up a task.
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == *id)
    }

    /// Move a task, renumbering the affected columns.
    ///
    /// Nothing changes in memory unless the file write succeeds.
    ///
    /// # Errors
    /// Returns [`StoreError::TaskNotFound`] for unknown ids, or an I/O error on save.
    pub fn move_task(&mut self, id: &TaskId, status: &ColumnId, position: u32) -> Result<(), StoreError> {
        let target = Placement {
            status: status.clone(),
            index: position,
        };
        let mut next = self.tasks.clone();
        let previous =
            placement::relocate(&mut next, id, &target).ok_or_else(|| StoreError::TaskNotFound(id.to_string()))?;
        if let Some(task) = next.iter_mut().find(|task| task.id == *id) {
            task.updated_at = OffsetDateTime::now_utc();
        }
        self.commit(next)?;
        info!(task = %id, from = %previous.status, to = %status, position, "moved task");
        Ok(())
    }

    /// Apply a metadata patch.
    ///
    /// # Errors
    /// Returns [`StoreError::TaskNotFound`] for unknown ids, or an I/O error on save.
    pub fn update_task(&mut self, id: &TaskId, patch: &TaskPatch) -> Result<Task, StoreError> {
        let mut next = self.tasks.clone();
        let task = next
            .iter_mut()
            .find(|task| task.id == *id)
            .ok_or_else(|| StoreError::TaskNotFound(id.to_string()))?;
        if !task.apply_patch(patch) {
            return Ok(task.clone());
        }
        let updated = task.clone();
        self.commit(next)?;
        info!(task = %id, "updated task");
        Ok(updated)
    }

    /// Create a task at the end of its column.
    ///
    /// # Errors
    /// Returns [`StoreError::MissingStatus`] when the payload has no status, or an I/O error on save.
    pub fn create_task(&mut self, new: NewTask) -> Result<Task, StoreError> {
        let status = new
            .status
            .clone()
            .ok_or_else(|| StoreError::MissingStatus(new.title.clone()))?;
        let position = placement::append_position(&self.tasks, &status);
        let task = Task::from_new(new, status, position);
        let mut next = self.tasks.clone();
        next.push(task.clone());
        self.commit(next)?;
        info!(task = %task.id, status = %task.status, position, "created task");
        Ok(task)
    }

    /// Write the board file atomically (temp file + rename).
    ///
    /// # Errors
    /// Returns an error if serialization or any filesystem step fails.
    pub fn save(&self) -> Result<(), StoreError> {
        self.write(&self.tasks)
    }

    // Swap in `next` only once it is on disk.
    fn commit(&mut self, next: Vec<Task>) -> Result<(), StoreError> {
        self.write(&next)?;
        self.tasks = next;
        Ok(())
    }

    fn write(&self, tasks: &[Task]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = BoardFile {
            version: FORMAT_VERSION,
            tasks: tasks.to_vec(),
        };
        let body = serde_json::to_string_pretty(&file).map_err(StoreError::SerializeError)?;
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut handle = fs::File::create(&tmp)?;
            handle.write_all(body.as_bytes())?;
            handle.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
