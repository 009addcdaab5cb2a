use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use planboard_core::column::find_column;
use planboard_core::{BoardColumn, ColumnId};
use serde::Deserialize;

use crate::session::Theme;

/// Directory holding board configuration and data.
pub const CONFIG_DIR: &str = ".planboard";
const CONFIG_FILE: &str = "config.toml";

/// Top-level project configuration loaded from `.planboard/config.toml`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProjectConfig {
    #[serde(default)]
    pub board: BoardConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl ProjectConfig {
    /// Load configuration from the nearest directory containing `.planboard/`.
    pub fn load(cwd: impl AsRef<Path>) -> Result<Self> {
        Self::from_workdir(discover_root(cwd.as_ref()))
    }

    /// Load configuration from a known board root.
    pub fn from_workdir(workdir: impl AsRef<Path>) -> Result<Self> {
        let config_path = workdir.as_ref().join(CONFIG_DIR).join(CONFIG_FILE);
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        self.board.ensure_columns_present()?;
        self.board.ensure_unique_columns()?;
        self.board.ensure_valid_limits()?;
        self.board.ensure_valid_default()
    }
}

/// Walk up from `start` to the first directory that contains `.planboard/`.
/// Falls back to `start` itself.
#[must_use]
pub fn discover_root(start: &Path) -> PathBuf {
    start
        .ancestors()
        .find(|dir| dir.join(CONFIG_DIR).is_dir())
        .unwrap_or(start)
        .to_path_buf()
}

/// What happens to an optimistic move when the store rejects it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollbackPolicy {
    /// Put the task back where it was, unless a later move already relocated it.
    #[default]
    Revert,
    /// Leave local state as the user left it.
    Keep,
}

/// Board configuration block.
#[derive(Debug, Clone, Deserialize)]
pub struct BoardConfig {
    #[serde(default = "BoardColumn::builtin")]
    columns: Vec<BoardColumn>,
    #[serde(default)]
    default_status: Option<ColumnId>,
    #[serde(default)]
    rollback: RollbackPolicy,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            columns: BoardColumn::builtin(),
            default_status: Some(ColumnId::from("todo")),
            rollback: RollbackPolicy::default(),
        }
    }
}

impl BoardConfig {
    /// Construct a configuration from explicit columns.
    pub fn from_columns(columns: Vec<BoardColumn>) -> Self {
        Self {
            columns,
            default_status: None,
            rollback: RollbackPolicy::default(),
        }
    }

    /// Builder-style rollback policy.
    #[must_use]
    pub const fn with_rollback(mut self, rollback: RollbackPolicy) -> Self {
        self.rollback = rollback;
        self
    }

    /// Columns in display order.
    pub fn columns(&self) -> &[BoardColumn] {
        &self.columns
    }

    /// Status used for new tasks: the configured one, else the first column.
    pub fn default_status(&self) -> Option<&ColumnId> {
        self.default_status
            .as_ref()
            .or_else(|| self.columns.first().map(|column| &column.id))
    }

    /// Configured rollback policy.
    pub const fn rollback(&self) -> RollbackPolicy {
        self.rollback
    }

    /// Find a column by its id.
    pub fn find_column(&self, id: &str) -> Option<&BoardColumn> {
        find_column(&self.columns, id)
    }

    /// Display name for a status, falling back to the raw id.
    pub fn display_name<'a>(&'a self, status: &'a str) -> &'a str {
        self.find_column(status).map_or(status, |column| column.name.as_str())
    }

    /// Validate that `status` names a configured column.
    pub fn validate_status(&self, status: &str) -> Result<()> {
        if self.find_column(status).is_some() {
            return Ok(());
        }
        bail!(
            "status '{status}' is not a board column. Allowed values: {}.",
            self.status_hint()
        );
    }

    /// Human-readable list of columns for error messages.
    pub fn status_hint(&self) -> String {
        self.columns
            .iter()
            .map(|column| {
                if column.name == column.id.as_str() {
                    column.id.to_string()
                } else {
                    format!("{} ({})", column.id, column.name)
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn ensure_columns_present(&self) -> Result<()> {
        if self.columns.is_empty() {
            bail!("board must define at least one column");
        }
        if self.columns.iter().any(|column| column.id.as_str().is_empty()) {
            bail!("column id must not be empty");
        }
        Ok(())
    }

    fn ensure_unique_columns(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.id.as_str()) {
                bail!("duplicate board column detected: {}", column.id);
            }
        }
        Ok(())
    }

    fn ensure_valid_limits(&self) -> Result<()> {
        if let Some(column) = self.columns.iter().find(|column| column.limit == Some(0)) {
            bail!("column '{}' has a WIP limit of 0", column.id);
        }
        Ok(())
    }

    fn ensure_valid_default(&self) -> Result<()> {
        let Some(default) = self.default_status.as_ref() else {
            return Ok(());
        };
        if default.as_str().is_empty() {
            bail!("default status must not be empty");
        }
        if self.find_column(default.as_str()).is_none() {
            bail!("default status '{default}' is not a board column");
        }
        Ok(())
    }
}

/// Session block: who is using the board and how it is displayed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub theme: Theme,
}
