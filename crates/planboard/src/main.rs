//! CLI entry point for planboard.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use tokio::sync::Mutex;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

use planboard_app::config::discover_root;
use planboard_app::{BoardService, ProjectConfig, SessionContext, TracingNotifier};
use planboard_core::intelligence::IntelligenceEndpoint;
use planboard_store_json::JsonStore;

mod commands;

/// Kanban board kept in `.planboard/tasks.json`.
#[derive(Parser, Debug)]
#[command(name = "planboard", version, about = "planboard: a kanban task board in your project directory")]
struct Cli {
    /// Board directory or any subdir (defaults to current).
    #[arg(long, global = true)]
    dir: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every column with its tasks.
    Board {
        /// Case-insensitive text matched against title, description and tags.
        #[arg(short = 'q', long)]
        query: Option<String>,
        #[arg(short = 't', long = "tag")]
        tags: Vec<String>,
        #[arg(short = 'a', long = "assignee")]
        assignees: Vec<String>,
        #[arg(short = 'p', long = "priority")]
        priorities: Vec<String>,
        #[arg(long, value_enum, default_value_t = BoardFormat::Table)]
        format: BoardFormat,
    },

    /// Create a task at the end of a column.
    New {
        #[arg(long)]
        title: String,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(short = 't', long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Due date as `YYYY-MM-DD`.
        #[arg(long)]
        due: Option<String>,
    },

    /// Move a task to an explicit column and position.
    Move {
        #[arg(long)]
        task: String,
        #[arg(long)]
        status: String,
        #[arg(long)]
        position: u32,
    },

    /// Drag a task and release it over a column or another task.
    #[command(group(ArgGroup::new("target").required(true).args(["column", "onto"])))]
    Drop {
        #[arg(long)]
        task: String,
        /// Release over the empty space of this column.
        #[arg(long)]
        column: Option<String>,
        /// Release over this task.
        #[arg(long)]
        onto: Option<String>,
    },

    /// Change task metadata.
    Edit {
        #[arg(long)]
        task: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long, conflicts_with = "unassign")]
        assignee: Option<String>,
        #[arg(long)]
        unassign: bool,
    },

    /// Show a task as JSON.
    Show {
        #[arg(long)]
        task: String,
    },

    /// Validate an intelligence service response body and print it as JSON.
    Inspect {
        #[arg(long, value_enum)]
        endpoint: EndpointArg,
        /// Read the body from this file instead of stdin.
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum BoardFormat {
    #[default]
    Table,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum EndpointArg {
    Valuation,
    RiskAssessment,
    Insights,
    SemanticSearch,
}

impl From<EndpointArg> for IntelligenceEndpoint {
    fn from(arg: EndpointArg) -> Self {
        match arg {
            EndpointArg::Valuation => Self::Valuation,
            EndpointArg::RiskAssessment => Self::RiskAssessment,
            EndpointArg::Insights => Self::Insights,
            EndpointArg::SemanticSearch => Self::SemanticSearch,
        }
    }
}

fn main() -> Result<()> {
    let Cli { dir, cmd } = Cli::parse();
    install_tracing();

    let start = dir.map_or_else(|| PathBuf::from("."), PathBuf::from);
    execute_command(&discover_root(&start), cmd)
}

fn execute_command(root: &Path, command: Command) -> Result<()> {
    let config = ProjectConfig::from_workdir(root)?;
    let session = SessionContext::resolve(&config.session);
    let store = Arc::new(Mutex::new(JsonStore::open(root)?));

    tokio::runtime::Runtime::new()?.block_on(async move {
        let service = BoardService::load(store, TracingNotifier, config.board, session).await?;
        commands::run(command, &service).await
    })
}

fn install_tracing() {
    // RUST_LOG overrides the default INFO level.
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .compact()
        .try_init();
}
