use std::fs;
use std::io;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use planboard_app::{
    AsyncTaskStore, BoardConfig, BoardService, DropOutcome, DropTarget, LaneView, MoveStatus, Notifier,
    TaskFilterBuilder,
};
use planboard_core::intelligence::{IntelligenceEndpoint, parse_response};
use planboard_core::{ColumnId, NewTask, Priority, Task, TaskId, TaskPatch};
use serde::Serialize;
use time::Date;
use time::macros::format_description;
use tracing::{debug, warn};

use crate::{BoardFormat, Command};

pub async fn run<S: AsyncTaskStore, N: Notifier>(command: Command, service: &BoardService<S, N>) -> Result<()> {
    match command {
        Command::Board {
            query,
            tags,
            assignees,
            priorities,
            format,
        } => {
            let filter = TaskFilterBuilder::new()
                .with_text(query)
                .with_tags(&tags)
                .with_assignees(&assignees)
                .with_priorities(&priorities)
                .map_err(|err| anyhow!(err.describe_user_facing()))?
                .build();
            let filter_empty = filter.is_empty();
            service.set_filter(filter).await;

            let orphans = service.orphans().await;
            if !orphans.is_empty() {
                warn!(count = orphans.len(), "some tasks have a status with no column");
            }

            let lanes = service.visible_lanes().await;
            if lanes.is_empty() && !filter_empty {
                println!("No tasks matched the provided filters");
                return Ok(());
            }
            match format {
                BoardFormat::Table => render_board(&lanes),
                BoardFormat::Json => println!("{}", serde_json::to_string_pretty(&board_output(&lanes))?),
            }
        }
        Command::New {
            title,
            status,
            priority,
            tags,
            assignee,
            description,
            due,
        } => {
            let status = status.map(|raw| parse_status(service.config(), &raw)).transpose()?;
            let task = service
                .create_task(NewTask {
                    title,
                    status,
                    description,
                    priority: priority.as_deref().map(parse_priority).transpose()?,
                    assignee,
                    tags: tags.into_iter().collect(),
                    due_date: due.as_deref().map(parse_due).transpose()?,
                    created_by: None,
                })
                .await?;
            println!("created task: {} ({})", task.id, task.status);
        }
        Command::Move { task, status, position } => {
            let task = parse_task_id(&task)?;
            let status = parse_status(service.config(), &status)?;
            match service.move_task(&task, &status, position).await? {
                MoveStatus::Skipped => println!("task {task} is already at {status}/{position}"),
                MoveStatus::Persisted(mv) => {
                    println!("moved task: {task} {} -> {} at {}", mv.from.status, mv.to.status, mv.to.index);
                }
            }
        }
        Command::Drop { task, column, onto } => {
            let task = parse_task_id(&task)?;
            let target = drop_target(column, onto)?;
            service.drag_start(&task).await?;
            service.drag_over(&target).await;
            match service.drag_end(Some(&target)).await? {
                DropOutcome::Moved(mv) => {
                    println!("moved task: {task} {} -> {} at {}", mv.from.status, mv.to.status, mv.to.index);
                }
                DropOutcome::Unchanged => println!("task {task} did not move"),
                DropOutcome::Cancelled => println!("drop target did not resolve, task {task} stays put"),
            }
        }
        Command::Edit {
            task,
            title,
            description,
            priority,
            assignee,
            unassign,
        } => {
            let task = parse_task_id(&task)?;
            let patch = TaskPatch {
                title,
                description,
                priority: priority.as_deref().map(parse_priority).transpose()?,
                assignee: if unassign { Some(None) } else { assignee.map(Some) },
                ..TaskPatch::default()
            };
            let updated = service.update_task(&task, &patch).await?;
            println!("updated task: {} ({})", updated.id, updated.title);
        }
        Command::Show { task } => {
            let task = parse_task_id(&task)?;
            let found = service
                .task(&task)
                .await
                .ok_or_else(|| anyhow!("task {task} not found"))?;
            println!("{}", serde_json::to_string_pretty(&found)?);
        }
        Command::Inspect { endpoint, file } => {
            let body = match file {
                Some(path) => {
                    fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?
                }
                None => io::read_to_string(io::stdin()).context("failed to read response body from stdin")?,
            };
            println!("{}", inspect_body(endpoint.into(), &body)?);
        }
    }

    Ok(())
}

fn inspect_body(endpoint: IntelligenceEndpoint, body: &str) -> Result<String> {
    let response = parse_response(endpoint, body)?;
    debug!(%endpoint, "response accepted");
    Ok(serde_json::to_string_pretty(&response)?)
}

fn parse_task_id(raw: &str) -> Result<TaskId> {
    TaskId::from_str(raw).with_context(|| format!("invalid task id '{raw}'"))
}

fn parse_status(config: &BoardConfig, raw: &str) -> Result<ColumnId> {
    config.validate_status(raw.trim())?;
    ColumnId::from_str(raw).with_context(|| format!("invalid status '{raw}'"))
}

fn parse_priority(raw: &str) -> Result<Priority> {
    Priority::from_str(raw).map_err(|token| anyhow!("unknown priority '{token}' (expected low, medium, high or urgent)"))
}

fn parse_due(raw: &str) -> Result<Date> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
        .with_context(|| format!("invalid due date '{raw}' (expected YYYY-MM-DD)"))
}

fn drop_target(column: Option<String>, onto: Option<String>) -> Result<DropTarget> {
    match (column, onto) {
        (Some(column), None) => Ok(DropTarget::Column(
            ColumnId::from_str(&column).with_context(|| format!("invalid column '{column}'"))?,
        )),
        (None, Some(onto)) => Ok(DropTarget::Task(parse_task_id(&onto)?)),
        _ => Err(anyhow!("pass exactly one of --column or --onto")),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LaneOutput<'a> {
    id: &'a str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u32>,
    over_limit: bool,
    tasks: &'a [Task],
}

fn board_output(lanes: &[LaneView]) -> Vec<LaneOutput<'_>> {
    lanes
        .iter()
        .map(|lane| LaneOutput {
            id: lane.column.id.as_str(),
            name: &lane.column.name,
            limit: lane.column.limit,
            over_limit: lane.is_over_limit(),
            tasks: &lane.tasks,
        })
        .collect()
}

fn render_board(lanes: &[LaneView]) {
    for lane in lanes {
        println!("{}", lane_header(lane));
        if lane.tasks.is_empty() {
            println!("  (empty)");
        }
        for task in &lane.tasks {
            println!("  {}", task_line(task));
        }
    }
}

fn lane_header(lane: &LaneView) -> String {
    let count = lane.tasks.len();
    let mut header = match lane.column.limit {
        Some(limit) => format!("{} [{count}/{limit}]", lane.column.name),
        None => format!("{} [{count}]", lane.column.name),
    };
    if lane.is_over_limit() {
        header.push_str(" over limit");
    }
    header
}

fn task_line(task: &Task) -> String {
    let mut line = format!("{}. {} ({}) {}", task.position, task.title, task.priority, task.id);
    if let Some(assignee) = &task.assignee {
        line.push_str(&format!(" @{assignee}"));
    }
    if !task.tags.is_empty() {
        let tags: Vec<String> = task.tags.iter().map(|tag| format!("#{tag}")).collect();
        line.push(' ');
        line.push_str(&tags.join(" "));
    }
    if task.checklist.total > 0 {
        line.push_str(&format!(" [{}/{}]", task.checklist.completed, task.checklist.total));
    }
    line
}
