#![allow(missing_docs)]

use anyhow::Result;
use planboard_app::{
    BoardConfig, BoardService, DropOutcome, DropTarget, MoveStatus, NotificationLevel, NotificationLog,
    ServiceError, SessionContext,
};
use planboard_core::{ColumnId, NewTask, TaskId};
use planboard_store_json::JsonStore;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::Mutex;

type Service = BoardService<Arc<Mutex<JsonStore>>, NotificationLog>;

async fn open_service(dir: &TempDir) -> Result<Service> {
    Ok(open_service_with_log(dir).await?.0)
}

async fn open_service_with_log(dir: &TempDir) -> Result<(Service, NotificationLog)> {
    let store = Arc::new(Mutex::new(JsonStore::open(dir.path())?));
    let log = NotificationLog::default();
    let service = BoardService::load(store, log.clone(), BoardConfig::default(), SessionContext::default()).await?;
    Ok((service, log))
}

async fn create(service: &Service, title: &str, status: &str) -> Result<TaskId> {
    let task = service
        .create_task(NewTask {
            title: title.into(),
            status: Some(status.into()),
            ..NewTask::default()
        })
        .await?;
    Ok(task.id)
}

fn stored_order(dir: &TempDir, status: &str) -> Result<Vec<TaskId>> {
    let store = JsonStore::open(dir.path())?;
    let mut tasks: Vec<_> = store
        .tasks()
        .iter()
        .filter(|task| task.status == status)
        .cloned()
        .collect();
    tasks.sort_by_key(|task| task.position);
    Ok(tasks.into_iter().map(|task| task.id).collect())
}

async fn lane_ids(service: &Service, status: &str) -> Vec<TaskId> {
    service
        .lanes()
        .await
        .iter()
        .find(|lane| lane.column.id == status)
        .map(|lane| lane.tasks.iter().map(|task| task.id.clone()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn moves_survive_a_reload() -> Result<()> {
    let dir = TempDir::new()?;
    let service = open_service(&dir).await?;
    let a = create(&service, "Review financial statements", "todo").await?;
    let b = create(&service, "Update business plan", "todo").await?;
    let c = create(&service, "Call the broker", "todo").await?;

    service.drag_start(&c).await?;
    let outcome = service.drag_end(Some(&DropTarget::Task(a.clone()))).await?;
    assert!(matches!(outcome, DropOutcome::Moved(_)));

    let status = service
        .move_task(&b, &ColumnId::from("in_progress"), 0)
        .await?;
    assert!(matches!(status, MoveStatus::Persisted(_)));

    assert_eq!(stored_order(&dir, "todo")?, vec![c.clone(), a.clone()]);
    assert_eq!(stored_order(&dir, "in_progress")?, vec![b.clone()]);

    let reopened = open_service(&dir).await?;
    let lanes = reopened.lanes().await;
    let todo: Vec<TaskId> = lanes
        .iter()
        .find(|lane| lane.column.id == "todo")
        .map(|lane| lane.tasks.iter().map(|task| task.id.clone()).collect())
        .unwrap_or_default();
    assert_eq!(todo, vec![c, a]);
    Ok(())
}

#[tokio::test]
async fn created_tasks_default_to_configured_status() -> Result<()> {
    let dir = TempDir::new()?;
    let service = open_service(&dir).await?;
    let task = service
        .create_task(NewTask {
            title: "Draft teaser".into(),
            ..NewTask::default()
        })
        .await?;

    assert_eq!(task.status, "todo");
    assert_eq!(task.created_by.as_deref(), Some("planboard"));
    assert_eq!(stored_order(&dir, "todo")?, vec![task.id]);
    Ok(())
}

#[tokio::test]
async fn failed_write_keeps_board_store_and_file_in_step() -> Result<()> {
    let dir = TempDir::new()?;
    let (service, log) = open_service_with_log(&dir).await?;
    let a = create(&service, "Review financial statements", "todo").await?;
    let b = create(&service, "Update business plan", "todo").await?;

    // A directory where the temp file goes makes the next write fail.
    let blocker = service.store().lock().await.path().with_extension("json.tmp");
    fs::create_dir(&blocker)?;

    let Err(err) = service.move_task(&a, &ColumnId::from("completed"), 0).await else {
        panic!("expected the move to fail");
    };
    assert!(matches!(err, ServiceError::Store(_)));
    let notes = log.drain();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].level, NotificationLevel::Error);

    assert_eq!(lane_ids(&service, "todo").await, vec![a.clone(), b.clone()]);
    assert!(lane_ids(&service, "completed").await.is_empty());
    let in_store = service
        .store()
        .lock()
        .await
        .get(&a)
        .map(|task| task.status.to_string());
    assert_eq!(in_store, Some("todo".to_owned()));
    assert_eq!(stored_order(&dir, "todo")?, vec![a.clone(), b.clone()]);

    // The next successful write carries nothing from the rejected move.
    fs::remove_dir(&blocker)?;
    service
        .move_task(&b, &ColumnId::from("in_progress"), 0)
        .await?;
    assert!(log.entries().is_empty());
    assert_eq!(stored_order(&dir, "todo")?, vec![a.clone()]);
    assert!(stored_order(&dir, "completed")?.is_empty());
    assert_eq!(stored_order(&dir, "in_progress")?, vec![b]);
    for status in ["todo", "in_progress", "completed"] {
        assert_eq!(lane_ids(&service, status).await, stored_order(&dir, status)?);
    }
    Ok(())
}
