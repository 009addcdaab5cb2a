//! Service façade that keeps the in-memory board in sync with the store.
//!
//! Moves are applied locally first and then pushed to the store. The board
//! lock is released before any store call, so independent moves may be in
//! flight at the same time; each one reconciles on its own.

use anyhow::Error;
use planboard_core::{BoardColumn, ColumnId, NewTask, Task, TaskFilter, TaskId, TaskPatch};
use thiserror::Error as ThisError;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::async_store::AsyncTaskStore;
use crate::board_state::BoardState;
use crate::config::{BoardConfig, RollbackPolicy};
use crate::drag::{DragController, DragError, DropOutcome};
use crate::notify::{Notification, Notifier, TracingNotifier};
use crate::resolver::{self, DropTarget, MoveError, ResolvedMove};
use crate::session::{SessionContext, UserProvider};

/// Errors surfaced by [`BoardService`].
#[derive(ThisError, Debug)]
pub enum ServiceError {
    /// The requested move does not resolve.
    #[error(transparent)]
    Move(#[from] MoveError),
    /// The drag gesture was rejected.
    #[error(transparent)]
    Drag(#[from] DragError),
    /// Target task could not be found.
    #[error("task {0} not found")]
    MissingTask(TaskId),
    /// No status was given and the board has no columns to fall back to.
    #[error("no column is available for new tasks")]
    NoDefaultStatus,
    /// Backing store returned an error.
    #[error("store error: {0}")]
    Store(#[source] Error),
}

/// What happened to a move request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveStatus {
    /// Target equals the current placement; the store was not called.
    Skipped,
    /// Applied locally and accepted by the store.
    Persisted(ResolvedMove),
}

/// Owned copy of one column and its tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneView {
    /// Column definition.
    pub column: BoardColumn,
    /// Tasks in display order.
    pub tasks: Vec<Task>,
}

impl LaneView {
    /// Whether the lane holds more tasks than its limit.
    #[must_use]
    pub fn is_over_limit(&self) -> bool {
        self.column
            .limit
            .is_some_and(|limit| self.tasks.len() > limit as usize)
    }
}

#[derive(Debug)]
struct BoardModel {
    board: BoardState,
    drag: DragController,
}

/// Board state plus the store it is persisted to.
pub struct BoardService<S, N = TracingNotifier> {
    store: S,
    notifier: N,
    config: BoardConfig,
    session: SessionContext,
    model: Mutex<BoardModel>,
}

impl<S, N> BoardService<S, N> {
    /// Build a service around tasks that were already loaded.
    pub fn new(store: S, notifier: N, config: BoardConfig, session: SessionContext, tasks: Vec<Task>) -> Self {
        let board = BoardState::new(config.columns().to_vec(), tasks);
        Self {
            store,
            notifier,
            config,
            session,
            model: Mutex::new(BoardModel {
                board,
                drag: DragController::new(),
            }),
        }
    }

    /// Board configuration.
    pub const fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// Session the service acts for.
    pub const fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Run `f` against the current board.
    pub async fn with_board<R>(&self, f: impl FnOnce(&BoardState) -> R) -> R {
        let model = self.model.lock().await;
        f(&model.board)
    }

    /// Every column with its tasks, ignoring the filter.
    pub async fn lanes(&self) -> Vec<LaneView> {
        self.with_board(|board| board.lanes().into_iter().map(to_view).collect())
            .await
    }

    /// Columns as currently displayed under the active filter.
    pub async fn visible_lanes(&self) -> Vec<LaneView> {
        self.with_board(|board| board.visible_lanes().into_iter().map(to_view).collect())
            .await
    }

    /// Tasks whose status names no column.
    pub async fn orphans(&self) -> Vec<Task> {
        self.with_board(|board| board.orphans().into_iter().cloned().collect())
            .await
    }

    /// Look up a task.
    pub async fn task(&self, id: &TaskId) -> Option<Task> {
        self.with_board(|board| board.task(id).cloned()).await
    }

    /// Replace the display filter. Never touches task data.
    pub async fn set_filter(&self, filter: TaskFilter) {
        debug!(active = !filter.is_empty(), "filter changed");
        self.model.lock().await.board.set_filter(filter);
    }

    /// Active display filter.
    pub async fn filter(&self) -> TaskFilter {
        self.with_board(|board| board.filter().clone()).await
    }

    /// Card currently being dragged.
    pub async fn active_drag(&self) -> Option<TaskId> {
        self.model.lock().await.drag.active_task().cloned()
    }

    /// Pick up a card.
    ///
    /// # Errors
    /// Returns [`ServiceError::Drag`] when the card is unknown or a gesture is active.
    pub async fn drag_start(&self, task: &TaskId) -> Result<(), ServiceError> {
        let mut guard = self.model.lock().await;
        let BoardModel { board, drag } = &mut *guard;
        drag.drag_start(board, task)?;
        Ok(())
    }

    /// Pointer moved over `target`. Returns true when the card changed column.
    pub async fn drag_over(&self, target: &DropTarget) -> bool {
        let mut guard = self.model.lock().await;
        let BoardModel { board, drag } = &mut *guard;
        drag.drag_over(board, target)
    }

    /// Abort the gesture. Returns false when nothing was being dragged.
    pub async fn drag_cancel(&self) -> bool {
        let mut guard = self.model.lock().await;
        let BoardModel { board, drag } = &mut *guard;
        drag.cancel(board)
    }
}

impl<S: AsyncTaskStore, N: Notifier> BoardService<S, N> {
    /// Load tasks from the store and build the service.
    ///
    /// # Errors
    /// Returns [`ServiceError::Store`] when the tasks cannot be loaded.
    pub async fn load(store: S, notifier: N, config: BoardConfig, session: SessionContext) -> Result<Self, ServiceError> {
        let tasks = store
            .load_tasks()
            .await
            .map_err(|err| ServiceError::Store(err.into()))?;
        Ok(Self::new(store, notifier, config, session, tasks))
    }

    /// Move a task to `position` within `status`.
    ///
    /// The position is clamped to the end of the column. Requests that land
    /// where the task already is never reach the store.
    ///
    /// # Errors
    /// Returns [`ServiceError::Move`] for unknown tasks or columns and
    /// [`ServiceError::Store`] when the store rejects the move.
    pub async fn move_task(&self, task: &TaskId, status: &ColumnId, position: u32) -> Result<MoveStatus, ServiceError> {
        let mv = {
            let mut model = self.model.lock().await;
            let mv = resolver::resolve_explicit(&model.board, task, status, position)?;
            if mv.is_noop() {
                debug!(task = %task, status = %status, position, "move is a no-op, skipping store");
                return Ok(MoveStatus::Skipped);
            }
            model.board.apply_move(&mv);
            mv
        };
        self.persist_move(mv).await
    }

    /// Release the dragged card. A gesture that moved the card issues exactly
    /// one store call.
    ///
    /// # Errors
    /// Returns [`ServiceError::Store`] when the store rejects the final move.
    pub async fn drag_end(&self, target: Option<&DropTarget>) -> Result<DropOutcome, ServiceError> {
        let outcome = {
            let mut guard = self.model.lock().await;
            let BoardModel { board, drag } = &mut *guard;
            drag.drag_end(board, target)
        };
        if let DropOutcome::Moved(mv) = &outcome {
            self.persist_move(mv.clone()).await?;
        }
        Ok(outcome)
    }

    /// Create a task at the end of its column.
    ///
    /// # Errors
    /// Returns [`ServiceError::Move`] when the status names no column and
    /// [`ServiceError::Store`] when the store rejects the task.
    pub async fn create_task(&self, mut new: NewTask) -> Result<Task, ServiceError> {
        let status = match new.status.take() {
            Some(status) => status,
            None => self
                .config
                .default_status()
                .cloned()
                .ok_or(ServiceError::NoDefaultStatus)?,
        };
        if !self.with_board(|board| board.has_column(&status)).await {
            return Err(MoveError::UnknownColumn(status).into());
        }
        new.status = Some(status);
        if new.created_by.is_none() {
            new.created_by = Some(self.session.current_user().name.clone());
        }

        let task = self
            .store
            .create_task(&new)
            .await
            .map_err(|err| self.store_failure("create", err.into()))?;
        info!(task = %task.id, status = %task.status, "task created");
        self.model.lock().await.board.upsert_task(task.clone());
        Ok(task)
    }

    /// Apply a metadata patch. Status and position are never touched here.
    ///
    /// # Errors
    /// Returns [`ServiceError::MissingTask`] for unknown ids and
    /// [`ServiceError::Store`] when the store rejects the patch.
    pub async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, ServiceError> {
        let current = self
            .task(id)
            .await
            .ok_or_else(|| ServiceError::MissingTask(id.clone()))?;
        if patch.is_empty() {
            debug!(task = %id, "empty patch, skipping store");
            return Ok(current);
        }

        let stored = self
            .store
            .update_task(id, patch)
            .await
            .map_err(|err| self.store_failure("update", err.into()))?;
        let mut model = self.model.lock().await;
        model.board.refresh_metadata(stored);
        model
            .board
            .task(id)
            .cloned()
            .ok_or_else(|| ServiceError::MissingTask(id.clone()))
    }

    async fn persist_move(&self, mv: ResolvedMove) -> Result<MoveStatus, ServiceError> {
        match self
            .store
            .move_task(&mv.task, &mv.to.status, mv.to.index)
            .await
        {
            Ok(()) => {
                info!(
                    task = %mv.task,
                    from = %mv.from.status,
                    to = %mv.to.status,
                    position = mv.to.index,
                    "move persisted"
                );
                Ok(MoveStatus::Persisted(mv))
            }
            Err(err) => {
                let err = self.store_failure("move", err.into());
                self.reconcile(&mv).await;
                Err(err)
            }
        }
    }

    /// Undo a rejected move if nothing has relocated the task since.
    async fn reconcile(&self, mv: &ResolvedMove) {
        if self.config.rollback() == RollbackPolicy::Keep {
            warn!(task = %mv.task, "keeping local placement after failed move");
            return;
        }
        let mut model = self.model.lock().await;
        if model.drag.active_task() == Some(&mv.task) {
            debug!(task = %mv.task, "task is being dragged again, not reverting");
            return;
        }
        if model.board.placement_of(&mv.task).as_ref() != Some(&mv.to) {
            debug!(task = %mv.task, "task moved again since, not reverting");
            return;
        }
        model.board.place(&mv.task, &mv.from);
        info!(task = %mv.task, status = %mv.from.status, index = mv.from.index, "reverted failed move");
    }

    fn store_failure(&self, action: &str, err: Error) -> ServiceError {
        warn!(action, error = %err, "store call failed");
        self.notifier
            .notify(Notification::error(format!("Failed to {action} task")));
        ServiceError::Store(err)
    }
}

fn to_view(lane: planboard_core::ColumnLane<'_>) -> LaneView {
    LaneView {
        column: lane.column.clone(),
        tasks: lane.tasks.into_iter().cloned().collect(),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::notify::{NotificationLevel, NotificationLog};
    use crate::test_support::{id, sample_columns, tasks_with};
    use anyhow::anyhow;
    use planboard_core::placement;
    use std::sync::{Arc, Mutex as StdMutex, PoisonError};
    use tokio::sync::Notify;

    #[derive(Default)]
    struct MockStore {
        inner: StdMutex<MockStoreInner>,
        release: Notify,
    }

    #[derive(Default)]
    struct MockStoreInner {
        tasks: Vec<Task>,
        moves: Vec<(TaskId, ColumnId, u32)>,
        updates: usize,
        fail_moves: usize,
        hold_failures: bool,
        fail_creates: bool,
    }

    impl MockStore {
        fn with_tasks(tasks: Vec<Task>) -> Self {
            Self {
                inner: StdMutex::new(MockStoreInner {
                    tasks,
                    ..MockStoreInner::default()
                }),
                release: Notify::new(),
            }
        }

        fn guard(&self) -> std::sync::MutexGuard<'_, MockStoreInner> {
            self.inner.lock().unwrap_or_else(PoisonError::into_inner)
        }

        fn fail_next_moves(&self, count: usize) {
            self.guard().fail_moves = count;
        }

        fn moves(&self) -> Vec<(TaskId, ColumnId, u32)> {
            self.guard().moves.clone()
        }
    }

    impl AsyncTaskStore for Arc<MockStore> {
        type Error = anyhow::Error;

        async fn load_tasks(&self) -> Result<Vec<Task>, Self::Error> {
            Ok(self.guard().tasks.clone())
        }

        async fn move_task(&self, task: &TaskId, status: &ColumnId, position: u32) -> Result<(), Self::Error> {
            let (fail, hold) = {
                let mut inner = self.guard();
                inner.moves.push((task.clone(), status.clone(), position));
                let fail = inner.fail_moves > 0;
                if fail {
                    inner.fail_moves -= 1;
                }
                (fail, inner.hold_failures)
            };
            if !fail {
                return Ok(());
            }
            if hold {
                self.release.notified().await;
            }
            Err(anyhow!("backend unavailable"))
        }

        async fn update_task(&self, task: &TaskId, patch: &TaskPatch) -> Result<Task, Self::Error> {
            let mut inner = self.guard();
            inner.updates += 1;
            let stored = inner
                .tasks
                .iter_mut()
                .find(|candidate| candidate.id == *task)
                .ok_or_else(|| anyhow!("task {task} not found"))?;
            stored.apply_patch(patch);
            Ok(stored.clone())
        }

        async fn create_task(&self, task: &NewTask) -> Result<Task, Self::Error> {
            let mut inner = self.guard();
            if inner.fail_creates {
                return Err(anyhow!("backend unavailable"));
            }
            let status = task.status.clone().ok_or_else(|| anyhow!("missing status"))?;
            let position = placement::append_position(&inner.tasks, &status);
            let created = Task::from_new(task.clone(), status, position);
            inner.tasks.push(created.clone());
            Ok(created)
        }
    }

    type TestService = BoardService<Arc<MockStore>, NotificationLog>;

    fn service_with(entries: &[(&str, &str)], rollback: RollbackPolicy) -> (Arc<MockStore>, NotificationLog, TestService) {
        let tasks = tasks_with(entries);
        let store = Arc::new(MockStore::with_tasks(tasks.clone()));
        let log = NotificationLog::default();
        let config = BoardConfig::from_columns(sample_columns()).with_rollback(rollback);
        let service = BoardService::new(Arc::clone(&store), log.clone(), config, SessionContext::default(), tasks);
        (store, log, service)
    }

    fn order(lanes: &[LaneView], status: &str) -> Vec<String> {
        lanes
            .iter()
            .find(|lane| lane.column.id == status)
            .map(|lane| lane.tasks.iter().map(|task| task.id.to_string()).collect())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn drag_onto_card_issues_one_move() {
        let (store, _log, service) = service_with(&[("A", "todo"), ("B", "todo"), ("C", "todo")], RollbackPolicy::Revert);

        service.drag_start(&id("C")).await.expect("drag start");
        service.drag_over(&DropTarget::Task(id("A"))).await;
        let outcome = service
            .drag_end(Some(&DropTarget::Task(id("A"))))
            .await
            .expect("drag end");

        assert!(matches!(outcome, DropOutcome::Moved(_)));
        assert_eq!(store.moves(), vec![(id("C"), ColumnId::from("todo"), 0)]);
        assert_eq!(order(&service.lanes().await, "todo"), ["C", "A", "B"]);
        assert!(service.active_drag().await.is_none());
    }

    #[tokio::test]
    async fn drag_into_empty_column_appends() {
        let (store, _log, service) = service_with(&[("A", "todo"), ("D", "todo")], RollbackPolicy::Revert);

        service.drag_start(&id("D")).await.expect("drag start");
        let column = DropTarget::Column("in_progress".into());
        assert!(service.drag_over(&column).await);
        service.drag_end(Some(&column)).await.expect("drag end");

        assert_eq!(store.moves(), vec![(id("D"), ColumnId::from("in_progress"), 0)]);
        assert_eq!(order(&service.lanes().await, "in_progress"), ["D"]);
    }

    #[tokio::test]
    async fn no_op_moves_skip_the_store() {
        let (store, _log, service) = service_with(&[("A", "todo"), ("B", "todo"), ("C", "todo")], RollbackPolicy::Revert);

        let status = service
            .move_task(&id("C"), &"todo".into(), 2)
            .await
            .expect("move");
        assert_eq!(status, MoveStatus::Skipped);

        service.drag_start(&id("C")).await.expect("drag start");
        let outcome = service
            .drag_end(Some(&DropTarget::Column("todo".into())))
            .await
            .expect("drag end");
        assert_eq!(outcome, DropOutcome::Unchanged);

        let cancelled = service.drag_end(None).await.expect("idle drag end");
        assert_eq!(cancelled, DropOutcome::Cancelled);
        assert!(store.moves().is_empty());
    }

    #[tokio::test]
    async fn unknown_targets_never_reach_the_store() {
        let (store, _log, service) = service_with(&[("A", "todo")], RollbackPolicy::Revert);

        let err = service
            .move_task(&id("A"), &"archived".into(), 0)
            .await
            .expect_err("unknown column");
        assert!(matches!(err, ServiceError::Move(MoveError::UnknownColumn(_))));
        let err = service
            .move_task(&id("missing"), &"todo".into(), 0)
            .await
            .expect_err("unknown task");
        assert!(matches!(err, ServiceError::Move(MoveError::UnknownTask(_))));
        assert!(store.moves().is_empty());
    }

    #[tokio::test]
    async fn failed_move_notifies_and_reverts() {
        let (store, log, service) = service_with(&[("A", "todo"), ("B", "todo"), ("X", "done")], RollbackPolicy::Revert);
        store.fail_next_moves(1);

        let err = service
            .move_task(&id("A"), &"done".into(), 0)
            .await
            .expect_err("store failure");
        assert!(matches!(err, ServiceError::Store(_)));

        let notes = log.drain();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, NotificationLevel::Error);
        assert_eq!(notes[0].message, "Failed to move task");

        let lanes = service.lanes().await;
        assert_eq!(order(&lanes, "todo"), ["A", "B"]);
        assert_eq!(order(&lanes, "done"), ["X"]);
    }

    #[tokio::test]
    async fn keep_policy_leaves_local_state_diverged() {
        let (store, log, service) = service_with(&[("A", "todo"), ("X", "done")], RollbackPolicy::Keep);
        store.fail_next_moves(1);

        service
            .move_task(&id("A"), &"done".into(), 1)
            .await
            .expect_err("store failure");

        assert_eq!(log.entries().len(), 1);
        assert_eq!(order(&service.lanes().await, "done"), ["X", "A"]);
    }

    #[tokio::test]
    async fn superseded_move_is_not_reverted() {
        let (store, log, service) = service_with(&[("A", "todo"), ("B", "todo")], RollbackPolicy::Revert);
        {
            let mut inner = store.guard();
            inner.fail_moves = 1;
            inner.hold_failures = true;
        }

        let first_task = id("A");
        let first_status: ColumnId = "in_progress".into();
        let first = service.move_task(&first_task, &first_status, 0);
        let second = async {
            let result = service.move_task(&id("A"), &"done".into(), 0).await;
            store.release.notify_one();
            result
        };
        let (first, second) = tokio::join!(first, second);

        assert!(matches!(first, Err(ServiceError::Store(_))));
        assert!(matches!(second, Ok(MoveStatus::Persisted(_))));
        assert_eq!(store.moves().len(), 2);
        assert_eq!(log.entries().len(), 1);
        let lanes = service.lanes().await;
        assert_eq!(order(&lanes, "done"), ["A"]);
        assert!(order(&lanes, "in_progress").is_empty());
    }

    #[tokio::test]
    async fn create_uses_default_status_and_session_user() {
        let (_store, _log, service) = service_with(&[("A", "todo")], RollbackPolicy::Revert);

        let created = service
            .create_task(NewTask {
                title: "Draft exit memo".into(),
                ..NewTask::default()
            })
            .await
            .expect("create");

        assert_eq!(created.status, "todo");
        assert_eq!(created.position, 1);
        assert_eq!(created.created_by.as_deref(), Some(crate::session::DEFAULT_USER_NAME));
        let lanes = service.lanes().await;
        assert_eq!(order(&lanes, "todo"), ["A".to_owned(), created.id.to_string()]);
    }

    #[tokio::test]
    async fn create_failure_is_reported() {
        let (store, log, service) = service_with(&[], RollbackPolicy::Revert);
        store.guard().fail_creates = true;

        let err = service
            .create_task(NewTask {
                title: "Offline".into(),
                ..NewTask::default()
            })
            .await
            .expect_err("store failure");
        assert!(matches!(err, ServiceError::Store(_)));
        assert_eq!(log.drain()[0].message, "Failed to create task");

        let err = service
            .create_task(NewTask {
                title: "Nowhere".into(),
                status: Some("archived".into()),
                ..NewTask::default()
            })
            .await
            .expect_err("unknown column");
        assert!(matches!(err, ServiceError::Move(MoveError::UnknownColumn(_))));
    }

    #[tokio::test]
    async fn update_replaces_metadata_and_skips_empty_patches() {
        let (store, _log, service) = service_with(&[("A", "todo"), ("B", "todo")], RollbackPolicy::Revert);

        let unchanged = service
            .update_task(&id("B"), &TaskPatch::default())
            .await
            .expect("empty patch");
        assert_eq!(unchanged.title, "B");
        assert_eq!(store.guard().updates, 0);

        let updated = service
            .update_task(
                &id("B"),
                &TaskPatch {
                    title: Some("Sign LOI".into()),
                    ..TaskPatch::default()
                },
            )
            .await
            .expect("update");
        assert_eq!(updated.title, "Sign LOI");
        assert_eq!(updated.position, 1);
        assert_eq!(store.guard().updates, 1);

        let err = service
            .update_task(&id("missing"), &TaskPatch::default())
            .await
            .expect_err("missing task");
        assert!(matches!(err, ServiceError::MissingTask(_)));
    }

    #[tokio::test]
    async fn filter_changes_visible_lanes_only() {
        let (_store, _log, service) = service_with(&[("A", "todo"), ("B", "done")], RollbackPolicy::Revert);

        service.set_filter(TaskFilter::with_text("b")).await;
        let visible = service.visible_lanes().await;
        assert_eq!(visible.len(), 1);
        assert_eq!(order(&visible, "done"), ["B"]);
        assert_eq!(service.lanes().await.len(), sample_columns().len());
        assert!(!service.filter().await.is_empty());
    }
}
