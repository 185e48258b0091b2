use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::json;

use crate::{
    DynStore, GanttStore, MemberDraft, MemberId, MemberPatch, PersistenceError, ResolveError,
    ScheduleDate, ScheduleSnapshot, ScheduledTask, StoreError, Task, TaskDraft, TaskId, TaskPatch,
    TeamMember,
};

pub type SharedStore = Arc<RwLock<GanttStore<DynStore>>>;

#[derive(Clone)]
pub struct AppState {
    store: SharedStore,
}

impl AppState {
    pub fn new(store: GanttStore<DynStore>) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
        }
    }

    pub fn with_shared(store: SharedStore) -> Self {
        Self { store }
    }

    fn store(&self) -> SharedStore {
        self.store.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict(String),
    Invalid(String),
    /// Stored data is valid but some dates cannot be resolved.
    Unresolvable(String),
    Internal(String),
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Persistence(PersistenceError::InvalidData(message)) => {
                ApiError::Invalid(message)
            }
            StoreError::Persistence(err) => ApiError::Internal(err.to_string()),
            StoreError::Resolve(err) => ApiError::from(err),
            err @ StoreError::DependencyCycle { .. } => ApiError::Conflict(err.to_string()),
        }
    }
}

impl From<ResolveError> for ApiError {
    fn from(value: ResolveError) -> Self {
        ApiError::Unresolvable(value.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Unresolvable(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "unresolvable_schedule",
                message,
            ),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskDates {
    start_date: Option<ScheduleDate>,
    end_date: Option<ScheduleDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TimelineBody {
    start_date: ScheduleDate,
    end_date: Option<ScheduleDate>,
    tasks: Vec<ScheduledTask>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/snapshot", get(export_snapshot).put(import_snapshot))
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/:id",
            get(get_task).patch(update_task).delete(delete_task),
        )
        .route("/tasks/:id/dates", get(task_dates))
        .route("/timeline", get(timeline))
        .route("/members", get(list_members).post(create_member))
        .route("/members/:id", patch(update_member).delete(delete_member))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, store: GanttStore<DynStore>) -> std::io::Result<()> {
    let state = AppState::new(store);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn export_snapshot(State(state): State<AppState>) -> Json<ScheduleSnapshot> {
    let store = state.store();
    let snapshot = store.read().export_data();
    Json(snapshot)
}

async fn import_snapshot(
    State(state): State<AppState>,
    Json(snapshot): Json<ScheduleSnapshot>,
) -> Result<Json<ScheduleSnapshot>, ApiError> {
    let store = state.store();
    let mut guard = store.write();
    guard.load_data(snapshot)?;
    Ok(Json(guard.export_data()))
}

async fn list_tasks(State(state): State<AppState>) -> Json<Vec<Task>> {
    let store = state.store();
    let tasks = store.read().tasks().to_vec();
    Json(tasks)
}

async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    let task_id = TaskId::from(task_id);
    let store = state.store();
    let guard = store.read();
    match guard.task(&task_id) {
        Some(task) => Ok(Json(task.clone())),
        None => Err(ApiError::not_found(format!("task {task_id} not found"))),
    }
}

async fn create_task(
    State(state): State<AppState>,
    Json(draft): Json<TaskDraft>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let store = state.store();
    let mut guard = store.write();
    let id = guard.add_task(draft)?;
    let created = guard
        .task(&id)
        .cloned()
        .ok_or_else(|| ApiError::internal("task not found after creation"))?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<Task>, ApiError> {
    let task_id = TaskId::from(task_id);
    let store = state.store();
    let mut guard = store.write();
    if !guard.update_task(&task_id, patch)? {
        return Err(ApiError::not_found(format!("task {task_id} not found")));
    }
    let updated = guard
        .task(&task_id)
        .cloned()
        .ok_or_else(|| ApiError::internal("task not found after update"))?;
    Ok(Json(updated))
}

async fn delete_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let task_id = TaskId::from(task_id);
    let store = state.store();
    let removed = store.write().delete_task(&task_id)?;
    if !removed {
        return Err(ApiError::not_found(format!("task {task_id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn task_dates(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskDates>, ApiError> {
    let task_id = TaskId::from(task_id);
    let store = state.store();
    let guard = store.read();
    let task = guard
        .task(&task_id)
        .ok_or_else(|| ApiError::not_found(format!("task {task_id} not found")))?;
    let resolver = guard.resolver();
    Ok(Json(TaskDates {
        start_date: resolver.start_date(task)?,
        end_date: resolver.end_date(task)?,
    }))
}

async fn timeline(State(state): State<AppState>) -> Result<Json<TimelineBody>, ApiError> {
    let store = state.store();
    let guard = store.read();
    Ok(Json(TimelineBody {
        start_date: guard.timeline_start_date()?,
        end_date: guard.timeline_end_date()?,
        tasks: guard.timeline()?,
    }))
}

async fn list_members(State(state): State<AppState>) -> Json<Vec<TeamMember>> {
    let store = state.store();
    let members = store.read().team_members().to_vec();
    Json(members)
}

async fn create_member(
    State(state): State<AppState>,
    Json(draft): Json<MemberDraft>,
) -> Result<(StatusCode, Json<TeamMember>), ApiError> {
    let store = state.store();
    let mut guard = store.write();
    let id = guard.add_team_member(draft)?;
    let created = guard
        .team_member(&id)
        .cloned()
        .ok_or_else(|| ApiError::internal("team member not found after creation"))?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_member(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
    Json(patch): Json<MemberPatch>,
) -> Result<Json<TeamMember>, ApiError> {
    let member_id = MemberId::from(member_id);
    let store = state.store();
    let mut guard = store.write();
    if !guard.update_team_member(&member_id, patch)? {
        return Err(ApiError::not_found(format!(
            "team member {member_id} not found"
        )));
    }
    let updated = guard
        .team_member(&member_id)
        .cloned()
        .ok_or_else(|| ApiError::internal("team member not found after update"))?;
    Ok(Json(updated))
}

async fn delete_member(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let member_id = MemberId::from(member_id);
    let store = state.store();
    let removed = store.write().delete_team_member(&member_id)?;
    if !removed {
        return Err(ApiError::not_found(format!(
            "team member {member_id} not found"
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}
