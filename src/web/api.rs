use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::build_info;
use crate::error::TaskError;
use crate::model::{Task, TaskInput, TaskListing};
use crate::store::tasks::{Direction, MoveOutcome};
use crate::web::AppState;

/// JSON error body: `{"error": <code>, "message": <text>}`.
pub struct ApiError(pub TaskError);

impl From<TaskError> for ApiError {
    fn from(err: TaskError) -> Self {
        Self(err)
    }
}

pub fn status_for(err: &TaskError) -> StatusCode {
    match err {
        TaskError::DuplicateName(_) => StatusCode::CONFLICT,
        TaskError::TaskNotFound(_) => StatusCode::NOT_FOUND,
        TaskError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            warn!(error = %self.0, code = self.0.code(), "request failed");
        }
        let body = serde_json::json!({
            "error": self.0.code(),
            "message": self.0.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

/// Request body for create and update. Values arrive as strings, like form fields.
#[derive(Debug, Deserialize)]
pub struct TaskPayload {
    pub name: String,
    pub cost: String,
    pub due_date: String,
}

impl TaskPayload {
    fn parse(&self) -> Result<TaskInput, TaskError> {
        TaskInput::parse(&self.name, &self.cost, &self.due_date)
    }
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
    pub git_sha: Option<&'static str>,
}

pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: build_info::version(),
        git_sha: build_info::git_sha(),
    })
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<TaskListing>> {
    Ok(Json(state.with_store(|store| store.list()).await?))
}

pub async fn show(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Task>> {
    Ok(Json(state.with_store(move |store| store.get(id)).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<TaskPayload>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let input = payload.parse()?;
    let task = state.with_store(move |store| store.create(&input)).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<TaskPayload>,
) -> ApiResult<Json<Task>> {
    let input = payload.parse()?;
    Ok(Json(
        state
            .with_store(move |store| store.update(id, &input))
            .await?,
    ))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Task>> {
    Ok(Json(state.with_store(move |store| store.delete(id)).await?))
}

pub async fn move_up(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<MoveOutcome>> {
    move_task(state, id, Direction::Up).await
}

pub async fn move_down(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<MoveOutcome>> {
    move_task(state, id, Direction::Down).await
}

async fn move_task(state: AppState, id: i64, direction: Direction) -> ApiResult<Json<MoveOutcome>> {
    Ok(Json(
        state
            .with_store(move |store| store.move_task(id, direction))
            .await?,
    ))
}
