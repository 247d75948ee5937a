use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::extractors::AuthUser,
    error::{AppError, AppResult},
    extract::{OptionalJson, ValidatedJson},
    state::AppState,
    todos::{
        dto::{
            CreateTodoRequest, DailySummaryResponse, TaskDto, UpdateCompletionRequest,
            UpdatePrioritiesResponse,
        },
        services,
    },
};

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/todo", get(list_todos).post(create_todo))
        .route("/todo/:id", delete(delete_todo))
        .route("/todo/:id/completed", put(update_completion))
}

pub fn ai_routes() -> Router<AppState> {
    Router::new()
        .route("/todo/ai/daily-summary", get(daily_summary))
        .route("/todo/ai/update-priorities", post(update_priorities))
}

// Non-numeric ids cannot name a task, so they get the same 404 as unknown ones.
fn task_id(raw: &str) -> AppResult<i64> {
    raw.parse()
        .map_err(|_| AppError::NotFound("Task not found".into()))
}

#[instrument(skip(state))]
pub async fn list_todos(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Vec<TaskDto>>> {
    Ok(Json(services::list_tasks(&state, user_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_todo(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateTodoRequest>,
) -> AppResult<(StatusCode, Json<TaskDto>)> {
    let task = services::create_task(&state, user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

#[instrument(skip(state))]
pub async fn delete_todo(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    services::delete_task(&state, user_id, task_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /todo/:id/completed, body `{ "completed": bool }`, or no body to flip.
#[instrument(skip(state, payload))]
pub async fn update_completion(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    OptionalJson(payload): OptionalJson<UpdateCompletionRequest>,
) -> AppResult<Json<TaskDto>> {
    let desired = payload.and_then(|body| body.completed);
    let task = services::toggle_completion(&state, user_id, task_id(&id)?, desired).await?;
    Ok(Json(task))
}

#[instrument(skip(state))]
pub async fn daily_summary(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<DailySummaryResponse>> {
    let summary = services::daily_summary(&state, user_id).await?;
    Ok(Json(DailySummaryResponse { summary }))
}

#[instrument(skip(state))]
pub async fn update_priorities(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<UpdatePrioritiesResponse>> {
    Ok(Json(services::refresh_priorities(&state, user_id).await?))
}
