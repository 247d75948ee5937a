use time::{Date, OffsetDateTime};
use tracing::{info, instrument, warn};

use crate::{
    ai::services::{refresh_all_priorities, score_priority, summarize_day},
    error::{AppError, AppResult},
    state::AppState,
    todos::{
        dto::{CreateTodoRequest, TaskDto, UpdatePrioritiesResponse},
        repo_types::Task,
    },
};

pub const ALL_DONE_SUMMARY: &str = "All your tasks are completed! Great job staying productive.";

fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

fn task_not_found() -> AppError {
    AppError::NotFound("Task not found".into())
}

#[instrument(skip(st))]
pub async fn list_tasks(st: &AppState, user_id: i64) -> AppResult<Vec<TaskDto>> {
    let tasks = st.tasks.list_by_user(user_id).await?;
    Ok(tasks.into_iter().map(TaskDto::from).collect())
}

/// Creates a task, scoring it first. A failed score never blocks creation.
#[instrument(skip(st, req))]
pub async fn create_task(st: &AppState, user_id: i64, req: CreateTodoRequest) -> AppResult<TaskDto> {
    let description = req.task.trim();
    if description.is_empty() {
        return Err(AppError::BadRequest("Task name is required".into()));
    }

    if st.users.find_by_id(user_id).await?.is_none() {
        warn!(user_id, "create task for unknown user");
        return Err(AppError::NotFound("User not found".into()));
    }

    let priority = score_priority(st.ai.as_ref(), description, req.date, today()).await;
    let task: Task = st
        .tasks
        .create(user_id, description, req.date, Some(priority))
        .await?;

    info!(user_id, task_id = task.id, priority, "task created");
    Ok(TaskDto::from(task))
}

#[instrument(skip(st))]
pub async fn delete_task(st: &AppState, user_id: i64, task_id: i64) -> AppResult<()> {
    if !st.tasks.delete(task_id, user_id).await? {
        return Err(task_not_found());
    }
    info!(user_id, task_id, "task deleted");
    Ok(())
}

/// Sets completion to `desired`, or flips it when absent.
#[instrument(skip(st))]
pub async fn toggle_completion(
    st: &AppState,
    user_id: i64,
    task_id: i64,
    desired: Option<bool>,
) -> AppResult<TaskDto> {
    let task = st
        .tasks
        .set_completion(task_id, user_id, desired)
        .await?
        .ok_or_else(task_not_found)?;
    info!(user_id, task_id, completed = task.completed, "task completion updated");
    Ok(TaskDto::from(task))
}

#[instrument(skip(st))]
pub async fn daily_summary(st: &AppState, user_id: i64) -> AppResult<String> {
    let pending = st.tasks.list_incomplete_by_user(user_id).await?;
    if pending.is_empty() {
        return Ok(ALL_DONE_SUMMARY.to_string());
    }
    Ok(summarize_day(st.ai.as_ref(), &pending, today()).await)
}

#[instrument(skip(st))]
pub async fn refresh_priorities(st: &AppState, user_id: i64) -> AppResult<UpdatePrioritiesResponse> {
    let res = refresh_all_priorities(
        st.ai.as_ref(),
        st.tasks.as_ref(),
        user_id,
        st.ai_batch_delay(),
        today(),
    )
    .await?;
    info!(user_id, updated = res.updated_count, "priorities refreshed");
    Ok(res)
}
