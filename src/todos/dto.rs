use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    extract::{Checks, FieldErrors, Validate},
    formats::{iso_date, iso_millis, utc},
    todos::repo_types::Task,
};

#[derive(Debug, Deserialize)]
pub struct CreateTodoRequest {
    pub task: String,
    #[serde(default, with = "iso_date::option")]
    pub date: Option<Date>,
}

impl Validate for CreateTodoRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        Checks::new()
            .check(!self.task.trim().is_empty(), "task", "Task name is required")
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCompletionRequest {
    #[serde(default)]
    pub completed: Option<bool>,
}

/// Task as rendered to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDto {
    #[serde(rename = "_id")]
    pub id: i64,
    pub task: String,
    #[serde(with = "iso_date::option")]
    pub date: Option<Date>,
    pub completed: bool,
    pub ai_priority: Option<i32>,
    #[serde(with = "iso_millis")]
    pub created_at: OffsetDateTime,
    #[serde(with = "iso_millis")]
    pub updated_at: OffsetDateTime,
}

impl From<Task> for TaskDto {
    fn from(t: Task) -> Self {
        Self {
            id: t.id,
            task: t.task,
            date: t.date,
            completed: t.completed,
            ai_priority: t.ai_priority,
            created_at: utc(t.created_at),
            updated_at: utc(t.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DailySummaryResponse {
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePrioritiesResponse {
    pub message: String,
    pub updated_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn task_json_shape() {
        let task = Task {
            id: 12,
            user_id: 3,
            task: "Deploy the application".into(),
            date: Some(date!(2025 - 01 - 01)),
            completed: false,
            ai_priority: Some(4),
            created_at: datetime!(2024-12-30 09:00:00 UTC),
            updated_at: datetime!(2024-12-30 11:00:00.25 +01:00),
        };
        let json = serde_json::to_value(TaskDto::from(task)).unwrap();
        assert_eq!(json["_id"], 12);
        assert_eq!(json["task"], "Deploy the application");
        assert_eq!(json["date"], "2025-01-01");
        assert_eq!(json["completed"], false);
        assert_eq!(json["aiPriority"], 4);
        assert_eq!(json["createdAt"], "2024-12-30T09:00:00.000Z");
        assert_eq!(json["updatedAt"], "2024-12-30T10:00:00.250Z");
        assert!(json.get("userId").is_none());
    }

    #[test]
    fn missing_date_and_priority_render_as_null() {
        let task = Task {
            id: 1,
            user_id: 1,
            task: "x".into(),
            date: None,
            completed: true,
            ai_priority: None,
            created_at: datetime!(2025-01-01 0:00 UTC),
            updated_at: datetime!(2025-01-01 0:00 UTC),
        };
        let json = serde_json::to_value(TaskDto::from(task)).unwrap();
        assert!(json["date"].is_null());
        assert!(json["aiPriority"].is_null());
    }

    #[test]
    fn completion_request_field_is_optional() {
        let empty: UpdateCompletionRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.completed, None);
        let set: UpdateCompletionRequest = serde_json::from_str(r#"{"completed":true}"#).unwrap();
        assert_eq!(set.completed, Some(true));
    }

    #[test]
    fn update_priorities_response_is_camel_case() {
        let json = serde_json::to_value(UpdatePrioritiesResponse {
            message: "done".into(),
            updated_count: 2,
        })
        .unwrap();
        assert_eq!(json["updatedCount"], 2);
    }
}
