use sqlx::FromRow;
use time::{Date, OffsetDateTime};

/// Todo item row. Always owned by exactly one user.
#[derive(Debug, Clone, FromRow)]
pub struct Task {
    pub id: i64,
    pub user_id: i64,
    pub task: String,
    pub date: Option<Date>,
    pub completed: bool,
    pub ai_priority: Option<i32>, // 1..=5 once scored
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}
