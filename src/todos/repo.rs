use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::Date;

use crate::todos::repo_types::Task;

/// Persistence contract for todo items.
///
/// Every lookup or mutation of a single task is keyed by `(id, user_id)`:
/// a task owned by someone else behaves exactly like a missing one.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Newest first.
    async fn list_by_user(&self, user_id: i64) -> anyhow::Result<Vec<Task>>;
    async fn list_incomplete_by_user(&self, user_id: i64) -> anyhow::Result<Vec<Task>>;
    async fn create(
        &self,
        user_id: i64,
        task: &str,
        date: Option<Date>,
        ai_priority: Option<i32>,
    ) -> anyhow::Result<Task>;
    /// Sets completion to `desired`, or flips it when `desired` is `None`.
    async fn set_completion(
        &self,
        id: i64,
        user_id: i64,
        desired: Option<bool>,
    ) -> anyhow::Result<Option<Task>>;
    async fn set_priority(&self, id: i64, user_id: i64, priority: i32)
        -> anyhow::Result<Option<Task>>;
    async fn delete(&self, id: i64, user_id: i64) -> anyhow::Result<bool>;
    async fn count_incomplete(&self, user_id: i64) -> anyhow::Result<i64>;
}

#[derive(Clone)]
pub struct PgTaskStore {
    db: PgPool,
}

impl PgTaskStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn list_by_user(&self, user_id: i64) -> anyhow::Result<Vec<Task>> {
        let rows = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, user_id, task, date, completed, ai_priority, created_at, updated_at
            FROM todo_items
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list tasks by user")?;
        Ok(rows)
    }

    async fn list_incomplete_by_user(&self, user_id: i64) -> anyhow::Result<Vec<Task>> {
        let rows = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, user_id, task, date, completed, ai_priority, created_at, updated_at
            FROM todo_items
            WHERE user_id = $1 AND completed = false
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list incomplete tasks")?;
        Ok(rows)
    }

    async fn create(
        &self,
        user_id: i64,
        task: &str,
        date: Option<Date>,
        ai_priority: Option<i32>,
    ) -> anyhow::Result<Task> {
        let row = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO todo_items (user_id, task, date, completed, ai_priority)
            VALUES ($1, $2, $3, false, $4)
            RETURNING id, user_id, task, date, completed, ai_priority, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(task)
        .bind(date)
        .bind(ai_priority)
        .fetch_one(&self.db)
        .await
        .context("insert task")?;
        Ok(row)
    }

    async fn set_completion(
        &self,
        id: i64,
        user_id: i64,
        desired: Option<bool>,
    ) -> anyhow::Result<Option<Task>> {
        let row = sqlx::query_as::<_, Task>(
            r#"
            UPDATE todo_items
               SET completed = COALESCE($3, NOT completed),
                   updated_at = now()
             WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, task, date, completed, ai_priority, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(desired)
        .fetch_optional(&self.db)
        .await
        .context("update task completion")?;
        Ok(row)
    }

    async fn set_priority(
        &self,
        id: i64,
        user_id: i64,
        priority: i32,
    ) -> anyhow::Result<Option<Task>> {
        let row = sqlx::query_as::<_, Task>(
            r#"
            UPDATE todo_items
               SET ai_priority = $3,
                   updated_at = now()
             WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, task, date, completed, ai_priority, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(priority)
        .fetch_optional(&self.db)
        .await
        .context("update task priority")?;
        Ok(row)
    }

    async fn delete(&self, id: i64, user_id: i64) -> anyhow::Result<bool> {
        let res = sqlx::query(r#"DELETE FROM todo_items WHERE id = $1 AND user_id = $2"#)
            .bind(id)
            .bind(user_id)
            .execute(&self.db)
            .await
            .context("delete task")?;
        Ok(res.rows_affected() > 0)
    }

    async fn count_incomplete(&self, user_id: i64) -> anyhow::Result<i64> {
        let n: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM todo_items WHERE user_id = $1 AND completed = false"#,
        )
        .bind(user_id)
        .fetch_one(&self.db)
        .await
        .context("count incomplete tasks")?;
        Ok(n)
    }
}
