//! In-memory stand-ins for the database and the text generator.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use time::{Date, OffsetDateTime};

use crate::{
    ai::client::TextGenerator,
    auth::{
        repo::UserStore,
        repo_types::{NewUser, User},
    },
    todos::{repo::TaskStore, repo_types::Task},
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    tasks: Vec<Task>,
    next_user_id: i64,
    next_task_id: i64,
}

/// One shared table set implementing both stores, so user deletion cascades.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, email: &str) -> i64 {
        let new_user = NewUser {
            first_name: "Test".into(),
            last_name: None,
            email: email.into(),
            password_hash: "$argon2id$unused".into(),
        };
        let user = UserStore::create(self, new_user).await.unwrap().unwrap();
        user.id
    }

    /// Direct row lookup, bypassing the store traits.
    pub fn task(&self, id: i64) -> Option<Task> {
        self.with(|t| t.tasks.iter().find(|task| task.id == id).cloned())
    }

    fn with<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> R {
        let mut guard = self.tables.lock().unwrap();
        f(&mut guard)
    }
}

fn newest_first(mut tasks: Vec<Task>) -> Vec<Task> {
    tasks.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
    tasks
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self.with(|t| t.users.iter().find(|u| u.email == email).cloned()))
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        Ok(self.with(|t| t.users.iter().find(|u| u.id == id).cloned()))
    }

    async fn exists_by_email(&self, email: &str) -> anyhow::Result<bool> {
        Ok(self.with(|t| t.users.iter().any(|u| u.email == email)))
    }

    async fn create(&self, user: NewUser) -> anyhow::Result<Option<User>> {
        Ok(self.with(|t| {
            if t.users.iter().any(|u| u.email == user.email) {
                return None;
            }
            t.next_user_id += 1;
            let row = User {
                id: t.next_user_id,
                first_name: user.first_name,
                last_name: user.last_name,
                email: user.email,
                password_hash: user.password_hash,
                created_at: OffsetDateTime::now_utc(),
            };
            t.users.push(row.clone());
            Some(row)
        }))
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        Ok(self.with(|t| {
            let before = t.users.len();
            t.users.retain(|u| u.id != id);
            if t.users.len() == before {
                return false;
            }
            t.tasks.retain(|task| task.user_id != id);
            true
        }))
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn list_by_user(&self, user_id: i64) -> anyhow::Result<Vec<Task>> {
        let rows = self.with(|t| {
            t.tasks
                .iter()
                .filter(|task| task.user_id == user_id)
                .cloned()
                .collect()
        });
        Ok(newest_first(rows))
    }

    async fn list_incomplete_by_user(&self, user_id: i64) -> anyhow::Result<Vec<Task>> {
        let rows = self.with(|t| {
            t.tasks
                .iter()
                .filter(|task| task.user_id == user_id && !task.completed)
                .cloned()
                .collect()
        });
        Ok(newest_first(rows))
    }

    async fn create(
        &self,
        user_id: i64,
        task: &str,
        date: Option<Date>,
        ai_priority: Option<i32>,
    ) -> anyhow::Result<Task> {
        self.with(|t| {
            anyhow::ensure!(
                t.users.iter().any(|u| u.id == user_id),
                "foreign key violation: user {user_id}"
            );
            t.next_task_id += 1;
            let now = OffsetDateTime::now_utc();
            let row = Task {
                id: t.next_task_id,
                user_id,
                task: task.to_string(),
                date,
                completed: false,
                ai_priority,
                created_at: now,
                updated_at: now,
            };
            t.tasks.push(row.clone());
            Ok(row)
        })
    }

    async fn set_completion(
        &self,
        id: i64,
        user_id: i64,
        desired: Option<bool>,
    ) -> anyhow::Result<Option<Task>> {
        Ok(self.with(|t| {
            let task = t
                .tasks
                .iter_mut()
                .find(|task| task.id == id && task.user_id == user_id)?;
            task.completed = desired.unwrap_or(!task.completed);
            task.updated_at = OffsetDateTime::now_utc();
            Some(task.clone())
        }))
    }

    async fn set_priority(
        &self,
        id: i64,
        user_id: i64,
        priority: i32,
    ) -> anyhow::Result<Option<Task>> {
        Ok(self.with(|t| {
            let task = t
                .tasks
                .iter_mut()
                .find(|task| task.id == id && task.user_id == user_id)?;
            task.ai_priority = Some(priority);
            task.updated_at = OffsetDateTime::now_utc();
            Some(task.clone())
        }))
    }

    async fn delete(&self, id: i64, user_id: i64) -> anyhow::Result<bool> {
        Ok(self.with(|t| {
            let before = t.tasks.len();
            t.tasks
                .retain(|task| !(task.id == id && task.user_id == user_id));
            t.tasks.len() != before
        }))
    }

    async fn count_incomplete(&self, user_id: i64) -> anyhow::Result<i64> {
        Ok(self.with(|t| {
            t.tasks
                .iter()
                .filter(|task| task.user_id == user_id && !task.completed)
                .count() as i64
        }))
    }
}

/// Replies with a fixed string and records every prompt it was given.
#[derive(Default)]
pub struct ScriptedGenerator {
    reply: String,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn always(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }
}

/// Simulates a provider outage.
pub struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
        anyhow::bail!("connection refused")
    }
}
