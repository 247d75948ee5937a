//! Priority scoring and daily summaries backed by the text generator.
//!
//! Nothing in here returns an error because the generator misbehaved: every
//! outbound failure degrades to a fixed default.

use std::time::Duration;

use time::Date;
use tracing::{debug, error, instrument, warn};

use crate::{
    ai::{
        client::TextGenerator,
        prompts::{build_priority_prompt, build_summary_prompt, select_for_summary, DEFAULT_PRIORITY},
    },
    todos::{dto::UpdatePrioritiesResponse, repo::TaskStore, repo_types::Task},
};

pub const NO_TASKS_SUMMARY: &str = "No tasks for today. It's a great day to plan ahead!";
pub const FALLBACK_SUMMARY: &str =
    "You have tasks to complete today. Stay focused and tackle them one by one!";
pub const NO_INCOMPLETE_TASKS: &str = "No incomplete tasks to update";

const MAX_SUMMARY_CHARS: usize = 500;
const TRUNCATED_SUMMARY_CHARS: usize = 497;

/// First digit anywhere in the reply, clamped into 1..=5.
pub fn parse_priority(reply: &str) -> Option<i32> {
    reply
        .chars()
        .find(char::is_ascii_digit)
        .and_then(|c| c.to_digit(10))
        .map(|d| (d as i32).clamp(1, 5))
}

/// Trimmed reply, cut to 497 characters plus `...` when longer than 500.
pub fn trim_summary(reply: &str) -> Option<String> {
    let cleaned = reply.trim();
    if cleaned.is_empty() {
        return None;
    }
    if cleaned.chars().count() > MAX_SUMMARY_CHARS {
        let mut cut: String = cleaned.chars().take(TRUNCATED_SUMMARY_CHARS).collect();
        cut.push_str("...");
        return Some(cut);
    }
    Some(cleaned.to_string())
}

#[instrument(skip(ai, task))]
pub async fn score_priority(
    ai: &dyn TextGenerator,
    task: &str,
    due: Option<Date>,
    today: Date,
) -> i32 {
    let prompt = build_priority_prompt(task, due, today);
    match ai.generate(&prompt).await {
        Ok(reply) => parse_priority(&reply).unwrap_or_else(|| {
            warn!(reply = %reply, "unparseable priority reply, defaulting");
            DEFAULT_PRIORITY
        }),
        Err(e) => {
            warn!(error = %e, "priority generation failed, defaulting");
            DEFAULT_PRIORITY
        }
    }
}

#[instrument(skip(ai, tasks), fields(tasks = tasks.len()))]
pub async fn summarize_day(ai: &dyn TextGenerator, tasks: &[Task], today: Date) -> String {
    let selected = select_for_summary(tasks);
    if selected.is_empty() {
        return NO_TASKS_SUMMARY.to_string();
    }

    let prompt = build_summary_prompt(&selected, today);
    match ai.generate(&prompt).await {
        Ok(reply) => trim_summary(&reply).unwrap_or_else(|| {
            warn!("empty summary reply, using fallback");
            FALLBACK_SUMMARY.to_string()
        }),
        Err(e) => {
            warn!(error = %e, "summary generation failed, using fallback");
            FALLBACK_SUMMARY.to_string()
        }
    }
}

/// Re-scores every incomplete task of `user_id`, one call at a time with
/// `delay` between calls.
#[instrument(skip(ai, store))]
pub async fn refresh_all_priorities(
    ai: &dyn TextGenerator,
    store: &dyn TaskStore,
    user_id: i64,
    delay: Duration,
    today: Date,
) -> anyhow::Result<UpdatePrioritiesResponse> {
    let pending = store.list_incomplete_by_user(user_id).await?;
    if pending.is_empty() {
        return Ok(UpdatePrioritiesResponse {
            message: NO_INCOMPLETE_TASKS.to_string(),
            updated_count: 0,
        });
    }

    let mut updated_count = 0;
    for (i, task) in pending.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let priority = score_priority(ai, &task.task, task.date, today).await;
        match store.set_priority(task.id, task.user_id, priority).await {
            Ok(Some(_)) => {
                updated_count += 1;
                debug!(task_id = task.id, priority, "priority updated");
            }
            Ok(None) => {
                debug!(task_id = task.id, "task vanished during refresh");
            }
            Err(e) => {
                error!(task_id = task.id, error = %e, "priority update failed");
            }
        }
    }

    Ok(UpdatePrioritiesResponse {
        message: format!("Successfully updated priorities for {} tasks", updated_count),
        updated_count,
    })
}
