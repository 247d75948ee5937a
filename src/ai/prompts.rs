use std::fmt::Write;

use time::Date;

use crate::todos::repo_types::Task;

pub const NO_DUE_DATE: &str = "No due date";
pub const DEFAULT_PRIORITY: i32 = 3;
pub const SUMMARY_TASK_LIMIT: usize = 10;

fn due_label(date: Option<Date>) -> String {
    date.map(|d| d.to_string())
        .unwrap_or_else(|| NO_DUE_DATE.to_string())
}

pub fn build_priority_prompt(task: &str, due: Option<Date>, today: Date) -> String {
    format!(
        r#"You are an expert productivity assistant. Rate the priority of the task below on a scale from 1 to 5.

Task: "{task}"
Due Date: {due}
Today's Date: {today}

Weigh the following:
- The closer the due date, the higher the priority.
- Wording that signals urgency or importance (urgent, ASAP, deadline, important, critical) raises the priority.
- Routine tasks or tasks that can wait get a lower priority.

Answer with a single digit from 1 to 5 and nothing else.
1 = Minimal, 2 = Low, 3 = Medium, 4 = High, 5 = Critical"#,
        due = due_label(due),
    )
}

/// Incomplete tasks by descending priority (unscored counts as medium), capped for the prompt.
pub fn select_for_summary(tasks: &[Task]) -> Vec<&Task> {
    let mut pending: Vec<&Task> = tasks.iter().filter(|t| !t.completed).collect();
    pending.sort_by_key(|t| std::cmp::Reverse(t.ai_priority.unwrap_or(DEFAULT_PRIORITY)));
    pending.truncate(SUMMARY_TASK_LIMIT);
    pending
}

pub fn build_summary_prompt(tasks: &[&Task], today: Date) -> String {
    let mut list = String::new();
    for t in tasks {
        let _ = writeln!(
            list,
            "- {} (Priority: {}, Due: {})",
            t.task,
            t.ai_priority.unwrap_or(DEFAULT_PRIORITY),
            due_label(t.date),
        );
    }

    format!(
        r#"Write a motivational daily summary for the pending tasks below in 2-3 sentences at most.
Lead with the highest priority items and encourage steady progress.

Tasks:
{list}
Today's Date: {today}

The summary should be:
- Encouraging and positive
- Brief (2-3 sentences max)
- Focused on the top priorities
- Actionable"#
    )
}
