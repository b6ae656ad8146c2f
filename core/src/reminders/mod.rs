//! macOS Reminders integration

mod script;

pub use script::{OsaScriptRunner, ScriptRunner};

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};

use crate::deadlines::DeadlineView;
use crate::error::Result;

/// List that receives assignment reminders
pub const DEFAULT_LIST: &str = "Course Assignments";

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["\\{}]"#).expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Success,
    Partial,
}

/// Result of adding one reminder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderOutcome {
    pub status: ReminderStatus,
    pub message: String,
    pub title: String,
    pub list: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderStats {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

/// Summary of a batch of reminders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderBatch {
    pub status: BatchStatus,
    pub message: String,
    pub results: Vec<ReminderOutcome>,
    pub stats: ReminderStats,
}

/// Strip characters AppleScript string literals cannot hold
pub fn clean_text(text: &str) -> String {
    UNSAFE_CHARS.replace_all(text, "").into_owned()
}

/// Writes reminders into a single Reminders list
pub struct ReminderManager {
    runner: Arc<dyn ScriptRunner>,
    list_name: String,
}

impl ReminderManager {
    pub fn new<S: Into<String>>(runner: Arc<dyn ScriptRunner>, list_name: S) -> Self {
        Self {
            runner,
            list_name: clean_text(&list_name.into()),
        }
    }

    pub fn list_name(&self) -> &str {
        &self.list_name
    }

    /// Create the list when it does not exist yet
    pub async fn ensure_list(&self) -> Result<()> {
        let script = format!(
            "tell application \"Reminders\" to if not (exists list \"{0}\") \
             then make new list with properties {{name:\"{0}\"}}",
            self.list_name
        );
        self.runner.run(&script).await?;
        Ok(())
    }

    /// Delete every reminder in the list
    pub async fn clear_list(&self) -> Result<()> {
        let script = format!(
            "tell application \"Reminders\" to delete every reminder of list \"{}\"",
            self.list_name
        );
        self.runner.run(&script).await?;
        tracing::debug!("Cleared reminders list '{}'", self.list_name);
        Ok(())
    }

    pub async fn add_reminder(&self, title: &str, notes: &str) -> ReminderOutcome {
        let title = clean_text(title);
        let notes = clean_text(notes);
        let script = format!(
            "tell application \"Reminders\" to tell list \"{}\" \
             to make new reminder with properties {{name:\"{}\", body:\"{}\"}}",
            self.list_name, title, notes
        );

        let (status, message) = match self.runner.run(&script).await {
            Ok(_) => (ReminderStatus::Success, "Reminder added successfully"),
            Err(e) => {
                tracing::warn!("Failed to add reminder '{}': {}", title, e);
                (ReminderStatus::Error, "Failed to add reminder")
            }
        };

        ReminderOutcome {
            status,
            message: message.to_string(),
            title,
            list: self.list_name.clone(),
        }
    }

    pub async fn add_assignment(&self, deadline: &DeadlineView) -> ReminderOutcome {
        let title = format!("[{}] {}", deadline.platform, deadline.assignment_name);
        self.add_reminder(&title, &reminder_notes(deadline)).await
    }

    /// Replace the list contents with the given deadlines
    pub async fn add_assignments(&self, deadlines: &[DeadlineView]) -> Result<ReminderBatch> {
        self.ensure_list().await?;

        if let Err(e) = self.clear_list().await {
            tracing::warn!("Failed to clear existing reminders: {}", e);
        }

        let mut results = Vec::with_capacity(deadlines.len());
        for deadline in deadlines {
            results.push(self.add_assignment(deadline).await);
        }

        let successful = results
            .iter()
            .filter(|r| r.status == ReminderStatus::Success)
            .count();
        let failed = results.len() - successful;

        tracing::info!("Added {} reminders, {} failed", successful, failed);
        Ok(ReminderBatch {
            status: if failed == 0 {
                BatchStatus::Success
            } else {
                BatchStatus::Partial
            },
            message: format!("Added {} reminders, {} failed", successful, failed),
            results,
            stats: ReminderStats {
                total: deadlines.len(),
                successful,
                failed,
            },
        })
    }
}

/// Reminder body for a deadline, one detail per line
fn reminder_notes(deadline: &DeadlineView) -> String {
    let mut notes = format!("Course: {}\n", deadline.course_name);

    if let Some(points) = deadline.points_possible.filter(|p| *p != 0.0) {
        notes.push_str(&format!("Points: {}\n", format_points(points)));
    }
    if let Some(url) = deadline.url.as_deref().filter(|u| !u.is_empty()) {
        notes.push_str(&format!("URL: {}\n", url));
    }
    if let Some(late) = deadline.late_due_date.as_deref().filter(|d| !d.is_empty()) {
        notes.push_str(&format!("Late submission deadline: {}\n", late));
    }
    if !deadline.time_remaining.is_empty() {
        notes.push_str(&format!("Time remaining: {}\n", deadline.time_remaining));
    }
    if !deadline.due_date.is_empty() {
        notes.push_str(&format!("Due: {}\n", deadline.due_date));
    }

    notes
}

fn format_points(points: f64) -> String {
    if points.fract() == 0.0 {
        format!("{:.1}", points)
    } else {
        points.to_string()
    }
}
