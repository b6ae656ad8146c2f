//! Deadline tools: listing and pushing to Reminders

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

use crate::deadlines::{DeadlineScraper, DeadlineView, DEFAULT_DAYS_AHEAD};
use crate::error::{Result, ToolError};
use crate::impl_tool_factory;
use crate::reminders::{ReminderManager, DEFAULT_LIST};
use crate::tools::{Tool, ToolCall, ToolContext, ToolExample, ToolResult};

fn days_ahead_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "days_ahead": {
                "type": "integer",
                "description": "Number of days to look ahead for assignments (default: 14)",
                "default": DEFAULT_DAYS_AHEAD,
                "minimum": 0
            }
        }
    })
}

fn days_ahead(call: &ToolCall) -> Result<i64> {
    let days = call
        .get_optional_parameter::<i64>("days_ahead")?
        .unwrap_or(DEFAULT_DAYS_AHEAD);
    if days < 0 {
        return Err(ToolError::InvalidParameters {
            message: format!("days_ahead must be zero or greater, got {}", days),
        }
        .into());
    }
    Ok(days)
}

async fn upcoming_deadlines(context: &ToolContext, days_ahead: i64) -> Result<Vec<DeadlineView>> {
    let canvas = context.services.canvas()?;
    let gradescope = context.services.gradescope().await?;

    DeadlineScraper::for_services(canvas, gradescope)
        .upcoming_deadlines(days_ahead, Utc::now())
        .await
}

/// Upcoming deadlines from Canvas and Gradescope
pub struct GetDeadlinesTool {
    context: Arc<ToolContext>,
}

impl GetDeadlinesTool {
    pub fn new(context: Arc<ToolContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Tool for GetDeadlinesTool {
    fn name(&self) -> &str {
        "get_deadlines"
    }

    fn description(&self) -> &str {
        "Get upcoming deadlines from Canvas and Gradescope.\n\
         Returns unsubmitted assignments due within the next `days_ahead` days, \
         sorted by due date."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        days_ahead_schema()
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let days = days_ahead(&call)?;

        match upcoming_deadlines(&self.context, days).await {
            Ok(deadlines) if deadlines.is_empty() => {
                Ok(ToolResult::success(&call.id, "No upcoming deadlines found."))
            }
            Ok(deadlines) => Ok(ToolResult::success(
                &call.id,
                serde_json::to_string_pretty(&deadlines)?,
            )),
            Err(e) => Ok(ToolResult::error(
                &call.id,
                format!("Error getting deadlines: {}", e),
            )),
        }
    }

    fn examples(&self) -> Vec<ToolExample> {
        vec![
            ToolExample {
                description: "Deadlines in the next two weeks".to_string(),
                parameters: json!({}),
                expected_result: "JSON list of upcoming assignments".to_string(),
            },
            ToolExample {
                description: "Deadlines in the next three days".to_string(),
                parameters: json!({"days_ahead": 3}),
                expected_result: "JSON list of assignments due within three days".to_string(),
            },
        ]
    }
}

/// Pushes upcoming deadlines into macOS Reminders
pub struct AddToRemindersTool {
    context: Arc<ToolContext>,
}

impl AddToRemindersTool {
    pub fn new(context: Arc<ToolContext>) -> Self {
        Self { context }
    }

    async fn add(&self, days: i64) -> Result<Option<String>> {
        let deadlines = upcoming_deadlines(&self.context, days).await?;
        if deadlines.is_empty() {
            return Ok(None);
        }

        let manager = ReminderManager::new(self.context.services.script_runner(), DEFAULT_LIST);
        let batch = manager.add_assignments(&deadlines).await?;
        Ok(Some(serde_json::to_string_pretty(&batch)?))
    }
}

#[async_trait]
impl Tool for AddToRemindersTool {
    fn name(&self) -> &str {
        "add_to_reminders"
    }

    fn description(&self) -> &str {
        "Add upcoming deadlines to macOS Reminders.\n\
         Replaces the contents of the \"Course Assignments\" list with the \
         deadlines due within the next `days_ahead` days."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        days_ahead_schema()
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let days = days_ahead(&call)?;

        match self.add(days).await {
            Ok(Some(summary)) => Ok(ToolResult::success(&call.id, summary)),
            Ok(None) => Ok(ToolResult::success(
                &call.id,
                "No upcoming deadlines found to add to Reminders.",
            )),
            Err(e) => Ok(ToolResult::error(
                &call.id,
                format!("Error adding to Reminders: {}", e),
            )),
        }
    }

    fn examples(&self) -> Vec<ToolExample> {
        vec![ToolExample {
            description: "Add the next week's deadlines to Reminders".to_string(),
            parameters: json!({"days_ahead": 7}),
            expected_result: "Summary of reminders added".to_string(),
        }]
    }
}

impl_tool_factory!(
    GetDeadlinesToolFactory,
    GetDeadlinesTool,
    "get_deadlines",
    "Get upcoming deadlines from Canvas and Gradescope"
);

impl_tool_factory!(
    AddToRemindersToolFactory,
    AddToRemindersTool,
    "add_to_reminders",
    "Add upcoming deadlines to macOS Reminders"
);
