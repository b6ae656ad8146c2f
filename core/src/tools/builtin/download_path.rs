//! Default download path tools

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use super::expand_path;
use crate::error::Result;
use crate::impl_tool_factory;
use crate::tools::{Tool, ToolCall, ToolContext, ToolExample, ToolResult};

/// Saves the default download directory
pub struct SetDownloadPathTool {
    context: Arc<ToolContext>,
}

impl SetDownloadPathTool {
    pub fn new(context: Arc<ToolContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Tool for SetDownloadPathTool {
    fn name(&self) -> &str {
        "set_download_path"
    }

    fn description(&self) -> &str {
        "Set the default download path for Canvas files.\n\
         The directory must already exist."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path to save downloaded files to"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let raw: String = call.get_parameter("path")?;
        let path = expand_path(&raw);

        let is_dir = tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Ok(ToolResult::error(
                &call.id,
                format!("Error: Path '{}' is not a valid directory.", path.display()),
            ));
        }

        match self.context.settings.save_download_path(&path).await {
            Ok(()) => Ok(ToolResult::success(
                &call.id,
                format!("Download path set to: {}", path.display()),
            )),
            Err(e) => Ok(ToolResult::error(
                &call.id,
                format!("Error setting download path: {}", e),
            )),
        }
    }

    fn examples(&self) -> Vec<ToolExample> {
        vec![ToolExample {
            description: "Save downloads to a folder in the home directory".to_string(),
            parameters: json!({"path": "~/Documents/School"}),
            expected_result: "Confirmation with the saved path".to_string(),
        }]
    }
}

/// Reports the default download directory
pub struct GetDownloadPathInfoTool {
    context: Arc<ToolContext>,
}

impl GetDownloadPathInfoTool {
    pub fn new(context: Arc<ToolContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Tool for GetDownloadPathInfoTool {
    fn name(&self) -> &str {
        "get_download_path_info"
    }

    fn description(&self) -> &str {
        "Get the current default download path for Canvas files."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let path = self.context.settings.download_path().await;
        Ok(ToolResult::success(
            &call.id,
            format!("Current download path: {}", path.display()),
        ))
    }

    fn examples(&self) -> Vec<ToolExample> {
        vec![ToolExample {
            description: "Show where course files are saved".to_string(),
            parameters: json!({}),
            expected_result: "The current download path".to_string(),
        }]
    }
}

impl_tool_factory!(
    SetDownloadPathToolFactory,
    SetDownloadPathTool,
    "set_download_path",
    "Set the default download path for Canvas files"
);

impl_tool_factory!(
    GetDownloadPathInfoToolFactory,
    GetDownloadPathInfoTool,
    "get_download_path_info",
    "Get the current default download path for Canvas files"
);
