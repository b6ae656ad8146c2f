//! Base tool traits and structures

use crate::error::{Result, ToolError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Trait for all tools
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the name of the tool
    fn name(&self) -> &str;

    /// Get the description of the tool
    fn description(&self) -> &str;

    /// Get the JSON schema for the tool's parameters
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given parameters
    async fn execute(&self, call: ToolCall) -> Result<ToolResult>;

    /// Get examples of how to use this tool
    fn examples(&self) -> Vec<ToolExample> {
        Vec::new()
    }
}

/// A call to a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this tool call
    pub id: String,

    /// Name of the tool to call
    pub name: String,

    /// Parameters to pass to the tool
    pub parameters: serde_json::Value,
}

/// Result of a tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// ID of the tool call this is a result for
    pub tool_call_id: String,

    /// Whether the execution was successful
    pub success: bool,

    /// Text shown to the assistant
    pub content: String,

    /// Execution duration in milliseconds
    pub duration_ms: Option<u64>,
}

/// Example usage of a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolExample {
    /// Description of what this example does
    pub description: String,

    /// Example parameters
    pub parameters: serde_json::Value,

    /// Expected result description
    pub expected_result: String,
}

/// Tool as advertised to MCP clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// Tool executor that manages tool execution
///
/// Tools keep their registration order.
pub struct ToolExecutor {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new<S: Into<String>>(name: S, parameters: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            parameters,
        }
    }

    /// Get a parameter value by key
    pub fn get_parameter<T>(&self, key: &str) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        self.get_optional_parameter(key)?
            .ok_or_else(|| {
                ToolError::InvalidParameters {
                    message: format!("Missing parameter: {}", key),
                }
                .into()
            })
    }

    /// Get a parameter that may be absent or null
    pub fn get_optional_parameter<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        match self.parameters.get(key) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone()).map(Some).map_err(|_| {
                ToolError::InvalidParameters {
                    message: format!("Invalid parameter type for: {}", key),
                }
                .into()
            }),
        }
    }

    /// Get a parameter value by key with a default
    pub fn get_parameter_or<T>(&self, key: &str, default: T) -> T
    where
        T: for<'de> Deserialize<'de>,
    {
        self.get_parameter(key).unwrap_or(default)
    }
}

impl ToolResult {
    /// Create a successful result
    pub fn success<S: Into<String>>(tool_call_id: &str, content: S) -> Self {
        Self {
            tool_call_id: tool_call_id.to_string(),
            success: true,
            content: content.into(),
            duration_ms: None,
        }
    }

    /// Create an error result; the message is shown as is
    pub fn error<S: Into<String>>(tool_call_id: &str, error: S) -> Self {
        Self {
            tool_call_id: tool_call_id.to_string(),
            success: false,
            content: error.into(),
            duration_ms: None,
        }
    }

    /// Set execution duration
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

impl ToolExecutor {
    /// Create a new tool executor
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register_tool(&mut self, tool: Box<dyn Tool>) {
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(index) => self.tools[index] = tool,
            None => self.tools.push(tool),
        }
    }

    /// Get a tool by name
    pub fn get_tool(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    /// List all available tools
    pub fn list_tools(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Execute a tool call
    ///
    /// Unknown tools are an error; failures inside a tool become error results.
    pub async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let tool = self
            .get_tool(&call.name)
            .ok_or_else(|| ToolError::NotFound {
                name: call.name.clone(),
            })?;

        tracing::debug!("Executing tool {} ({})", call.name, call.id);
        let start_time = std::time::Instant::now();
        let call_id = call.id.clone();
        let name = call.name.clone();
        let result = tool.execute(call).await;
        let duration = start_time.elapsed().as_millis() as u64;

        match result {
            Ok(result) => {
                tracing::info!(
                    tool = %name,
                    duration_ms = duration,
                    success = result.success,
                    "Tool finished"
                );
                Ok(result.with_duration(duration))
            }
            Err(e) => {
                tracing::warn!(tool = %name, duration_ms = duration, "Tool failed: {}", e);
                Ok(ToolResult::error(&call_id, e.to_string()).with_duration(duration))
            }
        }
    }

    /// Definitions advertised by `tools/list`
    pub fn get_tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                input_schema: tool.parameters_schema(),
            })
            .collect()
    }
}

impl Default for ToolExecutor {
    fn default() -> Self {
        Self::new()
    }
}
