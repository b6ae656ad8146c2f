//! Tool system and the School MCP tools

pub mod base;
pub mod builtin;
pub mod context;
pub mod registry;

pub use base::{Tool, ToolCall, ToolDefinition, ToolExample, ToolExecutor, ToolResult};
pub use context::{LiveServices, ServiceProvider, ToolContext};
pub use registry::{ToolFactory, ToolRegistry, TOOL_NAMES};
