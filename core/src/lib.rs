//! # School MCP Core
//!
//! Core library for School MCP: Canvas and Gradescope clients, deadline
//! aggregation, macOS Reminders integration, course file downloads and the
//! MCP server (stdio or SSE) that exposes them as tools.

pub mod config;
pub mod deadlines;
pub mod downloads;
pub mod error;
pub mod mcp;
pub mod platforms;
pub mod reminders;
pub mod tools;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::{CredentialSet, LaunchConfig, LaunchStep, SettingsStore};
pub use error::{Error, Result};
pub use mcp::SchoolServer;
pub use tools::{ToolContext, ToolRegistry, TOOL_NAMES};

/// Current version of the school-mcp-core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
