//! Tools listing command

use anyhow::Result;
use colored::*;
use school_mcp_core::ToolRegistry;
use tracing::info;

/// Show available tools
pub async fn tools_command() -> Result<()> {
    info!("Listing available tools");

    println!("{}\n", "Available Tools".bold().cyan());

    let registry = ToolRegistry::default();
    for name in registry.list_tools() {
        if let Some((tool_name, description)) = registry.get_tool_info(name) {
            println!("  {}", tool_name.green());
            println!("    {}\n", description);
        }
    }

    Ok(())
}
