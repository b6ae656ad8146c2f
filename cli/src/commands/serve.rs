//! Tool server command

use anyhow::{Context, Result};
use clap::ValueEnum;
use school_mcp_core::mcp::{serve_sse, serve_stdio};
use school_mcp_core::{SchoolServer, SettingsStore, ToolContext, ToolRegistry};
use tracing::{info, warn};

use crate::config::CredentialLoader;

/// How clients reach the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Transport {
    /// Newline-delimited JSON-RPC on stdin/stdout
    Stdio,
    /// Server-sent events over HTTP
    Sse,
}

#[derive(Debug, Clone)]
pub struct ServeOptions {
    pub transport: Transport,
    /// Ignored for stdio
    pub host: String,
    /// Ignored for stdio
    pub port: u16,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            transport: Transport::Stdio,
            host: "localhost".to_string(),
            port: 8080,
        }
    }
}

/// Start the MCP server on the chosen transport
pub async fn serve_command(loader: CredentialLoader, options: ServeOptions) -> Result<()> {
    let loaded = loader.load().await?;
    let credentials = loaded.credentials;

    if credentials.canvas.is_none() {
        warn!("Canvas credentials are not configured; Canvas tools will report an error");
    }
    if credentials.gradescope.is_none() {
        warn!("Gradescope credentials are not configured; deadline tools will report an error");
    }

    let settings =
        SettingsStore::for_current_user().context("Failed to locate the settings file")?;
    info!("Settings file: {}", settings.path().display());

    let context = ToolContext::live(settings, credentials);
    let server = SchoolServer::new(ToolRegistry::default().create_executor_with_all(context));

    let served = match options.transport {
        Transport::Stdio => serve_stdio(server).await,
        Transport::Sse => serve_sse(server, &options.host, options.port).await,
    };
    served.context("Error running server")
}
