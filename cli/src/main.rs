//! # school-mcp CLI
//!
//! Serves School MCP tools to an assistant over stdio or SSE.
//!
//! ## Usage
//!
//! - `school-mcp` - Run the launch plan (optional setup helper, then the server)
//! - `school-mcp serve` - Start the tool server (stdio, or `--transport sse`)
//! - `school-mcp setup` - Register the server with Claude Desktop
//! - `school-mcp tools` - Show available tools

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;

use commands::{
    launch_command, serve_command, setup_command, tools_command, ServeOptions, SetupOptions,
    Transport,
};
use config::{launch_config, CredentialLoader};

/// school-mcp - Canvas, Gradescope and Reminders tools for assistants
#[derive(Parser)]
#[command(name = "school-mcp")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "MCP server for Canvas, Gradescope and macOS Reminders")]
#[command(long_about = None)]
struct Cli {
    /// Fallback credentials file (JSON)
    #[arg(long, global = true)]
    credentials: Option<PathBuf>,

    /// Env file holding service credentials
    #[arg(long, global = true, env = "SCHOOL_MCP_ENV_FILE", default_value = ".env")]
    env_file: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Launch configuration as JSON: {"envFilePath": ..., "useSetupHelper": ...}
    #[arg(long, env = "SCHOOL_MCP_LAUNCH_CONFIG")]
    launch_config: Option<String>,

    /// Run the setup helper before starting the server
    #[arg(
        long,
        env = "SCHOOL_MCP_USE_SETUP_HELPER",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    use_setup_helper: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the tool server
    Serve {
        /// Transport protocol to use
        #[arg(long, value_enum, default_value_t = Transport::Stdio)]
        transport: Transport,

        /// Host for the SSE transport (ignored for stdio)
        #[arg(long, default_value = "localhost")]
        host: String,

        /// Port for the SSE transport (ignored for stdio)
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },

    /// Register the server with Claude Desktop
    Setup {
        /// Answer yes to every prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show available tools
    Tools,
}

/// Build a credential loader from CLI arguments
fn build_credential_loader(cli: &Cli) -> CredentialLoader {
    let mut loader = CredentialLoader::new().with_env_file(cli.env_file.clone());

    if let Some(credentials) = &cli.credentials {
        loader = loader.with_credentials_override(credentials.clone());
    }

    loader
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Stdout belongs to the protocol; logs go to stderr
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let loader = build_credential_loader(&cli);

    match cli.command {
        Some(Commands::Serve {
            transport,
            host,
            port,
        }) => {
            let options = ServeOptions {
                transport,
                host,
                port,
            };
            serve_command(loader, options).await
        }
        Some(Commands::Setup { yes }) => {
            let options = SetupOptions {
                interactive: true,
                assume_yes: yes,
            };
            if setup_command(&cli.env_file, options).await? {
                Ok(())
            } else {
                std::process::exit(1);
            }
        }
        Some(Commands::Tools) => tools_command().await,
        None => {
            let config = launch_config(
                cli.launch_config.as_deref(),
                &cli.env_file,
                cli.use_setup_helper,
            )?;
            launch_command(config, loader).await
        }
    }
}
