//! Setup helper: registers the server with Claude Desktop

use anyhow::{Context, Result};
use colored::*;
use dialoguer::Confirm;
use school_mcp_core::config::credentials::REQUIRED_VARIABLES;
use school_mcp_core::config::EnvFile;
use std::path::Path;

use crate::config::claude;

#[derive(Debug, Clone, Copy)]
pub struct SetupOptions {
    /// Prompts allowed and output on stdout; otherwise stderr only
    pub interactive: bool,
    /// Answer yes to every prompt
    pub assume_yes: bool,
}

impl SetupOptions {
    fn say(&self, message: impl std::fmt::Display) {
        if self.interactive {
            println!("{}", message);
        } else {
            eprintln!("{}", message);
        }
    }

    /// `None` when the question cannot be asked
    fn confirm(&self, prompt: &str, default: bool) -> Result<Option<bool>> {
        if self.assume_yes {
            return Ok(Some(true));
        }
        if !self.interactive {
            return Ok(None);
        }
        let answer = Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()
            .context("Failed to read answer")?;
        Ok(Some(answer))
    }
}

/// Register `school-tools` in the Claude Desktop config
///
/// Returns `false` when the config was not updated and the user has
/// something left to do.
pub async fn setup_command(env_path: &Path, options: SetupOptions) -> Result<bool> {
    options.say("School MCP Setup Helper".bold());
    options.say("This utility will configure Claude Desktop to use School MCP.\n");

    let command = std::env::current_exe().context("Failed to locate the school-mcp executable")?;

    let config_path = claude::config_path().filter(|p| p.parent().is_some_and(Path::exists));
    let Some(config_path) = config_path else {
        options.say("Could not find Claude Desktop configuration file.".yellow());
        options.say(claude::manual_instructions(&command));
        return Ok(false);
    };
    options.say(format!("Found Claude Desktop configuration at: {}", config_path.display()));

    if !env_path.exists() {
        options.say(format!("\nNo env file found at {}.", env_path.display()));
        match options.confirm("Create it from the template now?", true)? {
            Some(true) => {
                tokio::fs::write(env_path, claude::ENV_TEMPLATE)
                    .await
                    .with_context(|| format!("Failed to write {}", env_path.display()))?;
                options.say(format!(
                    "Created {}. Fill in your credentials, then run setup again.",
                    env_path.display()
                ));
            }
            _ => options.say("Create the env file with your credentials, then run setup again."),
        }
        return Ok(false);
    }

    let env = EnvFile::load(env_path).await?;
    options.say(format!("Loaded environment variables from {}", env_path.display()));

    let missing: Vec<&str> = REQUIRED_VARIABLES
        .iter()
        .copied()
        .filter(|var| !env.contains(var))
        .collect();
    if !missing.is_empty() {
        options.say(format!(
            "{} Missing required environment variables: {}",
            "Warning:".yellow(),
            missing.join(", ")
        ));
        options.say(format!("Edit {} to include these variables.", env_path.display()));

        if options.confirm("Continue with setup anyway?", false)? == Some(false) {
            return Ok(false);
        }
    }

    let config = claude::read_config(&config_path).await;
    let config = claude::register_server(config, claude::server_entry(&command, &env));

    if let Err(e) = claude::write_config(&config_path, &config).await {
        options.say(format!("{} {:#}", "Error updating configuration file:".red(), e));
        options.say(claude::manual_instructions(&command));
        return Ok(false);
    }

    options.say(format!("\n{}", "Successfully updated Claude Desktop configuration!".green()));
    options.say(format!(
        "School MCP has been configured as '{}' in Claude Desktop.",
        claude::SERVER_KEY
    ));
    options.say("Please restart Claude Desktop for the changes to take effect.");
    Ok(true)
}
