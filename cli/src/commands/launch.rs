//! Launch plan runner

use anyhow::Result;
use school_mcp_core::{LaunchConfig, LaunchStep};
use tracing::{info, warn};

use super::{serve_command, setup_command, ServeOptions, SetupOptions};
use crate::config::CredentialLoader;

/// Run the steps of the launch plan in order
///
/// The setup step runs non-interactively since stdin belongs to the
/// protocol; a failed setup does not keep the server from starting.
pub async fn launch_command(config: LaunchConfig, loader: CredentialLoader) -> Result<()> {
    for step in config.launch_plan() {
        match step {
            LaunchStep::Setup { env_file } => {
                info!("Running setup helper with {}", env_file.display());
                let options = SetupOptions {
                    interactive: false,
                    assume_yes: false,
                };
                match setup_command(&env_file, options).await {
                    Ok(true) => info!("Setup helper finished"),
                    Ok(false) => warn!("Setup helper did not update the Claude Desktop config"),
                    Err(e) => warn!("Setup helper failed: {:#}", e),
                }
            }
            LaunchStep::Serve { env_file } => {
                serve_command(loader.clone().with_env_file(env_file), ServeOptions::default())
                    .await?;
            }
        }
    }

    Ok(())
}
