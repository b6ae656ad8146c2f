//! Credential and launch configuration loading
//!
//! Credentials come from, highest priority first:
//! 1. Process environment
//! 2. The env file (`--env-file`, `SCHOOL_MCP_ENV_FILE` or the launch config)
//! 3. `--credentials` file, or `<config_dir>/school-mcp/config.json`

use anyhow::{anyhow, Context, Result};
use school_mcp_core::config::{EnvFile, LaunchConfig};
use school_mcp_core::CredentialSet;
use std::path::{Path, PathBuf};

/// Credentials plus the env file they were partly read from
#[derive(Debug, Clone)]
pub struct LoadedCredentials {
    pub env_file: EnvFile,
    pub credentials: CredentialSet,
}

/// CLI credential loader
#[derive(Debug, Clone, Default)]
pub struct CredentialLoader {
    /// Env file path
    env_file: Option<PathBuf>,
    /// Explicit fallback credentials file
    credentials_override: Option<PathBuf>,
}

impl CredentialLoader {
    /// Create a new loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the env file
    pub fn with_env_file(mut self, path: PathBuf) -> Self {
        self.env_file = Some(path);
        self
    }

    /// Set the fallback credentials file
    pub fn with_credentials_override(mut self, path: PathBuf) -> Self {
        self.credentials_override = Some(path);
        self
    }

    /// Load the env file and resolve credentials
    pub async fn load(&self) -> Result<LoadedCredentials> {
        let env_file = match &self.env_file {
            Some(path) => EnvFile::load(path)
                .await
                .with_context(|| format!("Failed to read env file: {}", path.display()))?,
            None => EnvFile::default(),
        };

        let fallback = match &self.credentials_override {
            Some(path) if !path.exists() => {
                return Err(anyhow!("Credentials file not found: {}", path.display()));
            }
            Some(path) => Some(path.clone()),
            None => CredentialSet::default_fallback_path(),
        };

        let credentials = CredentialSet::resolve(&env_file, fallback.as_deref())
            .await
            .context("Failed to resolve credentials")?;

        Ok(LoadedCredentials {
            env_file,
            credentials,
        })
    }
}

/// Launch configuration from `--launch-config`, or from the individual flags
pub fn launch_config(
    raw: Option<&str>,
    env_file: &Path,
    use_setup_helper: bool,
) -> Result<LaunchConfig> {
    match raw.map(str::trim).filter(|r| !r.is_empty()) {
        Some(raw) => LaunchConfig::from_json(raw).context("Invalid launch configuration"),
        None => Ok(LaunchConfig {
            env_file_path: env_file.display().to_string(),
            use_setup_helper,
        }),
    }
}
