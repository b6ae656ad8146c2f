//! AppleScript execution

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{Result, ServiceError};

const SERVICE: &str = "Reminders";

/// Runs AppleScript snippets
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    /// Run `script` and return its trimmed stdout
    async fn run(&self, script: &str) -> Result<String>;
}

/// Runs scripts through `osascript -e`
#[derive(Debug, Clone, Default)]
pub struct OsaScriptRunner {
    program: Option<PathBuf>,
}

impl OsaScriptRunner {
    /// Runner that looks up `osascript` on `PATH` when first used
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner using an explicit interpreter
    pub fn with_program<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: Some(program.into()),
        }
    }

    fn program(&self) -> Result<PathBuf> {
        if let Some(program) = &self.program {
            return Ok(program.clone());
        }

        which::which("osascript").map_err(|_| {
            ServiceError::Unavailable {
                service: SERVICE.to_string(),
                message: "osascript was not found on PATH (Reminders requires macOS)".to_string(),
            }
            .into()
        })
    }
}

#[async_trait]
impl ScriptRunner for OsaScriptRunner {
    async fn run(&self, script: &str) -> Result<String> {
        let program = self.program()?;
        tracing::debug!("osascript -e {}", script);

        let output = Command::new(&program)
            .arg("-e")
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ServiceError::UnexpectedResponse {
                service: SERVICE.to_string(),
                message: format!(
                    "AppleScript error (code {}): {}",
                    output.status.code().unwrap_or(-1),
                    stderr.trim()
                ),
            }
            .into());
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
