//! Process launch contract
//!
//! The host that starts the server hands over a small JSON object with two
//! options. It decides whether the setup helper runs before the tool server.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Default env file consulted for credentials
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Launch options supplied by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchConfig {
    /// Path to the env file holding service credentials
    #[serde(default = "default_env_file_path")]
    pub env_file_path: String,

    /// Run the setup helper before starting the server
    #[serde(default)]
    pub use_setup_helper: bool,
}

/// A single step of the launch plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchStep {
    /// Register the server with the desktop client
    Setup { env_file: PathBuf },
    /// Run the stdio tool server
    Serve { env_file: PathBuf },
}

fn default_env_file_path() -> String {
    DEFAULT_ENV_FILE.to_string()
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            env_file_path: default_env_file_path(),
            use_setup_helper: false,
        }
    }
}

impl LaunchConfig {
    /// Parse the host-provided JSON object
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| {
            ConfigError::InvalidFormat {
                path: "launch config".to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Env file path as a filesystem path
    pub fn env_file(&self) -> PathBuf {
        PathBuf::from(&self.env_file_path)
    }

    /// Ordered steps to execute for this configuration
    pub fn launch_plan(&self) -> Vec<LaunchStep> {
        let env_file = self.env_file();
        let mut plan = Vec::with_capacity(2);

        if self.use_setup_helper {
            plan.push(LaunchStep::Setup {
                env_file: env_file.clone(),
            });
        }
        plan.push(LaunchStep::Serve { env_file });

        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_options_use_defaults() {
        let config = LaunchConfig::from_json("{}").unwrap();

        assert_eq!(config.env_file_path, ".env");
        assert!(!config.use_setup_helper);
        assert_eq!(config, LaunchConfig::default());
    }

    #[test]
    fn test_plan_without_setup_helper_only_serves() {
        for raw in [
            "{}",
            r#"{"envFilePath": "/etc/school/.env"}"#,
            r#"{"useSetupHelper": false}"#,
            r#"{"envFilePath": "creds.env", "somethingElse": 3}"#,
        ] {
            let config = LaunchConfig::from_json(raw).unwrap();
            let plan = config.launch_plan();

            assert_eq!(plan.len(), 1, "plan for {raw}");
            assert!(matches!(plan[0], LaunchStep::Serve { .. }));
        }
    }

    #[test]
    fn test_plan_with_setup_helper_runs_setup_first() {
        let config =
            LaunchConfig::from_json(r#"{"envFilePath": "my.env", "useSetupHelper": true}"#)
                .unwrap();

        assert_eq!(
            config.launch_plan(),
            vec![
                LaunchStep::Setup {
                    env_file: PathBuf::from("my.env")
                },
                LaunchStep::Serve {
                    env_file: PathBuf::from("my.env")
                },
            ]
        );
    }

    #[test]
    fn test_invalid_json_is_a_config_error() {
        let err = LaunchConfig::from_json(r#"{"useSetupHelper": "yes"}"#).unwrap_err();
        assert!(err.to_string().contains("launch config"));
    }
}
