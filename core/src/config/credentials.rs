//! Service credentials
//!
//! Resolution order for every key:
//! 1. Process environment
//! 2. The env file handed over by the launch config
//! 3. Fallback JSON file (`<config_dir>/school-mcp/config.json`)

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

use super::EnvFile;
use crate::error::{ConfigError, Result};

pub const CANVAS_ACCESS_TOKEN: &str = "CANVAS_ACCESS_TOKEN";
pub const CANVAS_DOMAIN: &str = "CANVAS_DOMAIN";
pub const GRADESCOPE_EMAIL: &str = "GRADESCOPE_EMAIL";
pub const GRADESCOPE_PASSWORD: &str = "GRADESCOPE_PASSWORD";

/// Every variable a fully configured installation sets
pub const REQUIRED_VARIABLES: [&str; 4] = [
    CANVAS_ACCESS_TOKEN,
    CANVAS_DOMAIN,
    GRADESCOPE_EMAIL,
    GRADESCOPE_PASSWORD,
];

/// Canvas API token and institution domain
#[derive(Clone, PartialEq, Eq)]
pub struct CanvasCredentials {
    pub access_token: String,
    pub domain: String,
}

impl CanvasCredentials {
    pub fn new<S: Into<String>>(access_token: S, domain: S) -> Self {
        Self {
            access_token: access_token.into(),
            domain: normalize_domain(&domain.into()),
        }
    }

    /// API root, always https
    pub fn base_url(&self) -> String {
        format!("https://{}", self.domain)
    }
}

impl fmt::Debug for CanvasCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanvasCredentials")
            .field("access_token", &"<redacted>")
            .field("domain", &self.domain)
            .finish()
    }
}

/// Gradescope login
#[derive(Clone, PartialEq, Eq)]
pub struct GradescopeCredentials {
    pub email: String,
    pub password: String,
}

impl GradescopeCredentials {
    pub fn new<S: Into<String>>(email: S, password: S) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for GradescopeCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GradescopeCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Fallback credentials file format
#[derive(Debug, Default, Deserialize)]
struct CredentialsFile {
    canvas_access_token: Option<String>,
    canvas_domain: Option<String>,
    gradescope_email: Option<String>,
    gradescope_password: Option<String>,
}

impl CredentialsFile {
    fn get(&self, key: &str) -> Option<&str> {
        let value = match key {
            CANVAS_ACCESS_TOKEN => &self.canvas_access_token,
            CANVAS_DOMAIN => &self.canvas_domain,
            GRADESCOPE_EMAIL => &self.gradescope_email,
            GRADESCOPE_PASSWORD => &self.gradescope_password,
            _ => &None,
        };
        value.as_deref()
    }
}

/// Credentials for whichever services are configured
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialSet {
    pub canvas: Option<CanvasCredentials>,
    pub gradescope: Option<GradescopeCredentials>,
}

impl CredentialSet {
    /// Build from a key lookup; empty values count as missing
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let canvas = match (get(CANVAS_ACCESS_TOKEN), get(CANVAS_DOMAIN)) {
            (Some(token), Some(domain)) => Some(CanvasCredentials::new(token, domain)),
            _ => None,
        };
        let gradescope = match (get(GRADESCOPE_EMAIL), get(GRADESCOPE_PASSWORD)) {
            (Some(email), Some(password)) => Some(GradescopeCredentials::new(email, password)),
            _ => None,
        };

        Self { canvas, gradescope }
    }

    /// Resolve from the process environment, the env file and the fallback file
    pub async fn resolve(env_file: &EnvFile, fallback: Option<&Path>) -> Result<Self> {
        Self::resolve_with(|key| std::env::var(key).ok(), env_file, fallback).await
    }

    /// Same as [`CredentialSet::resolve`] with an explicit process lookup
    pub async fn resolve_with<F>(
        process: F,
        env_file: &EnvFile,
        fallback: Option<&Path>,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = match fallback {
            Some(path) => load_credentials_file(path).await?,
            None => CredentialsFile::default(),
        };

        let set = Self::from_lookup(|key| {
            process(key)
                .filter(|v| !v.is_empty())
                .or_else(|| env_file.get(key).map(str::to_string))
                .filter(|v| !v.is_empty())
                .or_else(|| file.get(key).map(str::to_string))
        });

        tracing::debug!(
            canvas = set.canvas.is_some(),
            gradescope = set.gradescope.is_some(),
            "Resolved service credentials"
        );
        Ok(set)
    }

    /// Default location of the fallback credentials file
    pub fn default_fallback_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("school-mcp").join("config.json"))
    }

    pub fn require_canvas(&self) -> Result<&CanvasCredentials> {
        self.canvas.as_ref().ok_or_else(|| {
            ConfigError::MissingCredentials {
                service: "Canvas".to_string(),
                variables: vec![CANVAS_ACCESS_TOKEN.to_string(), CANVAS_DOMAIN.to_string()],
            }
            .into()
        })
    }

    pub fn require_gradescope(&self) -> Result<&GradescopeCredentials> {
        self.gradescope.as_ref().ok_or_else(|| {
            ConfigError::MissingCredentials {
                service: "Gradescope".to_string(),
                variables: vec![GRADESCOPE_EMAIL.to_string(), GRADESCOPE_PASSWORD.to_string()],
            }
            .into()
        })
    }
}

async fn load_credentials_file(path: &Path) -> Result<CredentialsFile> {
    if !path.exists() {
        return Ok(CredentialsFile::default());
    }

    let content = tokio::fs::read_to_string(path).await?;
    serde_json::from_str(&content).map_err(|e| {
        ConfigError::InvalidFormat {
            path: path.display().to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

/// Strip scheme and trailing slashes from a Canvas domain
pub fn normalize_domain(domain: &str) -> String {
    let domain = domain.trim();
    let domain = domain
        .strip_prefix("https://")
        .or_else(|| domain.strip_prefix("http://"))
        .unwrap_or(domain);
    domain.trim_end_matches('/').to_string()
}
