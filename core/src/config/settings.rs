//! Persistent user settings (default download path)

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{ConfigError, Result};

const SETTINGS_FILE: &str = ".school_mcp_settings.json";
const DOWNLOAD_PATH_KEY: &str = "download_path";
const DEFAULT_DOWNLOAD_DIR: &str = "Canvas_Downloads";

/// JSON settings file in the user's home directory
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    default_download_path: PathBuf,
}

impl SettingsStore {
    /// Store rooted at an explicit home directory
    pub fn new<P: AsRef<Path>>(home: P) -> Self {
        let home = home.as_ref();
        Self {
            path: home.join(SETTINGS_FILE),
            default_download_path: home.join(DEFAULT_DOWNLOAD_DIR),
        }
    }

    /// Store rooted at the current user's home directory
    pub fn for_current_user() -> Result<Self> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
        Ok(Self::new(home))
    }

    /// Location of the settings file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saved download path, or `~/Canvas_Downloads` when none is saved
    pub async fn download_path(&self) -> PathBuf {
        match self.load().await {
            Ok(settings) => settings
                .get(DOWNLOAD_PATH_KEY)
                .and_then(Value::as_str)
                .map(PathBuf::from)
                .unwrap_or_else(|| self.default_download_path.clone()),
            Err(e) => {
                tracing::warn!("Ignoring unreadable settings file {}: {}", self.path.display(), e);
                self.default_download_path.clone()
            }
        }
    }

    /// Persist a new default download path, keeping any other settings
    pub async fn save_download_path<P: AsRef<Path>>(&self, download_path: P) -> Result<()> {
        let mut settings = self.load().await.unwrap_or_default();
        settings.insert(
            DOWNLOAD_PATH_KEY.to_string(),
            Value::String(download_path.as_ref().display().to_string()),
        );

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string(&Value::Object(settings))?;
        fs::write(&self.path, content).await?;

        tracing::info!("Saved download path {}", download_path.as_ref().display());
        Ok(())
    }

    async fn load(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let content = fs::read_to_string(&self.path).await?;
        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            _ => Err(ConfigError::InvalidFormat {
                path: self.path.display().to_string(),
                message: "expected a JSON object".to_string(),
            }
            .into()),
        }
    }
}
