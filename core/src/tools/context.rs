//! Shared state handed to every tool

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{CredentialSet, SettingsStore};
use crate::downloads::{FileFetcher, HttpFileFetcher};
use crate::error::Result;
use crate::platforms::{CanvasApi, CanvasClient, GradescopeApi, GradescopeClient};
use crate::reminders::{OsaScriptRunner, ScriptRunner};

/// Access to the outside world
///
/// Clients are created on demand so a missing credential only affects the
/// tools that need it.
#[async_trait]
pub trait ServiceProvider: Send + Sync {
    fn canvas(&self) -> Result<Arc<dyn CanvasApi>>;

    /// A logged-in Gradescope session
    async fn gradescope(&self) -> Result<Arc<dyn GradescopeApi>>;

    fn file_fetcher(&self) -> Arc<dyn FileFetcher>;

    fn script_runner(&self) -> Arc<dyn ScriptRunner>;
}

/// Real Canvas, Gradescope, HTTP and osascript
pub struct LiveServices {
    credentials: CredentialSet,
    fetcher: Arc<HttpFileFetcher>,
    runner: Arc<OsaScriptRunner>,
}

impl LiveServices {
    pub fn new(credentials: CredentialSet) -> Self {
        Self {
            credentials,
            fetcher: Arc::new(HttpFileFetcher::new()),
            runner: Arc::new(OsaScriptRunner::new()),
        }
    }
}

#[async_trait]
impl ServiceProvider for LiveServices {
    fn canvas(&self) -> Result<Arc<dyn CanvasApi>> {
        let credentials = self.credentials.require_canvas()?;
        Ok(Arc::new(CanvasClient::new(credentials)?))
    }

    async fn gradescope(&self) -> Result<Arc<dyn GradescopeApi>> {
        let credentials = self.credentials.require_gradescope()?;
        Ok(Arc::new(GradescopeClient::login(credentials).await?))
    }

    fn file_fetcher(&self) -> Arc<dyn FileFetcher> {
        self.fetcher.clone()
    }

    fn script_runner(&self) -> Arc<dyn ScriptRunner> {
        self.runner.clone()
    }
}

/// Everything a tool needs to run
pub struct ToolContext {
    pub settings: SettingsStore,
    pub services: Arc<dyn ServiceProvider>,
}

impl ToolContext {
    pub fn new(settings: SettingsStore, services: Arc<dyn ServiceProvider>) -> Self {
        Self { settings, services }
    }

    /// Context backed by the live services
    pub fn live(settings: SettingsStore, credentials: CredentialSet) -> Arc<Self> {
        Arc::new(Self::new(settings, Arc::new(LiveServices::new(credentials))))
    }
}
