//! Configuration for School MCP
//!
//! Pure data types plus the small amount of file IO they own. Flag parsing and
//! precedence between flags and environment lives in the CLI layer.

pub mod credentials;
pub mod env_file;
pub mod launch;
pub mod settings;

pub use credentials::{CanvasCredentials, CredentialSet, GradescopeCredentials};
pub use env_file::EnvFile;
pub use launch::{LaunchConfig, LaunchStep};
pub use settings::SettingsStore;
