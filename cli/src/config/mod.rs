//! CLI configuration

pub mod claude;
pub mod loader;

pub use loader::{launch_config, CredentialLoader, LoadedCredentials};
