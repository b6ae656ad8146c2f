//! CLI command implementations

pub mod launch;
pub mod serve;
pub mod setup;
pub mod tools;

pub use launch::launch_command;
pub use serve::{serve_command, ServeOptions, Transport};
pub use setup::{setup_command, SetupOptions};
pub use tools::tools_command;
