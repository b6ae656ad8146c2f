//! Error types and handling for School MCP Core

use thiserror::Error;

/// Result type alias for School MCP operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for School MCP Core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Remote service errors (Canvas, Gradescope, Reminders)
    #[error("{0}")]
    Service(#[from] ServiceError),

    /// Tool execution errors
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing {service} credentials: set {}", .variables.join(", "))]
    MissingCredentials {
        service: String,
        variables: Vec<String>,
    },

    #[error("Invalid value for field '{field}': {value}")]
    InvalidValue { field: String, value: String },

    #[error("Invalid configuration format in {path}: {message}")]
    InvalidFormat { path: String, message: String },

    #[error("Could not determine the home directory")]
    NoHomeDirectory,
}

/// Errors talking to an external service
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{service} authentication failed: {message}")]
    Authentication { service: String, message: String },

    #[error("{service} API error: {status} - {message}")]
    Api {
        service: String,
        status: u16,
        message: String,
    },

    #[error("Unexpected {service} response: {message}")]
    UnexpectedResponse { service: String, message: String },

    #[error("{service} is unavailable: {message}")]
    Unavailable { service: String, message: String },
}

/// Tool execution errors
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool not found: {name}")]
    NotFound { name: String },

    #[error("Invalid tool parameters: {message}")]
    InvalidParameters { message: String },
}

/// JSON-RPC framing errors, answered to the client without reaching a tool
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Method not found: {method}")]
    MethodNotFound { method: String },

    #[error("Invalid params: {message}")]
    InvalidParams { message: String },
}

impl ProtocolError {
    /// JSON-RPC error code
    pub fn code(&self) -> i64 {
        match self {
            ProtocolError::Parse { .. } => -32700,
            ProtocolError::InvalidRequest { .. } => -32600,
            ProtocolError::MethodNotFound { .. } => -32601,
            ProtocolError::InvalidParams { .. } => -32602,
        }
    }
}
