//! Model Context Protocol server built on rmcp
//!
//! Two transports share one handler: newline-delimited JSON-RPC on
//! stdin/stdout, and server-sent events over HTTP. Stdout carries protocol
//! frames only, so logging must go to stderr.

mod gate;
mod handler;
mod session;
mod sse;
mod stdio;

pub use handler::{
    SchoolServer, DEFAULT_PROTOCOL_VERSION, SERVER_NAME, SUPPORTED_PROTOCOL_VERSIONS,
};
pub use sse::{router as sse_router, serve_sse, serve_sse_on, MESSAGES_PATH, SSE_PATH};
pub use stdio::{serve_lines, serve_stdio};
