//! One client connection bound to its own rmcp service

use rmcp::ServiceExt;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tokio::sync::mpsc;

use super::gate::{Admit, FrameGate, PendingRequests, Settled};
use super::handler::SchoolServer;
use crate::error::Result;

const PIPE_CAPACITY: usize = 64 * 1024;

/// Item on the way to the client
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// One JSON-RPC frame, without a trailing newline
    Frame(String),
    /// A request the gate made on its own was answered
    Settled,
}

/// Client side of a running service
///
/// Dropping the session closes the service input, which ends the service
/// once it has read what was already delivered.
pub struct Session {
    gate: FrameGate,
    to_service: DuplexStream,
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl Session {
    /// Spawn a service for `server` and return the receiving end of its output
    pub fn start(server: SchoolServer) -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (to_service, service_input) = tokio::io::duplex(PIPE_CAPACITY);
        let (service_output, from_service) = tokio::io::duplex(PIPE_CAPACITY);
        let (outbound, receiver) = mpsc::unbounded_channel();
        let pending = PendingRequests::default();

        tokio::spawn(async move {
            match server.serve((service_input, service_output)).await {
                Ok(running) => {
                    if let Err(e) = running.waiting().await {
                        tracing::warn!("MCP service task failed: {}", e);
                    }
                }
                Err(e) => tracing::debug!("MCP session ended before initialization: {}", e),
            }
        });

        tokio::spawn(relay(from_service, pending.clone(), outbound.clone()));

        let session = Self {
            gate: FrameGate::new(pending),
            to_service,
            outbound,
        };
        (session, receiver)
    }

    /// Screen one client frame and pass it on
    pub async fn deliver(&mut self, raw: &[u8]) -> Result<()> {
        match self.gate.admit(raw) {
            Admit::Forward(frames) => {
                for frame in frames {
                    let mut line = serde_json::to_vec(&frame)?;
                    line.push(b'\n');
                    self.to_service.write_all(&line).await?;
                }
                self.to_service.flush().await?;
            }
            Admit::Reject(error) => {
                let _ = self.outbound.send(Outbound::Frame(error.to_string()));
            }
            Admit::Ignore => {}
        }
        Ok(())
    }

    /// Whether a forwarded request is still unanswered
    pub fn has_pending(&self) -> bool {
        self.gate.has_pending()
    }
}

/// Copy service output to the client, restoring client ids
async fn relay(
    from_service: DuplexStream,
    pending: PendingRequests,
    outbound: mpsc::UnboundedSender<Outbound>,
) {
    let mut lines = BufReader::new(from_service).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                let item = match pending.settle(&line) {
                    Settled::Reply(frame) => Outbound::Frame(frame),
                    Settled::Absorbed => Outbound::Settled,
                };
                if outbound.send(item).is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Failed to read MCP service output: {}", e);
                break;
            }
        }
    }
    tracing::debug!("MCP service output closed");
}
