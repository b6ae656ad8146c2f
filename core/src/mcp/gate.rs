//! Frame screening in front of the rmcp service
//!
//! rmcp closes a transport on the first frame it cannot decode, so every
//! client frame is checked here first. Bad frames are answered directly with
//! a JSON-RPC error; good ones are rebuilt with a gate-issued id that is
//! mapped back when the response comes out.

use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::handler::DEFAULT_PROTOCOL_VERSION;
use crate::error::ProtocolError;

/// What to do with one client frame
#[derive(Debug, Clone, PartialEq)]
pub enum Admit {
    /// Frames for the service, in order
    Forward(Vec<Value>),
    /// Error response sent straight back to the client
    Reject(Value),
    /// Blank lines, notifications and stray responses
    Ignore,
}

/// How a frame coming out of the service should be treated
#[derive(Debug, Clone, PartialEq)]
pub enum Settled {
    /// Send to the client
    Reply(String),
    /// Answer to a request the gate made on its own
    Absorbed,
}

/// Requests handed to the service and not yet answered
///
/// `None` marks a request the gate issued itself.
#[derive(Debug, Clone, Default)]
pub struct PendingRequests {
    inner: Arc<Mutex<HashMap<u64, Option<Value>>>>,
}

impl PendingRequests {
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, Option<Value>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert(&self, id: u64, client_id: Option<Value>) {
        self.lock().insert(id, client_id);
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Restore the client's id on a service response
    pub fn settle(&self, line: &str) -> Settled {
        let Ok(Value::Object(mut frame)) = serde_json::from_str::<Value>(line) else {
            return Settled::Reply(line.to_string());
        };
        let is_response = frame.contains_key("result") || frame.contains_key("error");
        let Some(id) = frame.get("id").and_then(Value::as_u64).filter(|_| is_response) else {
            return Settled::Reply(line.to_string());
        };

        match self.lock().remove(&id) {
            Some(Some(client_id)) => {
                frame.insert("id".to_string(), client_id);
                Settled::Reply(Value::Object(frame).to_string())
            }
            Some(None) => {
                if let Some(error) = frame.get("error") {
                    tracing::warn!("Implicit initialize failed: {}", error);
                }
                Settled::Absorbed
            }
            None => {
                tracing::warn!("Service answered unknown request {}", id);
                Settled::Reply(line.to_string())
            }
        }
    }
}

/// Per-connection screening state
#[derive(Debug)]
pub struct FrameGate {
    pending: PendingRequests,
    next_id: u64,
    initialized: bool,
}

impl FrameGate {
    pub fn new(pending: PendingRequests) -> Self {
        Self {
            pending,
            next_id: 1,
            initialized: false,
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Screen one raw frame, with or without its trailing newline
    pub fn admit(&mut self, raw: &[u8]) -> Admit {
        match self.screen(raw) {
            Ok(admit) => admit,
            Err((id, error)) => {
                tracing::warn!("Rejected frame: {}", error);
                Admit::Reject(error_frame(id, &error))
            }
        }
    }

    fn screen(&mut self, raw: &[u8]) -> Result<Admit, (Value, ProtocolError)> {
        let text = std::str::from_utf8(raw).map_err(|e| {
            let error = ProtocolError::Parse {
                message: format!("frame is not valid UTF-8 ({})", e),
            };
            (Value::Null, error)
        })?;
        let text = text.trim();
        if text.is_empty() {
            return Ok(Admit::Ignore);
        }

        let value: Value = serde_json::from_str(text)
            .map_err(|e| (Value::Null, ProtocolError::Parse { message: e.to_string() }))?;

        let mut message = match value {
            Value::Object(message) => message,
            Value::Array(_) => {
                return Err((Value::Null, invalid_request("batch requests are not supported")))
            }
            _ => return Err((Value::Null, invalid_request("request must be a JSON object"))),
        };

        let id = message.remove("id");
        let Some(method) = message.get("method").and_then(Value::as_str).map(str::to_string)
        else {
            if id.is_some() && (message.contains_key("result") || message.contains_key("error")) {
                tracing::debug!("Ignoring response from client");
                return Ok(Admit::Ignore);
            }
            return Err((id.unwrap_or(Value::Null), invalid_request("missing method")));
        };
        let params = message.remove("params");

        let Some(id) = id else {
            tracing::debug!("Notification {}", method);
            return Ok(Admit::Ignore);
        };

        let params = match method.as_str() {
            "initialize" => Some(initialize_params(params).map_err(|e| (id.clone(), e))?),
            "ping" | "tools/list" => None,
            "tools/call" => Some(call_params(params).map_err(|e| (id.clone(), e))?),
            _ => return Err((id, ProtocolError::MethodNotFound { method })),
        };

        let mut frames = Vec::new();
        if method == "initialize" {
            frames.push(self.request(Some(id), &method, params));
            frames.push(initialized_notification());
            self.initialized = true;
        } else {
            if !self.initialized {
                tracing::debug!("{} before initialize; initializing implicitly", method);
                let params = initialize_params(None).map_err(|e| (Value::Null, e))?;
                frames.push(self.request(None, "initialize", Some(params)));
                frames.push(initialized_notification());
                self.initialized = true;
            }
            frames.push(self.request(Some(id), &method, params));
        }
        Ok(Admit::Forward(frames))
    }

    fn request(&mut self, client_id: Option<Value>, method: &str, params: Option<Value>) -> Value {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.insert(id, client_id);

        let mut frame = json!({"jsonrpc": "2.0", "id": id, "method": method});
        if let Some(params) = params {
            frame["params"] = params;
        }
        frame
    }
}

fn invalid_request(message: &str) -> ProtocolError {
    ProtocolError::InvalidRequest {
        message: message.to_string(),
    }
}

fn invalid_params(message: &str) -> ProtocolError {
    ProtocolError::InvalidParams {
        message: message.to_string(),
    }
}

fn initialized_notification() -> Value {
    json!({"jsonrpc": "2.0", "method": "notifications/initialized"})
}

/// JSON-RPC error response
pub fn error_frame(id: Value, error: &ProtocolError) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {"code": error.code(), "message": error.to_string()}
    })
}

/// Fill in what a lenient client left out of `initialize`
fn initialize_params(params: Option<Value>) -> Result<Value, ProtocolError> {
    let mut params = object_params(params)?;

    match params.get("protocolVersion") {
        None | Some(Value::Null) => {
            params.insert("protocolVersion".to_string(), json!(DEFAULT_PROTOCOL_VERSION));
        }
        Some(Value::String(_)) => {}
        Some(_) => return Err(invalid_params("protocolVersion must be a string")),
    }

    if !params.get("capabilities").is_some_and(Value::is_object) {
        params.insert("capabilities".to_string(), json!({}));
    }

    let client_info_ok = params.get("clientInfo").is_some_and(|info| {
        info.get("name").is_some_and(Value::is_string)
            && info.get("version").is_some_and(Value::is_string)
    });
    if !client_info_ok {
        params.insert(
            "clientInfo".to_string(),
            json!({"name": "unknown", "version": "0"}),
        );
    }

    Ok(Value::Object(params))
}

fn call_params(params: Option<Value>) -> Result<Value, ProtocolError> {
    let Some(Value::Object(params)) = params else {
        return Err(invalid_params("missing params"));
    };
    let Some(name) = params.get("name").and_then(Value::as_str) else {
        return Err(invalid_params("name must be a string"));
    };

    match params.get("arguments") {
        None | Some(Value::Null) => Ok(json!({"name": name})),
        Some(arguments @ Value::Object(_)) => Ok(json!({"name": name, "arguments": arguments})),
        Some(_) => Err(invalid_params("arguments must be an object")),
    }
}

fn object_params(params: Option<Value>) -> Result<Map<String, Value>, ProtocolError> {
    match params {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(params)) => Ok(params),
        Some(_) => Err(invalid_params("params must be an object")),
    }
}
