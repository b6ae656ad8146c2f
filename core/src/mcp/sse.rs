//! Server-sent events transport
//!
//! `GET /sse` opens a session whose first event, `endpoint`, names the URL
//! to POST client frames to. Responses arrive on the stream as `message`
//! events.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::Router;
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::net::TcpListener;
use tokio_stream::wrappers::UnboundedReceiverStream;
use uuid::Uuid;

use super::handler::{SchoolServer, SERVER_NAME};
use super::session::{Outbound, Session};
use crate::error::Result;

pub const SSE_PATH: &str = "/sse";
pub const MESSAGES_PATH: &str = "/messages/";

type Sessions = Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<Session>>>>>;

#[derive(Clone)]
struct SseState {
    server: SchoolServer,
    sessions: Sessions,
}

impl SseState {
    fn session(&self, id: &str) -> Option<Arc<tokio::sync::Mutex<Session>>> {
        let sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.get(id).cloned()
    }
}

/// Forgets the session when its event stream is dropped
struct SessionGuard {
    id: String,
    sessions: Sessions,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.remove(&self.id);
        tracing::info!("SSE session {} closed", self.id);
    }
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    session_id: Option<String>,
}

/// Routes for the SSE transport
pub fn router(server: SchoolServer) -> Router {
    let state = SseState {
        server,
        sessions: Arc::new(Mutex::new(HashMap::new())),
    };

    Router::new()
        .route(SSE_PATH, get(open_stream))
        .route(MESSAGES_PATH, post(post_message))
        .with_state(state)
}

/// Bind `host:port` and serve until the process stops
pub async fn serve_sse(server: SchoolServer, host: &str, port: u16) -> Result<()> {
    let listener = TcpListener::bind((host, port)).await?;
    serve_sse_on(server, listener).await
}

/// Serve on an already bound listener
pub async fn serve_sse_on(server: SchoolServer, listener: TcpListener) -> Result<()> {
    tracing::info!(
        "{} {} serving {} tools on http://{}{}",
        SERVER_NAME,
        crate::VERSION,
        server.tool_count(),
        listener.local_addr()?,
        SSE_PATH
    );

    axum::serve(listener, router(server)).await?;
    Ok(())
}

async fn open_stream(
    State(state): State<SseState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let id = Uuid::new_v4().simple().to_string();
    let (session, outbound) = Session::start(state.server.clone());
    state
        .sessions
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(id.clone(), Arc::new(tokio::sync::Mutex::new(session)));
    tracing::info!("SSE session {} opened", id);

    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("{}?session_id={}", MESSAGES_PATH, id));

    let guard = SessionGuard {
        id,
        sessions: state.sessions.clone(),
    };
    let messages = UnboundedReceiverStream::new(outbound).filter_map(move |item| {
        let _guard = &guard;
        let event = match item {
            Outbound::Frame(frame) => Some(Ok::<_, Infallible>(
                Event::default().event("message").data(frame),
            )),
            Outbound::Settled => None,
        };
        futures::future::ready(event)
    });

    let events = stream::once(futures::future::ready(Ok(endpoint))).chain(messages);
    Sse::new(events).keep_alive(KeepAlive::default())
}

async fn post_message(
    State(state): State<SseState>,
    Query(query): Query<MessageQuery>,
    body: Bytes,
) -> (StatusCode, &'static str) {
    let Some(id) = query.session_id else {
        return (StatusCode::BAD_REQUEST, "session_id is required");
    };
    let Some(session) = state.session(&id) else {
        tracing::warn!("Message for unknown SSE session {}", id);
        return (StatusCode::NOT_FOUND, "Could not find session");
    };

    let mut session = session.lock().await;
    match session.deliver(&body).await {
        Ok(()) => (StatusCode::ACCEPTED, "Accepted"),
        Err(e) => {
            tracing::warn!("SSE session {} failed: {}", id, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Session closed")
        }
    }
}
