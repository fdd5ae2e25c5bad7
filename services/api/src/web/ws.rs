//! services/api/src/web/ws.rs
//!
//! The in-app notification channel. Each connected client holds one
//! WebSocket; the server forwards every match event involving that actor
//! and ignores whatever the client sends.

use crate::web::{protocol::ServerEvent, state::AppState};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    Extension,
};
use futures::{SinkExt, StreamExt};
use matchdeck_core::domain::Actor;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state, actor))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>, actor: Actor) {
    info!("New WebSocket connection established for actor: {}", actor.id);

    let mut events = app_state.events.subscribe();
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(created) if created.involves(actor.id) => {
                    let frame = ServerEvent::from_match(&created);
                    let json = match serde_json::to_string(&frame) {
                        Ok(json) => json,
                        Err(e) => {
                            warn!("Failed to serialize match event: {e}");
                            continue;
                        }
                    };
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Ok(_) => {} // a match for somebody else
                Err(RecvError::Lagged(skipped)) => {
                    // The client missed events; matches stay queryable via
                    // GET /matches, so just note it and keep going.
                    warn!(
                        "WebSocket for actor {} lagged behind by {} events",
                        actor.id, skipped
                    );
                }
                Err(RecvError::Closed) => break,
            },
            msg = receiver.next() => match msg {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {} // server-push only; inbound frames are ignored
                Some(Err(e)) => {
                    warn!("WebSocket error for actor {}: {e}", actor.id);
                    break;
                }
            },
        }
    }

    info!("WebSocket connection closed for actor: {}", actor.id);
}
