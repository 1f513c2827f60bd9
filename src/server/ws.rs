//! WebSocket transport: one task per connection
//!
//! Inbound text frames are parsed into [`ClientEvent`]s and handed to the
//! coordinator; events queued for the connection are written back as text
//! frames. Closing the socket triggers the coordinator's disconnect cleanup.

use crate::protocol::ClientEvent;
use crate::server::ServerState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use tracing::{debug, error, warn};

/// Upgrade handler for `GET /ws`
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<ServerState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

/// Drive a single WebSocket until either side closes it
pub async fn handle_socket(state: ServerState, mut socket: WebSocket) {
    let (connection, mut events) = match state.coordinator.connect() {
        Ok(registered) => registered,
        Err(e) => {
            error!("Failed to register connection: {}", e);
            return;
        }
    };

    loop {
        tokio::select! {
            Some(event) = events.recv() => {
                match event.to_json() {
                    Ok(json) => {
                        if socket.send(Message::Text(json.into())).await.is_err() {
                            debug!("Write to {} failed, closing", connection);
                            break;
                        }
                    }
                    Err(e) => error!("Failed to encode {} for {}: {}", event.name(), connection, e),
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => match ClientEvent::from_json(text.as_str()) {
                        Ok(event) => state.coordinator.handle_event(connection, event),
                        Err(e) => {
                            warn!("Malformed frame from {}: {}", connection, e);
                            state.metrics.record_dropped_event("malformed");
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!("Read from {} failed: {}", connection, e);
                        break;
                    }
                }
            }
        }
    }

    debug!(
        "Socket for {} closed while {:?}",
        connection,
        state.coordinator.session_state(connection)
    );
    if let Err(e) = state.coordinator.disconnect(connection) {
        error!("Cleanup for {} failed: {}", connection, e);
    }
}
