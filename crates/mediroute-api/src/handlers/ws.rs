//! WebSocket upgrade handler.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{info, warn};

use mediroute_tracking::session::authenticator::AuthenticatedSession;

use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters for WebSocket authentication.
#[derive(Debug, serde::Deserialize)]
pub struct WsQuery {
    /// JWT access token or the demo sentinel.
    pub token: String,
}

/// GET /ws?token={credential} — WebSocket upgrade.
///
/// The credential is verified before the upgrade; a rejected credential
/// produces a plain HTTP error and no session state.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
) -> Result<Response, ApiError> {
    let auth = state.authenticator.authenticate(&query.token).await?;

    Ok(ws.on_upgrade(move |socket| handle_ws_connection(state, auth, socket)))
}

/// Drives an established WebSocket connection.
async fn handle_ws_connection(state: AppState, auth: AuthenticatedSession, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let (handle, mut outbound_rx) = state.engine.manager().register(&auth);
    let session_id = handle.id;

    info!(
        session_id = %session_id,
        subject_id = %handle.subject_id,
        "WebSocket connection established"
    );

    // Forward hub messages to the socket.
    let outbound_task = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            let text = match serde_json::to_string(&msg) {
                Ok(text) => text,
                Err(e) => {
                    warn!(session_id = %session_id, error = %e, "Unserializable outbound message");
                    continue;
                }
            };
            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(result) = ws_rx.next().await {
        match result {
            Ok(Message::Text(text)) => {
                state.engine.hub().handle_inbound(&handle, text.as_str()).await;
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    outbound_task.abort();
    state.engine.manager().unregister(session_id);

    info!(session_id = %session_id, "WebSocket connection closed");
}
