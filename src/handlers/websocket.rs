//! WebSocket event surface
//!
//! One connection-identity per socket, issued at upgrade time. The loop
//! parses inbound events, runs them through the router, and hands the
//! resulting dispatches to the session manager. Connection loss drives the
//! disconnect transition.

use std::sync::Arc;

use futures_util::sink::SinkExt;
use futures_util::stream::StreamExt;
use log::{debug, info, warn};
use tokio::sync::mpsc;
use uuid::Uuid;
use warp::ws::{Message, WebSocket};

use crate::core::events::{ClientEvent, ClientId};
use crate::core::router::EventRouter;
use crate::core::session::SessionManager;

/// Handle a WebSocket connection for its whole lifetime
pub async fn handle_ws_client(
    ws: WebSocket,
    router: Arc<EventRouter>,
    sessions: Arc<SessionManager>,
) {
    let (mut ws_tx, mut ws_rx) = ws.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    // Forward queued outbound events to the socket
    tokio::task::spawn(async move {
        while let Some(message) = rx.recv().await {
            if let Err(e) = ws_tx.send(message).await {
                debug!("websocket send failed: {}", e);
                break;
            }
        }
    });

    // Issue the connection-identity; it has no meaning past this socket
    let client_id: ClientId = Uuid::new_v4().to_string();

    sessions.register(client_id.clone(), tx).await;
    info!("client connected: {}", client_id);
    info!("current connections: {}", sessions.client_count().await);

    while let Some(result) = ws_rx.next().await {
        match result {
            Ok(msg) => {
                if msg.is_text() {
                    process_event(&msg, &client_id, &router, &sessions).await;
                } else if msg.is_close() {
                    debug!("client {} sent close frame", client_id);
                    break;
                }
            }
            Err(e) => {
                warn!("websocket error for {}: {}", client_id, e);
                break;
            }
        }
    }

    // Connection lost: run the disconnect transition before dropping the
    // session so the departure broadcast still reaches the others.
    let dispatches = router.handle_disconnect(&client_id).await;
    sessions.deliver(dispatches).await;
    sessions.unregister(&client_id).await;

    info!("client disconnected: {}", client_id);
    info!("current connections: {}", sessions.client_count().await);
}

// Parse and route one inbound frame
async fn process_event(
    msg: &Message,
    client_id: &ClientId,
    router: &EventRouter,
    sessions: &SessionManager,
) {
    let Ok(text) = msg.to_str() else {
        return;
    };

    match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => {
            let dispatches = router.handle(client_id, event).await;
            sessions.deliver(dispatches).await;
        }
        Err(e) => {
            warn!("unparseable event from {}: {}", client_id, e);
        }
    }
}
