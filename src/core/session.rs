//! Live connection tracking and dispatch delivery
//!
//! The session manager owns the identity-to-socket mapping and is the only
//! place that resolves a room target into concrete connections. Delivery is
//! best-effort: a closed connection is logged and skipped, never retried.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::{mpsc, RwLock};
use warp::ws::Message as WsMessage;

use crate::core::events::{ClientId, Dispatch, ServerEvent, Target};
use crate::core::room::RoomRegistry;
use crate::error::{RelayError, Result};

/// A live client connection with its outbound channel
pub struct Connection {
    pub id: ClientId,
    pub sender: mpsc::UnboundedSender<WsMessage>,
}

/// Tracks connections and fans dispatches out to sockets
pub struct SessionManager {
    connections: RwLock<HashMap<ClientId, Connection>>,
    registry: Arc<RoomRegistry>,
}

impl SessionManager {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            registry,
        }
    }

    /// Register a new client connection
    pub async fn register(&self, id: ClientId, sender: mpsc::UnboundedSender<WsMessage>) {
        let connection = Connection {
            id: id.clone(),
            sender,
        };
        self.connections.write().await.insert(id, connection);
    }

    /// Remove a client connection
    pub async fn unregister(&self, id: &str) {
        self.connections.write().await.remove(id);
    }

    pub async fn client_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Deliver router dispatches to their targets.
    ///
    /// Room targets are resolved against current membership at delivery
    /// time; membership may have moved on since the transition ran, which
    /// is fine under best-effort delivery.
    pub async fn deliver(&self, dispatches: Vec<Dispatch>) {
        for Dispatch { target, event } in dispatches {
            match target {
                Target::Client(id) => {
                    if let Err(e) = self.send_to(&id, &event).await {
                        debug!("dropped event for {}: {}", id, e);
                    }
                }
                Target::Room { room, exclude } => {
                    for id in self.registry.member_identities(&room).await {
                        if id == exclude {
                            continue;
                        }
                        if let Err(e) = self.send_to(&id, &event).await {
                            debug!("dropped room event for {}: {}", id, e);
                        }
                    }
                }
            }
        }
    }

    async fn send_to(&self, id: &str, event: &ServerEvent) -> Result<()> {
        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("failed to serialize outbound event: {}", e);
                return Ok(());
            }
        };

        let connections = self.connections.read().await;
        let connection = connections
            .get(id)
            .ok_or_else(|| RelayError::SessionNotFound(id.to_string()))?;

        connection
            .sender
            .send(WsMessage::text(payload))
            .map_err(|_| RelayError::SessionNotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::digest;

    async fn registered_member(
        sessions: &SessionManager,
        registry: &RoomRegistry,
        room: &str,
        id: &str,
        name: &str,
    ) -> mpsc::UnboundedReceiver<WsMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        sessions.register(id.to_string(), tx).await;
        let handle = registry.room(room).await.unwrap();
        handle
            .write()
            .await
            .add_member(id.to_string(), name.to_string());
        rx
    }

    #[tokio::test]
    async fn test_room_delivery_skips_excluded_sender() {
        let registry = Arc::new(RoomRegistry::new());
        registry.create_room("r1", digest("pw")).await.unwrap();
        let sessions = SessionManager::new(registry.clone());

        let mut alice_rx = registered_member(&sessions, &registry, "r1", "id-a", "alice").await;
        let mut bob_rx = registered_member(&sessions, &registry, "r1", "id-b", "bob").await;

        sessions
            .deliver(vec![Dispatch::to_room(
                "r1",
                "id-a",
                ServerEvent::PersonJoined {
                    name: "carol".to_string(),
                },
            )])
            .await;

        assert!(alice_rx.try_recv().is_err());
        let delivered = bob_rx.try_recv().unwrap();
        assert!(delivered.to_str().unwrap().contains("personjoined"));
    }

    #[tokio::test]
    async fn test_client_delivery_targets_one_connection() {
        let registry = Arc::new(RoomRegistry::new());
        registry.create_room("r1", digest("pw")).await.unwrap();
        let sessions = SessionManager::new(registry.clone());

        let mut alice_rx = registered_member(&sessions, &registry, "r1", "id-a", "alice").await;
        let mut bob_rx = registered_member(&sessions, &registry, "r1", "id-b", "bob").await;

        sessions
            .deliver(vec![Dispatch::to_client(
                "id-b",
                ServerEvent::Error {
                    message: "cannot whisper".to_string(),
                },
            )])
            .await;

        assert!(alice_rx.try_recv().is_err());
        assert!(bob_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_delivery_to_gone_connection_is_best_effort() {
        let registry = Arc::new(RoomRegistry::new());
        registry.create_room("r1", digest("pw")).await.unwrap();
        let sessions = SessionManager::new(registry.clone());

        // Never registered
        sessions
            .deliver(vec![Dispatch::to_client(
                "id-ghost",
                ServerEvent::Error {
                    message: "unauthorized user".to_string(),
                },
            )])
            .await;

        assert_eq!(sessions.client_count().await, 0);
    }
}
