//! Protocol state machine
//!
//! Interprets inbound client events, validates them against the registry,
//! mutates room state, and returns the outbound events paired with their
//! targets. Delivery is the transport layer's job; nothing here touches a
//! socket.
//!
//! Per connection-identity the lifecycle is unjoined, then joined to exactly
//! one room, then disconnected; there is no re-join without a fresh
//! identity. Each transition runs under the target room's lock, so two
//! concurrent joins claiming the same display name can never both pass the
//! uniqueness check.

use std::sync::Arc;

use chrono::Utc;
use log::{debug, warn};

use crate::auth;
use crate::core::events::{ClientEvent, ClientId, Dispatch, ServerEvent, Target};
use crate::core::message::{canonical_utc, StoredMessage};
use crate::core::room::RoomRegistry;

const ERR_NAME_TAKEN: &str = "name taken";
const ERR_UNAUTHORIZED: &str = "unauthorized user";
const ERR_CANNOT_WHISPER: &str = "cannot whisper";

/// Routes inbound events against a shared room registry
pub struct EventRouter {
    registry: Arc<RoomRegistry>,
}

impl EventRouter {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }

    /// Route one wire event for `identity`
    pub async fn handle(&self, identity: &ClientId, event: ClientEvent) -> Vec<Dispatch> {
        match event {
            ClientEvent::NewUser {
                room,
                name,
                password,
            } => self.handle_join(identity, &room, name, &password).await,
            ClientEvent::ChatMessage { room, body, time } => {
                self.handle_chat(identity, &room, body, &time).await
            }
            ClientEvent::Whisper {
                room,
                body,
                to,
                time,
            } => self.handle_whisper(identity, &room, body, &to, time).await,
        }
    }

    /// Join transition. Failed joins leave membership untouched.
    pub async fn handle_join(
        &self,
        identity: &ClientId,
        room_name: &str,
        name: String,
        password: &str,
    ) -> Vec<Dispatch> {
        if let Some(current) = self.registry.room_of(identity).await {
            warn!("join from {} ignored: already a member of {}", identity, current);
            return Vec::new();
        }

        let Some(room) = self.registry.room(room_name).await else {
            // A missing room is indistinguishable from a wrong password
            return vec![error_to(identity, ERR_UNAUTHORIZED)];
        };
        let mut room = room.write().await;

        if room.name_taken(&name) {
            return vec![error_to(identity, ERR_NAME_TAKEN)];
        }
        if !room.password_matches(&auth::digest(password)) {
            return vec![error_to(identity, ERR_UNAUTHORIZED)];
        }

        if !room.admin_password_set() {
            debug!("room {} has no admin password set", room_name);
        }

        room.add_member(identity.clone(), name.clone());
        let messages = room.history().to_vec();

        vec![
            Dispatch::to_room(room_name, identity.clone(), ServerEvent::PersonJoined { name }),
            Dispatch::to_client(identity.clone(), ServerEvent::ChatHistory { messages }),
        ]
    }

    /// Room broadcast. The sender already has its own copy locally, so the
    /// live broadcast excludes it; the history entry is the shared record.
    pub async fn handle_chat(
        &self,
        identity: &ClientId,
        room_name: &str,
        body: String,
        client_time: &str,
    ) -> Vec<Dispatch> {
        let Some(room) = self.registry.room(room_name).await else {
            warn!("chat for unknown room {} from {}", room_name, identity);
            return Vec::new();
        };
        let mut room = room.write().await;

        let Some(sender) = room.display_name(identity).map(str::to_string) else {
            warn!("chat from {} who is not a member of {}", identity, room_name);
            return Vec::new();
        };

        let time = canonical_utc(client_time).unwrap_or_else(|| {
            debug!("unparseable client time {:?}, stamping server time", client_time);
            Utc::now()
        });

        room.append_message(StoredMessage::chat(sender.clone(), body.clone(), time));

        vec![Dispatch::to_room(
            room_name,
            identity.clone(),
            ServerEvent::ChatMessage {
                body,
                from: sender,
                time,
            },
        )]
    }

    /// Private delivery to one named member. Never persisted, never echoed;
    /// an unresolvable recipient is terminal.
    pub async fn handle_whisper(
        &self,
        identity: &ClientId,
        room_name: &str,
        body: String,
        recipient_name: &str,
        time: String,
    ) -> Vec<Dispatch> {
        let Some(room) = self.registry.room(room_name).await else {
            warn!("whisper for unknown room {} from {}", room_name, identity);
            return Vec::new();
        };
        let room = room.read().await;

        let Some(sender) = room.display_name(identity).map(str::to_string) else {
            warn!("whisper from {} who is not a member of {}", identity, room_name);
            return Vec::new();
        };

        match room.identity_of(recipient_name) {
            Some(recipient) => vec![Dispatch::to_client(
                recipient.clone(),
                ServerEvent::Whisper {
                    body,
                    from: sender,
                    time,
                },
            )],
            None => vec![error_to(identity, ERR_CANNOT_WHISPER)],
        }
    }

    /// Terminal transition, driven by the transport when the connection
    /// drops. Idempotent: a second disconnect resolves no room and emits
    /// nothing.
    pub async fn handle_disconnect(&self, identity: &ClientId) -> Vec<Dispatch> {
        let Some(room_name) = self.registry.room_of(identity).await else {
            warn!("disconnect for {} with no resolvable room", identity);
            return Vec::new();
        };
        let Some(room) = self.registry.room(&room_name).await else {
            warn!("room {} vanished during disconnect of {}", room_name, identity);
            return Vec::new();
        };
        let mut room = room.write().await;

        let Some(name) = room.display_name(identity).map(str::to_string) else {
            warn!("disconnect for {} who is not a member of {}", identity, room_name);
            return Vec::new();
        };

        room.append_message(StoredMessage::info(format!("{} has left the chat", name)));
        room.remove_member(identity);

        vec![Dispatch {
            target: Target::Room {
                room: room_name,
                exclude: identity.clone(),
            },
            event: ServerEvent::UserDisconnected { name },
        }]
    }
}

fn error_to(identity: &ClientId, message: &str) -> Dispatch {
    Dispatch::to_client(
        identity.clone(),
        ServerEvent::Error {
            message: message.to_string(),
        },
    )
}
