//! Wire events and dispatch targets
//!
//! Inbound and outbound events are JSON tagged objects. The tag names are
//! the protocol's route names and are part of the client contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::message::StoredMessage;

/// Connection-identity issued by the transport layer. Opaque to the core,
/// meaningless once the connection ends.
pub type ClientId = String;

/// Client-to-server events
///
/// Disconnect is not a wire event; the transport signals it when the
/// connection drops.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Join a room under a display name
    #[serde(rename = "newuser")]
    NewUser {
        room: String,
        name: String,
        password: String,
    },

    /// Broadcast an opaque payload to the sender's room
    #[serde(rename = "chatmessage")]
    ChatMessage {
        room: String,
        body: String,
        time: String,
    },

    /// Deliver an opaque payload to one named member, privately
    #[serde(rename = "whisper")]
    Whisper {
        room: String,
        body: String,
        to: String,
        time: String,
    },
}

/// Server-to-client events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Rejection of the sender's last request
    #[serde(rename = "error")]
    Error { message: String },

    /// A new member joined the room
    #[serde(rename = "personjoined")]
    PersonJoined { name: String },

    /// Full history replay, oldest first, sent once on join
    #[serde(rename = "chathistory")]
    ChatHistory { messages: Vec<StoredMessage> },

    /// Room broadcast from another member
    #[serde(rename = "chatmessage")]
    ChatMessage {
        body: String,
        from: String,
        time: DateTime<Utc>,
    },

    /// Private message; `time` is forwarded as the sender supplied it
    #[serde(rename = "whisper")]
    Whisper {
        body: String,
        from: String,
        time: String,
    },

    /// A member's connection ended
    #[serde(rename = "userdisconnected")]
    UserDisconnected { name: String },
}

/// Where an outbound event goes. The transport resolves room targets
/// against current membership at delivery time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Exactly one connection
    Client(ClientId),
    /// Every current member of `room` except `exclude`
    Room { room: String, exclude: ClientId },
}

/// One outbound event paired with its target selector
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub target: Target,
    pub event: ServerEvent,
}

impl Dispatch {
    pub fn to_client(id: impl Into<ClientId>, event: ServerEvent) -> Self {
        Self {
            target: Target::Client(id.into()),
            event,
        }
    }

    pub fn to_room(room: impl Into<String>, exclude: impl Into<ClientId>, event: ServerEvent) -> Self {
        Self {
            target: Target::Room {
                room: room.into(),
                exclude: exclude.into(),
            },
            event,
        }
    }
}
