//! Room registry: rooms, membership, and history
//!
//! The registry exclusively owns all room state. Membership and history are
//! fields of `Room`; the helpers here are views over them and never copy
//! state elsewhere. Rooms are created on demand and persist empty for the
//! process lifetime once their last member leaves.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::auth::Digest;
use crate::core::events::ClientId;
use crate::core::message::StoredMessage;
use crate::error::{RelayError, Result};

/// A named, password-gated chat channel
#[derive(Debug)]
pub struct Room {
    /// Credential digest fixed at creation
    password_digest: Digest,
    /// Optional secondary digest for elevated operations
    admin_password_digest: Option<Digest>,
    /// Connection-identity to display name; names are unique per room
    members: HashMap<ClientId, String>,
    /// Append-only, insertion order = chronological order
    history: Vec<StoredMessage>,
}

impl Room {
    fn new(password_digest: Digest) -> Self {
        Self {
            password_digest,
            admin_password_digest: None,
            members: HashMap::new(),
            history: Vec::new(),
        }
    }

    pub fn password_matches(&self, digest: &Digest) -> bool {
        self.password_digest.matches(digest)
    }

    pub fn admin_password_matches(&self, digest: &Digest) -> bool {
        match &self.admin_password_digest {
            Some(admin) => admin.matches(digest),
            None => false,
        }
    }

    pub fn admin_password_set(&self) -> bool {
        self.admin_password_digest.is_some()
    }

    /// Overwrites any previous digest; last writer wins
    pub fn set_admin_password(&mut self, digest: Digest) {
        self.admin_password_digest = Some(digest);
    }

    /// True if any current member uses this display name
    pub fn name_taken(&self, name: &str) -> bool {
        self.members.values().any(|n| n == name)
    }

    /// Insert `identity -> name`. The caller must hold this room's write
    /// lock and have checked `name_taken`; inserting a duplicate name
    /// corrupts the per-room uniqueness invariant.
    pub fn add_member(&mut self, identity: ClientId, name: String) {
        self.members.insert(identity, name);
    }

    /// Remove the mapping; returns false when the identity was absent
    pub fn remove_member(&mut self, identity: &str) -> bool {
        self.members.remove(identity).is_some()
    }

    pub fn has_member(&self, identity: &str) -> bool {
        self.members.contains_key(identity)
    }

    pub fn display_name(&self, identity: &str) -> Option<&str> {
        self.members.get(identity).map(String::as_str)
    }

    /// First match by iteration; unambiguous while names stay unique
    pub fn identity_of(&self, name: &str) -> Option<&ClientId> {
        self.members
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(id, _)| id)
    }

    pub fn member_names(&self) -> Vec<String> {
        self.members.values().cloned().collect()
    }

    pub fn member_identities(&self) -> Vec<ClientId> {
        self.members.keys().cloned().collect()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn append_message(&mut self, message: StoredMessage) {
        self.history.push(message);
    }

    pub fn history(&self) -> &[StoredMessage] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

/// Owns the name-to-room mapping shared by every connection.
///
/// Two lock levels: the outer lock guards only the map itself, and each room
/// carries its own lock, so a transition against one room never contends
/// with traffic in another. Same-room transitions serialize on the room's
/// write lock, which is held across the whole validate-mutate-read sequence.
pub struct RoomRegistry {
    rooms: RwLock<HashMap<String, Arc<RwLock<Room>>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Create a room with empty members and history.
    ///
    /// The store never silently overwrites: creating an occupied name is an
    /// error the caller must avoid by checking `exists` first.
    pub async fn create_room(&self, name: &str, password_digest: Digest) -> Result<()> {
        let mut rooms = self.rooms.write().await;
        if rooms.contains_key(name) {
            return Err(RelayError::RoomExists(name.to_string()));
        }
        rooms.insert(
            name.to_string(),
            Arc::new(RwLock::new(Room::new(password_digest))),
        );
        Ok(())
    }

    pub async fn exists(&self, name: &str) -> bool {
        self.rooms.read().await.contains_key(name)
    }

    /// Handle for a transition that needs the room's own lock
    pub async fn room(&self, name: &str) -> Option<Arc<RwLock<Room>>> {
        self.rooms.read().await.get(name).cloned()
    }

    /// False when the room does not exist
    pub async fn verify_password(&self, name: &str, digest: &Digest) -> bool {
        match self.room(name).await {
            Some(room) => room.read().await.password_matches(digest),
            None => false,
        }
    }

    /// False when the room does not exist or no admin digest is set
    pub async fn verify_admin_password(&self, name: &str, digest: &Digest) -> bool {
        match self.room(name).await {
            Some(room) => room.read().await.admin_password_matches(digest),
            None => false,
        }
    }

    pub async fn set_admin_password(&self, name: &str, digest: Digest) -> Result<()> {
        match self.room(name).await {
            Some(room) => {
                room.write().await.set_admin_password(digest);
                Ok(())
            }
            None => Err(RelayError::RoomNotFound(name.to_string())),
        }
    }

    /// Maintenance operation; not part of the protocol flow
    pub async fn clear_history(&self, name: &str) -> Result<()> {
        match self.room(name).await {
            Some(room) => {
                room.write().await.clear_history();
                Ok(())
            }
            None => Err(RelayError::RoomNotFound(name.to_string())),
        }
    }

    /// Full replay clone, oldest first
    pub async fn history(&self, name: &str) -> Result<Vec<StoredMessage>> {
        match self.room(name).await {
            Some(room) => Ok(room.read().await.history().to_vec()),
            None => Err(RelayError::RoomNotFound(name.to_string())),
        }
    }

    /// Timestamp of the room's most recent history entry
    pub async fn last_message_time(&self, name: &str) -> Option<DateTime<Utc>> {
        match self.room(name).await {
            Some(room) => room.read().await.history().last().map(|m| m.timestamp),
            None => None,
        }
    }

    /// Display names of the room's current members; empty when the room
    /// does not exist
    pub async fn member_names(&self, name: &str) -> Vec<String> {
        match self.room(name).await {
            Some(room) => room.read().await.member_names(),
            None => Vec::new(),
        }
    }

    /// Connection identities of the room's current members
    pub async fn member_identities(&self, name: &str) -> Vec<ClientId> {
        match self.room(name).await {
            Some(room) => room.read().await.member_identities(),
            None => Vec::new(),
        }
    }

    /// Reverse lookup across all rooms, used at disconnect time.
    ///
    /// Takes each room's read lock one at a time, never two at once, so the
    /// scan cannot deadlock against a transition holding a room write lock.
    pub async fn room_of(&self, identity: &str) -> Option<String> {
        let rooms = self.rooms.read().await;
        for (name, room) in rooms.iter() {
            if room.read().await.has_member(identity) {
                return Some(name.clone());
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::digest;

    #[test]
    fn test_room_membership() {
        let mut room = Room::new(digest("pw"));

        room.add_member("id-1".to_string(), "alice".to_string());
        assert!(room.name_taken("alice"));
        assert!(!room.name_taken("bob"));
        assert_eq!(room.display_name("id-1"), Some("alice"));
        assert_eq!(room.identity_of("alice"), Some(&"id-1".to_string()));
        assert!(room.identity_of("bob").is_none());

        assert!(room.remove_member("id-1"));
        assert!(!room.remove_member("id-1"));
        assert_eq!(room.member_count(), 0);
    }

    #[test]
    fn test_room_passwords() {
        let mut room = Room::new(digest("pw"));
        assert!(room.password_matches(&digest("pw")));
        assert!(!room.password_matches(&digest("wrong")));

        assert!(!room.admin_password_set());
        assert!(!room.admin_password_matches(&digest("admin")));
        room.set_admin_password(digest("admin"));
        assert!(room.admin_password_matches(&digest("admin")));
    }
}
