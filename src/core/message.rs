//! Chat message records and time handling

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Distinguishes user chat from system-generated notices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Chat,
    Info,
}

/// A single room history entry. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    /// Display name of the author; system notices have none
    pub author: Option<String>,
    /// Opaque payload, stored and forwarded unmodified
    pub body: String,
    pub timestamp: DateTime<Utc>,
    pub kind: MessageKind,
}

impl StoredMessage {
    /// A user chat entry carrying the sender's claimed (canonicalized) time
    pub fn chat(author: String, body: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            author: Some(author),
            body,
            timestamp,
            kind: MessageKind::Chat,
        }
    }

    /// A system notice stamped with the server clock
    pub fn info(body: String) -> Self {
        Self {
            author: None,
            body,
            timestamp: Utc::now(),
            kind: MessageKind::Info,
        }
    }
}

/// Re-express a client-supplied timestamp in UTC.
///
/// Accepts RFC 3339 and RFC 2822. The result is a function of the claimed
/// instant only, never of server receipt time.
pub fn canonical_utc(client_time: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(client_time)
        .or_else(|_| DateTime::parse_from_rfc2822(client_time))
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Format a date like "January 2, 2020" for day-separator display
pub fn month_day_year(t: &DateTime<Utc>) -> String {
    t.format("%B %-d, %Y").to_string()
}
