use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum RelayError {
    // Registry errors
    RoomExists(String),
    RoomNotFound(String),

    // Session errors
    SessionNotFound(String),

    // Configuration errors
    ConfigError(String),
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RoomExists(name) => write!(f, "Room already exists: {}", name),
            Self::RoomNotFound(name) => write!(f, "Room not found: {}", name),
            Self::SessionNotFound(id) => write!(f, "Session not found: {}", id),
            Self::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl Error for RelayError {}

// Generic result type for the relay
pub type Result<T> = std::result::Result<T, RelayError>;
