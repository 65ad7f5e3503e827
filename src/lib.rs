//! Sealed Rooms - a password-gated group chat relay
//!
//! Clients join named rooms over WebSockets, exchange broadcast and private
//! messages, and receive replayed history on join. Message bodies are opaque
//! to the relay: they arrive already encrypted and are stored and forwarded
//! unmodified.

pub mod auth;
pub mod config;
pub mod constants;
pub mod core;
pub mod error;
pub mod handlers;

// Re-export main components
pub use config::*;
pub use constants::*;
