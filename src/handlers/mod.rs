//! Request handlers for the HTTP and WebSocket surfaces

pub mod provision;
pub mod websocket;

// Re-export the handlers
pub use provision::provision_room;
pub use websocket::handle_ws_client;
