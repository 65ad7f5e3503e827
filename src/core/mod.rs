//! Core functionality: the room registry and the event-routing engine

pub mod events;
pub mod message;
pub mod room;
pub mod router;
pub mod session;

// Re-export main components for convenience
pub use events::{ClientEvent, ClientId, Dispatch, ServerEvent, Target};
pub use message::{MessageKind, StoredMessage};
pub use room::{Room, RoomRegistry};
pub use router::EventRouter;
pub use session::{Connection, SessionManager};
