// Library crate for the sketchparty session coordinator
// This file exposes the public API for integration tests

pub mod countdown;
pub mod room;
pub mod shared;
pub mod websockets;

// Re-export commonly used types for easier access in tests
pub use countdown::CountdownEngine;
pub use room::{models::RoomModel, repository::RoomRegistry, RoomService};
pub use shared::{AppError, AppState};
pub use websockets::{
    ClientEvent, ConnectionManager, InMemoryConnectionManager, MessageHandler, ServerEvent,
    SessionRouter,
};
