pub mod canvas_events;
pub mod countdown_events;
pub mod room_events;
pub mod shared;

pub use canvas_events::CanvasEventHandlers;
pub use countdown_events::CountdownEventHandlers;
pub use room_events::RoomEventHandlers;
