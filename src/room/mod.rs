//! Room management for the service
//!
//! This module holds the room record, the registry that owns every open room
//! and the identifier source used for rooms the matchmaker creates.

pub mod id;
pub mod instance;
pub mod registry;

// Re-export commonly used types
pub use id::{RandomRoomIdGenerator, RoomIdGenerator};
pub use instance::{PlayerSlots, Presence, Room};
pub use registry::{RoomRegistry, DEFAULT_MAX_ROOMS, DEFAULT_ROOM_ID_ATTEMPTS};
