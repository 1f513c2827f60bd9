//! Anonymous matchmaking into public rooms
//!
//! A caller is seated in the first public room that is waiting for its second
//! player. When no such room exists a new public room is created with the
//! caller as X.

use crate::error::RoomResult;
use crate::game::GameState;
use crate::room::{Room, RoomRegistry};
use crate::types::{ConnectionId, Role, RoomId};
use std::sync::Arc;
use tracing::{debug, info};

/// Result of a room matching operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchingResult {
    /// Caller should be seated in an existing room
    MatchedToRoom(RoomId),
    /// No open room, a new one is needed
    CreateNewRoom,
}

/// Trait for room matching strategies
pub trait RoomMatcher: Send + Sync {
    /// Whether a room may receive an anonymous player
    fn is_room_eligible(&self, room: &Room) -> bool;

    /// Pick a room for an anonymous caller
    fn find_room(&self, registry: &RoomRegistry) -> MatchingResult {
        registry
            .iter()
            .find(|room| self.is_room_eligible(room))
            .map(|room| MatchingResult::MatchedToRoom(room.id().to_string()))
            .unwrap_or(MatchingResult::CreateNewRoom)
    }
}

/// Takes the first public room, in registry order, holding exactly one player
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstOpenRoomMatcher;

impl RoomMatcher for FirstOpenRoomMatcher {
    fn is_room_eligible(&self, room: &Room) -> bool {
        room.is_public() && room.players().occupied() == 1
    }
}

/// Seat assigned by the matchmaker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub room_id: RoomId,
    pub role: Role,
    /// Current board of a joined room; `None` for a room created just now
    pub initial_state: Option<GameState>,
    /// Whether the caller filled the room's last player slot
    pub filled_room: bool,
}

/// Pairs anonymous callers into public rooms
#[derive(Clone)]
pub struct Matchmaker {
    matcher: Arc<dyn RoomMatcher>,
}

impl Matchmaker {
    pub fn new() -> Self {
        Self::with_matcher(Arc::new(FirstOpenRoomMatcher))
    }

    pub fn with_matcher(matcher: Arc<dyn RoomMatcher>) -> Self {
        Self { matcher }
    }

    /// Seat a connection in an open public room or a brand new one
    pub fn find_public_room(
        &self,
        registry: &mut RoomRegistry,
        connection: ConnectionId,
    ) -> RoomResult<Assignment> {
        debug!(
            "Searching public rooms for {} - open rooms: {}",
            connection,
            registry.len()
        );

        if let MatchingResult::MatchedToRoom(room_id) = self.matcher.find_room(registry) {
            if let Some(room) = registry.get_mut(&room_id) {
                let role = room.assign_role(connection);
                info!(
                    "Matched {} into existing room '{}' as {}",
                    connection, room_id, role
                );
                return Ok(Assignment {
                    room_id,
                    role,
                    initial_state: Some(room.game_state().clone()),
                    filled_room: room.players().is_full(),
                });
            }
        }

        let room = registry.create_generated()?;
        let role = room.assign_role(connection);
        info!(
            "Created public room '{}' for {} as {}",
            room.id(),
            connection,
            role
        );
        Ok(Assignment {
            room_id: room.id().to_string(),
            role,
            initial_state: None,
            filled_room: false,
        })
    }
}

impl Default for Matchmaker {
    fn default() -> Self {
        Self::new()
    }
}
