//! Room record and player slot bookkeeping
//!
//! A room owns at most one connection per playing mark and the game state
//! those two connections share. Spectators are not stored here.

use crate::error::{RoomError, RoomResult};
use crate::game::GameState;
use crate::types::{ConnectionId, Mark, Role, RoomId};
use crate::utils::current_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Occupancy of the two player slots
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSlots {
    pub x: Option<ConnectionId>,
    pub o: Option<ConnectionId>,
}

impl PlayerSlots {
    pub fn get(&self, mark: Mark) -> Option<ConnectionId> {
        match mark {
            Mark::X => self.x,
            Mark::O => self.o,
        }
    }

    fn slot_mut(&mut self, mark: Mark) -> &mut Option<ConnectionId> {
        match mark {
            Mark::X => &mut self.x,
            Mark::O => &mut self.o,
        }
    }

    /// Number of occupied slots (0 to 2)
    pub fn occupied(&self) -> usize {
        usize::from(self.x.is_some()) + usize::from(self.o.is_some())
    }

    pub fn is_full(&self) -> bool {
        self.occupied() == 2
    }

    pub fn is_empty(&self) -> bool {
        self.occupied() == 0
    }

    /// First vacant mark, X before O
    pub fn first_vacant(&self) -> Option<Mark> {
        [Mark::X, Mark::O]
            .into_iter()
            .find(|&mark| self.get(mark).is_none())
    }

    /// Mark held by a connection, if any
    pub fn mark_of(&self, connection: ConnectionId) -> Option<Mark> {
        [Mark::X, Mark::O]
            .into_iter()
            .find(|&mark| self.get(mark) == Some(connection))
    }
}

/// Connectivity snapshot derived from slot occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presence {
    pub x_connected: bool,
    pub o_connected: bool,
}

/// A single match context
#[derive(Debug, Clone)]
pub struct Room {
    id: RoomId,
    passcode: Option<String>,
    players: PlayerSlots,
    game_state: GameState,
    created_at: DateTime<Utc>,
}

impl Room {
    /// Create an empty room with a fresh board
    pub fn new(id: RoomId, passcode: Option<String>) -> Self {
        Self {
            id,
            passcode,
            players: PlayerSlots::default(),
            game_state: GameState::new(),
            created_at: current_timestamp(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn players(&self) -> &PlayerSlots {
        &self.players
    }

    pub fn game_state(&self) -> &GameState {
        &self.game_state
    }

    pub fn game_state_mut(&mut self) -> &mut GameState {
        &mut self.game_state
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Public rooms have no passcode and are eligible for matchmaking
    pub fn is_public(&self) -> bool {
        self.passcode.is_none()
    }

    /// Reject a join whose passcode does not match the room's
    pub fn check_passcode(&self, supplied: Option<&str>) -> RoomResult<()> {
        match &self.passcode {
            Some(expected) if supplied != Some(expected.as_str()) => {
                Err(RoomError::WrongPasscode {
                    room_id: self.id.clone(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Bind a connection to the first vacant slot, or make it a spectator.
    /// A connection already seated keeps its seat.
    pub fn assign_role(&mut self, connection: ConnectionId) -> Role {
        if let Some(mark) = self.players.mark_of(connection) {
            return Role::from(mark);
        }
        match self.players.first_vacant() {
            Some(mark) => {
                *self.players.slot_mut(mark) = Some(connection);
                Role::from(mark)
            }
            None => Role::Spectator,
        }
    }

    /// Clear the slot held by a connection, returning the freed mark
    pub fn release(&mut self, connection: ConnectionId) -> Option<Mark> {
        let mark = self.players.mark_of(connection)?;
        *self.players.slot_mut(mark) = None;
        Some(mark)
    }

    /// Replace the board with a fresh one
    pub fn reset(&mut self) {
        self.game_state = GameState::new();
    }

    pub fn presence(&self) -> Presence {
        Presence {
            x_connected: self.players.x.is_some(),
            o_connected: self.players.o.is_some(),
        }
    }

    /// Rooms with no seated player are garbage
    pub fn is_abandoned(&self) -> bool {
        self.players.is_empty()
    }
}
