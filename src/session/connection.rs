//! Per-connection session bookkeeping

use crate::types::{ConnectionId, Role, RoomId};
use crate::utils::current_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A connection's membership in one room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub room_id: RoomId,
    pub role: Role,
}

/// Protocol state of a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Not bound to any room yet, or every room has gone away
    Unbound,
    /// Bound to one or more rooms, oldest binding first
    Bound(Vec<Binding>),
}

/// Session record kept by the coordinator for each live connection
#[derive(Debug, Clone)]
pub struct Session {
    id: ConnectionId,
    bindings: Vec<Binding>,
    connected_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: ConnectionId) -> Self {
        Self {
            id,
            bindings: Vec::new(),
            connected_at: current_timestamp(),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Time since the connection registered
    pub fn lifetime(&self) -> chrono::Duration {
        current_timestamp() - self.connected_at
    }

    pub fn state(&self) -> SessionState {
        if self.bindings.is_empty() {
            SessionState::Unbound
        } else {
            SessionState::Bound(self.bindings.clone())
        }
    }

    /// Record a binding; re-binding to the same room replaces the role
    pub fn bind(&mut self, room_id: &str, role: Role) {
        match self.bindings.iter_mut().find(|b| b.room_id == room_id) {
            Some(binding) => binding.role = role,
            None => self.bindings.push(Binding {
                room_id: room_id.to_string(),
                role,
            }),
        }
    }

    pub fn unbind(&mut self, room_id: &str) {
        self.bindings.retain(|b| b.room_id != room_id);
    }

    /// Rooms this connection is bound to
    pub fn room_ids(&self) -> Vec<RoomId> {
        self.bindings.iter().map(|b| b.room_id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::generate_connection_id;

    #[test]
    fn test_session_transitions() {
        let mut session = Session::new(generate_connection_id());
        assert_eq!(session.state(), SessionState::Unbound);

        session.bind("den", Role::Spectator);
        session.bind("den", Role::O);
        session.bind("attic", Role::X);
        assert_eq!(
            session.state(),
            SessionState::Bound(vec![
                Binding {
                    room_id: "den".to_string(),
                    role: Role::O
                },
                Binding {
                    room_id: "attic".to_string(),
                    role: Role::X
                },
            ])
        );
        assert_eq!(session.room_ids(), vec!["den".to_string(), "attic".to_string()]);

        assert!(session.lifetime().num_seconds() >= 0);

        session.unbind("den");
        session.unbind("attic");
        assert_eq!(session.state(), SessionState::Unbound);
    }
}
