//! Wire protocol between clients and the room service
//!
//! Every frame is a JSON object `{"event": <name>, "data": <payload>}`; the
//! `data` field is absent for events without a payload.

use crate::game::GameState;
use crate::room::Presence;
use crate::types::{Role, RoomId};
use serde::{Deserialize, Serialize};

/// Payload of `join_room`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomRequest {
    pub room_id: RoomId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passcode: Option<String>,
}

/// Payload of `send_move`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMoveRequest {
    pub room_id: RoomId,
    pub index: usize,
}

/// Events sent by clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    FindPublicRoom,
    JoinRoom(JoinRoomRequest),
    SendMove(SendMoveRequest),
    RequestReset(RoomId),
}

impl ClientEvent {
    /// Parse a text frame
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::FindPublicRoom => "find_public_room",
            ClientEvent::JoinRoom(_) => "join_room",
            ClientEvent::SendMove(_) => "send_move",
            ClientEvent::RequestReset(_) => "request_reset",
        }
    }
}

/// Payload of `assign_role`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAssignment {
    pub role: Role,
    pub room_id: RoomId,
    pub initial_state: Option<GameState>,
}

/// Payload of `receive_move`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayedMove {
    pub index: usize,
}

/// Events sent by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    AssignRole(RoleAssignment),
    ReceiveMove(RelayedMove),
    ResetGame,
    OpponentStatus(Presence),
    ErrorMessage(String),
}

impl ServerEvent {
    /// Serialize to a text frame
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::AssignRole(_) => "assign_role",
            ServerEvent::ReceiveMove(_) => "receive_move",
            ServerEvent::ResetGame => "reset_game",
            ServerEvent::OpponentStatus(_) => "opponent_status",
            ServerEvent::ErrorMessage(_) => "error_message",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_client_events() {
        assert_eq!(
            ClientEvent::from_json(r#"{"event":"find_public_room"}"#).unwrap(),
            ClientEvent::FindPublicRoom
        );
        assert_eq!(
            ClientEvent::from_json(r#"{"event":"join_room","data":{"roomId":"den"}}"#).unwrap(),
            ClientEvent::JoinRoom(JoinRoomRequest {
                room_id: "den".to_string(),
                passcode: None
            })
        );
        assert_eq!(
            ClientEvent::from_json(r#"{"event":"send_move","data":{"roomId":"den","index":4}}"#)
                .unwrap(),
            ClientEvent::SendMove(SendMoveRequest {
                room_id: "den".to_string(),
                index: 4
            })
        );
        assert_eq!(
            ClientEvent::from_json(r#"{"event":"request_reset","data":"den"}"#).unwrap(),
            ClientEvent::RequestReset("den".to_string())
        );
    }

    #[test]
    fn test_reject_malformed_frames() {
        assert!(ClientEvent::from_json("not json").is_err());
        assert!(ClientEvent::from_json(r#"{"event":"fly_away"}"#).is_err());
        assert!(
            ClientEvent::from_json(r#"{"event":"send_move","data":{"roomId":"den","index":-1}}"#)
                .is_err()
        );
    }

    #[test]
    fn test_server_event_shapes() {
        let assign = ServerEvent::AssignRole(RoleAssignment {
            role: Role::X,
            room_id: "den".to_string(),
            initial_state: None,
        });
        assert_eq!(
            serde_json::to_value(&assign).unwrap(),
            json!({"event": "assign_role", "data": {"role": "X", "roomId": "den", "initialState": null}})
        );

        assert_eq!(
            serde_json::to_value(ServerEvent::ResetGame).unwrap(),
            json!({"event": "reset_game"})
        );

        let status = ServerEvent::OpponentStatus(Presence {
            x_connected: true,
            o_connected: false,
        });
        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            json!({"event": "opponent_status", "data": {"xConnected": true, "oConnected": false}})
        );

        assert_eq!(
            serde_json::to_value(ServerEvent::ErrorMessage("Server is full".to_string())).unwrap(),
            json!({"event": "error_message", "data": "Server is full"})
        );
        assert_eq!(ServerEvent::ResetGame.name(), "reset_game");
    }
}
