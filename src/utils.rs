//! Utility functions for the room service

use crate::types::ConnectionId;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a new unique connection ID
pub fn generate_connection_id() -> ConnectionId {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Normalize an optional passcode; empty strings mean "no passcode"
pub fn normalize_passcode(passcode: Option<&str>) -> Option<String> {
    passcode.filter(|p| !p.is_empty()).map(str::to_string)
}
