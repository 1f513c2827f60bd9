//! Session coordinator: per-connection protocol handling
//!
//! The coordinator owns the room registry, the broadcast hub and the session
//! table behind a single mutex. Each inbound event is handled to completion
//! under that lock without awaiting, so operations on a room never interleave
//! and the events a room publishes are enqueued in issue order.

use crate::broadcast::{BroadcastHub, EventReceiver};
use crate::error::{RoomError, RoomResult};
use crate::game::{GameState, MoveOutcome};
use crate::matchmaking::{Assignment, Matchmaker};
use crate::metrics::MetricsCollector;
use crate::protocol::{ClientEvent, RelayedMove, RoleAssignment, ServerEvent};
use crate::room::{
    PlayerSlots, RandomRoomIdGenerator, RoomIdGenerator, RoomRegistry, DEFAULT_MAX_ROOMS,
    DEFAULT_ROOM_ID_ATTEMPTS,
};
use crate::session::connection::{Session, SessionState};
use crate::session::presence::PresenceNotifier;
use crate::types::{ConnectionId, Role, RoomId};
use crate::utils::{generate_connection_id, normalize_passcode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

/// Settings for a coordinator instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Maximum number of open rooms
    pub max_rooms: usize,
    /// Length of matchmaker-generated room ids
    pub room_id_length: usize,
    /// Attempts to find an unused generated room id
    pub room_id_attempts: usize,
    /// Only accept a move from the connection seated as the mark to move
    pub enforce_turn_order: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_rooms: DEFAULT_MAX_ROOMS,
            room_id_length: 6,
            room_id_attempts: DEFAULT_ROOM_ID_ATTEMPTS,
            enforce_turn_order: false,
        }
    }
}

/// Statistics about coordinator operations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorStats {
    /// Total number of rooms created
    pub rooms_created: u64,
    /// Total number of rooms removed
    pub rooms_removed: u64,
    /// Total number of matches started (both seats filled)
    pub matches_started: u64,
    /// Total number of moves relayed
    pub moves_relayed: u64,
    /// Total number of requested resets
    pub resets_requested: u64,
    /// Current number of open rooms
    pub active_rooms: usize,
    /// Current number of live connections
    pub active_connections: usize,
}

/// Read-only view of one room for reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub room_id: RoomId,
    pub public: bool,
    pub players: usize,
    pub members: usize,
    pub created_at: DateTime<Utc>,
}

struct CoordinatorState {
    registry: RoomRegistry,
    hub: BroadcastHub,
    sessions: HashMap<ConnectionId, Session>,
    stats: CoordinatorStats,
}

/// Where a join came from, for logs and metrics
#[derive(Debug, Clone, Copy)]
enum JoinSource {
    JoinRoom,
    Matchmaking,
}

impl JoinSource {
    fn label(self) -> &'static str {
        match self {
            JoinSource::JoinRoom => "join_room",
            JoinSource::Matchmaking => "matchmaking",
        }
    }
}

/// The room and match-state coordinator
#[derive(Clone)]
pub struct SessionCoordinator {
    state: Arc<Mutex<CoordinatorState>>,
    matchmaker: Matchmaker,
    presence: PresenceNotifier,
    config: CoordinatorConfig,
    metrics: Option<Arc<MetricsCollector>>,
}

impl SessionCoordinator {
    /// Create a coordinator with the default random room id generator
    pub fn new(config: CoordinatorConfig) -> Self {
        let generator = Arc::new(RandomRoomIdGenerator::new(config.room_id_length));
        Self::with_generator(config, generator)
    }

    /// Create a coordinator with a custom room id source
    pub fn with_generator(config: CoordinatorConfig, generator: Arc<dyn RoomIdGenerator>) -> Self {
        let registry =
            RoomRegistry::with_generator(config.max_rooms, generator, config.room_id_attempts);
        Self {
            state: Arc::new(Mutex::new(CoordinatorState {
                registry,
                hub: BroadcastHub::new(),
                sessions: HashMap::new(),
                stats: CoordinatorStats::default(),
            })),
            matchmaker: Matchmaker::new(),
            presence: PresenceNotifier::new(),
            config,
            metrics: None,
        }
    }

    /// Attach a metrics collector
    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    fn lock(&self) -> RoomResult<MutexGuard<'_, CoordinatorState>> {
        self.state.lock().map_err(|_| RoomError::Internal {
            message: "Failed to acquire coordinator lock".to_string(),
        })
    }

    fn metrics(&self) -> Option<&MetricsCollector> {
        self.metrics.as_deref()
    }

    /// Register a new connection and return its id and outbound events
    pub fn connect(&self) -> RoomResult<(ConnectionId, EventReceiver)> {
        let connection = generate_connection_id();
        let mut guard = self.lock()?;
        let state = &mut *guard;

        let receiver = state.hub.register(connection);
        state.sessions.insert(connection, Session::new(connection));
        state.stats.active_connections = state.sessions.len();
        if let Some(metrics) = self.metrics() {
            metrics.set_connections(state.sessions.len());
        }

        info!(
            "Connection {} registered - live connections: {}",
            connection,
            state.sessions.len()
        );
        Ok((connection, receiver))
    }

    /// Dispatch an inbound event, reporting user-visible failures to the
    /// sender as `error_message`
    pub fn handle_event(&self, connection: ConnectionId, event: ClientEvent) {
        let name = event.name();
        let result = match event {
            ClientEvent::FindPublicRoom => self.find_public_room(connection).map(|_| ()),
            ClientEvent::JoinRoom(request) => self
                .join_room(connection, &request.room_id, request.passcode.as_deref())
                .map(|_| ()),
            ClientEvent::SendMove(request) => self
                .send_move(connection, &request.room_id, request.index)
                .map(|_| ()),
            ClientEvent::RequestReset(room_id) => {
                self.request_reset(connection, &room_id).map(|_| ())
            }
        };

        if let Err(e) = result {
            if e.is_user_visible() {
                warn!("{} from {} rejected: {}", name, connection, e);
                self.report_error(connection, &e);
            } else {
                warn!("{} from {} dropped: {}", name, connection, e);
                if let Some(metrics) = self.metrics() {
                    metrics.record_dropped_event(e.kind());
                }
            }
        }
    }

    fn report_error(&self, connection: ConnectionId, e: &RoomError) {
        match self.lock() {
            Ok(state) => {
                state
                    .hub
                    .send_to(connection, ServerEvent::ErrorMessage(e.to_string()));
            }
            Err(lock_error) => {
                error!(
                    "Could not report '{}' to {}: {}",
                    e, connection, lock_error
                );
            }
        }
    }

    /// Join a named room, creating it when unknown.
    ///
    /// Seats go to X, then O, then everyone else spectates. Any join that
    /// leaves both seats occupied starts a fresh match for the whole room,
    /// spectator joins included.
    pub fn join_room(
        &self,
        connection: ConnectionId,
        room_id: &str,
        passcode: Option<&str>,
    ) -> RoomResult<Role> {
        let mut guard = self.lock()?;
        let state = &mut *guard;

        let open_before = state.registry.len();
        let (room, created) = match state
            .registry
            .ensure(room_id, normalize_passcode(passcode))
        {
            Ok(entry) => entry,
            Err(e) => {
                self.record_rejection(&e);
                return Err(e);
            }
        };
        if let Err(e) = room.check_passcode(passcode) {
            self.record_rejection(&e);
            return Err(e);
        }

        let role = room.assign_role(connection);
        let restart = room.players().is_full();
        let initial_state = room.game_state().clone();

        if created {
            self.on_room_created(state, open_before + 1);
        }
        self.bind(
            state,
            connection,
            room_id,
            role,
            Some(initial_state),
            restart,
            JoinSource::JoinRoom,
        );
        Ok(role)
    }

    /// Seat an anonymous caller in an open public room or a new one
    pub fn find_public_room(&self, connection: ConnectionId) -> RoomResult<Assignment> {
        let mut guard = self.lock()?;
        let state = &mut *guard;

        let open_before = state.registry.len();
        let assignment = match self
            .matchmaker
            .find_public_room(&mut state.registry, connection)
        {
            Ok(assignment) => assignment,
            Err(e) => {
                self.record_rejection(&e);
                return Err(e);
            }
        };

        let open_after = state.registry.len();
        if open_after > open_before {
            self.on_room_created(state, open_after);
        }
        self.bind(
            state,
            connection,
            &assignment.room_id,
            assignment.role,
            assignment.initial_state.clone(),
            assignment.filled_room,
            JoinSource::Matchmaking,
        );
        Ok(assignment)
    }

    /// Apply a move and relay it to the rest of the room.
    ///
    /// Moves for unknown rooms are dropped and yield `Ok(None)`.
    pub fn send_move(
        &self,
        connection: ConnectionId,
        room_id: &str,
        index: usize,
    ) -> RoomResult<Option<MoveOutcome>> {
        let mut guard = self.lock()?;
        let state = &mut *guard;

        let Some(room) = state.registry.get_mut(room_id) else {
            debug!(
                "Move {} from {} targets unknown room '{}', dropped",
                index, connection, room_id
            );
            if let Some(metrics) = self.metrics() {
                metrics.record_dropped_event("room_not_found");
            }
            return Ok(None);
        };

        if self.config.enforce_turn_order {
            let to_move = room.game_state().next_mark();
            if room.players().get(to_move) != Some(connection) {
                return Err(RoomError::NotYourTurn {
                    room_id: room_id.to_string(),
                });
            }
        }

        let outcome = room.game_state_mut().apply_move(index)?;
        if let Some(winner) = room.game_state().winner() {
            // Clients decide when a game is over; later moves still apply.
            debug!("Room '{}' shows a winning line for {}", room_id, winner);
        }

        let recipients = state.hub.publish(
            room_id,
            &ServerEvent::ReceiveMove(RelayedMove { index }),
            Some(connection),
        );
        state.stats.moves_relayed += 1;
        if let Some(metrics) = self.metrics() {
            metrics.record_move();
        }

        debug!(
            "Relayed {} at {} in room '{}' (evicted: {:?}) to {} member(s)",
            outcome.mark, index, room_id, outcome.evicted, recipients
        );
        Ok(Some(outcome))
    }

    /// Put a fresh board in the room and tell every member, requester included.
    ///
    /// Returns false when the room does not exist.
    pub fn request_reset(&self, connection: ConnectionId, room_id: &str) -> RoomResult<bool> {
        let mut guard = self.lock()?;
        let state = &mut *guard;

        let Some(room) = state.registry.get_mut(room_id) else {
            debug!(
                "Reset from {} targets unknown room '{}', dropped",
                connection, room_id
            );
            if let Some(metrics) = self.metrics() {
                metrics.record_dropped_event("room_not_found");
            }
            return Ok(false);
        };

        room.reset();
        state.hub.publish(room_id, &ServerEvent::ResetGame, None);
        state.stats.resets_requested += 1;
        if let Some(metrics) = self.metrics() {
            metrics.record_reset("requested");
        }

        info!("Room '{}' reset by {}", room_id, connection);
        Ok(true)
    }

    /// Release every seat the connection holds and forget it.
    ///
    /// Rooms left with no seated player are removed.
    pub fn disconnect(&self, connection: ConnectionId) -> RoomResult<()> {
        let mut guard = self.lock()?;
        let state = &mut *guard;

        let room_ids = match state.sessions.remove(&connection) {
            Some(session) => {
                debug!(
                    "Session {} ends after {}s in {} room(s)",
                    session.id(),
                    session.lifetime().num_seconds(),
                    session.room_ids().len()
                );
                session.room_ids()
            }
            None => Vec::new(),
        };
        state.hub.unregister(connection);

        for room_id in room_ids {
            let Some(room) = state.registry.get_mut(&room_id) else {
                continue;
            };
            if let Some(mark) = room.release(connection) {
                info!("{} left seat {} in room '{}'", connection, mark, room_id);
            }
            let abandoned = room.is_abandoned();

            self.presence.notify(&state.registry, &state.hub, &room_id);

            if abandoned {
                state.registry.remove(&room_id);
                for member in state.hub.dissolve(&room_id) {
                    if let Some(session) = state.sessions.get_mut(&member) {
                        session.unbind(&room_id);
                    }
                }
                state.stats.rooms_removed += 1;
                state.stats.active_rooms = state.registry.len();
                if let Some(metrics) = self.metrics() {
                    metrics.record_room_removed(state.registry.len());
                }
            }
        }

        state.stats.active_connections = state.sessions.len();
        if let Some(metrics) = self.metrics() {
            metrics.set_connections(state.sessions.len());
        }
        info!(
            "Connection {} closed - live connections: {}, open rooms: {}",
            connection,
            state.sessions.len(),
            state.registry.len()
        );
        Ok(())
    }

    fn on_room_created(&self, state: &mut CoordinatorState, open_rooms: usize) {
        state.stats.rooms_created += 1;
        state.stats.active_rooms = open_rooms;
        if let Some(metrics) = self.metrics() {
            metrics.record_room_created(open_rooms);
        }
    }

    fn record_rejection(&self, e: &RoomError) {
        if let Some(metrics) = self.metrics() {
            metrics.record_join_rejected(e.kind());
        }
    }

    /// Common tail of every successful join: bind, tell the caller its role,
    /// start a fresh match when asked to, then broadcast presence.
    #[allow(clippy::too_many_arguments)]
    fn bind(
        &self,
        state: &mut CoordinatorState,
        connection: ConnectionId,
        room_id: &str,
        role: Role,
        initial_state: Option<GameState>,
        restart: bool,
        source: JoinSource,
    ) {
        state.hub.join(room_id, connection);
        state
            .sessions
            .entry(connection)
            .or_insert_with(|| Session::new(connection))
            .bind(room_id, role);

        state.hub.send_to(
            connection,
            ServerEvent::AssignRole(RoleAssignment {
                role,
                room_id: room_id.to_string(),
                initial_state,
            }),
        );
        if let Some(metrics) = self.metrics() {
            metrics.record_join(role, source.label());
        }
        info!(
            "{} joined room '{}' as {} via {}",
            connection,
            room_id,
            role,
            source.label()
        );

        if restart {
            self.start_match(state, room_id);
        }
        self.presence.notify(&state.registry, &state.hub, room_id);
    }

    /// Both seats are occupied after a join: everyone starts from a fresh board
    fn start_match(&self, state: &mut CoordinatorState, room_id: &str) {
        let Some(room) = state.registry.get_mut(room_id) else {
            return;
        };
        room.reset();
        state.hub.publish(room_id, &ServerEvent::ResetGame, None);
        state.stats.matches_started += 1;
        if let Some(metrics) = self.metrics() {
            metrics.record_reset("seats_filled");
        }
        info!("Both seats occupied in room '{}', starting a fresh match", room_id);
    }

    /// Current board of a room
    pub fn room_state(&self, room_id: &str) -> Option<GameState> {
        let state = self.lock().ok()?;
        state
            .registry
            .get(room_id)
            .map(|room| room.game_state().clone())
    }

    /// Current seat occupancy of a room
    pub fn room_players(&self, room_id: &str) -> Option<PlayerSlots> {
        let state = self.lock().ok()?;
        state
            .registry
            .get(room_id)
            .map(|room| room.players().clone())
    }

    pub fn room_exists(&self, room_id: &str) -> bool {
        self.lock()
            .map(|state| state.registry.contains(room_id))
            .unwrap_or(false)
    }

    pub fn room_count(&self) -> usize {
        self.lock().map(|state| state.registry.len()).unwrap_or(0)
    }

    pub fn connection_count(&self) -> usize {
        self.lock().map(|state| state.sessions.len()).unwrap_or(0)
    }

    /// Protocol state of a connection; unknown connections are unbound
    pub fn session_state(&self, connection: ConnectionId) -> SessionState {
        self.lock()
            .ok()
            .and_then(|state| state.sessions.get(&connection).map(Session::state))
            .unwrap_or(SessionState::Unbound)
    }

    /// Summaries of every open room, in creation order
    pub fn room_summaries(&self) -> Vec<RoomSummary> {
        let Ok(state) = self.lock() else {
            return Vec::new();
        };
        state
            .registry
            .iter()
            .map(|room| RoomSummary {
                room_id: room.id().to_string(),
                public: room.is_public(),
                players: room.players().occupied(),
                members: state.hub.members(room.id()).len(),
                created_at: room.created_at(),
            })
            .collect()
    }

    pub fn stats(&self) -> CoordinatorStats {
        self.lock()
            .map(|state| state.stats.clone())
            .unwrap_or_default()
    }
}

impl Default for SessionCoordinator {
    fn default() -> Self {
        Self::new(CoordinatorConfig::default())
    }
}
