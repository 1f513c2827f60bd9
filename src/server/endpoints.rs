//! Health, metrics and stats endpoints

use crate::server::ServerState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::{debug, error};

/// Root endpoint handler - shows service information
pub async fn root_handler(State(state): State<ServerState>) -> impl IntoResponse {
    Json(json!({
        "service": state.service_name,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": ["/ws", "/health", "/metrics", "/stats"]
    }))
}

/// Liveness endpoint handler
pub async fn health_handler(State(state): State<ServerState>) -> impl IntoResponse {
    debug!("Health check requested");
    let uptime = crate::utils::current_timestamp() - state.started_at;
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": state.service_name,
            "version": env!("CARGO_PKG_VERSION"),
            "uptime_seconds": uptime.num_seconds(),
            "rooms": state.coordinator.room_count(),
            "connections": state.coordinator.connection_count(),
        })),
    )
}

/// Prometheus metrics endpoint handler
pub async fn metrics_handler(State(state): State<ServerState>) -> impl IntoResponse {
    match state.metrics.gather_text() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        ),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain")],
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}

/// Room and connection statistics
pub async fn stats_handler(State(state): State<ServerState>) -> impl IntoResponse {
    let coordinator = &state.coordinator;
    Json(json!({
        "stats": coordinator.stats(),
        "capacity": coordinator.config().max_rooms,
        "rooms": coordinator.room_summaries(),
    }))
}
