//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::interfaces::http::ApiState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub connected_charge_points: usize,
    pub pending_commands: usize,
}

pub async fn health_check(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        connected_charge_points: state.registry.count(),
        pending_commands: state.commands.pending_count(),
    })
}
