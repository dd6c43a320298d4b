//! Heartbeat handler

use chrono::Utc;
use rust_ocpp::v1_6::messages::heart_beat::HeartbeatResponse;
use serde_json::Value;
use tracing::debug;

use crate::application::handlers::{respond, Dispatcher, HandlerResult};

pub async fn handle_heartbeat(ctx: &Dispatcher, charge_point_id: &str, _payload: &Value) -> HandlerResult {
    debug!(charge_point_id, "Heartbeat");

    ctx.services.charge_points.heartbeat(charge_point_id).await?;

    respond(&HeartbeatResponse {
        current_time: Utc::now(),
    })
}
