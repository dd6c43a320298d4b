//! StatusNotification handler

use rust_ocpp::v1_6::messages::status_notification::{
    StatusNotificationRequest, StatusNotificationResponse,
};
use serde_json::Value;
use tracing::info;

use crate::application::handlers::{
    convert, parse_request, respond, wire_name, Dispatcher, HandlerResult,
};
use crate::domain::ConnectorStatus;

pub async fn handle_status_notification(
    ctx: &Dispatcher,
    charge_point_id: &str,
    payload: &Value,
) -> HandlerResult {
    let req: StatusNotificationRequest = parse_request("StatusNotification", payload)?;

    info!(
        charge_point_id,
        connector_id = req.connector_id,
        status = ?req.status,
        error_code = ?req.error_code,
        "StatusNotification"
    );

    let connector_status: ConnectorStatus = convert(&req.status)?;

    ctx.services
        .charge_points
        .update_connector_status(
            charge_point_id,
            req.connector_id,
            connector_status,
            wire_name(&req.error_code),
            req.info,
        )
        .await?;

    respond(&StatusNotificationResponse {})
}
