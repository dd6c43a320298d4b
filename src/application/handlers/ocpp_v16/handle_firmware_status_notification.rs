//! FirmwareStatusNotification handler

use rust_ocpp::v1_6::messages::firmware_status_notification::{
    FirmwareStatusNotificationRequest, FirmwareStatusNotificationResponse,
};
use serde_json::Value;
use tracing::info;

use crate::application::handlers::{parse_request, respond, wire_name, Dispatcher, HandlerResult};

pub async fn handle_firmware_status_notification(
    ctx: &Dispatcher,
    charge_point_id: &str,
    payload: &Value,
) -> HandlerResult {
    let req: FirmwareStatusNotificationRequest = parse_request("FirmwareStatusNotification", payload)?;

    info!(charge_point_id, status = ?req.status, "FirmwareStatusNotification");

    let status = wire_name(&req.status).unwrap_or_default();
    ctx.services
        .firmware
        .record_firmware_status(charge_point_id, &status)
        .await?;

    respond(&FirmwareStatusNotificationResponse {})
}
