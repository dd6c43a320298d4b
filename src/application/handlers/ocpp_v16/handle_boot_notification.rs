//! BootNotification handler

use chrono::Utc;
use rust_ocpp::v1_6::messages::boot_notification::{
    BootNotificationRequest, BootNotificationResponse,
};
use rust_ocpp::v1_6::types::RegistrationStatus;
use serde_json::Value;
use tracing::info;

use crate::application::handlers::{parse_request, respond, Dispatcher, HandlerResult};
use crate::application::services::BootInfo;

pub async fn handle_boot_notification(
    ctx: &Dispatcher,
    charge_point_id: &str,
    payload: &Value,
) -> HandlerResult {
    let req: BootNotificationRequest = parse_request("BootNotification", payload)?;

    info!(
        charge_point_id,
        vendor = req.charge_point_vendor.as_str(),
        model = req.charge_point_model.as_str(),
        "BootNotification"
    );

    ctx.services
        .charge_points
        .register_boot(
            charge_point_id,
            BootInfo {
                vendor: req.charge_point_vendor,
                model: req.charge_point_model,
                serial_number: req.charge_point_serial_number,
                firmware_version: req.firmware_version,
            },
        )
        .await?;
    ctx.services.configuration.seed_defaults(charge_point_id).await?;

    respond(&BootNotificationResponse {
        current_time: Utc::now(),
        interval: ctx.heartbeat_interval,
        status: RegistrationStatus::Accepted,
    })
}
