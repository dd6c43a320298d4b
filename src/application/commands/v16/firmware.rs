//! Firmware management profile
//!
//! Both calls only start the station-side job; progress comes back later as
//! FirmwareStatusNotification / DiagnosticsStatusNotification.

use chrono::{DateTime, Utc};
use rust_ocpp::v1_6::messages::get_diagnostics::{GetDiagnosticsRequest, GetDiagnosticsResponse};
use rust_ocpp::v1_6::messages::update_firmware::UpdateFirmwareRequest;
use serde_json::Value;
use tracing::info;

use super::exchange;
use crate::application::commands::{CommandError, SharedCommandSender};

/// The reply is an empty object.
pub async fn update_firmware(
    commands: &SharedCommandSender,
    charge_point_id: &str,
    location: &str,
    retrieve_date: DateTime<Utc>,
    retries: Option<i32>,
    retry_interval: Option<i32>,
) -> Result<(), CommandError> {
    info!(charge_point_id, location, %retrieve_date, "UpdateFirmware");
    let request = UpdateFirmwareRequest {
        location: location.to_string(),
        retries,
        retrieve_date,
        retry_interval,
    };
    let _: Value = exchange(commands, charge_point_id, "UpdateFirmware", &request).await?;
    Ok(())
}

/// Returns the file name the station will upload, if it reported one.
pub async fn get_diagnostics(
    commands: &SharedCommandSender,
    charge_point_id: &str,
    location: &str,
    retries: Option<i32>,
    retry_interval: Option<i32>,
    start_time: Option<DateTime<Utc>>,
    stop_time: Option<DateTime<Utc>>,
) -> Result<Option<String>, CommandError> {
    info!(charge_point_id, location, "GetDiagnostics");
    let request = GetDiagnosticsRequest {
        location: location.to_string(),
        retries,
        retry_interval,
        start_time,
        stop_time,
    };
    let response: GetDiagnosticsResponse =
        exchange(commands, charge_point_id, "GetDiagnostics", &request).await?;
    Ok(response.file_name)
}
