//! OCPP 1.6 action handlers
//!
//! Actions are dispatched by string name (parsed from `OcppFrame::Call`).
//! Payloads are deserialized into `rust_ocpp::v1_6` types within each handler.

use serde_json::Value;

use super::{Dispatcher, HandlerResult};

mod handle_authorize;
mod handle_boot_notification;
mod handle_data_transfer;
mod handle_diagnostics_status_notification;
mod handle_firmware_status_notification;
mod handle_heartbeat;
mod handle_meter_values;
mod handle_server_actions;
mod handle_start_transaction;
mod handle_status_notification;
mod handle_stop_transaction;

pub use handle_authorize::handle_authorize;
pub use handle_boot_notification::handle_boot_notification;
pub use handle_data_transfer::handle_data_transfer;
pub use handle_diagnostics_status_notification::handle_diagnostics_status_notification;
pub use handle_firmware_status_notification::handle_firmware_status_notification;
pub use handle_heartbeat::handle_heartbeat;
pub use handle_meter_values::handle_meter_values;
pub use handle_server_actions::{
    handle_change_configuration, handle_get_configuration, handle_get_local_list_version,
    handle_optimistic,
};
pub use handle_start_transaction::handle_start_transaction;
pub use handle_status_notification::handle_status_notification;
pub use handle_stop_transaction::handle_stop_transaction;

/// Routes an OCPP 1.6 action to its handler. `None` means the action is not
/// in the table.
pub async fn v16_action_matcher(
    ctx: &Dispatcher,
    charge_point_id: &str,
    action: &str,
    payload: &Value,
) -> Option<HandlerResult> {
    let result = match action {
        "Authorize" => handle_authorize(ctx, charge_point_id, payload).await,
        "BootNotification" => handle_boot_notification(ctx, charge_point_id, payload).await,
        "DataTransfer" => handle_data_transfer(ctx, charge_point_id, payload).await,
        "DiagnosticsStatusNotification" => {
            handle_diagnostics_status_notification(ctx, charge_point_id, payload).await
        }
        "FirmwareStatusNotification" => {
            handle_firmware_status_notification(ctx, charge_point_id, payload).await
        }
        "Heartbeat" => handle_heartbeat(ctx, charge_point_id, payload).await,
        "MeterValues" => handle_meter_values(ctx, charge_point_id, payload).await,
        "StartTransaction" => handle_start_transaction(ctx, charge_point_id, payload).await,
        "StatusNotification" => handle_status_notification(ctx, charge_point_id, payload).await,
        "StopTransaction" => handle_stop_transaction(ctx, charge_point_id, payload).await,

        // Normally issued by the server; answered from local state when received.
        "GetConfiguration" => handle_get_configuration(ctx, charge_point_id, payload).await,
        "ChangeConfiguration" => handle_change_configuration(charge_point_id, payload),
        "GetLocalListVersion" => handle_get_local_list_version(ctx, charge_point_id).await,
        other if is_cs_to_cp_action(other) => handle_optimistic(charge_point_id, other),

        _ => return None,
    };
    Some(result)
}

/// Actions the server normally sends to stations.
pub fn is_cs_to_cp_action(action: &str) -> bool {
    matches!(
        action,
        "CancelReservation"
            | "ChangeAvailability"
            | "ChangeConfiguration"
            | "ClearCache"
            | "ClearChargingProfile"
            | "GetCompositeSchedule"
            | "GetConfiguration"
            | "GetDiagnostics"
            | "GetLocalListVersion"
            | "RemoteStartTransaction"
            | "RemoteStopTransaction"
            | "ReserveNow"
            | "Reset"
            | "SendLocalList"
            | "SetChargingProfile"
            | "TriggerMessage"
            | "UnlockConnector"
            | "UpdateFirmware"
    )
}
