//! OCPP 1.6 typed commands
//!
//! One function per server-initiated action, grouped by feature profile. Each
//! builds its `rust_ocpp::v1_6` request, goes through [`exchange`] and returns
//! the station's answer as a status string or a small result struct.

mod core_profile;
mod firmware;
mod local_list;
mod reservation;
mod smart_charging;
mod trigger;

pub use core_profile::{
    change_configuration, clear_cache, data_transfer, get_configuration,
    remote_start_transaction, remote_stop_transaction, reset, unlock_connector,
};
pub use firmware::{get_diagnostics, update_firmware};
pub use local_list::{get_local_list_version, send_local_list};
pub use reservation::{cancel_reservation, reserve_now};
pub use smart_charging::{clear_charging_profile, get_composite_schedule, set_charging_profile};
pub use trigger::trigger_message;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::{from_payload, to_payload, CommandError, SharedCommandSender};

/// Send `request` as `action` and decode the station's reply as `Resp`.
async fn exchange<Req, Resp>(
    commands: &SharedCommandSender,
    charge_point_id: &str,
    action: &'static str,
    request: &Req,
) -> Result<Resp, CommandError>
where
    Req: Serialize,
    Resp: DeserializeOwned,
{
    let reply = commands
        .send_command(charge_point_id, action, to_payload(request)?)
        .await?;
    debug!(charge_point_id, action, %reply, "v1.6 reply");
    from_payload(reply)
}

/// Re-type a value between two enums that share a wire spelling, e.g. a domain
/// `ChargingRateUnit` into its rust-ocpp twin.
fn retype<T: Serialize, U: DeserializeOwned>(value: &T) -> Result<U, CommandError> {
    to_payload(value).and_then(|v| {
        serde_json::from_value(v)
            .map_err(|e| CommandError::SendFailed(format!("No v1.6 equivalent: {}", e)))
    })
}

/// Wire spelling of a response status enum.
fn status_text<T: Serialize>(status: &T) -> String {
    match serde_json::to_value(status) {
        Ok(Value::String(s)) => s,
        Ok(other) => other.to_string(),
        Err(_) => "Unknown".to_string(),
    }
}
