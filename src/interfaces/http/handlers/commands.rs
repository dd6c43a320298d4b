//! Remote command handler
//!
//! `POST /api/v1/stations/{id}/commands/{action}` issues a server-direction
//! OCPP 1.6 action with the request body as its payload. Actions with a
//! service behind them (reservations, profiles, firmware, local lists) go
//! through that service so the stores follow the station; the rest use the
//! typed command or, failing that, the raw `issue_command`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::dto::{
    CancelReservationBody, ChangeConfigurationBody, ClearChargingProfileBody, DataTransferBody,
    GetCompositeScheduleBody, GetConfigurationBody, GetDiagnosticsBody, RemoteStartBody,
    RemoteStopBody, ReserveNowBody, ResetBody, SendLocalListBody, SetChargingProfileBody,
    TriggerMessageBody, UnlockConnectorBody, UpdateFirmwareBody,
};
use crate::application::commands::{issue_command, to_payload, v16, CommandError, LocalAuthEntry};
use crate::application::handlers::ocpp_v16::is_cs_to_cp_action;
use crate::application::services::{remote_trigger, ServiceError};
use crate::domain::{DomainError, ProfileFilter};
use crate::interfaces::http::common::{api_error, ApiResponse, ApiResult};
use crate::interfaces::http::ApiState;

pub(crate) fn status_for(error: &CommandError) -> StatusCode {
    match error {
        CommandError::NotConnected(_) => StatusCode::CONFLICT,
        CommandError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        CommandError::CallError { .. } | CommandError::InvalidResponse(_) => StatusCode::BAD_GATEWAY,
        CommandError::Validation(_) => StatusCode::BAD_REQUEST,
        CommandError::SendFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn status_for_domain(error: &DomainError) -> StatusCode {
    match error {
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::Conflict(_) | DomainError::ChargePointOffline(_) => StatusCode::CONFLICT,
        DomainError::CommandTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
    }
}

fn status_for_service(error: &ServiceError) -> StatusCode {
    match error {
        ServiceError::Domain(e) => status_for_domain(e),
        ServiceError::Command(e) => status_for(e),
    }
}

fn body<T: DeserializeOwned>(action: &str, payload: Value) -> Result<T, ServiceError> {
    serde_json::from_value(payload)
        .map_err(|e| DomainError::Validation(format!("Invalid {action} body: {e}")).into())
}

fn reply<T: Serialize>(value: &T) -> Result<Value, ServiceError> {
    Ok(to_payload(value)?)
}

fn status(status: String) -> Value {
    json!({ "status": status })
}

async fn run_command(
    state: &ApiState,
    charge_point_id: &str,
    action: &str,
    payload: Value,
) -> Result<Value, ServiceError> {
    let commands = &state.commands;
    let services = &state.services;

    match action {
        // ── Core profile ───────────────────────────────────────
        "RemoteStartTransaction" => {
            let b: RemoteStartBody = body(action, payload)?;
            let s = v16::remote_start_transaction(commands, charge_point_id, &b.id_tag, b.connector_id)
                .await?;
            Ok(status(s))
        }
        "RemoteStopTransaction" => {
            let b: RemoteStopBody = body(action, payload)?;
            Ok(status(
                v16::remote_stop_transaction(commands, charge_point_id, b.transaction_id).await?,
            ))
        }
        "Reset" => {
            let b: ResetBody = body(action, payload)?;
            Ok(status(v16::reset(commands, charge_point_id, b.kind).await?))
        }
        "UnlockConnector" => {
            let b: UnlockConnectorBody = body(action, payload)?;
            Ok(status(
                v16::unlock_connector(commands, charge_point_id, b.connector_id).await?,
            ))
        }
        "ClearCache" => Ok(status(v16::clear_cache(commands, charge_point_id).await?)),
        "GetConfiguration" => {
            let b: GetConfigurationBody = body(action, payload)?;
            reply(&v16::get_configuration(commands, charge_point_id, b.key).await?)
        }
        "ChangeConfiguration" => {
            let b: ChangeConfigurationBody = body(action, payload)?;
            let s = v16::change_configuration(commands, charge_point_id, &b.key, &b.value).await?;
            if s == "Accepted" || s == "RebootRequired" {
                let stored = services
                    .configuration
                    .change(charge_point_id, &b.key, &b.value)
                    .await?;
                info!(charge_point_id, key = b.key.as_str(), ?stored, "Configuration mirrored");
            }
            Ok(status(s))
        }
        "DataTransfer" => {
            let b: DataTransferBody = body(action, payload)?;
            reply(&v16::data_transfer(commands, charge_point_id, &b.vendor_id, b.message_id, b.data).await?)
        }

        // ── Reservation ────────────────────────────────────────
        "ReserveNow" => {
            let b: ReserveNowBody = body(action, payload)?;
            let outcome = services
                .reservations
                .reserve_now(
                    charge_point_id,
                    b.connector_id,
                    &b.id_tag,
                    b.parent_id_tag.as_deref(),
                    b.expiry_date,
                )
                .await?;
            reply(&outcome)
        }
        "CancelReservation" => {
            let b: CancelReservationBody = body(action, payload)?;
            match services.reservations.find(b.reservation_id).await? {
                Some(r) if r.charge_point_id == charge_point_id => {}
                _ => {
                    return Err(
                        DomainError::not_found("Reservation", "id", b.reservation_id).into(),
                    )
                }
            }
            Ok(status(
                services.reservations.cancel_reservation(b.reservation_id).await?,
            ))
        }

        // ── Smart charging ─────────────────────────────────────
        "SetChargingProfile" => {
            let b: SetChargingProfileBody = body(action, payload)?;
            Ok(status(
                services
                    .smart_charging
                    .set_charging_profile(charge_point_id, b.connector_id, b.cs_charging_profiles)
                    .await?,
            ))
        }
        "ClearChargingProfile" => {
            let b: ClearChargingProfileBody = body(action, payload)?;
            Ok(status(
                services
                    .smart_charging
                    .clear_charging_profile(charge_point_id, ProfileFilter::from(b))
                    .await?,
            ))
        }
        "GetCompositeSchedule" => {
            let b: GetCompositeScheduleBody = body(action, payload)?;
            reply(
                &services
                    .smart_charging
                    .get_composite_schedule(
                        charge_point_id,
                        b.connector_id,
                        b.duration,
                        b.charging_rate_unit,
                    )
                    .await?,
            )
        }

        // ── Firmware / diagnostics ─────────────────────────────
        "UpdateFirmware" => {
            let b: UpdateFirmwareBody = body(action, payload)?;
            reply(
                &services
                    .firmware
                    .update_firmware(
                        charge_point_id,
                        &b.location,
                        b.retrieve_date,
                        b.retries,
                        b.retry_interval,
                    )
                    .await?,
            )
        }
        "GetDiagnostics" => {
            let b: GetDiagnosticsBody = body(action, payload)?;
            reply(
                &services
                    .firmware
                    .get_diagnostics(
                        charge_point_id,
                        &b.location,
                        b.retries,
                        b.retry_interval,
                        b.start_time,
                        b.stop_time,
                    )
                    .await?,
            )
        }

        // ── Local list / trigger ───────────────────────────────
        "SendLocalList" => {
            let b: SendLocalListBody = body(action, payload)?;
            let entries: Vec<LocalAuthEntry> =
                b.local_authorization_list.into_iter().map(LocalAuthEntry::from).collect();
            Ok(status(
                services
                    .local_lists
                    .send_local_list(charge_point_id, b.list_version, b.update_type, entries)
                    .await?,
            ))
        }
        "GetLocalListVersion" => {
            let version = v16::get_local_list_version(commands, charge_point_id).await?;
            Ok(json!({ "listVersion": version }))
        }
        "TriggerMessage" => {
            let b: TriggerMessageBody = body(action, payload)?;
            Ok(status(
                remote_trigger::trigger_message(
                    commands,
                    charge_point_id,
                    &b.requested_message,
                    b.connector_id,
                )
                .await?,
            ))
        }

        _ => Ok(issue_command(commands, charge_point_id, action, payload).await?),
    }
}

pub async fn send_command(
    State(state): State<ApiState>,
    Path((charge_point_id, action)): Path<(String, String)>,
    Json(payload): Json<Value>,
) -> ApiResult<Value> {
    if !is_cs_to_cp_action(&action) && action != "DataTransfer" {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("'{}' is not a command the central system can send", action),
        ));
    }

    info!(charge_point_id = charge_point_id.as_str(), action = action.as_str(), "Admin command");
    match run_command(&state, &charge_point_id, &action, payload).await {
        Ok(response) => Ok(Json(ApiResponse::success(response))),
        Err(e) => {
            warn!(
                charge_point_id = charge_point_id.as_str(),
                action = action.as_str(),
                error = %e,
                "Admin command failed"
            );
            Err(api_error(status_for_service(&e), e.to_string()))
        }
    }
}
