//! Reservation profile

use chrono::{DateTime, Utc};
use rust_ocpp::v1_6::messages::cancel_reservation::{
    CancelReservationRequest, CancelReservationResponse,
};
use rust_ocpp::v1_6::messages::reserve_now::{ReserveNowRequest, ReserveNowResponse};
use tracing::info;

use super::{exchange, status_text};
use crate::application::commands::{CommandError, SharedCommandSender};

pub async fn reserve_now(
    commands: &SharedCommandSender,
    charge_point_id: &str,
    reservation_id: i32,
    connector_id: u32,
    id_tag: &str,
    parent_id_tag: Option<&str>,
    expiry_date: DateTime<Utc>,
) -> Result<String, CommandError> {
    info!(
        charge_point_id,
        reservation_id,
        connector_id,
        id_tag,
        %expiry_date,
        "ReserveNow"
    );
    let request = ReserveNowRequest {
        connector_id,
        expiry_date,
        id_tag: id_tag.to_string(),
        parent_id_tag: parent_id_tag.map(str::to_string),
        reservation_id,
    };
    let response: ReserveNowResponse =
        exchange(commands, charge_point_id, "ReserveNow", &request).await?;
    Ok(status_text(&response.status))
}

pub async fn cancel_reservation(
    commands: &SharedCommandSender,
    charge_point_id: &str,
    reservation_id: i32,
) -> Result<String, CommandError> {
    info!(charge_point_id, reservation_id, "CancelReservation");
    let response: CancelReservationResponse = exchange(
        commands,
        charge_point_id,
        "CancelReservation",
        &CancelReservationRequest { reservation_id },
    )
    .await?;
    Ok(status_text(&response.status))
}
