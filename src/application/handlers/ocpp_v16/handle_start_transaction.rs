//! StartTransaction handler

use rust_ocpp::v1_6::messages::start_transaction::{
    StartTransactionRequest, StartTransactionResponse,
};
use serde_json::Value;
use tracing::info;

use super::handle_authorize::id_tag_info;
use crate::application::handlers::{parse_request, respond, Dispatcher, HandlerError, HandlerResult};
use crate::application::services::StartRequest;
use crate::domain::DomainError;

pub async fn handle_start_transaction(
    ctx: &Dispatcher,
    charge_point_id: &str,
    payload: &Value,
) -> HandlerResult {
    let req: StartTransactionRequest = parse_request("StartTransaction", payload)?;

    info!(
        charge_point_id,
        connector_id = req.connector_id,
        id_tag = req.id_tag.as_str(),
        meter_start = req.meter_start,
        reservation_id = ?req.reservation_id,
        "StartTransaction"
    );

    let outcome = ctx
        .services
        .transactions
        .start_transaction(
            charge_point_id,
            StartRequest {
                connector_id: req.connector_id,
                id_tag: req.id_tag,
                meter_start: req.meter_start,
                timestamp: req.timestamp,
                reservation_id: req.reservation_id,
            },
        )
        .await
        .map_err(|e| match e {
            DomainError::NotFound {
                entity: "ChargePoint",
                ..
            } => HandlerError::Generic("Charge point not registered".into()),
            other => other.into(),
        })?;

    respond(&StartTransactionResponse {
        transaction_id: outcome.transaction_id,
        id_tag_info: id_tag_info(&outcome.authorization),
    })
}
