//! StopTransaction handler

use rust_ocpp::v1_6::messages::stop_transaction::{
    StopTransactionRequest, StopTransactionResponse,
};
use serde_json::Value;
use tracing::info;

use super::handle_authorize::id_tag_info;
use super::handle_meter_values::raw_samples;
use crate::application::handlers::{parse_request, respond, wire_name, Dispatcher, HandlerResult};
use crate::application::services::StopRequest;

pub async fn handle_stop_transaction(
    ctx: &Dispatcher,
    charge_point_id: &str,
    payload: &Value,
) -> HandlerResult {
    let req: StopTransactionRequest = parse_request("StopTransaction", payload)?;

    info!(
        charge_point_id,
        transaction_id = req.transaction_id,
        meter_stop = req.meter_stop,
        reason = ?req.reason,
        "StopTransaction"
    );

    // Inline readings are tagged with the connector the transaction ran on.
    let connector_id = ctx
        .services
        .transactions
        .find(req.transaction_id)
        .await?
        .map(|tx| tx.connector_id)
        .unwrap_or(0);

    let authorization = ctx
        .services
        .transactions
        .stop_transaction(
            charge_point_id,
            StopRequest {
                transaction_id: req.transaction_id,
                id_tag: req.id_tag.clone(),
                meter_stop: req.meter_stop,
                timestamp: req.timestamp,
                reason: req.reason.as_ref().and_then(wire_name),
            },
        )
        .await?;

    if let Some(data) = req.transaction_data.as_deref() {
        ctx.services
            .meter_values
            .ingest(
                charge_point_id,
                connector_id,
                Some(req.transaction_id),
                raw_samples(data),
            )
            .await?;
    }

    respond(&StopTransactionResponse {
        id_tag_info: Some(id_tag_info(&authorization)),
    })
}
