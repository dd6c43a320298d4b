//! MeterValues handler

use rust_ocpp::v1_6::messages::meter_values::{MeterValuesRequest, MeterValuesResponse};
use rust_ocpp::v1_6::types::MeterValue;
use serde_json::Value;
use tracing::info;

use crate::application::handlers::{parse_request, respond, wire_name, Dispatcher, HandlerResult};
use crate::application::services::RawSample;

pub async fn handle_meter_values(ctx: &Dispatcher, charge_point_id: &str, payload: &Value) -> HandlerResult {
    let req: MeterValuesRequest = parse_request("MeterValues", payload)?;

    info!(
        charge_point_id,
        connector_id = req.connector_id,
        transaction_id = ?req.transaction_id,
        samples = req.meter_value.len(),
        "MeterValues"
    );

    ctx.services
        .meter_values
        .ingest(
            charge_point_id,
            req.connector_id,
            req.transaction_id,
            raw_samples(&req.meter_value),
        )
        .await?;

    respond(&MeterValuesResponse {})
}

/// Flatten meter values into samples, keeping the wire spelling of each enum.
pub(super) fn raw_samples(meter_values: &[MeterValue]) -> Vec<RawSample> {
    meter_values
        .iter()
        .flat_map(|mv| {
            mv.sampled_value.iter().map(move |sv| RawSample {
                timestamp: mv.timestamp,
                value: sv.value.clone(),
                context: sv.context.as_ref().and_then(wire_name),
                format: sv.format.as_ref().and_then(wire_name),
                measurand: sv.measurand.as_ref().and_then(wire_name),
                phase: sv.phase.as_ref().and_then(wire_name),
                location: sv.location.as_ref().and_then(wire_name),
                unit: sv.unit.as_ref().and_then(wire_name),
            })
        })
        .collect()
}
