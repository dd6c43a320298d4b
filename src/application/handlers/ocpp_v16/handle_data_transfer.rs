//! DataTransfer handler

use rust_ocpp::v1_6::messages::data_transfer::{DataTransferRequest, DataTransferResponse};
use rust_ocpp::v1_6::types::DataTransferStatus;
use serde_json::Value;
use tracing::info;

use crate::application::handlers::{parse_request, respond, Dispatcher, HandlerResult};

/// Vendor extensions are accepted without interpretation.
pub async fn handle_data_transfer(_ctx: &Dispatcher, charge_point_id: &str, payload: &Value) -> HandlerResult {
    let req: DataTransferRequest = parse_request("DataTransfer", payload)?;

    info!(
        charge_point_id,
        vendor_id = req.vendor_string.as_str(),
        message_id = ?req.message_id,
        "DataTransfer"
    );

    respond(&DataTransferResponse {
        status: DataTransferStatus::Accepted,
        data: None,
    })
}
