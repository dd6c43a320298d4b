//! Operator transaction handlers

use axum::{
    extract::{Path, State},
    Json,
};

use super::commands::status_for_domain;
use super::dto::AdminStopBody;
use crate::domain::Transaction;
use crate::interfaces::http::common::{api_error, ApiResponse, ApiResult};
use crate::interfaces::http::ApiState;

/// Close a transaction without a station message. The body is optional.
pub async fn stop_transaction(
    State(state): State<ApiState>,
    Path(transaction_id): Path<i32>,
    body: Option<Json<AdminStopBody>>,
) -> ApiResult<Transaction> {
    let meter_stop = body.and_then(|Json(b)| b.meter_stop);
    match state
        .services
        .transactions
        .stop_transaction_admin(transaction_id, meter_stop)
        .await
    {
        Ok(transaction) => Ok(Json(ApiResponse::success(transaction))),
        Err(e) => Err(api_error(status_for_domain(&e), e.to_string())),
    }
}
