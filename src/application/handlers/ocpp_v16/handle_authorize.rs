//! Authorize handler

use rust_ocpp::v1_6::messages::authorize::{AuthorizeRequest, AuthorizeResponse};
use rust_ocpp::v1_6::types::{AuthorizationStatus, IdTagInfo};
use serde_json::Value;
use tracing::info;

use crate::application::handlers::{parse_request, respond, Dispatcher, HandlerResult};
use crate::domain::{self, AuthorizationResult};

pub async fn handle_authorize(ctx: &Dispatcher, charge_point_id: &str, payload: &Value) -> HandlerResult {
    let req: AuthorizeRequest = parse_request("Authorize", payload)?;

    let result = ctx.services.authorization.authorize(&req.id_tag).await?;
    info!(
        charge_point_id,
        id_tag = req.id_tag.as_str(),
        status = %result.status,
        "Authorize"
    );

    respond(&AuthorizeResponse {
        id_tag_info: id_tag_info(&result),
    })
}

/// Wire form of an authorization outcome, shared with the transaction handlers.
pub(super) fn id_tag_info(result: &AuthorizationResult) -> IdTagInfo {
    let status = match result.status {
        domain::AuthorizationStatus::Accepted => AuthorizationStatus::Accepted,
        domain::AuthorizationStatus::Blocked => AuthorizationStatus::Blocked,
        domain::AuthorizationStatus::Expired => AuthorizationStatus::Expired,
        domain::AuthorizationStatus::Invalid => AuthorizationStatus::Invalid,
        domain::AuthorizationStatus::ConcurrentTx => AuthorizationStatus::ConcurrentTx,
    };
    IdTagInfo {
        status,
        expiry_date: result.expiry_date,
        parent_id_tag: result.parent_id_tag.clone(),
    }
}
