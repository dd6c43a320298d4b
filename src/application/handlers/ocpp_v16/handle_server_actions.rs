//! Actions the server normally issues, answered when a station sends them.
//!
//! Configuration and local-list queries are answered from stored state.
//! Everything else, ChangeConfiguration included, is acknowledged with
//! `Accepted` and applied nowhere.

use rust_ocpp::v1_6::messages::change_configuration::{
    ChangeConfigurationRequest, ChangeConfigurationResponse,
};
use rust_ocpp::v1_6::messages::get_configuration::{
    GetConfigurationRequest, GetConfigurationResponse,
};
use rust_ocpp::v1_6::messages::get_local_list_version::GetLocalListVersionResponse;
use rust_ocpp::v1_6::types::{ConfigurationStatus, KeyValue};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::application::handlers::{parse_request, respond, Dispatcher, HandlerResult};

pub async fn handle_get_configuration(
    ctx: &Dispatcher,
    charge_point_id: &str,
    payload: &Value,
) -> HandlerResult {
    let req: GetConfigurationRequest = parse_request("GetConfiguration", payload)?;
    let keys = req.key.unwrap_or_default();

    let lookup = ctx.services.configuration.get(charge_point_id, &keys).await?;
    info!(
        charge_point_id,
        known = lookup.entries.len(),
        unknown = lookup.unknown_keys.len(),
        "GetConfiguration"
    );

    respond(&GetConfigurationResponse {
        configuration_key: Some(
            lookup
                .entries
                .into_iter()
                .map(|e| KeyValue {
                    key: e.key,
                    readonly: e.readonly,
                    value: e.value,
                })
                .collect(),
        ),
        unknown_key: Some(lookup.unknown_keys),
    })
}

pub fn handle_change_configuration(charge_point_id: &str, payload: &Value) -> HandlerResult {
    let req: ChangeConfigurationRequest = parse_request("ChangeConfiguration", payload)?;
    warn!(
        charge_point_id,
        key = req.key.as_str(),
        value = req.value.as_str(),
        "ChangeConfiguration received from charge point; acknowledged without applying"
    );
    respond(&ChangeConfigurationResponse {
        status: ConfigurationStatus::Accepted,
    })
}

pub async fn handle_get_local_list_version(ctx: &Dispatcher, charge_point_id: &str) -> HandlerResult {
    let list_version = ctx.services.local_lists.current_list_version(charge_point_id).await?;
    info!(charge_point_id, list_version, "GetLocalListVersion");
    respond(&GetLocalListVersionResponse { list_version })
}

pub fn handle_optimistic(charge_point_id: &str, action: &str) -> HandlerResult {
    warn!(charge_point_id, action, "Server-direction action received from charge point");
    Ok(json!({ "status": "Accepted" }))
}
