//! Local auth list management profile

use rust_ocpp::v1_6::messages::get_local_list_version::{
    GetLocalListVersionRequest, GetLocalListVersionResponse,
};
use rust_ocpp::v1_6::messages::send_local_list::{SendLocalListRequest, SendLocalListResponse};
use rust_ocpp::v1_6::types::{AuthorizationData, IdTagInfo};
use tracing::info;

use super::{exchange, retype, status_text};
use crate::application::commands::{CommandError, LocalAuthEntry, SharedCommandSender};
use crate::domain::UpdateType;

fn authorization_data(entry: LocalAuthEntry) -> Result<AuthorizationData, CommandError> {
    let id_tag_info = match entry.status {
        Some(status) => Some(IdTagInfo {
            status: retype(&status)?,
            expiry_date: entry.expiry_date,
            parent_id_tag: entry.parent_id_tag,
        }),
        None => None,
    };
    Ok(AuthorizationData {
        id_tag: entry.id_tag,
        id_tag_info,
    })
}

pub async fn send_local_list(
    commands: &SharedCommandSender,
    charge_point_id: &str,
    list_version: i32,
    update_type: UpdateType,
    entries: Vec<LocalAuthEntry>,
) -> Result<String, CommandError> {
    info!(
        charge_point_id,
        list_version,
        ?update_type,
        entries = entries.len(),
        "SendLocalList"
    );
    let list = entries
        .into_iter()
        .map(authorization_data)
        .collect::<Result<Vec<_>, _>>()?;
    let request = SendLocalListRequest {
        list_version,
        local_authorization_list: Some(list),
        update_type: retype(&update_type)?,
    };
    let response: SendLocalListResponse =
        exchange(commands, charge_point_id, "SendLocalList", &request).await?;
    Ok(status_text(&response.status))
}

pub async fn get_local_list_version(
    commands: &SharedCommandSender,
    charge_point_id: &str,
) -> Result<i32, CommandError> {
    info!(charge_point_id, "GetLocalListVersion");
    let response: GetLocalListVersionResponse = exchange(
        commands,
        charge_point_id,
        "GetLocalListVersion",
        &GetLocalListVersionRequest {},
    )
    .await?;
    Ok(response.list_version)
}
