//! Core profile: configuration, cache, remote start/stop, reset, unlock,
//! vendor data transfer

use rust_ocpp::v1_6::messages::change_configuration::{
    ChangeConfigurationRequest, ChangeConfigurationResponse,
};
use rust_ocpp::v1_6::messages::clear_cache::{ClearCacheRequest, ClearCacheResponse};
use rust_ocpp::v1_6::messages::data_transfer::{DataTransferRequest, DataTransferResponse};
use rust_ocpp::v1_6::messages::get_configuration::{
    GetConfigurationRequest, GetConfigurationResponse,
};
use rust_ocpp::v1_6::messages::remote_start_transaction::{
    RemoteStartTransactionRequest, RemoteStartTransactionResponse,
};
use rust_ocpp::v1_6::messages::remote_stop_transaction::{
    RemoteStopTransactionRequest, RemoteStopTransactionResponse,
};
use rust_ocpp::v1_6::messages::reset::{ResetRequest, ResetResponse};
use rust_ocpp::v1_6::messages::unlock_connector::{
    UnlockConnectorRequest, UnlockConnectorResponse,
};
use tracing::info;

use super::{exchange, retype, status_text};
use crate::application::commands::{
    CommandError, ConfigurationResult, DataTransferResult, KeyValue, ResetKind,
    SharedCommandSender,
};

pub async fn change_configuration(
    commands: &SharedCommandSender,
    charge_point_id: &str,
    key: &str,
    value: &str,
) -> Result<String, CommandError> {
    info!(charge_point_id, key, value, "ChangeConfiguration");
    let request = ChangeConfigurationRequest {
        key: key.to_string(),
        value: value.to_string(),
    };
    let response: ChangeConfigurationResponse =
        exchange(commands, charge_point_id, "ChangeConfiguration", &request).await?;
    Ok(status_text(&response.status))
}

/// `keys = None` asks for the whole configuration.
pub async fn get_configuration(
    commands: &SharedCommandSender,
    charge_point_id: &str,
    keys: Option<Vec<String>>,
) -> Result<ConfigurationResult, CommandError> {
    info!(charge_point_id, ?keys, "GetConfiguration");
    let response: GetConfigurationResponse = exchange(
        commands,
        charge_point_id,
        "GetConfiguration",
        &GetConfigurationRequest { key: keys },
    )
    .await?;

    Ok(ConfigurationResult {
        configuration_key: response
            .configuration_key
            .into_iter()
            .flatten()
            .map(|entry| KeyValue {
                key: entry.key,
                readonly: entry.readonly,
                value: entry.value,
            })
            .collect(),
        unknown_key: response.unknown_key.unwrap_or_default(),
    })
}

pub async fn clear_cache(
    commands: &SharedCommandSender,
    charge_point_id: &str,
) -> Result<String, CommandError> {
    info!(charge_point_id, "ClearCache");
    let response: ClearCacheResponse =
        exchange(commands, charge_point_id, "ClearCache", &ClearCacheRequest {}).await?;
    Ok(status_text(&response.status))
}

pub async fn data_transfer(
    commands: &SharedCommandSender,
    charge_point_id: &str,
    vendor_id: &str,
    message_id: Option<String>,
    data: Option<String>,
) -> Result<DataTransferResult, CommandError> {
    info!(charge_point_id, vendor_id, ?message_id, "DataTransfer");
    let request = DataTransferRequest {
        vendor_string: vendor_id.to_string(),
        message_id,
        data,
    };
    let response: DataTransferResponse =
        exchange(commands, charge_point_id, "DataTransfer", &request).await?;
    Ok(DataTransferResult {
        status: status_text(&response.status),
        data: response.data,
    })
}

pub async fn remote_start_transaction(
    commands: &SharedCommandSender,
    charge_point_id: &str,
    id_tag: &str,
    connector_id: Option<u32>,
) -> Result<String, CommandError> {
    info!(charge_point_id, id_tag, ?connector_id, "RemoteStartTransaction");
    let request = RemoteStartTransactionRequest {
        connector_id,
        id_tag: id_tag.to_string(),
        charging_profile: None,
    };
    let response: RemoteStartTransactionResponse =
        exchange(commands, charge_point_id, "RemoteStartTransaction", &request).await?;
    Ok(status_text(&response.status))
}

pub async fn remote_stop_transaction(
    commands: &SharedCommandSender,
    charge_point_id: &str,
    transaction_id: i32,
) -> Result<String, CommandError> {
    info!(charge_point_id, transaction_id, "RemoteStopTransaction");
    let response: RemoteStopTransactionResponse = exchange(
        commands,
        charge_point_id,
        "RemoteStopTransaction",
        &RemoteStopTransactionRequest { transaction_id },
    )
    .await?;
    Ok(status_text(&response.status))
}

pub async fn reset(
    commands: &SharedCommandSender,
    charge_point_id: &str,
    kind: ResetKind,
) -> Result<String, CommandError> {
    info!(charge_point_id, ?kind, "Reset");
    let request = ResetRequest {
        kind: retype(&kind)?,
    };
    let response: ResetResponse = exchange(commands, charge_point_id, "Reset", &request).await?;
    Ok(status_text(&response.status))
}

pub async fn unlock_connector(
    commands: &SharedCommandSender,
    charge_point_id: &str,
    connector_id: u32,
) -> Result<String, CommandError> {
    info!(charge_point_id, connector_id, "UnlockConnector");
    let response: UnlockConnectorResponse = exchange(
        commands,
        charge_point_id,
        "UnlockConnector",
        &UnlockConnectorRequest { connector_id },
    )
    .await?;
    Ok(status_text(&response.status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::application::commands::tests::reply_to_call;
    use crate::application::commands::v16::tests::sender;

    #[tokio::test]
    async fn reset_sends_wire_kind() {
        let (rec, cs) = sender();
        let issuer = cs.clone();
        let task = tokio::spawn(async move { reset(&issuer, "CP1", ResetKind::Hard).await });

        let (action, request) = reply_to_call(&rec, &cs, 0, json!({"status": "Rejected"})).await;
        assert_eq!(action, "Reset");
        assert_eq!(request, json!({"type": "Hard"}));
        assert_eq!(task.await.unwrap().unwrap(), "Rejected");
    }

    #[tokio::test]
    async fn get_configuration_without_keys_flattens_reply() {
        let (rec, cs) = sender();
        let issuer = cs.clone();
        let task = tokio::spawn(async move { get_configuration(&issuer, "CP1", None).await });

        reply_to_call(
            &rec,
            &cs,
            0,
            json!({
                "configurationKey": [
                    {"key": "HeartbeatInterval", "readonly": false, "value": "300"},
                    {"key": "NumberOfConnectors", "readonly": true, "value": "2"}
                ],
                "unknownKey": ["Bogus"]
            }),
        )
        .await;

        let result = task.await.unwrap().unwrap();
        assert_eq!(result.configuration_key.len(), 2);
        assert!(result.configuration_key[1].readonly);
        assert_eq!(result.unknown_key, vec!["Bogus".to_string()]);
    }

    #[tokio::test]
    async fn reply_missing_status_is_invalid_response() {
        let (rec, cs) = sender();
        let issuer = cs.clone();
        let task = tokio::spawn(async move { unlock_connector(&issuer, "CP1", 1).await });

        reply_to_call(&rec, &cs, 0, json!({})).await;
        assert!(matches!(
            task.await.unwrap(),
            Err(CommandError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn remote_start_round_trip() {
        let (rec, cs) = sender();
        let issuer = cs.clone();
        let task = tokio::spawn(async move {
            remote_start_transaction(&issuer, "CP1", "TAG1", Some(1)).await
        });

        let (action, request) = reply_to_call(&rec, &cs, 0, json!({"status": "Accepted"})).await;
        assert_eq!(action, "RemoteStartTransaction");
        assert_eq!(request, json!({"idTag": "TAG1", "connectorId": 1}));
        assert_eq!(task.await.unwrap().unwrap(), "Accepted");
    }

    #[tokio::test]
    async fn remote_stop_maps_rejection_and_call_error() {
        let (rec, cs) = sender();
        let issuer = cs.clone();
        let task = tokio::spawn(async move { remote_stop_transaction(&issuer, "CP1", 42).await });
        let (action, request) = reply_to_call(&rec, &cs, 0, json!({"status": "Rejected"})).await;
        assert_eq!(action, "RemoteStopTransaction");
        assert_eq!(request, json!({"transactionId": 42}));
        assert_eq!(task.await.unwrap().unwrap(), "Rejected");

        let issuer = cs.clone();
        let task = tokio::spawn(async move { remote_stop_transaction(&issuer, "CP1", 43).await });
        for _ in 0..200 {
            if rec.sent.lock().unwrap().len() == 2 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert!(cs.handle_error("CP1", &rec.last_call_id(), "InternalError", "busy"));
        assert!(matches!(
            task.await.unwrap(),
            Err(CommandError::CallError { code, .. }) if code == "InternalError"
        ));
    }

    #[tokio::test]
    async fn remote_start_to_offline_station_sends_nothing() {
        let (rec, cs) = sender();
        rec.offline.lock().unwrap().push("CP9".into());
        let err = remote_start_transaction(&cs, "CP9", "TAG1", None).await.unwrap_err();
        assert!(matches!(err, CommandError::NotConnected(_)));
        assert_eq!(cs.pending_count(), 0);
    }

    #[tokio::test]
    async fn change_configuration_and_clear_cache_report_status() {
        let (rec, cs) = sender();
        let issuer = cs.clone();
        let task = tokio::spawn(async move {
            change_configuration(&issuer, "CP1", "HeartbeatInterval", "60").await
        });
        let (_, request) =
            reply_to_call(&rec, &cs, 0, json!({"status": "RebootRequired"})).await;
        assert_eq!(request, json!({"key": "HeartbeatInterval", "value": "60"}));
        assert_eq!(task.await.unwrap().unwrap(), "RebootRequired");

        let issuer = cs.clone();
        let task = tokio::spawn(async move { clear_cache(&issuer, "CP1").await });
        let (action, _) = reply_to_call(&rec, &cs, 1, json!({"status": "Accepted"})).await;
        assert_eq!(action, "ClearCache");
        assert_eq!(task.await.unwrap().unwrap(), "Accepted");
    }

    #[tokio::test]
    async fn data_transfer_returns_vendor_data() {
        let (rec, cs) = sender();
        let issuer = cs.clone();
        let task = tokio::spawn(async move {
            data_transfer(&issuer, "CP1", "com.acme", Some("ping".into()), None).await
        });
        let (_, request) = reply_to_call(
            &rec,
            &cs,
            0,
            json!({"status": "Accepted", "data": "pong"}),
        )
        .await;
        assert_eq!(request["messageId"], "ping");

        let result = task.await.unwrap().unwrap();
        assert_eq!(result.status, "Accepted");
        assert_eq!(result.data.as_deref(), Some("pong"));
    }
}
