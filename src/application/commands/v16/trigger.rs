//! Remote trigger profile

use rust_ocpp::v1_6::messages::trigger_message::{TriggerMessageRequest, TriggerMessageResponse};
use tracing::info;

use super::{exchange, retype, status_text};
use crate::application::commands::{CommandError, SharedCommandSender, TriggerType};

pub async fn trigger_message(
    commands: &SharedCommandSender,
    charge_point_id: &str,
    requested_message: TriggerType,
    connector_id: Option<u32>,
) -> Result<String, CommandError> {
    info!(charge_point_id, ?requested_message, ?connector_id, "TriggerMessage");
    let request = TriggerMessageRequest {
        requested_message: retype(&requested_message)?,
        connector_id,
    };
    let response: TriggerMessageResponse =
        exchange(commands, charge_point_id, "TriggerMessage", &request).await?;
    Ok(status_text(&response.status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::application::commands::tests::reply_to_call;
    use crate::application::commands::v16::tests::sender;

    #[tokio::test]
    async fn trigger_carries_message_and_connector() {
        let (rec, cs) = sender();
        let issuer = cs.clone();
        let task = tokio::spawn(async move {
            trigger_message(&issuer, "CP1", TriggerType::StatusNotification, Some(2)).await
        });

        let (action, request) =
            reply_to_call(&rec, &cs, 0, json!({"status": "NotImplemented"})).await;
        assert_eq!(action, "TriggerMessage");
        assert_eq!(request, json!({"requestedMessage": "StatusNotification", "connectorId": 2}));
        assert_eq!(task.await.unwrap().unwrap(), "NotImplemented");
    }
}
