//! Inbound frame dispatch
//!
//! Calls are routed by action name to the OCPP 1.6 handlers in [`ocpp_v16`];
//! CallResult / CallError frames resolve pending outbound commands.

pub mod ocpp_v16;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::application::commands::SharedCommandSender;
use crate::application::services::Services;
use crate::domain::DomainError;
use crate::shared::{OcppErrorCode, OcppFrame};

/// Failure of a single inbound Call, answered as a CallError.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{0}")]
    FormationViolation(String),

    #[error("{0}")]
    PropertyConstraint(String),

    #[error("{0}")]
    Generic(String),

    #[error("{0}")]
    Internal(String),
}

impl HandlerError {
    pub fn code(&self) -> OcppErrorCode {
        match self {
            Self::FormationViolation(_) => OcppErrorCode::FormationViolation,
            Self::PropertyConstraint(_) => OcppErrorCode::PropertyConstraintViolation,
            Self::Generic(_) => OcppErrorCode::GenericError,
            Self::Internal(_) => OcppErrorCode::InternalError,
        }
    }
}

impl From<DomainError> for HandlerError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(msg) => Self::PropertyConstraint(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

pub type HandlerResult = Result<Value, HandlerError>;

/// Decode a Call payload into its rust-ocpp request type.
pub(crate) fn parse_request<T: DeserializeOwned>(action: &str, payload: &Value) -> Result<T, HandlerError> {
    serde_json::from_value(payload.clone())
        .map_err(|e| HandlerError::FormationViolation(format!("Invalid {action} payload: {e}")))
}

pub(crate) fn respond<T: Serialize>(response: &T) -> HandlerResult {
    serde_json::to_value(response)
        .map_err(|e| HandlerError::Internal(format!("Failed to encode response: {e}")))
}

/// Wire spelling of a rust-ocpp enum value, e.g. `Energy.Active.Import.Register`.
pub(crate) fn wire_name<T: Serialize>(value: &T) -> Option<String> {
    match serde_json::to_value(value) {
        Ok(Value::String(s)) => Some(s),
        _ => None,
    }
}

/// Map a rust-ocpp enum onto the domain enum with the same wire spelling.
pub(crate) fn convert<T: Serialize, U: DeserializeOwned>(value: &T) -> Result<U, HandlerError> {
    serde_json::to_value(value)
        .and_then(serde_json::from_value)
        .map_err(|e| HandlerError::PropertyConstraint(format!("Unsupported value: {e}")))
}

// ── Dispatcher ─────────────────────────────────────────────────

pub struct Dispatcher {
    pub(crate) services: Services,
    pub(crate) commands: SharedCommandSender,
    /// Interval handed out in BootNotification responses, in seconds.
    pub(crate) heartbeat_interval: u32,
}

impl Dispatcher {
    pub fn new(services: Services, commands: SharedCommandSender, heartbeat_interval: u32) -> Self {
        Self {
            services,
            commands,
            heartbeat_interval,
        }
    }

    /// Handle a decoded frame. Returns the reply for a Call, `None` otherwise.
    pub async fn handle_inbound(&self, charge_point_id: &str, frame: OcppFrame) -> Option<OcppFrame> {
        if let Err(e) = self.services.charge_points.touch(charge_point_id).await {
            warn!(charge_point_id, error = %e, "Failed to refresh last-seen");
        }

        match frame {
            OcppFrame::Call {
                unique_id,
                action,
                payload,
            } => {
                metrics::counter!("ocpp_messages_total", "action" => action.clone()).increment(1);
                let reply =
                    match ocpp_v16::v16_action_matcher(self, charge_point_id, &action, &payload).await {
                        Some(Ok(payload)) => OcppFrame::CallResult { unique_id, payload },
                        Some(Err(e)) => {
                            warn!(
                                charge_point_id,
                                action = action.as_str(),
                                message_id = unique_id.as_str(),
                                error = %e,
                                "Call failed"
                            );
                            OcppFrame::error_response(unique_id, e.code(), e.to_string())
                        }
                        None => {
                            warn!(charge_point_id, action = action.as_str(), "Unsupported action");
                            OcppFrame::error_response(
                                unique_id,
                                OcppErrorCode::NotSupported,
                                format!("Action {action} is not supported"),
                            )
                        }
                    };
                Some(reply)
            }
            OcppFrame::CallResult { unique_id, payload } => {
                if !self.commands.handle_response(charge_point_id, &unique_id, payload) {
                    debug!(charge_point_id, message_id = unique_id.as_str(), "Result discarded");
                }
                None
            }
            OcppFrame::CallError {
                unique_id,
                error_code,
                error_description,
                ..
            } => {
                if !self.commands.handle_error(
                    charge_point_id,
                    &unique_id,
                    &error_code,
                    &error_description,
                ) {
                    debug!(charge_point_id, message_id = unique_id.as_str(), "Error discarded");
                }
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;

    use crate::application::commands::tests::RecordingSender;
    use crate::application::commands::CommandSender;
    use crate::domain::{IdTag, RepositoryProvider};
    use crate::infrastructure::InMemoryRepositoryProvider;

    pub struct Fixture {
        pub repos: Arc<InMemoryRepositoryProvider>,
        pub outbound: Arc<RecordingSender>,
        pub commands: SharedCommandSender,
        pub dispatcher: Arc<Dispatcher>,
    }

    pub fn fixture() -> Fixture {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let outbound = Arc::new(RecordingSender::default());
        let commands = Arc::new(CommandSender::new(outbound.clone(), Duration::from_secs(5)));
        let services = Services::new(repos.clone(), commands.clone());
        Fixture {
            dispatcher: Arc::new(Dispatcher::new(services, commands.clone(), 300)),
            repos,
            outbound,
            commands,
        }
    }

    pub fn call(id: &str, action: &str, payload: Value) -> OcppFrame {
        OcppFrame::Call {
            unique_id: id.into(),
            action: action.into(),
            payload,
        }
    }

    pub async fn boot(f: &Fixture, charge_point_id: &str) {
        let reply = f
            .dispatcher
            .handle_inbound(
                charge_point_id,
                call(
                    "boot",
                    "BootNotification",
                    json!({"chargePointVendor": "ACME", "chargePointModel": "X1"}),
                ),
            )
            .await;
        assert!(matches!(reply, Some(OcppFrame::CallResult { .. })));
    }

    fn result_payload(reply: Option<OcppFrame>) -> Value {
        match reply {
            Some(OcppFrame::CallResult { payload, .. }) => payload,
            other => panic!("expected CallResult, got {:?}", other),
        }
    }

    fn error_code(reply: Option<OcppFrame>) -> String {
        match reply {
            Some(OcppFrame::CallError { error_code, .. }) => error_code,
            other => panic!("expected CallError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn boot_accepts_and_seeds_configuration_once() {
        let f = fixture();
        let reply = f
            .dispatcher
            .handle_inbound(
                "CP1",
                call(
                    "1",
                    "BootNotification",
                    json!({"chargePointVendor": "ACME", "chargePointModel": "X1"}),
                ),
            )
            .await;
        let payload = result_payload(reply);
        assert_eq!(payload["status"], "Accepted");
        assert_eq!(payload["interval"], 300);
        assert!(payload["currentTime"].is_string());

        let seeded = f.repos.configuration().find_for_charge_point("CP1").await.unwrap();
        assert_eq!(seeded.len(), 27);

        let mut changed = seeded[0].clone();
        changed.value = Some("changed".into());
        f.repos.configuration().save(changed.clone()).await.unwrap();

        boot(&f, "CP1").await;
        let after = f
            .repos
            .configuration()
            .find("CP1", &changed.key)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.value.as_deref(), Some("changed"));
    }

    #[tokio::test]
    async fn start_then_stop_frees_the_connector() {
        let f = fixture();
        boot(&f, "CP1").await;
        f.repos.id_tags().save(IdTag::new("TAG1")).await.unwrap();

        let start = result_payload(
            f.dispatcher
                .handle_inbound(
                    "CP1",
                    call(
                        "2",
                        "StartTransaction",
                        json!({
                            "connectorId": 1,
                            "idTag": "TAG1",
                            "meterStart": 1000,
                            "timestamp": "2024-01-01T10:00:00Z"
                        }),
                    ),
                )
                .await,
        );
        assert_eq!(start["idTagInfo"]["status"], "Accepted");
        let tx_id = start["transactionId"].as_i64().unwrap() as i32;
        assert!(tx_id > 0);

        let connector = f.repos.connectors().find("CP1", 1).await.unwrap().unwrap();
        assert_eq!(connector.current_transaction_id, Some(tx_id));

        let stop = result_payload(
            f.dispatcher
                .handle_inbound(
                    "CP1",
                    call(
                        "3",
                        "StopTransaction",
                        json!({
                            "transactionId": tx_id,
                            "meterStop": 5000,
                            "timestamp": "2024-01-01T11:00:00Z",
                            "transactionData": [{
                                "timestamp": "2024-01-01T10:30:00Z",
                                "sampledValue": [{"value": "3000", "unit": "Wh"}]
                            }]
                        }),
                    ),
                )
                .await,
        );
        assert_eq!(stop["idTagInfo"]["status"], "Accepted");

        let tx = f.repos.transactions().find_by_id(tx_id).await.unwrap().unwrap();
        assert!(!tx.is_active());
        assert_eq!(tx.meter_stop, Some(5000));
        let connector = f.repos.connectors().find("CP1", 1).await.unwrap().unwrap();
        assert_eq!(connector.current_transaction_id, None);
        let readings = f.repos.meter_values().find_for_transaction(tx_id).await.unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].unit.as_deref(), Some("Wh"));
    }

    #[tokio::test]
    async fn unknown_id_tag_start_answers_sentinel() {
        let f = fixture();
        boot(&f, "CP1").await;
        let start = result_payload(
            f.dispatcher
                .handle_inbound(
                    "CP1",
                    call(
                        "2",
                        "StartTransaction",
                        json!({
                            "connectorId": 1,
                            "idTag": "NOPE",
                            "meterStart": 0,
                            "timestamp": "2024-01-01T10:00:00Z"
                        }),
                    ),
                )
                .await,
        );
        assert_eq!(start["idTagInfo"]["status"], "Invalid");
        assert_eq!(start["transactionId"], -1);
        assert!(f.repos.transactions().find_for_charge_point("CP1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn start_from_unbooted_station_is_generic_error() {
        let f = fixture();
        let reply = f
            .dispatcher
            .handle_inbound(
                "GHOST",
                call(
                    "1",
                    "StartTransaction",
                    json!({
                        "connectorId": 1,
                        "idTag": "TAG1",
                        "meterStart": 0,
                        "timestamp": "2024-01-01T10:00:00Z"
                    }),
                ),
            )
            .await;
        assert_eq!(error_code(reply), "GenericError");
    }

    #[tokio::test]
    async fn unknown_action_is_not_supported() {
        let f = fixture();
        let reply = f
            .dispatcher
            .handle_inbound("CP1", call("9", "TeleportVehicle", json!({})))
            .await;
        assert_eq!(error_code(reply), "NotSupported");
    }

    #[tokio::test]
    async fn bad_payload_is_formation_violation() {
        let f = fixture();
        let reply = f
            .dispatcher
            .handle_inbound("CP1", call("9", "StatusNotification", json!({"connectorId": "one"})))
            .await;
        assert_eq!(error_code(reply), "FormationViolation");
    }

    #[tokio::test]
    async fn result_frame_resolves_pending_command() {
        let f = fixture();
        let handle = f.commands.issue("CP1", "ClearCache", json!({})).unwrap();
        let id = f.outbound.last_call_id();

        let reply = f
            .dispatcher
            .handle_inbound(
                "CP1",
                OcppFrame::CallResult {
                    unique_id: id.clone(),
                    payload: json!({"status": "Accepted"}),
                },
            )
            .await;
        assert!(reply.is_none());
        assert_eq!(handle.outcome().await.unwrap()["status"], "Accepted");

        // A second answer for the same id is dropped silently.
        let again = f
            .dispatcher
            .handle_inbound(
                "CP1",
                OcppFrame::CallError {
                    unique_id: id,
                    error_code: "InternalError".into(),
                    error_description: "late".into(),
                    error_details: json!({}),
                },
            )
            .await;
        assert!(again.is_none());
    }
}
