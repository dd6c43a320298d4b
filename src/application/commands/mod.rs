//! Outbound commands: Central System → Charge Point
//!
//! ## Architecture
//!
//! ```text
//! admin flow ──► v16::* (typed rust_ocpp request/response)
//!                      │
//!                      ▼
//!               CommandSender ──(StationSender)──► ChannelRegistry ──► station
//!                      ▲
//!  Dispatcher ─────────┘  handle_response / handle_error
//! ```
//!
//! [`CommandSender`] owns the correlation table. Every issued call gets a fresh
//! UUID and a pending slot that is removed exactly once, by whichever comes
//! first: the matching `CallResult`/`CallError`, or the response deadline.
//! `DashMap::remove` is the single-assignment guard.

pub mod v16;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::ports::{SendError, StationSender};
use crate::domain::AuthorizationStatus;
use crate::shared::OcppFrame;

// ── Common command types ───────────────────────────────────────

/// Reset kind for the Reset command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResetKind {
    Soft,
    Hard,
}

/// Messages a station may be asked to send via TriggerMessage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TriggerType {
    BootNotification,
    DiagnosticsStatusNotification,
    FirmwareStatusNotification,
    Heartbeat,
    MeterValues,
    StatusNotification,
}

impl FromStr for TriggerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BootNotification" => Ok(Self::BootNotification),
            "DiagnosticsStatusNotification" => Ok(Self::DiagnosticsStatusNotification),
            "FirmwareStatusNotification" => Ok(Self::FirmwareStatusNotification),
            "Heartbeat" => Ok(Self::Heartbeat),
            "MeterValues" => Ok(Self::MeterValues),
            "StatusNotification" => Ok(Self::StatusNotification),
            other => Err(format!("Invalid trigger message: {}", other)),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataTransferResult {
    pub status: String,
    pub data: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyValue {
    pub key: String,
    pub readonly: bool,
    pub value: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationResult {
    pub configuration_key: Vec<KeyValue>,
    pub unknown_key: Vec<String>,
}

/// One entry of a SendLocalList payload. An entry without status removes the
/// tag in a differential update.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalAuthEntry {
    pub id_tag: String,
    pub status: Option<AuthorizationStatus>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub parent_id_tag: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeScheduleResult {
    pub status: String,
    pub schedule: Option<Value>,
    pub connector_id: Option<i32>,
    pub schedule_start: Option<DateTime<Utc>>,
}

// ── Errors ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CommandError {
    #[error("Charge point not connected: {0}")]
    NotConnected(String),
    #[error("Failed to send: {0}")]
    SendFailed(String),
    #[error("Response timeout")]
    Timeout,
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("CallError {code}: {description}")]
    CallError { code: String, description: String },
    #[error("Rejected: {0}")]
    Validation(String),
}

impl From<SendError> for CommandError {
    fn from(e: SendError) -> Self {
        match e {
            SendError::NotConnected(id) => Self::NotConnected(id),
        }
    }
}

impl CommandError {
    fn outcome_label(&self) -> &'static str {
        match self {
            Self::NotConnected(_) => "not_connected",
            Self::SendFailed(_) => "send_failed",
            Self::Timeout => "timeout",
            Self::InvalidResponse(_) => "invalid_response",
            Self::CallError { .. } => "call_error",
            Self::Validation(_) => "validation",
        }
    }
}

// ── Correlation table ──────────────────────────────────────────

type Outcome = Result<Value, CommandError>;

struct PendingCall {
    charge_point_id: String,
    action: String,
    created_at: DateTime<Utc>,
    slot: oneshot::Sender<Outcome>,
    deadline: AbortHandle,
}

impl PendingCall {
    /// Hand the outcome to the waiter and stop the deadline timer.
    fn resolve(self, outcome: Outcome) {
        self.deadline.abort();
        let _ = self.slot.send(outcome);
    }
}

/// Handle returned by [`CommandSender::issue`]. Completes exactly once.
/// Dropping it abandons the wait; the slot still expires at its deadline.
pub struct PendingResponse {
    pub message_id: String,
    receiver: oneshot::Receiver<Outcome>,
}

impl PendingResponse {
    pub async fn outcome(self) -> Outcome {
        self.receiver
            .await
            .unwrap_or_else(|_| Err(CommandError::InvalidResponse("Pending call dropped".into())))
    }
}

pub struct CommandSender {
    outbound: Arc<dyn StationSender>,
    pending: Arc<DashMap<String, PendingCall>>,
    response_timeout: Duration,
}

pub type SharedCommandSender = Arc<CommandSender>;

impl CommandSender {
    pub fn new(outbound: Arc<dyn StationSender>, response_timeout: Duration) -> Self {
        Self {
            outbound,
            pending: Arc::new(DashMap::new()),
            response_timeout,
        }
    }

    /// Send a Call and register its pending slot. Fails synchronously with
    /// `NotConnected` when the station has no live channel.
    ///
    /// Must be called from within a tokio runtime (the deadline is a spawned timer).
    pub fn issue(
        &self,
        charge_point_id: &str,
        action: &str,
        payload: Value,
    ) -> Result<PendingResponse, CommandError> {
        let message_id = Uuid::new_v4().to_string();
        let frame = OcppFrame::Call {
            unique_id: message_id.clone(),
            action: action.to_string(),
            payload,
        };

        let (tx, rx) = oneshot::channel();
        self.pending.insert(
            message_id.clone(),
            PendingCall {
                charge_point_id: charge_point_id.to_string(),
                action: action.to_string(),
                created_at: Utc::now(),
                slot: tx,
                deadline: self.arm_deadline(message_id.clone()),
            },
        );

        if let Err(e) = self.outbound.send_to(charge_point_id, &frame) {
            if let Some((_, call)) = self.pending.remove(&message_id) {
                call.deadline.abort();
            }
            let err = CommandError::from(e);
            record_outcome(action, Err(&err));
            return Err(err);
        }

        info!(
            charge_point_id,
            action,
            message_id = message_id.as_str(),
            "Sending command"
        );

        Ok(PendingResponse {
            message_id,
            receiver: rx,
        })
    }

    /// Issue and wait for the outcome.
    pub async fn send_command(
        &self,
        charge_point_id: &str,
        action: &str,
        payload: Value,
    ) -> Result<Value, CommandError> {
        self.issue(charge_point_id, action, payload)?.outcome().await
    }

    /// Spawn the timer that fails the call with `Timeout` unless a reply
    /// resolves it first.
    fn arm_deadline(&self, message_id: String) -> AbortHandle {
        let pending = self.pending.clone();
        let response_timeout = self.response_timeout;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(response_timeout).await;
            if let Some((_, call)) = pending.remove(&message_id) {
                warn!(
                    charge_point_id = call.charge_point_id.as_str(),
                    action = call.action.as_str(),
                    message_id = message_id.as_str(),
                    "Command timed out"
                );
                record_outcome(&call.action, Err(&CommandError::Timeout));
                let _ = call.slot.send(Err(CommandError::Timeout));
            }
        });
        timer.abort_handle()
    }

    /// Resolve a pending call with a CallResult. Returns false for unknown or
    /// already-resolved ids.
    pub fn handle_response(&self, charge_point_id: &str, message_id: &str, payload: Value) -> bool {
        let Some((_, call)) = self.pending.remove(message_id) else {
            warn!(charge_point_id, message_id, "Response for unknown request");
            return false;
        };
        if call.charge_point_id != charge_point_id {
            warn!(
                charge_point_id,
                expected = call.charge_point_id.as_str(),
                message_id,
                "Response arrived from a different charge point"
            );
        }

        let elapsed_ms = (Utc::now() - call.created_at).num_milliseconds();
        info!(
            charge_point_id,
            action = call.action.as_str(),
            message_id,
            elapsed_ms,
            "Received response"
        );
        record_outcome(&call.action, Ok(()));
        call.resolve(Ok(payload));
        true
    }

    /// Resolve a pending call with a CallError.
    pub fn handle_error(
        &self,
        charge_point_id: &str,
        message_id: &str,
        error_code: &str,
        error_description: &str,
    ) -> bool {
        let Some((_, call)) = self.pending.remove(message_id) else {
            warn!(charge_point_id, message_id, error_code, "Error for unknown request");
            return false;
        };

        warn!(
            charge_point_id,
            action = call.action.as_str(),
            message_id,
            error_code,
            error_description,
            "Received error"
        );
        let err = CommandError::CallError {
            code: error_code.to_string(),
            description: error_description.to_string(),
        };
        record_outcome(&call.action, Err(&err));
        call.resolve(Err(err));
        true
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_connected(&self, charge_point_id: &str) -> bool {
        self.outbound.is_connected(charge_point_id)
    }
}

fn record_outcome(action: &str, outcome: Result<(), &CommandError>) {
    let label = match outcome {
        Ok(()) => "accepted",
        Err(e) => e.outcome_label(),
    };
    debug!(action, outcome = label, "Command outcome");
    metrics::counter!(
        "ocpp_commands_total",
        "action" => action.to_string(),
        "outcome" => label
    )
    .increment(1);
}

/// Untyped entry point for callers that already hold a JSON payload.
pub async fn issue_command(
    command_sender: &SharedCommandSender,
    charge_point_id: &str,
    action: &str,
    payload: Value,
) -> Result<Value, CommandError> {
    command_sender
        .send_command(charge_point_id, action, payload)
        .await
}

/// Serialize a typed request payload.
pub(crate) fn to_payload<T: serde::Serialize>(request: &T) -> Result<Value, CommandError> {
    serde_json::to_value(request)
        .map_err(|e| CommandError::SendFailed(format!("Serialization failed: {}", e)))
}

/// Parse a typed response payload.
pub(crate) fn from_payload<T: serde::de::DeserializeOwned>(payload: Value) -> Result<T, CommandError> {
    serde_json::from_value(payload)
        .map_err(|e| CommandError::InvalidResponse(format!("Failed to parse response: {}", e)))
}
