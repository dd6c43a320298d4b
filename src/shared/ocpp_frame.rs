//! OCPP-J message framing
//!
//! - **Call**       `[2, "<uniqueId>", "<action>", {<payload>}]`
//! - **CallResult** `[3, "<uniqueId>", {<payload>}]`
//! - **CallError**  `[4, "<uniqueId>", "<errorCode>", "<errorDescription>", {<errorDetails>}]`
//!
//! Decoding is strict about arity: a frame that does not match one of the three
//! shapes exactly is rejected with [`FrameError`] and must not be answered.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;

// ── Message-type constants ─────────────────────────────────────

const MSG_TYPE_CALL: u64 = 2;
const MSG_TYPE_CALL_RESULT: u64 = 3;
const MSG_TYPE_CALL_ERROR: u64 = 4;

// ── OcppFrame ──────────────────────────────────────────────────

/// A decoded OCPP-J frame.
#[derive(Debug, Clone, PartialEq)]
pub enum OcppFrame {
    /// `[2, uniqueId, action, payload]`
    Call {
        unique_id: String,
        action: String,
        payload: Value,
    },
    /// `[3, uniqueId, payload]`
    CallResult { unique_id: String, payload: Value },
    /// `[4, uniqueId, errorCode, errorDescription, errorDetails]`
    CallError {
        unique_id: String,
        error_code: String,
        error_description: String,
        error_details: Value,
    },
}

impl OcppFrame {
    // ── Decoding ───────────────────────────────────────────

    /// Decode raw text into a frame.
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| FrameError::InvalidJson(e.to_string()))?;
        let arr = value.as_array().ok_or(FrameError::NotAnArray)?;

        let msg_type = arr
            .first()
            .ok_or(FrameError::EmptyArray)?
            .as_u64()
            .ok_or(FrameError::InvalidMessageType)?;

        match msg_type {
            MSG_TYPE_CALL => {
                expect_arity(arr, 4)?;
                Ok(Self::Call {
                    unique_id: string_field(arr, 1, "uniqueId must be a string")?,
                    action: string_field(arr, 2, "action must be a string")?,
                    payload: arr[3].clone(),
                })
            }
            MSG_TYPE_CALL_RESULT => {
                expect_arity(arr, 3)?;
                Ok(Self::CallResult {
                    unique_id: string_field(arr, 1, "uniqueId must be a string")?,
                    payload: arr[2].clone(),
                })
            }
            MSG_TYPE_CALL_ERROR => {
                expect_arity(arr, 5)?;
                Ok(Self::CallError {
                    unique_id: string_field(arr, 1, "uniqueId must be a string")?,
                    error_code: string_field(arr, 2, "errorCode must be a string")?,
                    error_description: string_field(arr, 3, "errorDescription must be a string")?,
                    error_details: arr[4].clone(),
                })
            }
            other => Err(FrameError::UnknownMessageType(other)),
        }
    }

    // ── Encoding ───────────────────────────────────────────

    /// Encode this frame to its wire text.
    pub fn serialize(&self) -> String {
        let arr = match self {
            Self::Call {
                unique_id,
                action,
                payload,
            } => Value::Array(vec![
                Value::from(MSG_TYPE_CALL),
                Value::String(unique_id.clone()),
                Value::String(action.clone()),
                payload.clone(),
            ]),
            Self::CallResult { unique_id, payload } => Value::Array(vec![
                Value::from(MSG_TYPE_CALL_RESULT),
                Value::String(unique_id.clone()),
                payload.clone(),
            ]),
            Self::CallError {
                unique_id,
                error_code,
                error_description,
                error_details,
            } => Value::Array(vec![
                Value::from(MSG_TYPE_CALL_ERROR),
                Value::String(unique_id.clone()),
                Value::String(error_code.clone()),
                Value::String(error_description.clone()),
                error_details.clone(),
            ]),
        };
        arr.to_string()
    }

    // ── Helpers ────────────────────────────────────────────

    pub fn unique_id(&self) -> &str {
        match self {
            Self::Call { unique_id, .. }
            | Self::CallResult { unique_id, .. }
            | Self::CallError { unique_id, .. } => unique_id,
        }
    }

    /// Build a `CallError` answering the call with the given id.
    pub fn error_response(
        unique_id: impl Into<String>,
        error_code: OcppErrorCode,
        error_description: impl Into<String>,
    ) -> Self {
        Self::CallError {
            unique_id: unique_id.into(),
            error_code: error_code.as_str().to_string(),
            error_description: error_description.into(),
            error_details: Value::Object(Default::default()),
        }
    }
}

fn expect_arity(arr: &[Value], expected: usize) -> Result<(), FrameError> {
    if arr.len() != expected {
        return Err(FrameError::WrongArity {
            expected,
            got: arr.len(),
        });
    }
    Ok(())
}

fn string_field(arr: &[Value], index: usize, what: &'static str) -> Result<String, FrameError> {
    arr[index]
        .as_str()
        .map(str::to_string)
        .ok_or(FrameError::FieldTypeMismatch(what))
}

// ── Error codes ────────────────────────────────────────────────

/// Error codes carried in `CallError` frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcppErrorCode {
    NotSupported,
    InternalError,
    ProtocolError,
    SecurityError,
    FormationViolation,
    PropertyConstraintViolation,
    OccurrenceConstraintViolation,
    TypeConstraintViolation,
    GenericError,
}

impl OcppErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotSupported => "NotSupported",
            Self::InternalError => "InternalError",
            Self::ProtocolError => "ProtocolError",
            Self::SecurityError => "SecurityError",
            Self::FormationViolation => "FormationViolation",
            Self::PropertyConstraintViolation => "PropertyConstraintViolation",
            Self::OccurrenceConstraintViolation => "OccurrenceConstraintViolation",
            Self::TypeConstraintViolation => "TypeConstraintViolation",
            Self::GenericError => "GenericError",
        }
    }
}

impl fmt::Display for OcppErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OcppErrorCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NotSupported" => Ok(Self::NotSupported),
            "InternalError" => Ok(Self::InternalError),
            "ProtocolError" => Ok(Self::ProtocolError),
            "SecurityError" => Ok(Self::SecurityError),
            "FormationViolation" => Ok(Self::FormationViolation),
            "PropertyConstraintViolation" => Ok(Self::PropertyConstraintViolation),
            "OccurrenceConstraintViolation" => Ok(Self::OccurrenceConstraintViolation),
            "TypeConstraintViolation" => Ok(Self::TypeConstraintViolation),
            "GenericError" => Ok(Self::GenericError),
            other => Err(format!("Unknown OCPP error code: {}", other)),
        }
    }
}

// ── Errors ─────────────────────────────────────────────────────

/// Reasons a text message is not a valid OCPP-J frame.
#[derive(Debug, Error, PartialEq)]
pub enum FrameError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),
    #[error("OCPP message is not a JSON array")]
    NotAnArray,
    #[error("Empty OCPP message array")]
    EmptyArray,
    #[error("Message type is not a number")]
    InvalidMessageType,
    #[error("Unknown message type: {0}")]
    UnknownMessageType(u64),
    #[error("Expected exactly {expected} fields, got {got}")]
    WrongArity { expected: usize, got: usize },
    #[error("Field type mismatch: {0}")]
    FieldTypeMismatch(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_call() {
        let text = r#"[2,"abc123","BootNotification",{"chargePointVendor":"Vendor","chargePointModel":"Model"}]"#;
        match OcppFrame::parse(text).unwrap() {
            OcppFrame::Call {
                unique_id,
                action,
                payload,
            } => {
                assert_eq!(unique_id, "abc123");
                assert_eq!(action, "BootNotification");
                assert_eq!(payload["chargePointVendor"], "Vendor");
            }
            other => panic!("Expected Call frame, got {:?}", other),
        }
    }

    #[test]
    fn parse_call_error() {
        let text = r#"[4,"abc123","NotSupported","Action not supported",{}]"#;
        match OcppFrame::parse(text).unwrap() {
            OcppFrame::CallError {
                error_code,
                error_description,
                ..
            } => {
                assert_eq!(error_code, "NotSupported");
                assert_eq!(error_description, "Action not supported");
            }
            other => panic!("Expected CallError frame, got {:?}", other),
        }
    }

    #[test]
    fn two_element_array_is_rejected() {
        let err = OcppFrame::parse(r#"[3,"abc"]"#).unwrap_err();
        assert_eq!(err, FrameError::WrongArity { expected: 3, got: 2 });
    }

    #[test]
    fn extra_fields_are_rejected() {
        assert!(OcppFrame::parse(r#"[2,"a","Heartbeat",{},{}]"#).is_err());
        assert!(OcppFrame::parse(r#"[4,"a","GenericError","x"]"#).is_err());
    }

    #[test]
    fn non_array_and_bad_types_are_rejected() {
        assert_eq!(OcppFrame::parse(r#"{"a":1}"#).unwrap_err(), FrameError::NotAnArray);
        assert_eq!(OcppFrame::parse("[]").unwrap_err(), FrameError::EmptyArray);
        assert!(matches!(
            OcppFrame::parse("not json"),
            Err(FrameError::InvalidJson(_))
        ));
        assert_eq!(
            OcppFrame::parse(r#"[7,"a",{}]"#).unwrap_err(),
            FrameError::UnknownMessageType(7)
        );
        assert!(matches!(
            OcppFrame::parse(r#"[2,5,"Heartbeat",{}]"#),
            Err(FrameError::FieldTypeMismatch(_))
        ));
        assert_eq!(
            OcppFrame::parse(r#"["2","a","Heartbeat",{}]"#).unwrap_err(),
            FrameError::InvalidMessageType
        );
    }

    #[test]
    fn decode_inverts_encode() {
        let frames = vec![
            OcppFrame::Call {
                unique_id: "id1".into(),
                action: "Heartbeat".into(),
                payload: json!({}),
            },
            OcppFrame::CallResult {
                unique_id: "id2".into(),
                payload: json!({"currentTime": "2024-01-01T00:00:00Z", "interval": 300}),
            },
            OcppFrame::CallError {
                unique_id: "id3".into(),
                error_code: "GenericError".into(),
                error_description: "Something went wrong".into(),
                error_details: json!({"hint": [1, 2]}),
            },
        ];
        for frame in frames {
            assert_eq!(OcppFrame::parse(&frame.serialize()).unwrap(), frame);
        }
    }

    #[test]
    fn encode_wire_shape() {
        let frame = OcppFrame::error_response("x", OcppErrorCode::NotSupported, "nope");
        assert_eq!(frame.serialize(), r#"[4,"x","NotSupported","nope",{}]"#);
    }

    #[test]
    fn error_code_roundtrip() {
        for code in ["NotSupported", "FormationViolation", "GenericError"] {
            assert_eq!(code.parse::<OcppErrorCode>().unwrap().as_str(), code);
        }
        assert!("Bogus".parse::<OcppErrorCode>().is_err());
    }
}
