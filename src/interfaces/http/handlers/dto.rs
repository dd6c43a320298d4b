//! Admin request bodies
//!
//! Command bodies use the OCPP 1.6 payload shape of their action, so the same
//! JSON a station would receive can be posted here.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::application::commands::{LocalAuthEntry, ResetKind};
use crate::domain::charging_profile::ChargingRateUnit;
use crate::domain::{
    AuthorizationStatus, ChargingProfile, ChargingProfilePurpose, IdTag, ProfileFilter, UpdateType,
};

// ── Core profile ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteStartBody {
    pub id_tag: String,
    pub connector_id: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteStopBody {
    pub transaction_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct ResetBody {
    #[serde(rename = "type")]
    pub kind: ResetKind,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockConnectorBody {
    pub connector_id: u32,
}

#[derive(Debug, Deserialize)]
pub struct ChangeConfigurationBody {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct GetConfigurationBody {
    #[serde(default)]
    pub key: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataTransferBody {
    pub vendor_id: String,
    pub message_id: Option<String>,
    pub data: Option<String>,
}

// ── Reservation ────────────────────────────────────────────────

/// `reservationId` is allocated by the central system and ignored if sent.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveNowBody {
    pub connector_id: u32,
    pub id_tag: String,
    pub parent_id_tag: Option<String>,
    pub expiry_date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelReservationBody {
    pub reservation_id: i32,
}

// ── Smart charging ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetChargingProfileBody {
    pub connector_id: u32,
    pub cs_charging_profiles: ChargingProfile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearChargingProfileBody {
    pub id: Option<i32>,
    pub connector_id: Option<u32>,
    pub charging_profile_purpose: Option<ChargingProfilePurpose>,
    pub stack_level: Option<i32>,
}

impl From<ClearChargingProfileBody> for ProfileFilter {
    fn from(body: ClearChargingProfileBody) -> Self {
        ProfileFilter {
            id: body.id,
            connector_id: body.connector_id,
            purpose: body.charging_profile_purpose,
            stack_level: body.stack_level,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetCompositeScheduleBody {
    pub connector_id: u32,
    pub duration: i32,
    pub charging_rate_unit: Option<ChargingRateUnit>,
}

// ── Firmware / diagnostics ─────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFirmwareBody {
    pub location: String,
    pub retrieve_date: DateTime<Utc>,
    pub retries: Option<i32>,
    pub retry_interval: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetDiagnosticsBody {
    pub location: String,
    pub retries: Option<i32>,
    pub retry_interval: Option<i32>,
    pub start_time: Option<DateTime<Utc>>,
    pub stop_time: Option<DateTime<Utc>>,
}

// ── Local list / trigger ───────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdTagInfoBody {
    pub status: AuthorizationStatus,
    pub expiry_date: Option<DateTime<Utc>>,
    pub parent_id_tag: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationDataBody {
    pub id_tag: String,
    pub id_tag_info: Option<IdTagInfoBody>,
}

impl From<AuthorizationDataBody> for LocalAuthEntry {
    fn from(body: AuthorizationDataBody) -> Self {
        let (status, expiry_date, parent_id_tag) = match body.id_tag_info {
            Some(info) => (Some(info.status), info.expiry_date, info.parent_id_tag),
            None => (None, None, None),
        };
        LocalAuthEntry {
            id_tag: body.id_tag,
            status,
            expiry_date,
            parent_id_tag,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendLocalListBody {
    pub list_version: i32,
    pub update_type: UpdateType,
    #[serde(default)]
    pub local_authorization_list: Vec<AuthorizationDataBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerMessageBody {
    pub requested_message: String,
    pub connector_id: Option<u32>,
}

// ── Registry / transactions ────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateIdTagBody {
    pub id_tag: String,
    pub parent_id_tag: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub blocked: bool,
}

impl From<CreateIdTagBody> for IdTag {
    fn from(body: CreateIdTagBody) -> Self {
        let mut tag = IdTag::new(body.id_tag);
        tag.parent_id_tag = body.parent_id_tag;
        tag.expiry_date = body.expiry_date;
        tag.blocked = body.blocked;
        tag
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminStopBody {
    pub meter_stop: Option<i32>,
}
