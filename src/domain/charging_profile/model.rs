//! Charging profile entity (profile + schedule + ordered periods)
//!
//! The profile body uses the OCPP 1.6 `csChargingProfiles` JSON shape so it can be
//! stored from and sent to a station without a second mapping layer. Ownership
//! (station, connector scope) is kept outside the wire shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargingProfilePurpose {
    ChargePointMaxProfile,
    TxDefaultProfile,
    TxProfile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargingProfileKind {
    Absolute,
    Recurring,
    Relative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecurrencyKind {
    Daily,
    Weekly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargingRateUnit {
    W,
    A,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargingSchedulePeriod {
    /// Offset in seconds from the schedule start
    pub start_period: i32,
    pub limit: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_phases: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargingSchedule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_schedule: Option<DateTime<Utc>>,
    pub charging_rate_unit: ChargingRateUnit,
    #[serde(rename = "chargingSchedulePeriod")]
    pub periods: Vec<ChargingSchedulePeriod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_charging_rate: Option<f64>,
}

impl ChargingSchedule {
    /// Periods ordered by start offset.
    pub fn normalize(&mut self) {
        self.periods.sort_by_key(|p| p.start_period);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargingProfile {
    #[serde(skip)]
    pub charge_point_id: String,
    /// `None` or `Some(0)` scopes the profile to the whole station
    #[serde(skip)]
    pub connector_id: Option<u32>,
    #[serde(rename = "chargingProfileId")]
    pub profile_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<i32>,
    pub stack_level: i32,
    #[serde(rename = "chargingProfilePurpose")]
    pub purpose: ChargingProfilePurpose,
    #[serde(rename = "chargingProfileKind")]
    pub kind: ChargingProfileKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrency_kind: Option<RecurrencyKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<DateTime<Utc>>,
    #[serde(rename = "chargingSchedule")]
    pub schedule: ChargingSchedule,
}

impl ChargingProfile {
    /// Attach ownership after deserializing a wire profile.
    pub fn owned_by(mut self, charge_point_id: impl Into<String>, connector_id: u32) -> Self {
        self.charge_point_id = charge_point_id.into();
        self.connector_id = Some(connector_id);
        self.schedule.normalize();
        self
    }
}

/// Filter for retrieval and clearing. `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileFilter {
    pub id: Option<i32>,
    pub connector_id: Option<u32>,
    pub purpose: Option<ChargingProfilePurpose>,
    pub stack_level: Option<i32>,
}

impl ProfileFilter {
    pub fn matches(&self, profile: &ChargingProfile) -> bool {
        self.id.map_or(true, |id| profile.profile_id == id)
            && self
                .connector_id
                .map_or(true, |c| profile.connector_id == Some(c))
            && self.purpose.map_or(true, |p| profile.purpose == p)
            && self.stack_level.map_or(true, |s| profile.stack_level == s)
    }
}
