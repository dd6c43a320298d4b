//! Sampled meter readings

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One sampled value, tagged to its (station, connector, transaction) triple.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeterReading {
    /// Assigned by the store
    pub id: i64,
    pub charge_point_id: String,
    pub connector_id: u32,
    pub transaction_id: Option<i32>,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub context: Option<String>,
    pub format: Option<String>,
    pub measurand: Option<String>,
    pub phase: Option<String>,
    pub location: Option<String>,
    pub unit: Option<String>,
}
