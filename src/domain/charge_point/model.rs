//! Charge point (station) and connector entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registration state answered in BootNotification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RegistrationStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChargePoint {
    /// Stable external id (last path segment of the WebSocket URL)
    pub id: String,
    pub vendor: String,
    pub model: String,
    pub serial_number: Option<String>,
    pub firmware_version: Option<String>,
    pub registration_status: RegistrationStatus,
    pub last_seen: Option<DateTime<Utc>>,
    pub registered_at: DateTime<Utc>,
}

impl ChargePoint {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            vendor: String::new(),
            model: String::new(),
            serial_number: None,
            firmware_version: None,
            registration_status: RegistrationStatus::Pending,
            last_seen: None,
            registered_at: Utc::now(),
        }
    }

    /// Apply the descriptors carried by a boot and accept the station.
    pub fn apply_boot(
        &mut self,
        vendor: impl Into<String>,
        model: impl Into<String>,
        serial_number: Option<String>,
        firmware_version: Option<String>,
    ) {
        self.vendor = vendor.into();
        self.model = model.into();
        self.serial_number = serial_number;
        self.firmware_version = firmware_version;
        self.registration_status = RegistrationStatus::Accepted;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.last_seen = Some(Utc::now());
    }

    pub fn is_accepted(&self) -> bool {
        self.registration_status == RegistrationStatus::Accepted
    }

    /// Seconds since last contact, `None` if never seen.
    pub fn silence_secs(&self, now: DateTime<Utc>) -> Option<i64> {
        self.last_seen
            .map(|seen| now.signed_duration_since(seen).num_seconds())
    }
}

/// Connector status as reported by StatusNotification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectorStatus {
    Available,
    Preparing,
    Charging,
    SuspendedEV,
    SuspendedEVSE,
    Finishing,
    Reserved,
    Unavailable,
    Faulted,
}

impl ConnectorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Preparing => "Preparing",
            Self::Charging => "Charging",
            Self::SuspendedEV => "SuspendedEV",
            Self::SuspendedEVSE => "SuspendedEVSE",
            Self::Finishing => "Finishing",
            Self::Reserved => "Reserved",
            Self::Unavailable => "Unavailable",
            Self::Faulted => "Faulted",
        }
    }
}

impl std::fmt::Display for ConnectorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const NO_ERROR: &str = "NoError";

#[derive(Debug, Clone, Serialize)]
pub struct Connector {
    pub charge_point_id: String,
    pub connector_id: u32,
    pub status: ConnectorStatus,
    pub error_code: String,
    pub info: Option<String>,
    /// Set iff an Active transaction runs on this connector
    pub current_transaction_id: Option<i32>,
    pub updated_at: DateTime<Utc>,
}

impl Connector {
    pub fn new(charge_point_id: impl Into<String>, connector_id: u32) -> Self {
        Self {
            charge_point_id: charge_point_id.into(),
            connector_id,
            status: ConnectorStatus::Available,
            error_code: NO_ERROR.to_string(),
            info: None,
            current_transaction_id: None,
            updated_at: Utc::now(),
        }
    }

    pub fn update_status(
        &mut self,
        status: ConnectorStatus,
        error_code: Option<String>,
        info: Option<String>,
    ) {
        self.status = status;
        self.error_code = error_code.unwrap_or_else(|| NO_ERROR.to_string());
        self.info = info;
        self.updated_at = Utc::now();
    }

    pub fn begin_transaction(&mut self, transaction_id: i32) {
        self.status = ConnectorStatus::Charging;
        self.current_transaction_id = Some(transaction_id);
        self.updated_at = Utc::now();
    }

    pub fn end_transaction(&mut self) {
        self.status = ConnectorStatus::Available;
        self.current_transaction_id = None;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boot_accepts_and_touches() {
        let mut cp = ChargePoint::new("CP1");
        assert_eq!(cp.registration_status, RegistrationStatus::Pending);
        cp.apply_boot("Vendor", "Model", Some("SN".into()), None);
        assert!(cp.is_accepted());
        assert!(cp.last_seen.is_some());
        assert_eq!(cp.serial_number.as_deref(), Some("SN"));
    }

    #[test]
    fn connector_transaction_reference_follows_lifecycle() {
        let mut c = Connector::new("CP1", 1);
        c.begin_transaction(7);
        assert_eq!(c.status, ConnectorStatus::Charging);
        assert_eq!(c.current_transaction_id, Some(7));
        c.end_transaction();
        assert_eq!(c.status, ConnectorStatus::Available);
        assert!(c.current_transaction_id.is_none());
    }

    #[test]
    fn missing_error_code_defaults_to_no_error() {
        let mut c = Connector::new("CP1", 2);
        c.update_status(ConnectorStatus::Faulted, Some("GroundFailure".into()), None);
        assert_eq!(c.error_code, "GroundFailure");
        c.update_status(ConnectorStatus::Available, None, None);
        assert_eq!(c.error_code, NO_ERROR);
    }
}
