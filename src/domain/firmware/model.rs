//! Firmware update, diagnostics upload and local authorization list records

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Firmware ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FirmwareStatus {
    Downloaded,
    DownloadFailed,
    Downloading,
    Idle,
    InstallationFailed,
    Installing,
    Installed,
}

impl FromStr for FirmwareStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Downloaded" => Ok(Self::Downloaded),
            "DownloadFailed" => Ok(Self::DownloadFailed),
            "Downloading" => Ok(Self::Downloading),
            "Idle" => Ok(Self::Idle),
            "InstallationFailed" => Ok(Self::InstallationFailed),
            "Installing" => Ok(Self::Installing),
            "Installed" => Ok(Self::Installed),
            other => Err(format!("Invalid firmware status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FirmwareUpdate {
    pub id: i64,
    pub charge_point_id: String,
    pub location: String,
    pub retrieve_date: DateTime<Utc>,
    pub retries: Option<i32>,
    pub retry_interval: Option<i32>,
    pub status: FirmwareStatus,
    pub created_at: DateTime<Utc>,
}

impl FirmwareUpdate {
    pub fn new(
        charge_point_id: impl Into<String>,
        location: impl Into<String>,
        retrieve_date: DateTime<Utc>,
        retries: Option<i32>,
        retry_interval: Option<i32>,
    ) -> Self {
        Self {
            id: 0,
            charge_point_id: charge_point_id.into(),
            location: location.into(),
            retrieve_date,
            retries,
            retry_interval,
            status: FirmwareStatus::Idle,
            created_at: Utc::now(),
        }
    }
}

// ── Diagnostics ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticsStatus {
    Idle,
    Uploaded,
    UploadFailed,
    Uploading,
}

impl FromStr for DiagnosticsStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Idle" => Ok(Self::Idle),
            "Uploaded" => Ok(Self::Uploaded),
            "UploadFailed" => Ok(Self::UploadFailed),
            "Uploading" => Ok(Self::Uploading),
            other => Err(format!("Invalid diagnostics status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    pub id: i64,
    pub charge_point_id: String,
    pub location: String,
    pub retries: Option<i32>,
    pub retry_interval: Option<i32>,
    pub start_time: Option<DateTime<Utc>>,
    pub stop_time: Option<DateTime<Utc>>,
    pub status: DiagnosticsStatus,
    /// Reported by the station in the GetDiagnostics response
    pub file_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Diagnostics {
    pub fn new(
        charge_point_id: impl Into<String>,
        location: impl Into<String>,
        retries: Option<i32>,
        retry_interval: Option<i32>,
        start_time: Option<DateTime<Utc>>,
        stop_time: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: 0,
            charge_point_id: charge_point_id.into(),
            location: location.into(),
            retries,
            retry_interval,
            start_time,
            stop_time,
            status: DiagnosticsStatus::Idle,
            file_name: None,
            created_at: Utc::now(),
        }
    }
}

// ── Local authorization list ───────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateType {
    Full,
    Differential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LocalListStatus {
    Accepted,
    Failed,
    NotSupported,
    VersionMismatch,
}

impl FromStr for LocalListStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Accepted" => Ok(Self::Accepted),
            "Failed" => Ok(Self::Failed),
            "NotSupported" => Ok(Self::NotSupported),
            "VersionMismatch" => Ok(Self::VersionMismatch),
            other => Err(format!("Invalid local list status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LocalAuthList {
    pub id: i64,
    pub charge_point_id: String,
    pub list_version: i32,
    pub update_type: UpdateType,
    pub status: LocalListStatus,
    pub created_at: DateTime<Utc>,
}

impl LocalAuthList {
    pub fn new(charge_point_id: impl Into<String>, list_version: i32, update_type: UpdateType) -> Self {
        Self {
            id: 0,
            charge_point_id: charge_point_id.into(),
            list_version,
            update_type,
            status: LocalListStatus::Accepted,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn firmware_status_parses_known_values_only() {
        assert_eq!("Installed".parse::<FirmwareStatus>(), Ok(FirmwareStatus::Installed));
        assert_eq!(
            "DownloadFailed".parse::<FirmwareStatus>(),
            Ok(FirmwareStatus::DownloadFailed)
        );
        assert!("Exploded".parse::<FirmwareStatus>().is_err());
    }

    #[test]
    fn new_records_start_idle() {
        let fw = FirmwareUpdate::new("CP1", "ftp://fw", Utc::now(), None, None);
        assert_eq!(fw.status, FirmwareStatus::Idle);
        let diag = Diagnostics::new("CP1", "ftp://diag", None, None, None, None);
        assert_eq!(diag.status, DiagnosticsStatus::Idle);
    }
}
