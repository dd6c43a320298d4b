//! Firmware updates and diagnostics uploads

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::ServiceError;
use crate::application::commands::{v16, SharedCommandSender};
use crate::domain::firmware::DiagnosticsStatus;
use crate::domain::{Diagnostics, DomainResult, FirmwareStatus, FirmwareUpdate, RepositoryProvider};

pub struct FirmwareService {
    repos: Arc<dyn RepositoryProvider>,
    commands: SharedCommandSender,
}

impl FirmwareService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, commands: SharedCommandSender) -> Self {
        Self { repos, commands }
    }

    /// Record an Idle update, then ask the station to fetch the firmware.
    pub async fn update_firmware(
        &self,
        charge_point_id: &str,
        location: &str,
        retrieve_date: DateTime<Utc>,
        retries: Option<i32>,
        retry_interval: Option<i32>,
    ) -> Result<FirmwareUpdate, ServiceError> {
        let record = self
            .repos
            .firmware_updates()
            .create(FirmwareUpdate::new(
                charge_point_id,
                location,
                retrieve_date,
                retries,
                retry_interval,
            ))
            .await?;

        v16::update_firmware(
            &self.commands,
            charge_point_id,
            location,
            retrieve_date,
            retries,
            retry_interval,
        )
        .await?;
        Ok(record)
    }

    /// Record an Idle diagnostics request, then ask the station to upload.
    pub async fn get_diagnostics(
        &self,
        charge_point_id: &str,
        location: &str,
        retries: Option<i32>,
        retry_interval: Option<i32>,
        start_time: Option<DateTime<Utc>>,
        stop_time: Option<DateTime<Utc>>,
    ) -> Result<Diagnostics, ServiceError> {
        let mut record = self
            .repos
            .diagnostics()
            .create(Diagnostics::new(
                charge_point_id,
                location,
                retries,
                retry_interval,
                start_time,
                stop_time,
            ))
            .await?;

        let file_name = v16::get_diagnostics(
            &self.commands,
            charge_point_id,
            location,
            retries,
            retry_interval,
            start_time,
            stop_time,
        )
        .await?;

        if file_name.is_some() {
            record.file_name = file_name;
            self.repos.diagnostics().update(record.clone()).await?;
        }
        Ok(record)
    }

    /// Apply a FirmwareStatusNotification to the latest record. Unknown status
    /// names are logged and ignored; no record means no-op.
    pub async fn record_firmware_status(
        &self,
        charge_point_id: &str,
        status: &str,
    ) -> DomainResult<()> {
        let status: FirmwareStatus = match status.parse() {
            Ok(s) => s,
            Err(e) => {
                warn!(charge_point_id, error = e.as_str(), "Ignoring firmware status");
                return Ok(());
            }
        };

        match self.repos.firmware_updates().latest_for_charge_point(charge_point_id).await? {
            Some(mut update) => {
                update.status = status;
                self.repos.firmware_updates().update(update).await?;
                info!(charge_point_id, ?status, "Firmware status updated");
            }
            None => info!(charge_point_id, ?status, "Firmware status without a pending update"),
        }
        Ok(())
    }

    pub async fn record_diagnostics_status(
        &self,
        charge_point_id: &str,
        status: &str,
    ) -> DomainResult<()> {
        let status: DiagnosticsStatus = match status.parse() {
            Ok(s) => s,
            Err(e) => {
                warn!(charge_point_id, error = e.as_str(), "Ignoring diagnostics status");
                return Ok(());
            }
        };

        match self.repos.diagnostics().latest_for_charge_point(charge_point_id).await? {
            Some(mut diagnostics) => {
                diagnostics.status = status;
                self.repos.diagnostics().update(diagnostics).await?;
                info!(charge_point_id, ?status, "Diagnostics status updated");
            }
            None => info!(charge_point_id, ?status, "Diagnostics status without a pending request"),
        }
        Ok(())
    }

    pub async fn firmware_history(&self, charge_point_id: &str) -> DomainResult<Vec<FirmwareUpdate>> {
        self.repos.firmware_updates().find_for_charge_point(charge_point_id).await
    }

    pub async fn diagnostics_history(&self, charge_point_id: &str) -> DomainResult<Vec<Diagnostics>> {
        self.repos.diagnostics().find_for_charge_point(charge_point_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::commands::tests::{reply_to_call, RecordingSender};
    use crate::application::commands::CommandSender;
    use crate::infrastructure::InMemoryRepositoryProvider;
    use serde_json::json;

    fn service() -> (Arc<RecordingSender>, SharedCommandSender, Arc<FirmwareService>) {
        let rec = Arc::new(RecordingSender::default());
        let cs = Arc::new(CommandSender::new(rec.clone(), std::time::Duration::from_secs(5)));
        let svc = Arc::new(FirmwareService::new(
            Arc::new(InMemoryRepositoryProvider::new()),
            cs.clone(),
        ));
        (rec, cs, svc)
    }

    #[tokio::test]
    async fn status_notifications_update_latest_record() {
        let (rec, cs, svc) = service();
        for n in 0..2 {
            let task = {
                let svc = svc.clone();
                tokio::spawn(async move {
                    svc.update_firmware("CP1", "ftp://fw/bin", Utc::now(), None, None)
                        .await
                })
            };
            let (action, _) = reply_to_call(&rec, &cs, n, json!({})).await;
            assert_eq!(action, "UpdateFirmware");
            task.await.unwrap().unwrap();
        }

        svc.record_firmware_status("CP1", "Downloading").await.unwrap();
        svc.record_firmware_status("CP1", "Exploded").await.unwrap();

        let history = svc.firmware_history("CP1").await.unwrap();
        let latest = history.iter().max_by_key(|u| u.id).unwrap();
        let oldest = history.iter().min_by_key(|u| u.id).unwrap();
        assert_eq!(latest.status, FirmwareStatus::Downloading);
        assert_eq!(oldest.status, FirmwareStatus::Idle);
    }

    #[tokio::test]
    async fn status_without_record_is_a_no_op() {
        let (_rec, _cs, svc) = service();
        svc.record_diagnostics_status("CP1", "Uploaded").await.unwrap();
        assert!(svc.diagnostics_history("CP1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn diagnostics_keeps_reported_file_name() {
        let (rec, cs, svc) = service();
        let task = {
            let svc = svc.clone();
            tokio::spawn(async move {
                svc.get_diagnostics("CP1", "ftp://logs", None, None, None, None).await
            })
        };
        reply_to_call(&rec, &cs, 0, json!({"fileName": "diag.zip"})).await;
        let record = task.await.unwrap().unwrap();
        assert_eq!(record.file_name.as_deref(), Some("diag.zip"));
        assert_eq!(record.status, DiagnosticsStatus::Idle);
    }
}
