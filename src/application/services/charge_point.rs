//! Charge point business logic service

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::{ChargePoint, Connector, ConnectorStatus, DomainResult, RepositoryProvider};

/// Descriptors carried by BootNotification.
#[derive(Debug, Clone, Default)]
pub struct BootInfo {
    pub vendor: String,
    pub model: String,
    pub serial_number: Option<String>,
    pub firmware_version: Option<String>,
}

pub struct ChargePointService {
    repos: Arc<dyn RepositoryProvider>,
}

impl ChargePointService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    /// Upsert the station from a boot and accept it.
    pub async fn register_boot(
        &self,
        charge_point_id: &str,
        boot: BootInfo,
    ) -> DomainResult<ChargePoint> {
        let existing = self.repos.charge_points().find_by_id(charge_point_id).await?;
        let is_new = existing.is_none();

        let mut cp = existing.unwrap_or_else(|| ChargePoint::new(charge_point_id));
        cp.apply_boot(
            boot.vendor,
            boot.model,
            boot.serial_number,
            boot.firmware_version,
        );

        if is_new {
            self.repos.charge_points().save(cp.clone()).await?;
        } else {
            self.repos.charge_points().update(cp.clone()).await?;
        }

        info!(
            charge_point_id,
            vendor = cp.vendor.as_str(),
            model = cp.model.as_str(),
            is_new,
            "Charge point registered"
        );
        Ok(cp)
    }

    /// Refresh last-seen. Unknown stations are ignored.
    pub async fn touch(&self, charge_point_id: &str) -> DomainResult<()> {
        if self.repos.charge_points().find_by_id(charge_point_id).await?.is_some() {
            self.repos.charge_points().touch(charge_point_id).await?;
        } else {
            debug!(charge_point_id, "Frame from unregistered charge point");
        }
        Ok(())
    }

    pub async fn heartbeat(&self, charge_point_id: &str) -> DomainResult<()> {
        self.touch(charge_point_id).await
    }

    /// Upsert the connector's status; unknown connectors are created.
    pub async fn update_connector_status(
        &self,
        charge_point_id: &str,
        connector_id: u32,
        status: ConnectorStatus,
        error_code: Option<String>,
        info: Option<String>,
    ) -> DomainResult<Connector> {
        let mut connector = self
            .repos
            .connectors()
            .find(charge_point_id, connector_id)
            .await?
            .unwrap_or_else(|| {
                info!(charge_point_id, connector_id, "Connector added");
                Connector::new(charge_point_id, connector_id)
            });

        connector.update_status(status, error_code, info);
        self.repos.connectors().save(connector.clone()).await?;

        info!(
            charge_point_id,
            connector_id,
            status = %status,
            error_code = connector.error_code.as_str(),
            "Connector status updated"
        );
        Ok(connector)
    }

    pub async fn get_charge_point(&self, id: &str) -> DomainResult<Option<ChargePoint>> {
        self.repos.charge_points().find_by_id(id).await
    }

    pub async fn is_registered(&self, id: &str) -> DomainResult<bool> {
        Ok(self
            .get_charge_point(id)
            .await?
            .is_some_and(|cp| cp.is_accepted()))
    }

    pub async fn list_charge_points(&self) -> DomainResult<Vec<ChargePoint>> {
        self.repos.charge_points().find_all().await
    }

    pub async fn connectors(&self, charge_point_id: &str) -> DomainResult<Vec<Connector>> {
        self.repos.connectors().find_for_charge_point(charge_point_id).await
    }
}
