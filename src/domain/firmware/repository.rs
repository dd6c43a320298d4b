//! Repositories for firmware, diagnostics and local list records.
//!
//! Records are append-only apart from their status; "latest" means the most
//! recently created record for the station.

use async_trait::async_trait;

use super::model::{Diagnostics, FirmwareUpdate, LocalAuthList};
use crate::shared::DomainResult;

#[async_trait]
pub trait FirmwareUpdateRepository: Send + Sync {
    /// Store a new record, returning it with its assigned id
    async fn create(&self, update: FirmwareUpdate) -> DomainResult<FirmwareUpdate>;
    async fn update(&self, update: FirmwareUpdate) -> DomainResult<()>;
    async fn latest_for_charge_point(&self, charge_point_id: &str)
        -> DomainResult<Option<FirmwareUpdate>>;
    async fn find_for_charge_point(&self, charge_point_id: &str) -> DomainResult<Vec<FirmwareUpdate>>;
}

#[async_trait]
pub trait DiagnosticsRepository: Send + Sync {
    async fn create(&self, diagnostics: Diagnostics) -> DomainResult<Diagnostics>;
    async fn update(&self, diagnostics: Diagnostics) -> DomainResult<()>;
    async fn latest_for_charge_point(&self, charge_point_id: &str)
        -> DomainResult<Option<Diagnostics>>;
    async fn find_for_charge_point(&self, charge_point_id: &str) -> DomainResult<Vec<Diagnostics>>;
}

#[async_trait]
pub trait LocalAuthListRepository: Send + Sync {
    async fn create(&self, list: LocalAuthList) -> DomainResult<LocalAuthList>;
    async fn update(&self, list: LocalAuthList) -> DomainResult<()>;
    async fn latest_for_charge_point(&self, charge_point_id: &str)
        -> DomainResult<Option<LocalAuthList>>;
}
