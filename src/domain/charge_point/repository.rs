//! Charge point and connector repository interfaces

use async_trait::async_trait;

use super::model::{ChargePoint, Connector};
use crate::shared::DomainResult;

#[async_trait]
pub trait ChargePointRepository: Send + Sync {
    /// Insert or replace a charge point
    async fn save(&self, charge_point: ChargePoint) -> DomainResult<()>;

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<ChargePoint>>;

    /// Update an existing charge point; fails with NotFound otherwise
    async fn update(&self, charge_point: ChargePoint) -> DomainResult<()>;

    /// Refresh last-seen; no-op for unknown ids
    async fn touch(&self, id: &str) -> DomainResult<()>;

    async fn find_all(&self) -> DomainResult<Vec<ChargePoint>>;

    async fn delete(&self, id: &str) -> DomainResult<()>;
}

#[async_trait]
pub trait ConnectorRepository: Send + Sync {
    async fn find(&self, charge_point_id: &str, connector_id: u32)
        -> DomainResult<Option<Connector>>;

    /// Insert or replace
    async fn save(&self, connector: Connector) -> DomainResult<()>;

    async fn find_for_charge_point(&self, charge_point_id: &str) -> DomainResult<Vec<Connector>>;
}
