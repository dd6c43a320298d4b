//! Charging profile repository interface

use async_trait::async_trait;

use super::model::{ChargingProfile, ProfileFilter};
use crate::shared::DomainResult;

#[async_trait]
pub trait ChargingProfileRepository: Send + Sync {
    /// Insert or replace by (charge point, profile id)
    async fn save(&self, profile: ChargingProfile) -> DomainResult<()>;

    async fn find(
        &self,
        charge_point_id: &str,
        filter: &ProfileFilter,
    ) -> DomainResult<Vec<ChargingProfile>>;

    /// Delete every matching profile, returning how many were removed
    async fn delete(&self, charge_point_id: &str, filter: &ProfileFilter) -> DomainResult<usize>;
}
