//! Configuration repository interface

use async_trait::async_trait;

use super::model::ConfigurationEntry;
use crate::shared::DomainResult;

#[async_trait]
pub trait ConfigurationRepository: Send + Sync {
    async fn find_for_charge_point(&self, charge_point_id: &str)
        -> DomainResult<Vec<ConfigurationEntry>>;

    async fn find(&self, charge_point_id: &str, key: &str)
        -> DomainResult<Option<ConfigurationEntry>>;

    /// Insert or replace a single entry
    async fn save(&self, entry: ConfigurationEntry) -> DomainResult<()>;

    /// Store `entries` only if the station has none yet. Returns whether it seeded.
    async fn seed_if_empty(
        &self,
        charge_point_id: &str,
        entries: Vec<ConfigurationEntry>,
    ) -> DomainResult<bool>;
}
