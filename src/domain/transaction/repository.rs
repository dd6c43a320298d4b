//! Transaction repository interface

use async_trait::async_trait;

use super::model::Transaction;
use crate::shared::DomainResult;

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Save a new transaction; fails with Conflict on a duplicate id
    async fn save(&self, transaction: Transaction) -> DomainResult<()>;

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Transaction>>;

    async fn update(&self, transaction: Transaction) -> DomainResult<()>;

    async fn find_active_for_connector(
        &self,
        charge_point_id: &str,
        connector_id: u32,
    ) -> DomainResult<Option<Transaction>>;

    async fn find_for_charge_point(&self, charge_point_id: &str) -> DomainResult<Vec<Transaction>>;

    /// Highest id ever stored, 0 when empty
    async fn max_id(&self) -> DomainResult<i32>;
}
