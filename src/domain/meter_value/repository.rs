use async_trait::async_trait;

use super::model::MeterReading;
use crate::shared::DomainResult;

#[async_trait]
pub trait MeterValueRepository: Send + Sync {
    /// Append readings, assigning ids. Returns how many were stored.
    async fn append(&self, readings: Vec<MeterReading>) -> DomainResult<usize>;

    async fn find_for_transaction(&self, transaction_id: i32) -> DomainResult<Vec<MeterReading>>;

    async fn find_for_charge_point(&self, charge_point_id: &str) -> DomainResult<Vec<MeterReading>>;
}
