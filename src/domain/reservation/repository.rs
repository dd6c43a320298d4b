//! Reservation repository interface

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::{Reservation, ReservationStatus};
use crate::shared::DomainResult;

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    async fn save(&self, reservation: Reservation) -> DomainResult<()>;

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Reservation>>;

    async fn update(&self, reservation: Reservation) -> DomainResult<()>;

    /// Move an Accepted reservation to `to` in one step. Returns false when it
    /// had already left Accepted; NotFound when it does not exist.
    async fn transition_from_accepted(&self, id: i32, to: ReservationStatus) -> DomainResult<bool>;

    /// All reservations for a connector, any status
    async fn find_for_connector(
        &self,
        charge_point_id: &str,
        connector_id: u32,
    ) -> DomainResult<Vec<Reservation>>;

    async fn find_all(&self) -> DomainResult<Vec<Reservation>>;

    /// Accepted reservations whose expiry is at or before `now`
    async fn find_overdue(&self, now: DateTime<Utc>) -> DomainResult<Vec<Reservation>>;

    async fn max_id(&self) -> DomainResult<i32>;
}
