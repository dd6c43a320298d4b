//! Reservation lifecycle: admin reserve/cancel, active lookup, expiry

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::ServiceError;
use crate::application::commands::{v16, SharedCommandSender};
use crate::domain::{DomainError, DomainResult, RepositoryProvider, Reservation, ReservationStatus};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveOutcome {
    pub reservation_id: i32,
    pub status: String,
}

pub struct ReservationService {
    repos: Arc<dyn RepositoryProvider>,
    commands: SharedCommandSender,
    /// Highest id handed out so far, so ids stay unique while a ReserveNow is in flight.
    last_allocated: Mutex<i32>,
}

impl ReservationService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, commands: SharedCommandSender) -> Self {
        Self {
            repos,
            commands,
            last_allocated: Mutex::new(0),
        }
    }

    async fn allocate_id(&self) -> DomainResult<i32> {
        let mut last = self.last_allocated.lock().await;
        let next = (*last).max(self.repos.reservations().max_id().await?) + 1;
        *last = next;
        Ok(next)
    }

    /// Issue ReserveNow with a fresh id; the reservation is stored only when
    /// the station accepts it.
    pub async fn reserve_now(
        &self,
        charge_point_id: &str,
        connector_id: u32,
        id_tag: &str,
        parent_id_tag: Option<&str>,
        expiry_date: DateTime<Utc>,
    ) -> Result<ReserveOutcome, ServiceError> {
        if expiry_date <= Utc::now() {
            return Err(DomainError::Validation("expiry date must be in the future".into()).into());
        }

        let reservation_id = self.allocate_id().await?;
        let status = v16::reserve_now(
            &self.commands,
            charge_point_id,
            reservation_id,
            connector_id,
            id_tag,
            parent_id_tag,
            expiry_date,
        )
        .await?;

        if status == "Accepted" {
            self.repos
                .reservations()
                .save(Reservation::new(
                    reservation_id,
                    charge_point_id,
                    connector_id,
                    id_tag,
                    parent_id_tag.map(str::to_string),
                    expiry_date,
                ))
                .await?;
            info!(reservation_id, charge_point_id, connector_id, id_tag, "Reservation created");
        } else {
            warn!(reservation_id, charge_point_id, status = status.as_str(), "ReserveNow not accepted");
        }

        Ok(ReserveOutcome {
            reservation_id,
            status,
        })
    }

    /// Issue CancelReservation and mark the reservation Cancelled once the
    /// station accepts.
    pub async fn cancel_reservation(&self, reservation_id: i32) -> Result<String, ServiceError> {
        let reservation = self
            .repos
            .reservations()
            .find_by_id(reservation_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Reservation", "id", reservation_id))?;

        let status =
            v16::cancel_reservation(&self.commands, &reservation.charge_point_id, reservation_id)
                .await?;
        if status == "Accepted" {
            self.cancel(reservation_id).await?;
        }
        Ok(status)
    }

    /// Store-only Accepted → Cancelled. Returns false if it already left Accepted.
    pub async fn cancel(&self, reservation_id: i32) -> DomainResult<bool> {
        let cancelled = self
            .repos
            .reservations()
            .transition_from_accepted(reservation_id, ReservationStatus::Cancelled)
            .await?;
        if cancelled {
            info!(reservation_id, "Reservation cancelled");
        }
        Ok(cancelled)
    }

    /// Accepted reservations with a future expiry.
    pub async fn find_active(
        &self,
        charge_point_id: &str,
        connector_id: u32,
    ) -> DomainResult<Vec<Reservation>> {
        let now = Utc::now();
        Ok(self
            .repos
            .reservations()
            .find_for_connector(charge_point_id, connector_id)
            .await?
            .into_iter()
            .filter(|r| r.is_active_at(now))
            .collect())
    }

    pub async fn find(&self, reservation_id: i32) -> DomainResult<Option<Reservation>> {
        self.repos.reservations().find_by_id(reservation_id).await
    }

    /// Move every overdue Accepted reservation to Expired. Returns the count.
    pub async fn expire_overdue(&self, now: DateTime<Utc>) -> DomainResult<usize> {
        expire_overdue(self.repos.as_ref(), now).await
    }
}

pub(crate) async fn expire_overdue(
    repos: &dyn RepositoryProvider,
    now: DateTime<Utc>,
) -> DomainResult<usize> {
    let overdue = repos.reservations().find_overdue(now).await?;
    let mut expired = 0;
    for reservation in overdue {
        let id = reservation.id;
        match repos
            .reservations()
            .transition_from_accepted(id, ReservationStatus::Expired)
            .await
        {
            Ok(true) => {
                info!(reservation_id = id, "Reservation expired");
                expired += 1;
            }
            Ok(false) => debug!(reservation_id = id, "Reservation left Accepted before expiry"),
            Err(e) => warn!(reservation_id = id, error = %e, "Failed to expire reservation"),
        }
    }
    Ok(expired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::commands::tests::{reply_to_call, RecordingSender};
    use crate::application::commands::CommandSender;
    use crate::infrastructure::InMemoryRepositoryProvider;
    use chrono::Duration;
    use serde_json::json;

    fn setup() -> (
        Arc<InMemoryRepositoryProvider>,
        Arc<RecordingSender>,
        SharedCommandSender,
        Arc<ReservationService>,
    ) {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let rec = Arc::new(RecordingSender::default());
        let cs = Arc::new(CommandSender::new(rec.clone(), std::time::Duration::from_secs(5)));
        let svc = Arc::new(ReservationService::new(repos.clone(), cs.clone()));
        (repos, rec, cs, svc)
    }

    #[tokio::test]
    async fn reserve_then_cancel() {
        let (_repos, rec, cs, svc) = setup();
        let expiry = Utc::now() + Duration::hours(1);

        let task = {
            let svc = svc.clone();
            tokio::spawn(async move { svc.reserve_now("CP1", 1, "TAG1", None, expiry).await })
        };
        let (action, request) = reply_to_call(&rec, &cs, 0, json!({"status": "Accepted"})).await;
        assert_eq!(action, "ReserveNow");
        let outcome = task.await.unwrap().unwrap();
        assert_eq!(request["reservationId"], outcome.reservation_id);
        assert_eq!(svc.find_active("CP1", 1).await.unwrap().len(), 1);

        let task = {
            let svc = svc.clone();
            let id = outcome.reservation_id;
            tokio::spawn(async move { svc.cancel_reservation(id).await })
        };
        let (action, _) = reply_to_call(&rec, &cs, 1, json!({"status": "Accepted"})).await;
        assert_eq!(action, "CancelReservation");
        assert_eq!(task.await.unwrap().unwrap(), "Accepted");

        let r = svc.find(outcome.reservation_id).await.unwrap().unwrap();
        assert_eq!(r.status, ReservationStatus::Cancelled);
        assert!(svc.find_active("CP1", 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejected_reserve_stores_nothing() {
        let (repos, rec, cs, svc) = setup();
        let task = {
            let svc = svc.clone();
            tokio::spawn(async move {
                svc.reserve_now("CP1", 1, "TAG1", None, Utc::now() + Duration::hours(1))
                    .await
            })
        };
        reply_to_call(&rec, &cs, 0, json!({"status": "Occupied"})).await;
        assert_eq!(task.await.unwrap().unwrap().status, "Occupied");
        assert!(repos.reservations().find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn expiry_skips_cancelled() {
        let (repos, _rec, _cs, svc) = setup();
        let past = Utc::now() - Duration::minutes(1);
        repos
            .reservations()
            .save(Reservation::new(1, "CP1", 1, "A", None, past))
            .await
            .unwrap();
        let mut cancelled = Reservation::new(2, "CP1", 2, "B", None, past);
        cancelled.cancel();
        repos.reservations().save(cancelled).await.unwrap();

        assert_eq!(svc.expire_overdue(Utc::now()).await.unwrap(), 1);
        assert_eq!(
            svc.find(1).await.unwrap().unwrap().status,
            ReservationStatus::Expired
        );
        assert_eq!(
            svc.find(2).await.unwrap().unwrap().status,
            ReservationStatus::Cancelled
        );
        assert_eq!(svc.expire_overdue(Utc::now()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn cancel_after_expiry_keeps_expired() {
        let (repos, _rec, _cs, svc) = setup();
        repos
            .reservations()
            .save(Reservation::new(1, "CP1", 1, "A", None, Utc::now() - Duration::minutes(1)))
            .await
            .unwrap();

        assert_eq!(svc.expire_overdue(Utc::now()).await.unwrap(), 1);
        assert!(!svc.cancel(1).await.unwrap());
        assert_eq!(svc.find(1).await.unwrap().unwrap().status, ReservationStatus::Expired);
    }

    #[tokio::test]
    async fn sweep_does_not_overwrite_cancel_between_read_and_write() {
        let (repos, _rec, _cs, svc) = setup();
        let now = Utc::now();
        repos
            .reservations()
            .save(Reservation::new(1, "CP1", 1, "A", None, now - Duration::minutes(1)))
            .await
            .unwrap();

        // The sweep has read its overdue set; a cancel lands before it writes.
        let snapshot = repos.reservations().find_overdue(now).await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert!(svc.cancel(1).await.unwrap());
        assert!(!repos
            .reservations()
            .transition_from_accepted(snapshot[0].id, ReservationStatus::Expired)
            .await
            .unwrap());

        assert_eq!(svc.expire_overdue(now).await.unwrap(), 0);
        assert_eq!(svc.find(1).await.unwrap().unwrap().status, ReservationStatus::Cancelled);
    }

    #[tokio::test]
    async fn concurrent_sweeps_and_cancels_settle_once() {
        let (repos, _rec, _cs, svc) = setup();
        let past = Utc::now() - Duration::minutes(1);
        for id in 1..=20 {
            repos
                .reservations()
                .save(Reservation::new(id, "CP1", id as u32, "A", None, past))
                .await
                .unwrap();
        }

        let mut tasks = Vec::new();
        for id in 1..=20 {
            let svc = svc.clone();
            tasks.push(tokio::spawn(async move { svc.cancel(id).await.unwrap() as usize }));
        }
        let sweeps: Vec<_> = (0..4)
            .map(|_| {
                let svc = svc.clone();
                tokio::spawn(async move { svc.expire_overdue(Utc::now()).await.unwrap() })
            })
            .collect();

        let mut settled = 0;
        for t in tasks {
            settled += t.await.unwrap();
        }
        for t in sweeps {
            settled += t.await.unwrap();
        }
        assert_eq!(settled, 20);
        assert!(repos
            .reservations()
            .find_all()
            .await
            .unwrap()
            .iter()
            .all(|r| r.status != ReservationStatus::Accepted));
    }
}
