//! Transaction lifecycle: start, stop, administrative stop

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::authorization::AuthorizationService;
use crate::domain::{
    AuthorizationResult, AuthorizationStatus, DomainError, DomainResult, RepositoryProvider,
    Transaction,
};

/// Transaction id answered when a start is not accepted.
pub const REJECTED_TRANSACTION_ID: i32 = -1;

#[derive(Debug, Clone)]
pub struct StartRequest {
    pub connector_id: u32,
    pub id_tag: String,
    pub meter_start: i32,
    pub timestamp: DateTime<Utc>,
    pub reservation_id: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct StartOutcome {
    pub transaction_id: i32,
    pub authorization: AuthorizationResult,
}

#[derive(Debug, Clone)]
pub struct StopRequest {
    pub transaction_id: i32,
    pub id_tag: Option<String>,
    pub meter_stop: i32,
    pub timestamp: DateTime<Utc>,
    pub reason: Option<String>,
}

pub struct TransactionService {
    repos: Arc<dyn RepositoryProvider>,
    auth: Arc<AuthorizationService>,
    /// Serializes id allocation and the save that claims it.
    allocation: Mutex<()>,
}

impl TransactionService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, auth: Arc<AuthorizationService>) -> Self {
        Self {
            repos,
            auth,
            allocation: Mutex::new(()),
        }
    }

    /// Authorize and open a transaction. A non-Accepted outcome creates nothing
    /// and carries [`REJECTED_TRANSACTION_ID`].
    pub async fn start_transaction(
        &self,
        charge_point_id: &str,
        req: StartRequest,
    ) -> DomainResult<StartOutcome> {
        if self.repos.charge_points().find_by_id(charge_point_id).await?.is_none() {
            return Err(DomainError::not_found("ChargePoint", "id", charge_point_id));
        }

        let authorization = self.auth.authorize(&req.id_tag).await?;
        if !authorization.is_accepted() {
            info!(
                charge_point_id,
                id_tag = req.id_tag.as_str(),
                status = %authorization.status,
                "Start rejected by authorization"
            );
            return Ok(StartOutcome {
                transaction_id: REJECTED_TRANSACTION_ID,
                authorization,
            });
        }

        let reservation_id = self
            .check_reservation(charge_point_id, &req, authorization.parent_id_tag.as_deref())
            .await?;

        let _guard = self.allocation.lock().await;

        if let Some(active) = self
            .repos
            .transactions()
            .find_active_for_connector(charge_point_id, req.connector_id)
            .await?
        {
            warn!(
                charge_point_id,
                connector_id = req.connector_id,
                active_transaction = active.id,
                "Connector already has an active transaction"
            );
            return Ok(StartOutcome {
                transaction_id: REJECTED_TRANSACTION_ID,
                authorization: AuthorizationResult {
                    status: AuthorizationStatus::ConcurrentTx,
                    ..authorization
                },
            });
        }

        let transaction_id = self.repos.transactions().max_id().await? + 1;
        let mut transaction = Transaction::new(
            transaction_id,
            charge_point_id,
            req.connector_id,
            &req.id_tag,
            req.meter_start,
            req.timestamp,
        );
        transaction.reservation_id = reservation_id;
        self.repos.transactions().save(transaction).await?;

        let mut connector = self
            .repos
            .connectors()
            .find(charge_point_id, req.connector_id)
            .await?
            .unwrap_or_else(|| crate::domain::Connector::new(charge_point_id, req.connector_id));
        connector.begin_transaction(transaction_id);
        self.repos.connectors().save(connector).await?;

        info!(
            transaction_id,
            charge_point_id,
            connector_id = req.connector_id,
            id_tag = req.id_tag.as_str(),
            "Transaction started"
        );

        Ok(StartOutcome {
            transaction_id,
            authorization,
        })
    }

    /// Advisory only: a start by someone other than the holder is logged, not refused.
    async fn check_reservation(
        &self,
        charge_point_id: &str,
        req: &StartRequest,
        parent_id_tag: Option<&str>,
    ) -> DomainResult<Option<i32>> {
        let now = Utc::now();
        let active: Vec<_> = self
            .repos
            .reservations()
            .find_for_connector(charge_point_id, req.connector_id)
            .await?
            .into_iter()
            .filter(|r| r.is_active_at(now))
            .collect();

        if active.is_empty() {
            return Ok(req.reservation_id);
        }

        match active.iter().find(|r| r.is_held_by(&req.id_tag, parent_id_tag)) {
            Some(held) => Ok(Some(held.id)),
            None => {
                warn!(
                    charge_point_id,
                    connector_id = req.connector_id,
                    id_tag = req.id_tag.as_str(),
                    reservations = active.len(),
                    "Start on a connector reserved for another idTag"
                );
                Ok(req.reservation_id)
            }
        }
    }

    /// Close the transaction and free its connector. Returns the idTagInfo to
    /// answer with: the stop idTag's authorization, or Accepted when absent.
    pub async fn stop_transaction(
        &self,
        charge_point_id: &str,
        req: StopRequest,
    ) -> DomainResult<AuthorizationResult> {
        let authorization = match req.id_tag.as_deref() {
            Some(tag) => self.auth.authorize(tag).await?,
            None => AuthorizationResult::with_status(AuthorizationStatus::Accepted),
        };

        match self.repos.transactions().find_by_id(req.transaction_id).await? {
            Some(transaction) if transaction.is_active() => {
                let closed = self
                    .close(transaction.id, Some(req.meter_stop), req.timestamp, req.reason)
                    .await?;
                if closed.is_none() {
                    warn!(
                        charge_point_id,
                        transaction_id = transaction.id,
                        "Transaction was closed concurrently"
                    );
                }
            }
            Some(transaction) => warn!(
                charge_point_id,
                transaction_id = transaction.id,
                "Stop for a transaction that is already completed"
            ),
            None => warn!(
                charge_point_id,
                transaction_id = req.transaction_id,
                "Transaction not found for stop request"
            ),
        }

        Ok(authorization)
    }

    /// Operator-initiated close, without a station message.
    pub async fn stop_transaction_admin(
        &self,
        transaction_id: i32,
        meter_stop: Option<i32>,
    ) -> DomainResult<Transaction> {
        if self.repos.transactions().find_by_id(transaction_id).await?.is_none() {
            return Err(DomainError::not_found("Transaction", "id", transaction_id));
        }
        self.close(transaction_id, meter_stop, Utc::now(), Some("Remote".into()))
            .await?
            .ok_or_else(|| {
                DomainError::Validation(format!("Transaction {} is not active", transaction_id))
            })
    }

    /// Complete an active transaction and release its connector. Runs under the
    /// allocation lock so it cannot interleave with a start on the same
    /// connector. `None` when the transaction is missing or already completed.
    async fn close(
        &self,
        transaction_id: i32,
        meter_stop: Option<i32>,
        stopped_at: DateTime<Utc>,
        reason: Option<String>,
    ) -> DomainResult<Option<Transaction>> {
        let _guard = self.allocation.lock().await;

        let Some(mut transaction) = self.repos.transactions().find_by_id(transaction_id).await?
        else {
            return Ok(None);
        };
        if !transaction.is_active() {
            return Ok(None);
        }
        transaction.complete(meter_stop, stopped_at, reason);
        self.repos.transactions().update(transaction.clone()).await?;

        if let Some(mut connector) = self
            .repos
            .connectors()
            .find(&transaction.charge_point_id, transaction.connector_id)
            .await?
        {
            if connector.current_transaction_id == Some(transaction.id) {
                connector.end_transaction();
                self.repos.connectors().save(connector).await?;
            } else {
                warn!(
                    transaction_id = transaction.id,
                    connector_transaction = ?connector.current_transaction_id,
                    "Connector points at another transaction; left unchanged"
                );
            }
        }

        info!(
            transaction_id = transaction.id,
            charge_point_id = transaction.charge_point_id.as_str(),
            energy_wh = transaction.energy_wh(),
            reason = ?transaction.stop_reason,
            "Transaction stopped"
        );
        Ok(Some(transaction))
    }

    pub async fn find(&self, transaction_id: i32) -> DomainResult<Option<Transaction>> {
        self.repos.transactions().find_by_id(transaction_id).await
    }

    pub async fn transactions_for_station(
        &self,
        charge_point_id: &str,
    ) -> DomainResult<Vec<Transaction>> {
        self.repos.transactions().find_for_charge_point(charge_point_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChargePoint, ConnectorStatus, IdTag, Reservation, TransactionStatus};
    use crate::infrastructure::InMemoryRepositoryProvider;
    use chrono::Duration;

    async fn setup() -> (Arc<InMemoryRepositoryProvider>, TransactionService) {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let auth = Arc::new(AuthorizationService::new(repos.clone()));
        auth.add_id_tag(IdTag::new("TAG1")).await.unwrap();
        auth.add_id_tag(IdTag::new("TAG2")).await.unwrap();
        let mut blocked = IdTag::new("BAD");
        blocked.blocked = true;
        auth.add_id_tag(blocked).await.unwrap();

        let mut cp = ChargePoint::new("CP1");
        cp.apply_boot("ACME", "X", None, None);
        repos.charge_points().save(cp).await.unwrap();

        (repos.clone(), TransactionService::new(repos, auth))
    }

    fn start(connector_id: u32, id_tag: &str) -> StartRequest {
        StartRequest {
            connector_id,
            id_tag: id_tag.into(),
            meter_start: 1000,
            timestamp: Utc::now(),
            reservation_id: None,
        }
    }

    #[tokio::test]
    async fn start_then_stop() {
        let (repos, svc) = setup().await;
        let out = svc.start_transaction("CP1", start(1, "TAG1")).await.unwrap();
        assert_eq!(out.authorization.status, AuthorizationStatus::Accepted);
        assert!(out.transaction_id >= 1);

        let conn = repos.connectors().find("CP1", 1).await.unwrap().unwrap();
        assert_eq!(conn.status, ConnectorStatus::Charging);
        assert_eq!(conn.current_transaction_id, Some(out.transaction_id));

        svc.stop_transaction(
            "CP1",
            StopRequest {
                transaction_id: out.transaction_id,
                id_tag: None,
                meter_stop: 4500,
                timestamp: Utc::now(),
                reason: None,
            },
        )
        .await
        .unwrap();

        let tx = svc.find(out.transaction_id).await.unwrap().unwrap();
        assert_eq!(tx.status, TransactionStatus::Completed);
        assert_eq!(tx.energy_wh(), Some(3500));
        let conn = repos.connectors().find("CP1", 1).await.unwrap().unwrap();
        assert_eq!(conn.status, ConnectorStatus::Available);
        assert_eq!(conn.current_transaction_id, None);
    }

    #[tokio::test]
    async fn rejected_start_creates_nothing() {
        let (_repos, svc) = setup().await;
        for tag in ["BAD", "UNKNOWN"] {
            let out = svc.start_transaction("CP1", start(1, tag)).await.unwrap();
            assert_eq!(out.transaction_id, REJECTED_TRANSACTION_ID);
        }
        assert!(svc.transactions_for_station("CP1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn second_start_on_busy_connector_is_concurrent_tx() {
        let (_repos, svc) = setup().await;
        svc.start_transaction("CP1", start(1, "TAG1")).await.unwrap();
        let out = svc.start_transaction("CP1", start(1, "TAG2")).await.unwrap();
        assert_eq!(out.authorization.status, AuthorizationStatus::ConcurrentTx);
        assert_eq!(out.transaction_id, REJECTED_TRANSACTION_ID);
        assert_eq!(svc.transactions_for_station("CP1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_starts_get_distinct_ids() {
        let (_repos, svc) = setup().await;
        let svc = Arc::new(svc);
        let handles: Vec<_> = (1..=8)
            .map(|c| {
                let svc = svc.clone();
                tokio::spawn(async move { svc.start_transaction("CP1", start(c, "TAG1")).await })
            })
            .collect();

        let mut ids = Vec::new();
        for h in handles {
            ids.push(h.await.unwrap().unwrap().transaction_id);
        }
        ids.sort();
        ids.dedup();
        assert_eq!(ids, (1..=8).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn unregistered_station_cannot_start() {
        let (_repos, svc) = setup().await;
        assert!(matches!(
            svc.start_transaction("CP9", start(1, "TAG1")).await,
            Err(DomainError::NotFound { entity: "ChargePoint", .. })
        ));
    }

    #[tokio::test]
    async fn reservation_mismatch_is_advisory() {
        let (repos, svc) = setup().await;
        repos
            .reservations()
            .save(Reservation::new(
                7,
                "CP1",
                1,
                "TAG2",
                None,
                Utc::now() + Duration::hours(1),
            ))
            .await
            .unwrap();

        let out = svc.start_transaction("CP1", start(1, "TAG1")).await.unwrap();
        assert!(out.transaction_id >= 1);
        let tx = svc.find(out.transaction_id).await.unwrap().unwrap();
        assert_eq!(tx.reservation_id, None);
    }

    #[tokio::test]
    async fn admin_stop_frees_connector() {
        let (repos, svc) = setup().await;
        let out = svc.start_transaction("CP1", start(2, "TAG1")).await.unwrap();
        let tx = svc.stop_transaction_admin(out.transaction_id, None).await.unwrap();
        assert_eq!(tx.meter_stop, Some(1000));
        let conn = repos.connectors().find("CP1", 2).await.unwrap().unwrap();
        assert!(conn.current_transaction_id.is_none());
        assert!(svc.stop_transaction_admin(out.transaction_id, None).await.is_err());
    }

    #[tokio::test]
    async fn stop_leaves_connector_claimed_by_newer_transaction() {
        let (repos, svc) = setup().await;
        let first = svc.start_transaction("CP1", start(1, "TAG1")).await.unwrap();

        // A newer transaction already owns the connector when the old one closes.
        let newer = Transaction::new(99, "CP1", 1, "TAG2", 0, Utc::now());
        repos.transactions().save(newer).await.unwrap();
        let mut conn = repos.connectors().find("CP1", 1).await.unwrap().unwrap();
        conn.begin_transaction(99);
        repos.connectors().save(conn).await.unwrap();

        svc.stop_transaction_admin(first.transaction_id, None).await.unwrap();

        let conn = repos.connectors().find("CP1", 1).await.unwrap().unwrap();
        assert_eq!(conn.current_transaction_id, Some(99));
        assert_eq!(conn.status, ConnectorStatus::Charging);
    }

    #[tokio::test]
    async fn admin_stop_racing_station_start_keeps_connector_consistent() {
        let (repos, svc) = setup().await;
        let svc = Arc::new(svc);

        for _ in 0..20 {
            let active = match repos
                .transactions()
                .find_active_for_connector("CP1", 1)
                .await
                .unwrap()
            {
                Some(tx) => tx.id,
                None => svc.start_transaction("CP1", start(1, "TAG1")).await.unwrap().transaction_id,
            };

            let stopper = {
                let svc = svc.clone();
                tokio::spawn(async move { svc.stop_transaction_admin(active, None).await })
            };
            let starter = {
                let svc = svc.clone();
                tokio::spawn(async move { svc.start_transaction("CP1", start(1, "TAG2")).await })
            };
            stopper.await.unwrap().unwrap();
            starter.await.unwrap().unwrap();

            let active = repos
                .transactions()
                .find_active_for_connector("CP1", 1)
                .await
                .unwrap()
                .map(|tx| tx.id);
            let conn = repos.connectors().find("CP1", 1).await.unwrap().unwrap();
            assert_eq!(conn.current_transaction_id, active);
        }
    }

    #[tokio::test]
    async fn double_stop_closes_once() {
        let (_repos, svc) = setup().await;
        let svc = Arc::new(svc);
        let out = svc.start_transaction("CP1", start(1, "TAG1")).await.unwrap();

        let stops: Vec<_> = (0..4)
            .map(|_| {
                let svc = svc.clone();
                let id = out.transaction_id;
                tokio::spawn(async move { svc.stop_transaction_admin(id, Some(2000)).await.is_ok() })
            })
            .collect();
        let mut ok = 0;
        for s in stops {
            ok += s.await.unwrap() as usize;
        }
        assert_eq!(ok, 1);
    }
}
