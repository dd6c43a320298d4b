//! Background task that periodically expires overdue reservations.

use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{info, warn};

use super::reservation::expire_overdue;
use crate::domain::RepositoryProvider;
use crate::shared::shutdown::ShutdownSignal;

/// Start the reservation sweeper. Every `check_interval_secs` each Accepted
/// reservation whose expiry has passed becomes Expired.
pub fn start_reservation_sweeper(
    repos: Arc<dyn RepositoryProvider>,
    shutdown: ShutdownSignal,
    check_interval_secs: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            check_interval = check_interval_secs,
            "📅 Reservation sweeper started"
        );

        let mut interval = tokio::time::interval(Duration::from_secs(check_interval_secs.max(1)));
        let stop = shutdown.notified().wait();
        tokio::pin!(stop);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match expire_overdue(repos.as_ref(), Utc::now()).await {
                        Ok(0) => {}
                        Ok(count) => {
                            info!(count, "📅 Expired overdue reservations");
                            metrics::counter!("ocpp_reservations_expired_total").increment(count as u64);
                        }
                        Err(e) => warn!(error = %e, "Reservation sweep error"),
                    }
                }
                _ = &mut stop => {
                    info!("📅 Reservation sweeper shutting down");
                    break;
                }
            }
        }

        info!("📅 Reservation sweeper stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Reservation, ReservationStatus};
    use crate::infrastructure::InMemoryRepositoryProvider;

    #[tokio::test]
    async fn first_tick_expires_and_shutdown_stops() {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        repos
            .reservations()
            .save(Reservation::new(
                1,
                "CP1",
                1,
                "TAG",
                None,
                Utc::now() - chrono::Duration::seconds(5),
            ))
            .await
            .unwrap();

        let shutdown = ShutdownSignal::new();
        let handle = start_reservation_sweeper(repos.clone(), shutdown.clone(), 3600);

        let mut status = ReservationStatus::Accepted;
        for _ in 0..100 {
            status = repos.reservations().find_by_id(1).await.unwrap().unwrap().status;
            if status == ReservationStatus::Expired {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(status, ReservationStatus::Expired);

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper should stop")
            .unwrap();
    }
}
