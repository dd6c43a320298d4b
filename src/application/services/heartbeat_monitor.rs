//! Heartbeat Monitor Service
//!
//! Periodically reports registered charge points that have gone silent and
//! refreshes the connected-stations gauge.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::application::ports::StationSender;
use crate::domain::{DomainResult, RepositoryProvider};
use crate::shared::shutdown::ShutdownSignal;

#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    pub check_interval_secs: u64,
    /// Silence longer than this marks a station stale
    pub offline_threshold_secs: i64,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: 300,
            offline_threshold_secs: 600,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HeartbeatStatus {
    pub charge_point_id: String,
    pub last_seen: Option<DateTime<Utc>>,
    pub is_connected: bool,
    pub seconds_since_seen: Option<i64>,
}

pub struct HeartbeatMonitor {
    repos: Arc<dyn RepositoryProvider>,
    channels: Arc<dyn StationSender>,
    config: HeartbeatConfig,
}

impl HeartbeatMonitor {
    pub fn new(repos: Arc<dyn RepositoryProvider>, channels: Arc<dyn StationSender>) -> Self {
        Self {
            repos,
            channels,
            config: HeartbeatConfig::default(),
        }
    }

    pub fn with_config(mut self, config: HeartbeatConfig) -> Self {
        self.config = config;
        self
    }

    pub fn start(self: Arc<Self>, shutdown: ShutdownSignal) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                "💓 Heartbeat monitor started (check interval: {}s, offline threshold: {}s)",
                self.config.check_interval_secs, self.config.offline_threshold_secs
            );

            let mut interval =
                tokio::time::interval(Duration::from_secs(self.config.check_interval_secs.max(1)));
            let stop = shutdown.notified().wait();
            tokio::pin!(stop);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(e) = self.check().await {
                            warn!(error = %e, "Heartbeat check error");
                        }
                    }
                    _ = &mut stop => {
                        info!("💓 Heartbeat monitor shutting down");
                        break;
                    }
                }
            }

            info!("💓 Heartbeat monitor stopped");
        })
    }

    /// One pass: log stale stations and return them.
    pub async fn check(&self) -> DomainResult<Vec<HeartbeatStatus>> {
        let statuses = self.statuses().await?;
        let connected = statuses.iter().filter(|s| s.is_connected).count();
        metrics::gauge!("ocpp_connected_stations").set(connected as f64);

        let stale: Vec<_> = statuses
            .into_iter()
            .filter(|s| {
                s.seconds_since_seen
                    .map_or(true, |secs| secs > self.config.offline_threshold_secs)
            })
            .collect();

        for s in &stale {
            warn!(
                charge_point_id = s.charge_point_id.as_str(),
                seconds_since_seen = ?s.seconds_since_seen,
                is_connected = s.is_connected,
                "Charge point silent past offline threshold"
            );
        }
        debug!(connected, stale = stale.len(), "💓 Heartbeat check complete");
        Ok(stale)
    }

    pub async fn statuses(&self) -> DomainResult<Vec<HeartbeatStatus>> {
        let now = Utc::now();
        Ok(self
            .repos
            .charge_points()
            .find_all()
            .await?
            .into_iter()
            .map(|cp| HeartbeatStatus {
                is_connected: self.channels.is_connected(&cp.id),
                seconds_since_seen: cp.silence_secs(now),
                last_seen: cp.last_seen,
                charge_point_id: cp.id,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::commands::tests::RecordingSender;
    use crate::domain::ChargePoint;
    use crate::infrastructure::InMemoryRepositoryProvider;

    #[tokio::test]
    async fn silent_station_is_reported() {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let mut fresh = ChargePoint::new("FRESH");
        fresh.touch();
        let mut quiet = ChargePoint::new("QUIET");
        quiet.last_seen = Some(Utc::now() - chrono::Duration::seconds(900));
        repos.charge_points().save(fresh).await.unwrap();
        repos.charge_points().save(quiet).await.unwrap();

        let monitor = HeartbeatMonitor::new(repos, Arc::new(RecordingSender::default()));
        let stale = monitor.check().await.unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].charge_point_id, "QUIET");
        assert!(stale[0].is_connected);
    }
}
