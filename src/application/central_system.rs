//! Composition root for the central system core.
//!
//! Construction order breaks the registry / worker cycle: the registry only
//! knows the inbound queue, the command sender and workers only know the
//! registry as a [`StationSender`].

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::application::commands::{CommandSender, SharedCommandSender};
use crate::application::handlers::Dispatcher;
use crate::application::ports::{InboundEvent, StationSender};
use crate::application::services::{
    start_reservation_sweeper, HeartbeatConfig, HeartbeatMonitor, Services,
};
use crate::application::session::{ChannelRegistry, SharedChannelRegistry, StationWorkers};
use crate::config::OcppConfig;
use crate::domain::RepositoryProvider;
use crate::shared::shutdown::ShutdownSignal;

pub struct CentralSystem {
    pub repos: Arc<dyn RepositoryProvider>,
    pub registry: SharedChannelRegistry,
    pub commands: SharedCommandSender,
    pub services: Services,
    pub dispatcher: Arc<Dispatcher>,
    pub heartbeat_monitor: Arc<HeartbeatMonitor>,
    config: OcppConfig,
    inbound: Option<mpsc::UnboundedReceiver<InboundEvent>>,
}

impl CentralSystem {
    pub fn new(repos: Arc<dyn RepositoryProvider>, config: OcppConfig) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let registry = ChannelRegistry::shared(Arc::new(inbound_tx));
        let outbound: Arc<dyn StationSender> = registry.clone();

        let commands = Arc::new(CommandSender::new(outbound.clone(), config.command_timeout()));
        let services = Services::new(repos.clone(), commands.clone());
        let dispatcher = Arc::new(Dispatcher::new(
            services.clone(),
            commands.clone(),
            config.heartbeat_interval,
        ));
        let heartbeat_monitor = Arc::new(
            HeartbeatMonitor::new(repos.clone(), outbound).with_config(HeartbeatConfig {
                check_interval_secs: config.heartbeat_check_secs,
                offline_threshold_secs: config.offline_threshold_secs,
            }),
        );

        Self {
            repos,
            registry,
            commands,
            services,
            dispatcher,
            heartbeat_monitor,
            config,
            inbound: Some(inbound_rx),
        }
    }

    /// Spawn the station workers and the background tasks. Only the first
    /// call starts anything.
    pub fn start(&mut self, shutdown: ShutdownSignal) -> Vec<JoinHandle<()>> {
        let Some(inbound) = self.inbound.take() else {
            warn!("Central system already started");
            return Vec::new();
        };

        let workers = StationWorkers::new(self.dispatcher.clone(), self.registry.clone())
            .spawn(inbound, shutdown.clone());
        let sweeper = start_reservation_sweeper(
            self.repos.clone(),
            shutdown.clone(),
            self.config.reservation_sweep_secs,
        );
        let monitor = self.heartbeat_monitor.clone().start(shutdown);

        info!(
            heartbeat_interval = self.config.heartbeat_interval,
            command_timeout = self.config.command_timeout_secs,
            "Central system started"
        );
        vec![workers, sweeper, monitor]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use serde_json::json;

    use crate::application::commands::CommandError;
    use crate::infrastructure::InMemoryRepositoryProvider;
    use crate::shared::OcppFrame;

    async fn next_frame(rx: &mut mpsc::UnboundedReceiver<String>) -> OcppFrame {
        let text = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("no frame in time")
            .expect("channel closed");
        OcppFrame::parse(&text).unwrap()
    }

    #[tokio::test]
    async fn boot_reply_and_command_round_trip_over_the_registry() {
        let mut system =
            CentralSystem::new(Arc::new(InMemoryRepositoryProvider::new()), OcppConfig::default());
        let shutdown = ShutdownSignal::new();
        let handles = system.start(shutdown.clone());
        assert_eq!(handles.len(), 3);
        assert!(system.start(shutdown.clone()).is_empty());

        let (tx, mut station) = mpsc::unbounded_channel();
        system.registry.register("CP1", tx);

        system.registry.deliver(
            "CP1",
            r#"[2,"b1","BootNotification",{"chargePointVendor":"ACME","chargePointModel":"X1"}]"#
                .into(),
        );
        match next_frame(&mut station).await {
            OcppFrame::CallResult { unique_id, payload } => {
                assert_eq!(unique_id, "b1");
                assert_eq!(payload["status"], "Accepted");
            }
            other => panic!("unexpected {:?}", other),
        }

        let commands = system.commands.clone();
        let pending = tokio::spawn(async move {
            commands
                .send_command("CP1", "ClearCache", json!({}))
                .await
        });
        let id = match next_frame(&mut station).await {
            OcppFrame::Call { unique_id, action, .. } => {
                assert_eq!(action, "ClearCache");
                unique_id
            }
            other => panic!("unexpected {:?}", other),
        };
        system
            .registry
            .deliver("CP1", format!(r#"[3,"{id}",{{"status":"Accepted"}}]"#));
        let result = pending.await.unwrap().unwrap();
        assert_eq!(result["status"], "Accepted");

        shutdown.trigger();
    }

    #[tokio::test]
    async fn command_to_unknown_station_is_not_connected() {
        let system =
            CentralSystem::new(Arc::new(InMemoryRepositoryProvider::new()), OcppConfig::default());
        let err = system
            .commands
            .send_command("NOPE", "Reset", json!({"type": "Soft"}))
            .await
            .unwrap_err();
        assert_eq!(err, CommandError::NotConnected("NOPE".into()));
        assert_eq!(system.commands.pending_count(), 0);
    }
}
