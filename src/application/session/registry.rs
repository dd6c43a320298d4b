//! Channel registry: at most one live outbound channel per charge point

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::connection::Connection;
use crate::application::ports::{InboundSink, SendError, StationSender};
use crate::shared::OcppFrame;

pub struct ChannelRegistry {
    sessions: DashMap<String, Connection>,
    inbound: Arc<dyn InboundSink>,
    next_connection_id: AtomicU64,
}

pub type SharedChannelRegistry = Arc<ChannelRegistry>;

impl ChannelRegistry {
    pub fn new(inbound: Arc<dyn InboundSink>) -> Self {
        Self {
            sessions: DashMap::new(),
            inbound,
            next_connection_id: AtomicU64::new(1),
        }
    }

    pub fn shared(inbound: Arc<dyn InboundSink>) -> SharedChannelRegistry {
        Arc::new(Self::new(inbound))
    }

    /// Register a channel, closing any channel already registered for the station.
    /// Returns the id of the new connection.
    pub fn register(&self, charge_point_id: &str, sender: mpsc::UnboundedSender<String>) -> u64 {
        let connection_id = self.next_connection_id.fetch_add(1, Ordering::SeqCst);
        let connection = Connection::new(connection_id, charge_point_id, sender);

        if let Some(previous) = self.sessions.insert(charge_point_id.to_string(), connection) {
            let evicted = previous.into_evicted();
            warn!(
                charge_point_id,
                evicted_connection = evicted.connection_id,
                connected_at = %evicted.connected_at,
                "Replacing existing session; previous channel closed"
            );
        }

        info!(charge_point_id, connection_id, "Registered charge point session");
        metrics::gauge!("ocpp_connected_stations").set(self.sessions.len() as f64);
        connection_id
    }

    /// Remove whatever channel is registered for the station.
    pub fn remove(&self, charge_point_id: &str) -> bool {
        let removed = self.sessions.remove(charge_point_id).is_some();
        if removed {
            self.after_removal(charge_point_id);
        }
        removed
    }

    /// Remove the station only if `connection_id` is still its registered channel.
    /// A connection replaced by a newer one must not tear down its successor.
    pub fn remove_connection(&self, charge_point_id: &str, connection_id: u64) -> bool {
        let removed = self
            .sessions
            .remove_if(charge_point_id, |_, conn| conn.connection_id == connection_id)
            .is_some();
        if removed {
            self.after_removal(charge_point_id);
        }
        removed
    }

    fn after_removal(&self, charge_point_id: &str) {
        info!(charge_point_id, "Unregistered charge point session");
        metrics::gauge!("ocpp_connected_stations").set(self.sessions.len() as f64);
        self.inbound.disconnected(charge_point_id);
    }

    /// Hand an inbound text frame to the station's worker.
    pub fn deliver(&self, charge_point_id: &str, text: String) {
        if let Some(mut conn) = self.sessions.get_mut(charge_point_id) {
            conn.touch();
        }
        self.inbound.deliver(charge_point_id, text);
    }

    pub fn send(&self, charge_point_id: &str, frame: &OcppFrame) -> Result<(), SendError> {
        let conn = self
            .sessions
            .get(charge_point_id)
            .ok_or_else(|| SendError::NotConnected(charge_point_id.to_string()))?;

        if !conn.is_open() {
            return Err(SendError::NotConnected(charge_point_id.to_string()));
        }
        conn.send(frame.serialize()).map_err(|e| {
            warn!(charge_point_id, error = %e, "Send on closing channel");
            SendError::NotConnected(charge_point_id.to_string())
        })
    }

    /// Point-in-time check.
    pub fn is_connected(&self, charge_point_id: &str) -> bool {
        self.sessions
            .get(charge_point_id)
            .is_some_and(|conn| conn.is_open())
    }

    pub fn connected_ids(&self) -> Vec<String> {
        self.sessions.iter().map(|r| r.key().clone()).collect()
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }
}

impl StationSender for ChannelRegistry {
    fn send_to(&self, charge_point_id: &str, frame: &OcppFrame) -> Result<(), SendError> {
        self.send(charge_point_id, frame)
    }

    fn is_connected(&self, charge_point_id: &str) -> bool {
        ChannelRegistry::is_connected(self, charge_point_id)
    }
}
