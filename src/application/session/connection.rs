//! WebSocket connection abstraction

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

/// Outbound half of one live station connection.
///
/// The transport task owns the receiving end; dropping this value closes it.
#[derive(Debug)]
pub struct Connection {
    /// Distinguishes successive connections of the same station
    pub connection_id: u64,
    pub charge_point_id: String,
    pub sender: mpsc::UnboundedSender<String>,
    pub connected_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

/// Info logged when a connection is replaced by a newer one
#[derive(Debug)]
pub struct EvictedSession {
    pub connection_id: u64,
    pub connected_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Connection {
    pub fn new(
        connection_id: u64,
        charge_point_id: impl Into<String>,
        sender: mpsc::UnboundedSender<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            connection_id,
            charge_point_id: charge_point_id.into(),
            sender,
            connected_at: now,
            last_activity: now,
        }
    }

    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }

    pub fn send(&self, message: String) -> Result<(), String> {
        self.sender
            .send(message)
            .map_err(|e| format!("Failed to send message: {}", e))
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    pub fn into_evicted(self) -> EvictedSession {
        EvictedSession {
            connection_id: self.connection_id,
            connected_at: self.connected_at,
            last_activity: self.last_activity,
        }
    }
}
