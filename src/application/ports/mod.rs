//! Application ports
//!
//! The channel registry and the command sender reach each other only through
//! these two narrow capabilities:
//!
//! ```text
//! ws connection ──► ChannelRegistry ──(InboundSink)──► StationWorkers ──► Dispatcher
//!                        ▲                                                   │
//!                        └──────────────(StationSender)──── CommandSender ◄──┘
//! ```

use thiserror::Error;
use tokio::sync::mpsc;

use crate::shared::OcppFrame;

// ── Inbound ────────────────────────────────────────────────────

/// Traffic handed from the transport to the per-station workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Frame { charge_point_id: String, text: String },
    Disconnected { charge_point_id: String },
}

/// "Deliver inbound frame" capability supplied to the channel registry.
pub trait InboundSink: Send + Sync {
    fn deliver(&self, charge_point_id: &str, text: String);
    fn disconnected(&self, charge_point_id: &str);
}

impl InboundSink for mpsc::UnboundedSender<InboundEvent> {
    fn deliver(&self, charge_point_id: &str, text: String) {
        let _ = self.send(InboundEvent::Frame {
            charge_point_id: charge_point_id.to_string(),
            text,
        });
    }

    fn disconnected(&self, charge_point_id: &str) {
        let _ = self.send(InboundEvent::Disconnected {
            charge_point_id: charge_point_id.to_string(),
        });
    }
}

// ── Outbound ───────────────────────────────────────────────────

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SendError {
    #[error("Charge point {0} not connected")]
    NotConnected(String),
}

/// "Send to station" capability supplied to the command sender and workers.
pub trait StationSender: Send + Sync {
    fn send_to(&self, charge_point_id: &str, frame: &OcppFrame) -> Result<(), SendError>;
    fn is_connected(&self, charge_point_id: &str) -> bool;
}
