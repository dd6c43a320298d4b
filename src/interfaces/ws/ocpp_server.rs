//! OCPP 1.6 WebSocket server
//!
//! Accepts charge-point connections at `ws://<host>:<port>/ocpp/{charge_point_id}`.
//! Each connection gets an outbound queue registered in the channel registry;
//! inbound text frames are handed to the registry, which routes them to the
//! station's worker.

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::{HeaderValue, StatusCode};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::application::session::SharedChannelRegistry;
use crate::shared::shutdown::ShutdownSignal;

/// OCPP 1.6 WebSocket subprotocol
const OCPP_SUBPROTOCOL: &str = "ocpp1.6";

type ServerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

pub struct OcppServer {
    address: String,
    registry: SharedChannelRegistry,
    shutdown_signal: Option<ShutdownSignal>,
}

impl OcppServer {
    pub fn new(address: impl Into<String>, registry: SharedChannelRegistry) -> Self {
        Self {
            address: address.into(),
            registry,
            shutdown_signal: None,
        }
    }

    /// Set the shutdown signal for graceful shutdown
    pub fn with_shutdown(mut self, signal: ShutdownSignal) -> Self {
        self.shutdown_signal = Some(signal);
        self
    }

    pub async fn run(&self) -> ServerResult {
        let listener = TcpListener::bind(&self.address).await?;

        info!("🔌 OCPP 1.6 Central System started on ws://{}", self.address);
        info!(
            "   Charge points should connect to: ws://{}/ocpp/{{charge_point_id}}",
            self.address
        );

        let shutdown = self.shutdown_signal.clone().unwrap_or_default();
        let stop = shutdown.notified().wait();
        tokio::pin!(stop);

        loop {
            tokio::select! {
                result = listener.accept() => match result {
                    Ok((stream, addr)) => self.spawn_connection(stream, addr),
                    Err(e) => error!(error = %e, "Failed to accept connection"),
                },
                _ = &mut stop => {
                    info!("🛑 WebSocket server received shutdown signal");
                    self.close_all();
                    return Ok(());
                }
            }
        }
    }

    fn spawn_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let registry = self.registry.clone();
        let shutdown = self.shutdown_signal.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, addr, registry, shutdown).await {
                warn!(%addr, error = %e, "Connection error");
            }
        });
    }

    fn close_all(&self) {
        let connected = self.registry.connected_ids();
        if !connected.is_empty() {
            info!("📢 Closing {} charge point connections", connected.len());
        }
        for charge_point_id in connected {
            self.registry.remove(&charge_point_id);
        }
        info!("✅ WebSocket server shutdown complete");
    }
}

/// The station id is the last non-empty path segment.
fn extract_charge_point_id(path: &str) -> Option<String> {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Whether the `Sec-WebSocket-Protocol` header offers OCPP 1.6.
fn offers_ocpp16(requested: &str) -> bool {
    requested
        .split(',')
        .map(str::trim)
        .any(|p| p.eq_ignore_ascii_case(OCPP_SUBPROTOCOL))
}

async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    registry: SharedChannelRegistry,
    shutdown: Option<ShutdownSignal>,
) -> ServerResult {
    let mut charge_point_id: Option<String> = None;

    let ws_stream = tokio_tungstenite::accept_hdr_async(
        stream,
        |req: &Request, mut response: Response| {
            let path = req.uri().path();
            let Some(id) = extract_charge_point_id(path) else {
                warn!(%addr, path, "Rejecting connection without charge point id");
                let mut rejection = ErrorResponse::new(Some("Missing charge point id".into()));
                *rejection.status_mut() = StatusCode::BAD_REQUEST;
                return Err(rejection);
            };

            let requested = req
                .headers()
                .get("Sec-WebSocket-Protocol")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("");
            if offers_ocpp16(requested) {
                response.headers_mut().insert(
                    "Sec-WebSocket-Protocol",
                    HeaderValue::from_static(OCPP_SUBPROTOCOL),
                );
            } else {
                warn!(charge_point_id = id.as_str(), requested, "Client did not offer ocpp1.6");
            }

            charge_point_id = Some(id);
            Ok(response)
        },
    )
    .await?;

    let Some(charge_point_id) = charge_point_id else {
        return Ok(());
    };
    info!(charge_point_id = charge_point_id.as_str(), %addr, "🔌 Charge point connected");

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let connection_id = registry.register(&charge_point_id, tx);

    // Outgoing: drains the queue until the registry drops its sender.
    let cp_id_send = charge_point_id.clone();
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            debug!(charge_point_id = cp_id_send.as_str(), "-> {}", msg);
            if let Err(e) = ws_sender.send(Message::Text(msg)).await {
                warn!(charge_point_id = cp_id_send.as_str(), error = %e, "Send error");
                return;
            }
        }
        let _ = ws_sender.send(Message::Close(None)).await;
    });

    // Incoming
    let cp_id_recv = charge_point_id.clone();
    let recv_registry = registry.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = ws_receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    debug!(charge_point_id = cp_id_recv.as_str(), "<- {}", text);
                    recv_registry.deliver(&cp_id_recv, text);
                }
                Ok(Message::Close(frame)) => {
                    debug!(charge_point_id = cp_id_recv.as_str(), ?frame, "Close frame received");
                    break;
                }
                Ok(Message::Binary(data)) => {
                    warn!(
                        charge_point_id = cp_id_recv.as_str(),
                        bytes = data.len(),
                        "Binary message ignored"
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(charge_point_id = cp_id_recv.as_str(), error = %e, "WebSocket error");
                    break;
                }
            }
        }
    });

    let shutdown = shutdown.unwrap_or_default();
    tokio::select! {
        _ = &mut send_task => {},
        _ = &mut recv_task => {},
        _ = shutdown.notified().wait() => {
            info!(charge_point_id = charge_point_id.as_str(), "Connection closing due to server shutdown");
        }
    }
    recv_task.abort();

    // A newer connection for the same station stays registered.
    registry.remove_connection(&charge_point_id, connection_id);
    info!(charge_point_id = charge_point_id.as_str(), "🔌 Charge point disconnected");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn station_id_is_last_path_segment() {
        assert_eq!(extract_charge_point_id("/ocpp/CP001"), Some("CP001".into()));
        assert_eq!(extract_charge_point_id("/ocpp/CP001/"), Some("CP001".into()));
        assert_eq!(extract_charge_point_id("/central/ocpp/CP-7"), Some("CP-7".into()));
        assert_eq!(extract_charge_point_id("/CP9"), Some("CP9".into()));
        assert_eq!(extract_charge_point_id("/"), None);
        assert_eq!(extract_charge_point_id(""), None);
    }

    #[test]
    fn subprotocol_negotiation() {
        assert!(offers_ocpp16("ocpp1.6"));
        assert!(offers_ocpp16("ocpp2.0.1, ocpp1.6"));
        assert!(!offers_ocpp16("ocpp2.0.1"));
        assert!(!offers_ocpp16(""));
    }
}
