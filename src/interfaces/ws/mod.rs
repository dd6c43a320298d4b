//! WebSocket interfaces

pub mod ocpp_server;

pub use ocpp_server::OcppServer;
