//! Outer surfaces: the station WebSocket server and the admin HTTP API.

pub mod http;
pub mod ws;
