//! Station sessions: live channels and the per-station inbound workers.

pub mod connection;
pub mod registry;
pub mod worker;

pub use connection::Connection;
pub use registry::{ChannelRegistry, SharedChannelRegistry};
pub use worker::StationWorkers;
