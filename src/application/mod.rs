pub mod central_system;
pub mod commands;
pub mod handlers;
pub mod ports;
pub mod services;
pub mod session;

// Re-export key types for convenience
pub use central_system::CentralSystem;
pub use commands::{issue_command, CommandError, CommandSender, SharedCommandSender};
pub use handlers::{Dispatcher, HandlerError};
pub use ports::{InboundEvent, InboundSink, SendError, StationSender};
pub use services::{HeartbeatMonitor, ServiceError, Services};
pub use session::{ChannelRegistry, SharedChannelRegistry, StationWorkers};
