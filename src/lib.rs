//! # CSMS Service
//!
//! OCPP 1.6J Central System core: accepts charge-point WebSocket connections,
//! answers station-initiated requests and issues remote commands.
//!
//! ## Architecture
//!
//! - **shared**: OCPP-J frame codec, domain errors, shutdown signalling
//! - **domain**: entities and repository traits
//! - **infrastructure**: in-memory repositories
//! - **application**: channel registry, station workers, dispatcher, command
//!   sender and the business services
//! - **interfaces**: OCPP WebSocket server and the admin HTTP API

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod shared;

pub use application::CentralSystem;
pub use config::{config_path_from_env, default_config_path, AppConfig};
pub use infrastructure::InMemoryRepositoryProvider;
pub use interfaces::http::{create_api_router, ApiState};
pub use interfaces::ws::OcppServer;
