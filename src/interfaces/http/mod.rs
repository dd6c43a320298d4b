//! Admin HTTP API
//!
//! - `handlers`: health, metrics, stations and remote commands
//! - `router`: route table plus trace / CORS layers

pub mod common;
pub mod handlers;
pub mod router;

pub use common::ApiResponse;
pub use router::{create_api_router, ApiState};
