pub mod model;
pub mod repository;

pub use model::{ChargePoint, Connector, ConnectorStatus, RegistrationStatus};
pub use repository::{ChargePointRepository, ConnectorRepository};
