pub mod charge_point;
pub mod charging_profile;
pub mod configuration;
pub mod firmware;
pub mod id_tag;
pub mod meter_value;
pub mod repositories;
pub mod reservation;
pub mod transaction;

pub use charge_point::{ChargePoint, Connector, ConnectorStatus, RegistrationStatus};
pub use charging_profile::{ChargingProfile, ChargingProfilePurpose, ProfileFilter};
pub use configuration::{ConfigurationChange, ConfigurationEntry};
pub use firmware::{Diagnostics, FirmwareStatus, FirmwareUpdate, LocalAuthList, UpdateType};
pub use id_tag::{AuthorizationResult, AuthorizationStatus, IdTag};
pub use meter_value::MeterReading;
pub use repositories::{DomainResult, RepositoryProvider};
pub use reservation::{Reservation, ReservationStatus};
pub use transaction::{Transaction, TransactionStatus};

pub use crate::shared::errors::DomainError;
