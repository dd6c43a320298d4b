//! Repository provider for the domain layer
//!
//! Consumers request only the repository they need:
//!
//! ```ignore
//! async fn handle(repos: &dyn RepositoryProvider) {
//!     let cp = repos.charge_points().find_by_id("CP001").await?;
//!     let tx = repos.transactions().find_active_for_connector("CP001", 1).await?;
//! }
//! ```

use super::charge_point::{ChargePointRepository, ConnectorRepository};
use super::charging_profile::ChargingProfileRepository;
use super::configuration::ConfigurationRepository;
use super::firmware::{DiagnosticsRepository, FirmwareUpdateRepository, LocalAuthListRepository};
use super::id_tag::IdTagRepository;
use super::meter_value::MeterValueRepository;
use super::reservation::ReservationRepository;
use super::transaction::TransactionRepository;

pub use crate::shared::errors::DomainResult;

pub trait RepositoryProvider: Send + Sync {
    fn charge_points(&self) -> &dyn ChargePointRepository;
    fn connectors(&self) -> &dyn ConnectorRepository;
    fn transactions(&self) -> &dyn TransactionRepository;
    fn reservations(&self) -> &dyn ReservationRepository;
    fn charging_profiles(&self) -> &dyn ChargingProfileRepository;
    fn configuration(&self) -> &dyn ConfigurationRepository;
    fn id_tags(&self) -> &dyn IdTagRepository;
    fn meter_values(&self) -> &dyn MeterValueRepository;
    fn firmware_updates(&self) -> &dyn FirmwareUpdateRepository;
    fn diagnostics(&self) -> &dyn DiagnosticsRepository;
    fn local_auth_lists(&self) -> &dyn LocalAuthListRepository;
}
