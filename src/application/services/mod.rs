//! Application services: the state transitions driven by station traffic and
//! the admin flows that issue commands.

pub mod authorization;
pub mod charge_point;
pub mod configuration;
pub mod firmware;
pub mod heartbeat_monitor;
pub mod local_auth_list;
pub mod meter_values;
pub mod remote_trigger;
pub mod reservation;
pub mod reservation_expiry;
pub mod smart_charging;
pub mod transaction;

pub use authorization::AuthorizationService;
pub use charge_point::{BootInfo, ChargePointService};
pub use configuration::{ConfigurationLookup, ConfigurationService};
pub use firmware::FirmwareService;
pub use heartbeat_monitor::{HeartbeatConfig, HeartbeatMonitor, HeartbeatStatus};
pub use local_auth_list::LocalAuthListService;
pub use meter_values::{MeterValueService, RawSample};
pub use reservation::{ReservationService, ReserveOutcome};
pub use reservation_expiry::start_reservation_sweeper;
pub use smart_charging::SmartChargingService;
pub use transaction::{
    StartOutcome, StartRequest, StopRequest, TransactionService, REJECTED_TRANSACTION_ID,
};

use std::sync::Arc;

use thiserror::Error;

use crate::application::commands::{CommandError, SharedCommandSender};
use crate::domain::{DomainError, RepositoryProvider};

/// Failure of an admin flow that touches both the stores and a station.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Every service over one repository provider, shared by the dispatcher and
/// the admin API.
#[derive(Clone)]
pub struct Services {
    pub charge_points: Arc<ChargePointService>,
    pub authorization: Arc<AuthorizationService>,
    pub configuration: Arc<ConfigurationService>,
    pub transactions: Arc<TransactionService>,
    pub meter_values: Arc<MeterValueService>,
    pub reservations: Arc<ReservationService>,
    pub smart_charging: Arc<SmartChargingService>,
    pub firmware: Arc<FirmwareService>,
    pub local_lists: Arc<LocalAuthListService>,
}

impl Services {
    pub fn new(repos: Arc<dyn RepositoryProvider>, commands: SharedCommandSender) -> Self {
        let authorization = Arc::new(AuthorizationService::new(repos.clone()));
        Self {
            charge_points: Arc::new(ChargePointService::new(repos.clone())),
            configuration: Arc::new(ConfigurationService::new(repos.clone())),
            transactions: Arc::new(TransactionService::new(repos.clone(), authorization.clone())),
            meter_values: Arc::new(MeterValueService::new(repos.clone())),
            reservations: Arc::new(ReservationService::new(repos.clone(), commands.clone())),
            smart_charging: Arc::new(SmartChargingService::new(repos.clone(), commands.clone())),
            firmware: Arc::new(FirmwareService::new(repos.clone(), commands.clone())),
            local_lists: Arc::new(LocalAuthListService::new(repos, commands)),
            authorization,
        }
    }
}
