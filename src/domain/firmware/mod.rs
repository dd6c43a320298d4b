pub mod model;
pub mod repository;

pub use model::{
    Diagnostics, DiagnosticsStatus, FirmwareStatus, FirmwareUpdate, LocalAuthList,
    LocalListStatus, UpdateType,
};
pub use repository::{DiagnosticsRepository, FirmwareUpdateRepository, LocalAuthListRepository};
