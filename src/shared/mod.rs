pub mod errors;
pub mod ocpp_frame;
pub mod shutdown;

pub use errors::{DomainError, DomainResult};
pub use ocpp_frame::{FrameError, OcppErrorCode, OcppFrame};
