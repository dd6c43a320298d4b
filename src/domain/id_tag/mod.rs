pub mod model;
pub mod repository;

pub use model::{AuthorizationResult, AuthorizationStatus, IdTag};
pub use repository::IdTagRepository;
