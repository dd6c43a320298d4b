pub mod model;
pub mod repository;

pub use model::{
    default_entries, is_readonly_key, ConfigurationChange, ConfigurationEntry,
    DEFAULT_CONFIGURATION,
};
pub use repository::ConfigurationRepository;
