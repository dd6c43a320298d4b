pub mod model;
pub mod repository;

pub use model::{Transaction, TransactionStatus};
pub use repository::TransactionRepository;
