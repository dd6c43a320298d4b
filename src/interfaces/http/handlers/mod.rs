pub mod commands;
pub mod dto;
pub mod health;
pub mod id_tags;
pub mod metrics;
pub mod stations;
pub mod transactions;
