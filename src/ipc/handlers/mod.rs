pub mod auth;
pub mod backup_exchange;
pub mod core;
pub mod reports;
pub mod students;
