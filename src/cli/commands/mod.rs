pub mod audit_logs;
pub mod migrate;
pub mod products;
pub mod user;
