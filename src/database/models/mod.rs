pub mod audit_log;
pub mod product;
pub mod user;

pub use audit_log::{AuditLogEntry, AuditLogRow};
pub use product::{Product, ProductFields};
pub use user::User;
