//! Service interface to the store backend.
//!
//! Authentication, product storage, role lookup and the audit trail all live
//! behind these traits. `MemoryBackend` keeps everything in process;
//! `PgBackend` persists to PostgreSQL. Both write an audit entry for every
//! product mutation and enforce the storage invariants (unique names,
//! non-negative quantity and price).

pub mod error;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::database::models::{AuditLogEntry, Product, ProductFields};
use crate::types::{Role, Session, SessionUser};

pub use error::{AuthError, BackendError, ResetError};
pub use memory::MemoryBackend;
pub use postgres::PgBackend;

#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Check credentials and mint a session
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Issue a recovery token for the account behind `email`.
    /// A missing account is reported with status 404.
    async fn reset_password_for_email(&self, email: &str) -> Result<(), ResetError>;

    /// Redeem a recovery token, signing its owner in
    async fn recover(&self, token: &str) -> Result<Session, AuthError>;

    async fn update_password(&self, user_id: Uuid, password: &str) -> Result<(), BackendError>;
}

#[async_trait]
pub trait ProductBackend: Send + Sync {
    /// All products, newest first
    async fn list_products(&self) -> Result<Vec<Product>, BackendError>;

    async fn insert_product(&self, actor: &SessionUser, fields: ProductFields) -> Result<Product, BackendError>;

    async fn update_product(
        &self,
        actor: &SessionUser,
        id: Uuid,
        fields: ProductFields,
    ) -> Result<Product, BackendError>;

    async fn delete_product(&self, actor: &SessionUser, id: Uuid) -> Result<(), BackendError>;

    async fn get_product(&self, id: Uuid) -> Result<Product, BackendError> {
        self.list_products()
            .await?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| BackendError::NotFound(format!("product {}", id)))
    }
}

#[async_trait]
pub trait UserRoleBackend: Send + Sync {
    /// Role of the user; `Role::Unknown` when no role is assigned
    async fn get_role(&self, user_id: Uuid) -> Result<Role, BackendError>;
}

#[async_trait]
pub trait AuditLogBackend: Send + Sync {
    /// Audit entries, newest first
    async fn list_audit_logs(&self) -> Result<Vec<AuditLogEntry>, BackendError>;
}

/// Everything the application needs from its backend
#[async_trait]
pub trait Backend: AuthBackend + ProductBackend + UserRoleBackend + AuditLogBackend {
    async fn health_check(&self) -> Result<(), BackendError>;
}
