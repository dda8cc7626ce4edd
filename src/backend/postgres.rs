use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::{info, warn};
use uuid::Uuid;

use super::{AuditLogBackend, AuthBackend, AuthError, Backend, BackendError, ProductBackend, ResetError, UserRoleBackend};
use crate::auth;
use crate::config;
use crate::database::models::{AuditLogEntry, Product, ProductFields, User};
use crate::database::{DatabaseError, DatabaseManager};
use crate::types::{Operation, Role, Session, SessionUser};

const PRODUCT_COLUMNS: &str = "id, name, quantity, price, created_at";
const USER_COLUMNS: &str = "id, email, password_hash, created_at";

#[derive(FromRow)]
struct AuditLogRecord {
    id: Uuid,
    created_at: DateTime<Utc>,
    user_email: Option<String>,
    operation: String,
    data: serde_json::Value,
}

/// Reject values the column types would round or overflow
fn check_storable(fields: &ProductFields) -> Result<(), BackendError> {
    if fields.is_storable() {
        Ok(())
    } else {
        Err(BackendError::Invalid(format!("product {:?}", fields)))
    }
}

/// PostgreSQL backend. Product writes and their audit rows share a transaction.
#[derive(Clone)]
pub struct PgBackend {
    pool: PgPool,
}

impl PgBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE lower(email) = lower($1)", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Create an account and optionally assign its role
    pub async fn add_user(&self, email: &str, password: &str, role: Role) -> Result<SessionUser, BackendError> {
        let password_hash = auth::hash_password(password)?;
        let id = Uuid::new_v4();

        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO users (id, email, password_hash) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(email)
            .bind(password_hash)
            .execute(&mut *tx)
            .await?;
        if role.is_resolved() {
            Self::upsert_role(&mut tx, id, role).await?;
        }
        tx.commit().await?;

        info!("Added {} user {}", role.as_str(), email);
        Ok(SessionUser {
            id,
            email: email.to_string(),
        })
    }

    /// Assign a role by email; `Role::Unknown` removes the role row
    pub async fn set_role_by_email(&self, email: &str, role: Role) -> Result<SessionUser, BackendError> {
        let user = self
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| BackendError::NotFound(format!("user {}", email)))?;

        let mut tx = self.pool.begin().await?;
        if role.is_resolved() {
            Self::upsert_role(&mut tx, user.id, role).await?;
        } else {
            sqlx::query("DELETE FROM users_roles WHERE user_id = $1")
                .bind(user.id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        info!("Set role of {} to {}", email, role.as_str());
        Ok(user.session_user())
    }

    async fn upsert_role(tx: &mut Transaction<'_, Postgres>, user_id: Uuid, role: Role) -> Result<(), BackendError> {
        sqlx::query(
            "INSERT INTO users_roles (user_id, role) VALUES ($1, $2)
             ON CONFLICT (user_id) DO UPDATE SET role = EXCLUDED.role",
        )
        .bind(user_id)
        .bind(role.as_str())
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn audit(
        tx: &mut Transaction<'_, Postgres>,
        actor: &SessionUser,
        operation: Operation,
        product: &Product,
    ) -> Result<(), BackendError> {
        sqlx::query("INSERT INTO audit_logs (id, user_id, operation, data) VALUES ($1, $2, $3, $4)")
            .bind(Uuid::new_v4())
            .bind(actor.id)
            .bind(operation.as_str())
            .bind(json!(product))
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl AuthBackend for PgBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let user = self.find_user_by_email(email).await.map_err(BackendError::from)?;

        match user.filter(|u| auth::verify_password(password, &u.password_hash)) {
            Some(user) => Ok(auth::issue_session(user.session_user())?),
            None => {
                warn!("Failed sign-in attempt for {}", email);
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    async fn reset_password_for_email(&self, email: &str) -> Result<(), ResetError> {
        let user = self
            .find_user_by_email(email)
            .await
            .map_err(|e| ResetError::internal(e.to_string()))?
            .ok_or_else(ResetError::no_such_user)?;

        let token = Uuid::new_v4().simple().to_string();
        let ttl = config::config().security.recovery_token_ttl_minutes as i64;
        sqlx::query("INSERT INTO password_recoveries (token, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(&token)
            .bind(user.id)
            .bind(Utc::now() + Duration::minutes(ttl))
            .execute(&self.pool)
            .await
            .map_err(|e| ResetError::internal(e.to_string()))?;

        // No mailer wired in; operators pick the token up from the log
        info!(email, token = %token, "Password recovery requested");
        Ok(())
    }

    async fn recover(&self, token: &str) -> Result<Session, AuthError> {
        // Tokens are single use: the DELETE consumes it whether or not it is still valid
        let sql = format!(
            "WITH redeemed AS (
                DELETE FROM password_recoveries WHERE token = $1 RETURNING user_id, expires_at
             )
             SELECT {} FROM users WHERE id IN (SELECT user_id FROM redeemed WHERE expires_at > now())",
            USER_COLUMNS
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(BackendError::from)?
            .ok_or(AuthError::InvalidToken)?;

        Ok(auth::issue_session(user.session_user())?)
    }

    async fn update_password(&self, user_id: Uuid, password: &str) -> Result<(), BackendError> {
        let password_hash = auth::hash_password(password)?;
        let result = sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(BackendError::NotFound(format!("user {}", user_id)));
        }
        info!("Password updated for user {}", user_id);
        Ok(())
    }
}

#[async_trait]
impl ProductBackend for PgBackend {
    async fn list_products(&self) -> Result<Vec<Product>, BackendError> {
        let sql = format!("SELECT {} FROM products ORDER BY created_at DESC", PRODUCT_COLUMNS);
        let products = sqlx::query_as::<_, Product>(&sql).fetch_all(&self.pool).await?;
        Ok(products)
    }

    async fn get_product(&self, id: Uuid) -> Result<Product, BackendError> {
        let sql = format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS);
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| BackendError::NotFound(format!("product {}", id)))?;
        Ok(product)
    }

    async fn insert_product(&self, actor: &SessionUser, fields: ProductFields) -> Result<Product, BackendError> {
        let sql = format!(
            "INSERT INTO products (id, name, quantity, price) VALUES ($1, $2, $3, $4) RETURNING {}",
            PRODUCT_COLUMNS
        );

        check_storable(&fields)?;
        let mut tx = self.pool.begin().await?;
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(Uuid::new_v4())
            .bind(&fields.name)
            .bind(fields.quantity)
            .bind(fields.price)
            .fetch_one(&mut *tx)
            .await?;
        Self::audit(&mut tx, actor, Operation::Insert, &product).await?;
        tx.commit().await?;

        info!(product = %product.id, "{} created product {}", actor.email, product.name);
        Ok(product)
    }

    async fn update_product(
        &self,
        actor: &SessionUser,
        id: Uuid,
        fields: ProductFields,
    ) -> Result<Product, BackendError> {
        let sql = format!(
            "UPDATE products SET name = $2, quantity = $3, price = $4 WHERE id = $1 RETURNING {}",
            PRODUCT_COLUMNS
        );

        check_storable(&fields)?;
        let mut tx = self.pool.begin().await?;
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(&fields.name)
            .bind(fields.quantity)
            .bind(fields.price)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| BackendError::NotFound(format!("product {}", id)))?;
        Self::audit(&mut tx, actor, Operation::Update, &product).await?;
        tx.commit().await?;

        info!(product = %id, "{} updated product {}", actor.email, product.name);
        Ok(product)
    }

    async fn delete_product(&self, actor: &SessionUser, id: Uuid) -> Result<(), BackendError> {
        let sql = format!("DELETE FROM products WHERE id = $1 RETURNING {}", PRODUCT_COLUMNS);

        let mut tx = self.pool.begin().await?;
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| BackendError::NotFound(format!("product {}", id)))?;
        Self::audit(&mut tx, actor, Operation::Delete, &product).await?;
        tx.commit().await?;

        info!(product = %id, "{} deleted product {}", actor.email, product.name);
        Ok(())
    }
}

#[async_trait]
impl UserRoleBackend for PgBackend {
    async fn get_role(&self, user_id: Uuid) -> Result<Role, BackendError> {
        let role: Option<String> = sqlx::query_scalar("SELECT role FROM users_roles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(role.as_deref().map(Role::from_stored).unwrap_or_default())
    }
}

#[async_trait]
impl AuditLogBackend for PgBackend {
    async fn list_audit_logs(&self) -> Result<Vec<AuditLogEntry>, BackendError> {
        let rows = sqlx::query_as::<_, AuditLogRecord>(
            "SELECT a.id, a.created_at, u.email AS user_email, a.operation, a.data
             FROM audit_logs a
             LEFT JOIN users u ON u.id = a.user_id
             ORDER BY a.created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let operation = Operation::from_stored(&row.operation)
                    .ok_or_else(|| BackendError::Database(format!("unknown audit operation {}", row.operation)))?;
                Ok(AuditLogEntry {
                    id: row.id,
                    created_at: row.created_at,
                    user_email: row.user_email,
                    operation,
                    data: row.data,
                })
            })
            .collect()
    }
}

#[async_trait]
impl Backend for PgBackend {
    async fn health_check(&self) -> Result<(), BackendError> {
        DatabaseManager::health_check(&self.pool).await?;
        Ok(())
    }
}
