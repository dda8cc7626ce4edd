use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use super::{AuditLogBackend, AuthBackend, AuthError, Backend, BackendError, ProductBackend, ResetError, UserRoleBackend};
use crate::auth;
use crate::config;
use crate::database::models::{AuditLogEntry, Product, ProductFields, User};
use crate::types::{Operation, Role, Session, SessionUser};

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    roles: HashMap<Uuid, Role>,
    /// Insertion order; listing reverses it
    products: Vec<Product>,
    audit_logs: Vec<AuditLogEntry>,
    recoveries: HashMap<String, (Uuid, DateTime<Utc>)>,
}

impl MemoryState {
    fn user_by_email(&self, email: &str) -> Option<&User> {
        self.users.values().find(|u| u.email.eq_ignore_ascii_case(email))
    }

    fn name_taken(&self, name: &str, except: Option<Uuid>) -> bool {
        self.products.iter().any(|p| p.name == name && Some(p.id) != except)
    }

    fn audit(&mut self, actor: &SessionUser, operation: Operation, product: &Product) {
        self.audit_logs.push(AuditLogEntry {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            user_email: Some(actor.email.clone()),
            operation,
            data: json!(product),
        });
    }
}

/// In-process backend used for development and tests
#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account; `Role::Unknown` leaves it without a role row
    pub async fn add_user(&self, email: &str, password: &str, role: Role) -> Result<SessionUser, BackendError> {
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: auth::hash_password(password)?,
            created_at: Utc::now(),
        };
        let session_user = user.session_user();

        let mut state = self.state.write().await;
        if role.is_resolved() {
            state.roles.insert(user.id, role);
        }
        state.users.insert(user.id, user);
        info!("Added {} user {}", role.as_str(), email);
        Ok(session_user)
    }

    pub async fn set_role(&self, user_id: Uuid, role: Role) {
        let mut state = self.state.write().await;
        if role.is_resolved() {
            state.roles.insert(user_id, role);
        } else {
            state.roles.remove(&user_id);
        }
    }

    /// Most recent recovery token issued for `email`
    pub async fn recovery_token_for(&self, email: &str) -> Option<String> {
        let state = self.state.read().await;
        let user_id = state.user_by_email(email)?.id;
        state
            .recoveries
            .iter()
            .filter(|(_, (owner, _))| *owner == user_id)
            .max_by_key(|(_, (_, expires_at))| *expires_at)
            .map(|(token, _)| token.clone())
    }
}

#[async_trait]
impl AuthBackend for MemoryBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let user = {
            let state = self.state.read().await;
            state
                .user_by_email(email)
                .filter(|u| auth::verify_password(password, &u.password_hash))
                .map(User::session_user)
        };

        match user {
            Some(user) => Ok(auth::issue_session(user)?),
            None => {
                warn!("Failed sign-in attempt for {}", email);
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    async fn reset_password_for_email(&self, email: &str) -> Result<(), ResetError> {
        let mut state = self.state.write().await;
        let user_id = state.user_by_email(email).map(|u| u.id).ok_or_else(ResetError::no_such_user)?;

        let now = Utc::now();
        state.recoveries.retain(|_, (_, expires_at)| *expires_at >= now);

        let token = Uuid::new_v4().simple().to_string();
        let ttl = config::config().security.recovery_token_ttl_minutes as i64;
        state.recoveries.insert(token.clone(), (user_id, now + Duration::minutes(ttl)));

        // No mailer in process; the token is surfaced through the log
        info!(email, token = %token, "Password recovery requested");
        Ok(())
    }

    async fn recover(&self, token: &str) -> Result<Session, AuthError> {
        let user = {
            let mut state = self.state.write().await;
            let (user_id, expires_at) = state.recoveries.remove(token).ok_or(AuthError::InvalidToken)?;
            if expires_at < Utc::now() {
                return Err(AuthError::InvalidToken);
            }
            state.users.get(&user_id).map(User::session_user).ok_or(AuthError::InvalidToken)?
        };
        Ok(auth::issue_session(user)?)
    }

    async fn update_password(&self, user_id: Uuid, password: &str) -> Result<(), BackendError> {
        let password_hash = auth::hash_password(password)?;
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| BackendError::NotFound(format!("user {}", user_id)))?;
        user.password_hash = password_hash;
        info!("Password updated for {}", user.email);
        Ok(())
    }
}

#[async_trait]
impl ProductBackend for MemoryBackend {
    async fn list_products(&self) -> Result<Vec<Product>, BackendError> {
        let state = self.state.read().await;
        Ok(state.products.iter().rev().cloned().collect())
    }

    async fn insert_product(&self, actor: &SessionUser, fields: ProductFields) -> Result<Product, BackendError> {
        if !fields.is_storable() {
            return Err(BackendError::Invalid(format!("product {:?}", fields)));
        }

        let mut state = self.state.write().await;
        if state.name_taken(&fields.name, None) {
            return Err(BackendError::UniqueViolation("products_name_key".to_string()));
        }

        let product = Product {
            id: Uuid::new_v4(),
            name: fields.name,
            quantity: fields.quantity,
            price: fields.price,
            created_at: Utc::now(),
        };
        state.products.push(product.clone());
        state.audit(actor, Operation::Insert, &product);

        info!(product = %product.id, "{} created product {}", actor.email, product.name);
        Ok(product)
    }

    async fn update_product(
        &self,
        actor: &SessionUser,
        id: Uuid,
        fields: ProductFields,
    ) -> Result<Product, BackendError> {
        if !fields.is_storable() {
            return Err(BackendError::Invalid(format!("product {:?}", fields)));
        }

        let mut state = self.state.write().await;
        if state.name_taken(&fields.name, Some(id)) {
            return Err(BackendError::UniqueViolation("products_name_key".to_string()));
        }

        let product = state
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| BackendError::NotFound(format!("product {}", id)))?;
        product.name = fields.name;
        product.quantity = fields.quantity;
        product.price = fields.price;
        let product = product.clone();
        state.audit(actor, Operation::Update, &product);

        info!(product = %id, "{} updated product {}", actor.email, product.name);
        Ok(product)
    }

    async fn delete_product(&self, actor: &SessionUser, id: Uuid) -> Result<(), BackendError> {
        let mut state = self.state.write().await;
        let index = state
            .products
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| BackendError::NotFound(format!("product {}", id)))?;
        let product = state.products.remove(index);
        state.audit(actor, Operation::Delete, &product);

        info!(product = %id, "{} deleted product {}", actor.email, product.name);
        Ok(())
    }

    async fn get_product(&self, id: Uuid) -> Result<Product, BackendError> {
        let state = self.state.read().await;
        state
            .products
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("product {}", id)))
    }
}

#[async_trait]
impl UserRoleBackend for MemoryBackend {
    async fn get_role(&self, user_id: Uuid) -> Result<Role, BackendError> {
        let state = self.state.read().await;
        Ok(state.roles.get(&user_id).copied().unwrap_or_default())
    }
}

#[async_trait]
impl AuditLogBackend for MemoryBackend {
    async fn list_audit_logs(&self) -> Result<Vec<AuditLogEntry>, BackendError> {
        let state = self.state.read().await;
        Ok(state.audit_logs.iter().rev().cloned().collect())
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn health_check(&self) -> Result<(), BackendError> {
        Ok(())
    }
}
