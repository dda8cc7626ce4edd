// Protected handlers: every route here runs behind `jwt_auth_middleware`,
// which puts the caller's `AuthUser` into the request extensions. Roles are
// looked up per request, never taken from the token.
pub mod audit_logs;
pub mod auth;
pub mod products;

use crate::error::ApiError;
use crate::state::AppState;
use crate::types::{Role, SessionUser};

pub(crate) async fn caller_role(state: &AppState, user: &SessionUser) -> Result<Role, ApiError> {
    Ok(state.backend.get_role(user.id).await?)
}

/// Fails unless the caller is a resolved admin
pub(crate) async fn require_admin(state: &AppState, user: &SessionUser, action: &str) -> Result<(), ApiError> {
    match caller_role(state, user).await? {
        Role::Admin => Ok(()),
        Role::Cashier => Err(ApiError::forbidden(format!("Only an admin can {}.", action))),
        Role::Unknown => Err(ApiError::forbidden("Role is not resolved yet")),
    }
}
