use axum::{
    extract::{Extension, State},
    Json,
};
use serde_json::{json, Value};

use crate::forms::SetPasswordForm;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

use super::caller_role;

/// GET /api/auth/whoami - current principal and role
///
/// `is_admin` is `null` while the user has no role row.
pub async fn whoami_get(State(state): State<AppState>, Extension(AuthUser(user)): Extension<AuthUser>) -> ApiResult<Value> {
    let role = caller_role(&state, &user).await?;
    Ok(ApiResponse::success(json!({
        "id": user.id,
        "email": user.email,
        "role": role,
        "is_admin": role.is_admin(),
    })))
}

/// PUT /api/auth/password - set a new password for the caller
pub async fn password_put(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(form): Json<SetPasswordForm>,
) -> ApiResult<Value> {
    form.validate()?;
    state.backend.update_password(user.id, &form.password).await?;
    tracing::info!("{} changed their password", user.email);
    Ok(ApiResponse::success(json!({ "message": "Password updated." })))
}
