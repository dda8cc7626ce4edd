use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::forms::ForgetPasswordForm;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// POST /auth/forget-password - request a recovery token for an email
pub async fn forget_password_post(
    State(state): State<AppState>,
    Json(form): Json<ForgetPasswordForm>,
) -> ApiResult<Value> {
    form.validate()?;

    let result = state.backend.reset_password_for_email(form.email.trim()).await;
    let message = ForgetPasswordForm::outcome_message(&result);

    match result {
        Ok(()) => Ok(ApiResponse::success(json!({ "message": message }))),
        Err(err) if err.status == 404 => Err(ApiError::not_found(message)),
        Err(err) => {
            tracing::error!("Password reset failed: {}", err);
            Err(ApiError::internal_server_error(message))
        }
    }
}
