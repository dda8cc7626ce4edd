use axum::{extract::State, Json};

use crate::error::ApiError;
use crate::forms::LoginForm;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::types::Session;

/// POST /auth/login - exchange email and password for a session
///
/// Input: `{ "email": "...", "password": "..." }`. Empty fields yield 422 with
/// field errors; wrong credentials yield a generic 401.
pub async fn login_post(State(state): State<AppState>, Json(form): Json<LoginForm>) -> ApiResult<Session> {
    form.validate()?;

    match state.backend.sign_in(form.email.trim(), &form.password).await {
        Ok(session) => Ok(ApiResponse::success(session)),
        Err(err) => {
            tracing::info!("Login failed for {}: {}", form.email, err);
            Err(ApiError::from(err))
        }
    }
}
