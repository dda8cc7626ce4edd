use axum::{extract::State, Json};
use serde::Deserialize;

use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::types::Session;

#[derive(Debug, Deserialize)]
pub struct RecoverRequest {
    pub token: String,
}

/// POST /auth/recover - trade a one-time recovery token for a session
///
/// The session is then used with `PUT /api/auth/password` to set a new password.
pub async fn recover_post(State(state): State<AppState>, Json(payload): Json<RecoverRequest>) -> ApiResult<Session> {
    let session = state.backend.recover(payload.token.trim()).await?;
    Ok(ApiResponse::success(session))
}
