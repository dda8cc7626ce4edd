use axum::extract::{Extension, State};

use crate::database::models::AuditLogRow;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

use super::require_admin;

/// GET /api/audit-logs - product mutation history, newest first (admin only)
pub async fn audit_logs_get(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> ApiResult<Vec<AuditLogRow>> {
    require_admin(&state, &user, "view audit logs").await?;
    let entries = state.backend.list_audit_logs().await?;
    Ok(ApiResponse::success(entries.iter().map(AuditLogRow::from).collect()))
}
