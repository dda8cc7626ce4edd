use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET / - service description
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Domo store",
            "version": version,
            "description": "Inventory backend with role-gated product editing",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "public_auth": "/auth/login, /auth/forget-password, /auth/recover (public - token acquisition)",
                "auth": "/api/auth/whoami, /api/auth/password (protected)",
                "products": "/api/products[/:id] (protected, create and delete require admin)",
                "audit_logs": "/api/audit-logs (protected, admin only)",
            }
        }
    }))
}

/// GET /health - backend reachability
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let now = chrono::Utc::now();

    match state.backend.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "backend": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "backend unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "backend_error": e.to_string()
                    }
                })),
            )
        }
    }
}
