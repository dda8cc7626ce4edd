use axum::{
    http::HeaderValue,
    middleware::from_fn,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

/// Full HTTP application over `state`
pub fn app(state: AppState) -> Router {
    let config = crate::config::config();

    let router = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        // Public auth routes
        .merge(auth_public_routes())
        // Protected API
        .merge(protected_routes().route_layer(from_fn(jwt_auth_middleware)))
        .with_state(state)
        .layer(cors_layer(&config.security));

    if config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/auth/login", post(auth::login_post))
        .route("/auth/forget-password", post(auth::forget_password_post))
        .route("/auth/recover", post(auth::recover_post))
}

fn protected_routes() -> Router<AppState> {
    use protected::{audit_logs, auth, products};

    Router::new()
        .route("/api/auth/whoami", get(auth::whoami_get))
        .route("/api/auth/password", put(auth::password_put))
        .route("/api/products", get(products::products_get).post(products::products_post))
        .route(
            "/api/products/:id",
            put(products::products_put).delete(products::products_delete),
        )
        .route("/api/audit-logs", get(audit_logs::audit_logs_get))
}

/// `*` allows any origin; otherwise only the configured ones
fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_app() -> Router {
        app(AppState::new(Arc::new(MemoryBackend::new())))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = test_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["data"]["status"], "ok");
    }

    #[tokio::test]
    async fn protected_routes_need_a_token() {
        let response = test_app()
            .oneshot(Request::get("/api/products").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["success"], false);
    }

    #[test]
    fn cors_layer_accepts_wildcard_and_lists() {
        let security = SecurityConfig {
            jwt_secret: "x".to_string(),
            jwt_expiry_hours: 1,
            cors_origins: vec!["*".to_string()],
            recovery_token_ttl_minutes: 1,
            password_hash_cost: bcrypt::DEFAULT_COST,
        };
        let _ = cors_layer(&security);
        let _ = cors_layer(&SecurityConfig {
            cors_origins: vec!["http://localhost:5173".to_string()],
            ..security
        });
    }
}
