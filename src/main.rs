use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use domo_store::app::app;
use domo_store::backend::{Backend, MemoryBackend, PgBackend};
use domo_store::config::AppConfig;
use domo_store::database::DatabaseManager;
use domo_store::is_production;
use domo_store::state::AppState;
use domo_store::types::Role;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SECURITY_JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = domo_store::config::config();
    tracing::info!("Starting Domo store in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("SECURITY_JWT_SECRET must be set outside development");
    }

    let backend = backend_from_config(config).await?;
    let app = app(AppState::new(backend));

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Domo store listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

/// PostgreSQL when `DATABASE_URL` is set, otherwise an in-memory store
async fn backend_from_config(config: &AppConfig) -> anyhow::Result<Arc<dyn Backend>> {
    if config.database.url.is_some() {
        let pool = DatabaseManager::connect(&config.database).await?;
        DatabaseManager::migrate(&pool).await?;
        tracing::info!("Using PostgreSQL backend");
        return Ok(Arc::new(PgBackend::new(pool)));
    }

    if is_production!() {
        anyhow::bail!("DATABASE_URL is required in production");
    }

    tracing::warn!("DATABASE_URL not set, products are kept in memory only");
    let backend = MemoryBackend::new();
    if let (Some(email), Some(password)) = (&config.seed.admin_email, &config.seed.admin_password) {
        backend.add_user(email, password, Role::Admin).await?;
        tracing::info!("Seeded admin account {}", email);
    }
    Ok(Arc::new(backend))
}
