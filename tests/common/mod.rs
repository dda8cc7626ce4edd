#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use domo_store::app::app;
use domo_store::backend::MemoryBackend;
use domo_store::state::AppState;
use domo_store::types::Role;

pub const ADMIN_EMAIL: &str = "admin@domo.store";
pub const ADMIN_PASSWORD: &str = "admin-password";
pub const CASHIER_EMAIL: &str = "cashier@domo.store";
pub const CASHIER_PASSWORD: &str = "cashier-password";
pub const PENDING_EMAIL: &str = "pending@domo.store";
pub const PENDING_PASSWORD: &str = "pending-password";

/// In-process server over a seeded in-memory backend.
///
/// Each test gets its own server since every `#[tokio::test]` runs its own runtime.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub backend: MemoryBackend,
    pub client: reqwest::Client,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        let backend = MemoryBackend::new();
        backend.add_user(ADMIN_EMAIL, ADMIN_PASSWORD, Role::Admin).await?;
        backend.add_user(CASHIER_EMAIL, CASHIER_PASSWORD, Role::Cashier).await?;
        backend.add_user(PENDING_EMAIL, PENDING_PASSWORD, Role::Unknown).await?;

        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test port")?;
        let router = app(AppState::new(Arc::new(backend.clone())));
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        let server = Self {
            port,
            base_url,
            backend,
            client: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sign in and return the access token
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let res = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login failed with {}", res.status());
        let body: Value = res.json().await?;
        body["data"]["access_token"]
            .as_str()
            .map(str::to_string)
            .context("login response has no access_token")
    }

    pub async fn admin_token(&self) -> Result<String> {
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    pub async fn cashier_token(&self) -> Result<String> {
        self.login(CASHIER_EMAIL, CASHIER_PASSWORD).await
    }

    /// Create a product as admin and return its JSON
    pub async fn create_product(&self, token: &str, name: &str, quantity: i64, price: &str) -> Result<Value> {
        let res = self
            .client
            .post(self.url("/api/products"))
            .bearer_auth(token)
            .json(&json!({ "name": name, "quantity": quantity, "price": price }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "create failed with {}", res.status());
        let body: Value = res.json().await?;
        Ok(body["data"].clone())
    }
}
