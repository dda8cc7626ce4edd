mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{TestServer, ADMIN_EMAIL, CASHIER_EMAIL};

#[tokio::test]
async fn every_mutation_is_logged_newest_first() -> Result<()> {
    let server = TestServer::spawn().await?;
    let admin = server.admin_token().await?;
    let milk = server.create_product(&admin, "Milk", 10, "2.50").await?;
    let url = server.url(&format!("/api/products/{}", milk["id"].as_str().unwrap()));

    let cashier = server.cashier_token().await?;
    let res = server
        .client
        .put(&url)
        .bearer_auth(&cashier)
        .json(&json!({ "quantity": 9 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server.client.delete(&url).bearer_auth(&admin).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = server
        .client
        .get(server.url("/api/audit-logs"))
        .bearer_auth(&admin)
        .send()
        .await?
        .json()
        .await?;
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 3);

    let ops: Vec<&str> = rows.iter().map(|r| r["operation"].as_str().unwrap()).collect();
    assert_eq!(ops, vec!["Delete", "Update", "Insert"]);

    assert_eq!(rows[1]["user"], CASHIER_EMAIL);
    assert_eq!(rows[2]["user"], ADMIN_EMAIL);
    assert_eq!(rows[1]["data"], json!({ "name": "Milk", "quantity": 9 }));
    Ok(())
}

#[tokio::test]
async fn audit_logs_are_admin_only() -> Result<()> {
    let server = TestServer::spawn().await?;
    let cashier = server.cashier_token().await?;

    let res = server
        .client
        .get(server.url("/api/audit-logs"))
        .bearer_auth(&cashier)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}
