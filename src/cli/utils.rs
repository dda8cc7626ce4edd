use anyhow::Context;
use serde_json::{json, Value};

use crate::backend::PgBackend;
use crate::cli::OutputFormat;
use crate::database::DatabaseManager;

/// Open the configured database; the CLI always works against PostgreSQL
pub async fn connect() -> anyhow::Result<PgBackend> {
    let config = crate::config::config();
    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("cannot connect to the database (is DATABASE_URL set?)")?;
    Ok(PgBackend::new(pool))
}

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(Value::Object(extra)), Some(object)) = (data, response.as_object_mut()) {
                object.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(output_format: &OutputFormat, collection_name: &str, message: &str) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    collection_name: []
                }))?
            );
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}
