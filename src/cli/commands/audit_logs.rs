use serde_json::json;

use crate::backend::AuditLogBackend;
use crate::cli::utils::{connect, output_empty_collection};
use crate::cli::OutputFormat;
use crate::database::models::AuditLogRow;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let backend = connect().await?;
    let rows: Vec<AuditLogRow> = backend.list_audit_logs().await?.iter().map(AuditLogRow::from).collect();

    if rows.is_empty() {
        return output_empty_collection(&output_format, "audit_logs", "No audit log entries");
    }

    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "audit_logs": rows }))?);
        }
        OutputFormat::Text => {
            println!("{:<26} {:<28} {:<8} {}", "DATETIME", "USER", "OP", "DATA");
            println!("{}", "-".repeat(90));
            for row in &rows {
                println!("{:<26} {:<28} {:<8} {}", row.datetime, row.user, row.operation, row.data);
            }
        }
    }
    Ok(())
}
