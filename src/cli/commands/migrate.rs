use crate::cli::utils::{connect, output_success};
use crate::cli::OutputFormat;
use crate::database::DatabaseManager;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let backend = connect().await?;
    DatabaseManager::migrate(backend.pool()).await?;
    output_success(&output_format, "Migrations applied", None)
}
