pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "domo")]
#[command(about = "Domo CLI - database administration for the Domo store")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply pending database migrations")]
    Migrate,

    #[command(about = "User accounts and roles")]
    User {
        #[command(subcommand)]
        cmd: commands::user::UserCommands,
    },

    #[command(about = "List products, newest first")]
    Products,

    #[command(about = "List audit log entries, newest first")]
    AuditLogs,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Migrate => commands::migrate::handle(output_format).await,
        Commands::User { cmd } => commands::user::handle(cmd, output_format).await,
        Commands::Products => commands::products::handle(output_format).await,
        Commands::AuditLogs => commands::audit_logs::handle(output_format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;
    use commands::user::UserCommands;

    #[test]
    fn parses_user_add() {
        let cli = Cli::try_parse_from([
            "domo", "user", "add", "cashier@domo.store", "--password", "secret-pass", "--role", "cashier",
        ])
        .unwrap();
        match cli.command {
            Commands::User {
                cmd: UserCommands::Add { email, password, role },
            } => {
                assert_eq!(email, "cashier@domo.store");
                assert_eq!(password, "secret-pass");
                assert_eq!(role, Role::Cashier);
            }
            _ => panic!("expected user add"),
        }
    }

    #[test]
    fn json_flag_is_global() {
        let cli = Cli::try_parse_from(["domo", "products", "--json"]).unwrap();
        assert!(matches!(OutputFormat::from_cli(&cli), OutputFormat::Json));
    }

    #[test]
    fn rejects_unknown_role() {
        assert!(Cli::try_parse_from(["domo", "user", "role", "a@b.c", "manager"]).is_err());
    }
}
