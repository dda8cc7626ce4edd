use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{connect, output_success};
use crate::cli::OutputFormat;
use crate::forms::auth::{MIN_PASSWORD_CHARS, PASSWORD_TOO_SHORT};
use crate::types::Role;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create a user account")]
    Add {
        #[arg(help = "Email address used to sign in")]
        email: String,

        #[arg(long, help = "Initial password")]
        password: String,

        #[arg(long, help = "admin or cashier")]
        role: Role,
    },

    #[command(about = "Assign a role to an existing user")]
    Role {
        #[arg(help = "Email address of the user")]
        email: String,

        #[arg(help = "admin or cashier")]
        role: Role,
    },
}

pub async fn handle(cmd: UserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        UserCommands::Add { email, password, role } => {
            if password.chars().count() < MIN_PASSWORD_CHARS {
                anyhow::bail!(PASSWORD_TOO_SHORT);
            }

            let backend = connect().await?;
            let user = backend.add_user(&email, &password, role).await?;
            output_success(
                &output_format,
                &format!("User '{}' created as {}", user.email, role.as_str()),
                Some(json!({ "id": user.id, "email": user.email, "role": role })),
            )
        }
        UserCommands::Role { email, role } => {
            let backend = connect().await?;
            let user = backend.set_role_by_email(&email, role).await?;
            output_success(
                &output_format,
                &format!("User '{}' is now {}", user.email, role.as_str()),
                Some(json!({ "id": user.id, "email": user.email, "role": role })),
            )
        }
    }
}
