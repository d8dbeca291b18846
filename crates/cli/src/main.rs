//! AdBurst CLI - database migrations and account management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! adburst migrate
//!
//! # Grant credits to a user
//! adburst credits grant -e ada@example.com -a 50
//!
//! # Change a user's plan
//! adburst tier set -e ada@example.com -t pro
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "adburst")]
#[command(author, version, about = "AdBurst CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage user credits
    Credits {
        #[command(subcommand)]
        action: CreditsAction,
    },
    /// Manage subscription tiers
    Tier {
        #[command(subcommand)]
        action: TierAction,
    },
}

#[derive(Subcommand)]
enum CreditsAction {
    /// Add credits to a user's balance (negative to deduct)
    Grant {
        /// User email address
        #[arg(short, long)]
        email: String,

        /// Number of credits
        #[arg(short, long, allow_negative_numbers = true)]
        amount: i32,

        /// Ledger reason
        #[arg(short, long, default_value = "manual grant")]
        reason: String,
    },
}

#[derive(Subcommand)]
enum TierAction {
    /// Set a user's tier (`free`, `pro`, `business`)
    Set {
        /// User email address
        #[arg(short, long)]
        email: String,

        /// Tier name
        #[arg(short, long)]
        tier: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Credits {
            action:
                CreditsAction::Grant {
                    email,
                    amount,
                    reason,
                },
        } => {
            let balance = commands::account::grant_credits(&email, amount, &reason).await?;
            tracing::info!("{email} now has {balance} credits");
        }
        Commands::Tier {
            action: TierAction::Set { email, tier },
        } => {
            let tier = commands::account::set_tier(&email, &tier).await?;
            tracing::info!("{email} is now on the {tier} tier");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_negative_grant() {
        let cli = Cli::try_parse_from([
            "adburst", "credits", "grant", "-e", "ada@example.com", "-a", "-5",
        ]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Credits {
                action: CreditsAction::Grant { amount: -5, .. }
            })
        ));
    }
}
