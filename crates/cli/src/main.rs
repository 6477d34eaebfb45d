//! Gachadex CLI - database migrations and maintenance tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! gachadex migrate
//!
//! # Delete expired one-time login codes
//! gachadex codes cleanup
//!
//! # Give a user more pokéballs
//! gachadex credits grant --user-id 42 --amount 10
//!
//! # Check a catalog file
//! gachadex catalog validate --path crates/server/data/catalog.json
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "gachadex")]
#[command(author, version, about = "Gachadex CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage one-time login codes
    Codes {
        #[command(subcommand)]
        action: CodesAction,
    },
    /// Manage pokéball balances
    Credits {
        #[command(subcommand)]
        action: CreditsAction,
    },
    /// Inspect catalog files
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(Subcommand)]
enum CodesAction {
    /// Delete expired codes
    Cleanup,
}

#[derive(Subcommand)]
enum CreditsAction {
    /// Add pokéballs to a user's balance
    Grant {
        /// User ID
        #[arg(short, long)]
        user_id: i32,

        /// Number of pokéballs to add
        #[arg(short, long)]
        amount: u32,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Load a catalog file and report per-rarity counts
    Validate {
        /// Catalog file
        #[arg(
            short,
            long,
            env = "GACHADEX_CATALOG_PATH",
            default_value = "crates/server/data/catalog.json"
        )]
        path: PathBuf,

        /// Fail if any rarity has no items
        #[arg(long)]
        strict: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Codes { action } => match action {
            CodesAction::Cleanup => {
                commands::codes::cleanup().await?;
            }
        },
        Commands::Credits { action } => match action {
            CreditsAction::Grant { user_id, amount } => {
                commands::credits::grant(user_id, amount).await?;
            }
        },
        Commands::Catalog { action } => match action {
            CatalogAction::Validate { path, strict } => {
                commands::catalog::validate(&path, strict)?;
            }
        },
    }
    Ok(())
}
