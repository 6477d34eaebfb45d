//! CLI subcommands.

pub mod catalog;
pub mod codes;
pub mod credits;
pub mod migrate;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use gachadex_core::CatalogError;
use gachadex_server::db::{self, RepositoryError};

/// Errors from CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration error.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Store operation failed.
    #[error("Store error: {0}")]
    Repository(#[from] RepositoryError),

    /// Catalog file could not be read.
    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// Catalog file is invalid.
    #[error("Invalid catalog: {0}")]
    Catalog(#[from] CatalogError),

    /// Catalog is valid but some rarities have no items.
    #[error("Catalog has no items for: {0}")]
    MissingRarities(String),
}

/// Connect to the database named by `GACHADEX_DATABASE_URL` or `DATABASE_URL`.
async fn connect() -> Result<PgPool, CliError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("GACHADEX_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| CliError::MissingEnvVar("GACHADEX_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&SecretString::from(database_url)).await?)
}
