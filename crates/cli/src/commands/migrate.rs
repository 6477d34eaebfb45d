//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! gachadex migrate
//! ```
//!
//! # Environment Variables
//!
//! - `GACHADEX_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! Migration files live in `crates/server/migrations/`.

use super::{CliError, connect};

/// Run the server database migrations.
///
/// # Errors
///
/// Returns `CliError` if the connection or any migration fails.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
