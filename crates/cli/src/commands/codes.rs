//! One-time code maintenance.

use gachadex_server::db::PgStore;
use gachadex_server::services::two_factor::{SystemClock, TwoFactorService};

use super::{CliError, connect};

/// Delete every code whose expiry has passed.
///
/// # Errors
///
/// Returns `CliError` if the connection or the delete fails.
pub async fn cleanup() -> Result<u64, CliError> {
    let store = PgStore::new(connect().await?);

    let deleted = TwoFactorService::new(&store, &SystemClock)
        .cleanup_expired()
        .await?;

    tracing::info!("Deleted {} expired one-time code(s)", deleted);
    Ok(deleted)
}
