//! Pokéball balance management.

use gachadex_core::{Credits, UserId};
use gachadex_server::db::{PgStore, RepositoryError, UserStore};

use super::{CliError, connect};

/// Add `amount` pokéballs to a user's balance.
///
/// # Returns
///
/// The new balance.
///
/// # Errors
///
/// Returns `CliError::Repository` with `NotFound` if the user doesn't exist.
pub async fn grant(user_id: i32, amount: u32) -> Result<Credits, CliError> {
    let store = PgStore::new(connect().await?);
    let user_id = UserId::new(user_id);

    let total = store
        .grant_credits(user_id, amount)
        .await
        .inspect_err(|e| {
            if matches!(e, RepositoryError::NotFound) {
                tracing::error!("No user with ID {}", user_id);
            }
        })?;

    tracing::info!("Granted {} pokéball(s) to user {}; balance is now {}", amount, user_id, total);
    Ok(total)
}
