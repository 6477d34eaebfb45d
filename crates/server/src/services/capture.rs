//! Spending pokéballs on draws and building collections.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use gachadex_core::{
    Catalog, CatalogItem, CatalogItemId, Credits, DrawError, DrawResult, MergeOutcome, Rarity,
    UserId, draw,
};

use crate::db::{Capture, CaptureCommit, CollectionStore, RepositoryError, UserStore};
use crate::models::CollectedItem;

/// Errors from capture operations.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The balance does not cover the draw cost.
    #[error("insufficient credits: balance {balance}, cost {cost}")]
    InsufficientCredits { balance: Credits, cost: u32 },

    /// The selected rarity has no catalog items.
    #[error(transparent)]
    Draw(#[from] DrawError),

    /// A submitted item does not match the catalog.
    #[error("invalid item: {0}")]
    InvalidItem(String),

    /// Malformed request field.
    #[error("{0}")]
    Validation(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// A client-submitted draw.
#[derive(Debug, Clone, Deserialize)]
pub struct CatchSubmission {
    pub item: SubmittedItem,
    pub shiny: bool,
    pub cost: Option<i64>,
}

/// The item fields of a [`CatchSubmission`], checked against the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmittedItem {
    pub id: CatalogItemId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub rarity: Rarity,
    pub image: String,
}

/// A committed capture.
#[derive(Debug, Clone, Serialize)]
pub struct CaptureReceipt {
    pub item: CatalogItem,
    pub shiny: bool,
    pub outcome: MergeOutcome,
    pub credits_remaining: Credits,
}

/// Draws, captures, and collection queries for one catalog.
pub struct CaptureService<'a, S> {
    store: &'a S,
    catalog: &'a Catalog,
    draw_cost: u32,
}

impl<'a, S: UserStore + CollectionStore> CaptureService<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S, catalog: &'a Catalog, draw_cost: u32) -> Self {
        Self {
            store,
            catalog,
            draw_cost,
        }
    }

    /// Spend one draw's cost on a server-side draw.
    ///
    /// # Errors
    ///
    /// - `InsufficientCredits` when the balance is below the cost; nothing is drawn.
    /// - `Draw` when the selected rarity is empty; nothing is written.
    /// - `Repository` on store failure.
    pub async fn draw_and_capture(&self, user_id: UserId) -> Result<CaptureReceipt, CaptureError> {
        let balance = self.store.credits(user_id).await?;
        if !balance.covers(self.draw_cost) {
            return Err(CaptureError::InsufficientCredits {
                balance,
                cost: self.draw_cost,
            });
        }

        let result = {
            let mut rng = rand::rng();
            draw(self.catalog, &mut rng)
        };
        let result = result.inspect_err(|e| {
            tracing::warn!(user_id = %user_id, error = %e, "Draw hit an empty rarity");
        })?;

        self.commit(user_id, result, self.draw_cost).await
    }

    /// Commit a draw the client performed itself.
    ///
    /// # Errors
    ///
    /// - `InvalidItem` when the item does not match the catalog entry.
    /// - `Validation` when the cost is below one.
    /// - `InsufficientCredits` and `Repository` as for [`Self::draw_and_capture`].
    pub async fn catch(
        &self,
        user_id: UserId,
        submission: CatchSubmission,
    ) -> Result<CaptureReceipt, CaptureError> {
        let cost = match submission.cost {
            None => self.draw_cost,
            Some(cost) if cost >= 1 => u32::try_from(cost)
                .map_err(|_| CaptureError::Validation("cost is too large".to_owned()))?,
            Some(_) => return Err(CaptureError::Validation("cost must be at least 1".to_owned())),
        };

        let item = self.match_catalog(&submission.item)?;
        let result = DrawResult {
            item: item.clone(),
            shiny: submission.shiny,
        };

        self.commit(user_id, result, cost).await
    }

    /// Grant one pokéball. Returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the user is unknown or the store fails.
    pub async fn collect_ball(&self, user_id: UserId) -> Result<Credits, CaptureError> {
        let total = self.store.grant_credits(user_id, 1).await?;
        tracing::debug!(user_id = %user_id, credits = %total, "Collected a pokéball");
        Ok(total)
    }

    /// Owned items joined with the catalog, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the store fails.
    pub async fn collection(&self, user_id: UserId) -> Result<Vec<CollectedItem>, CaptureError> {
        let entries = self.store.entries(user_id).await?;
        Ok(entries
            .into_iter()
            .filter_map(|entry| {
                let Some(item) = self.catalog.get(entry.item_id) else {
                    tracing::warn!(
                        user_id = %user_id,
                        item_id = %entry.item_id,
                        "Owned item missing from catalog, skipping"
                    );
                    return None;
                };
                Some(CollectedItem {
                    item: item.clone(),
                    shiny: entry.shiny,
                    caught_at: entry.caught_at,
                })
            })
            .collect())
    }

    fn match_catalog(&self, submitted: &SubmittedItem) -> Result<&'a CatalogItem, CaptureError> {
        let item = self
            .catalog
            .get(submitted.id)
            .ok_or_else(|| CaptureError::InvalidItem(format!("unknown id {}", submitted.id)))?;

        let matches = item.name == submitted.name
            && item.kind == submitted.kind
            && item.rarity == submitted.rarity
            && item.image == submitted.image;
        if !matches {
            return Err(CaptureError::InvalidItem(format!(
                "fields do not match catalog entry {}",
                submitted.id
            )));
        }
        Ok(item)
    }

    async fn commit(
        &self,
        user_id: UserId,
        result: DrawResult,
        cost: u32,
    ) -> Result<CaptureReceipt, CaptureError> {
        let capture = Capture {
            item_id: result.item.id,
            shiny: result.shiny,
            cost,
        };

        match self.store.commit_capture(user_id, capture).await? {
            CaptureCommit::Committed { outcome, remaining } => {
                tracing::info!(
                    user_id = %user_id,
                    item_id = %result.item.id,
                    rarity = %result.item.rarity,
                    shiny = result.shiny,
                    outcome = outcome.as_str(),
                    credits_remaining = %remaining,
                    "Captured"
                );
                Ok(CaptureReceipt {
                    item: result.item,
                    shiny: result.shiny,
                    outcome,
                    credits_remaining: remaining,
                })
            }
            CaptureCommit::InsufficientCredits { balance } => {
                Err(CaptureError::InsufficientCredits { balance, cost })
            }
        }
    }
}
