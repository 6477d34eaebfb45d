//! Catalog, draw, and collection handlers.

use axum::{Json, extract::State};
use serde::Serialize;

use gachadex_core::{CatalogItem, Credits};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::CollectedItem;
use crate::routes::ApiJson;
use crate::services::capture::{CaptureReceipt, CatchSubmission};
use crate::state::AppState;

/// Response for a committed draw.
#[derive(Debug, Serialize)]
pub struct DrawResponse {
    pub success: bool,
    #[serde(flatten)]
    pub receipt: CaptureReceipt,
}

impl From<CaptureReceipt> for DrawResponse {
    fn from(receipt: CaptureReceipt) -> Self {
        Self {
            success: true,
            receipt,
        }
    }
}

/// Response for a collected pokéball.
#[derive(Debug, Serialize)]
pub struct CollectBallResponse {
    pub credits_total: Credits,
}

/// All catalog items.
///
/// GET /api/catalog
pub async fn catalog(State(state): State<AppState>) -> Json<Vec<CatalogItem>> {
    Json(state.catalog().items().to_vec())
}

/// The current user's collection, newest first.
///
/// GET /api/pokemon/collection
///
/// # Errors
///
/// Returns 401 if not logged in.
pub async fn collection(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<Vec<CollectedItem>>> {
    Ok(Json(state.capture().collection(current.id).await?))
}

/// Spend a pokéball on a server-side draw.
///
/// POST /api/pokemon/draw
///
/// # Errors
///
/// Returns 400 `insufficient_credits` when the balance is too low and 409
/// `no_item_for_rarity` when the drawn rarity has no items.
pub async fn draw(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<DrawResponse>> {
    let receipt = state.capture().draw_and_capture(current.id).await?;

    tracing::info!(
        user_id = %current.id,
        item_id = %receipt.item.id,
        rarity = %receipt.item.rarity,
        shiny = receipt.shiny,
        outcome = receipt.outcome.as_str(),
        "Draw committed"
    );

    Ok(Json(receipt.into()))
}

/// Commit a draw performed by the client.
///
/// POST /api/pokemon/catch
///
/// # Errors
///
/// Returns 400 `invalid_item` when the item does not match the catalog and
/// 400 `validation` for a cost below one.
pub async fn catch(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    ApiJson(submission): ApiJson<CatchSubmission>,
) -> Result<Json<DrawResponse>> {
    let receipt = state.capture().catch(current.id, submission).await?;
    Ok(Json(receipt.into()))
}

/// Grant one pokéball.
///
/// POST /api/pokemon/collect-ball
///
/// # Errors
///
/// Returns 401 if not logged in.
pub async fn collect_ball(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<CollectBallResponse>> {
    let credits_total = state.capture().collect_ball(current.id).await?;
    Ok(Json(CollectBallResponse { credits_total }))
}
