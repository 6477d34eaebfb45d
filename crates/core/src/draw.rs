//! Rarity-weighted draw.
//!
//! A draw is three independent steps:
//!
//! 1. [`select_rarity`] picks a class by cumulative probability.
//! 2. [`Catalog::select_item`] picks uniformly inside that class.
//! 3. [`roll_shiny`] flips the shiny coin.
//!
//! Randomness is always supplied by the caller. Production code passes
//! `rand::rng()`; tests pass a seeded `StdRng`.

use rand::Rng;
use serde::Serialize;

use crate::types::{Catalog, CatalogItem, Rarity};

/// Probability that a drawn item is shiny.
pub const SHINY_PROBABILITY: f64 = 0.025;

/// Errors produced by the draw engine.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawError {
    /// The selected rarity has no catalog items.
    #[error("catalog has no {0} items")]
    NoItemForRarity(Rarity),
}

/// The outcome of a single draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawResult {
    pub item: CatalogItem,
    pub shiny: bool,
}

/// Select a rarity class.
///
/// Walks [`Rarity::ALL`] accumulating probabilities and returns the first
/// class whose running total exceeds a uniform sample in `[0, 1)`. Samples
/// past the last total (the 3% residual) land on [`Rarity::Common`].
pub fn select_rarity<R: Rng + ?Sized>(rng: &mut R) -> Rarity {
    let sample: f64 = rng.random();
    let mut cumulative = 0.0;
    for rarity in Rarity::ALL {
        cumulative += rarity.probability();
        if sample < cumulative {
            return rarity;
        }
    }
    Rarity::Common
}

/// Roll the shiny flag, independent of rarity.
pub fn roll_shiny<R: Rng + ?Sized>(rng: &mut R) -> bool {
    rng.random_bool(SHINY_PROBABILITY)
}

/// Perform a complete draw against `catalog`.
///
/// # Errors
///
/// Returns [`DrawError::NoItemForRarity`] if the selected class is empty.
/// Nothing is rolled for shininess in that case.
pub fn draw<R: Rng + ?Sized>(catalog: &Catalog, rng: &mut R) -> Result<DrawResult, DrawError> {
    let rarity = select_rarity(rng);
    let item = catalog.select_item(rarity, rng)?.clone();
    let shiny = roll_shiny(rng);
    Ok(DrawResult { item, shiny })
}
