//! Rarity classes and their draw weights.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Returned when a string does not name a rarity.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown rarity: {0}")]
pub struct ParseRarityError(pub String);

/// Rarity class of a catalog item.
///
/// Serialized with the capitalised names used by the catalog file
/// (`"Common"`, `"Legendary"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    /// All rarities in draw order. Cumulative selection walks this order.
    pub const ALL: [Self; 5] = [
        Self::Common,
        Self::Uncommon,
        Self::Rare,
        Self::Epic,
        Self::Legendary,
    ];

    /// Draw probability of this class.
    ///
    /// The weights sum to 0.97. The remainder falls through to
    /// [`Rarity::Common`] during selection.
    #[must_use]
    pub const fn probability(self) -> f64 {
        match self {
            Self::Common => 0.60,
            Self::Uncommon => 0.20,
            Self::Rare => 0.10,
            Self::Epic => 0.05,
            Self::Legendary => 0.02,
        }
    }

    /// Name as it appears in the catalog file and API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Common => "Common",
            Self::Uncommon => "Uncommon",
            Self::Rare => "Rare",
            Self::Epic => "Epic",
            Self::Legendary => "Legendary",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rarity {
    type Err = ParseRarityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseRarityError(s.to_owned()))
    }
}
