//! Pokéball balance.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Returned when a balance cannot cover a cost.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("insufficient credits: balance {balance}, cost {cost}")]
pub struct InsufficientCredits {
    /// Balance at the time of the attempt.
    pub balance: Credits,
    /// Cost that was requested.
    pub cost: u32,
}

/// A non-negative count of pokéballs.
///
/// Every draw spends from it and collecting a ball grants to it. The type
/// cannot represent a negative balance, and never exceeds [`Credits::MAX`]
/// so every value fits the signed integer column it is stored in.
///
/// ```
/// use gachadex_core::Credits;
///
/// let balance = Credits::new(1);
/// let after = balance.spend(1).unwrap();
/// assert_eq!(after, Credits::ZERO);
/// assert!(after.spend(1).is_err());
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(from = "u32", into = "u32")]
pub struct Credits(u32);

impl Credits {
    /// An empty balance.
    pub const ZERO: Self = Self(0);

    /// The largest balance, `i32::MAX`.
    pub const MAX: Self = Self(i32::MAX.unsigned_abs());

    /// Create a balance, capped at [`Credits::MAX`].
    #[must_use]
    pub const fn new(amount: u32) -> Self {
        if amount > Self::MAX.0 {
            Self::MAX
        } else {
            Self(amount)
        }
    }

    /// Get the underlying count.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Whether the balance covers `cost`.
    #[must_use]
    pub const fn covers(self, cost: u32) -> bool {
        self.0 >= cost
    }

    /// Subtract `cost`, leaving `self` untouched on failure.
    ///
    /// # Errors
    ///
    /// Returns [`InsufficientCredits`] if the balance is below `cost`.
    pub const fn spend(self, cost: u32) -> Result<Self, InsufficientCredits> {
        match self.0.checked_sub(cost) {
            Some(remaining) => Ok(Self(remaining)),
            None => Err(InsufficientCredits {
                balance: self,
                cost,
            }),
        }
    }

    /// Add `amount`, saturating at [`Credits::MAX`].
    #[must_use]
    pub const fn grant(self, amount: u32) -> Self {
        Self::new(self.0.saturating_add(amount))
    }
}

impl fmt::Display for Credits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Credits {
    fn from(amount: u32) -> Self {
        Self::new(amount)
    }
}

impl From<Credits> for u32 {
    fn from(credits: Credits) -> Self {
        credits.0
    }
}

impl From<Credits> for i32 {
    fn from(credits: Credits) -> Self {
        // In range: balances never exceed `Credits::MAX`.
        Self::try_from(credits.0).unwrap_or(Self::MAX)
    }
}

impl TryFrom<i32> for Credits {
    type Error = core::num::TryFromIntError;

    /// Convert a stored integer column, rejecting negative values.
    fn try_from(value: i32) -> Result<Self, Self::Error> {
        u32::try_from(value).map(Self)
    }
}
