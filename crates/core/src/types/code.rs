//! One-time verification code value.

use core::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Lifetime of an issued code, in seconds.
pub const CODE_TTL_SECONDS: i64 = 5 * 60;

/// Errors that can occur when parsing a [`OneTimeCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CodeError {
    #[error("code must be exactly {expected} digits")]
    InvalidLength { expected: usize },
    #[error("code must contain only digits")]
    NonDigit,
}

/// A six-digit second-factor code.
///
/// Generated codes are uniform in `100000..=999999`, so they never carry a
/// leading zero. Parsed codes accept any six ASCII digits.
///
/// ```
/// use gachadex_core::OneTimeCode;
///
/// assert!(OneTimeCode::parse("042917").is_ok());
/// assert!(OneTimeCode::parse("12345").is_err());
/// assert!(OneTimeCode::parse("12a456").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OneTimeCode(String);

impl OneTimeCode {
    /// Number of digits.
    pub const LENGTH: usize = 6;

    /// Draw a fresh code.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(rng.random_range(100_000..=999_999_u32).to_string())
    }

    /// Validate user input.
    ///
    /// # Errors
    ///
    /// Returns [`CodeError`] unless the input is exactly six ASCII digits.
    pub fn parse(s: &str) -> Result<Self, CodeError> {
        let s = s.trim();
        if s.len() != Self::LENGTH {
            return Err(CodeError::InvalidLength {
                expected: Self::LENGTH,
            });
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CodeError::NonDigit);
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the digits.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Codes are secrets; keep them out of logs.
impl fmt::Debug for OneTimeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OneTimeCode(******)")
    }
}

impl fmt::Display for OneTimeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
