//! Username type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Username`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UsernameError {
    /// Fewer than [`Username::MIN_LENGTH`] characters.
    #[error("username must be at least {min} characters")]
    TooShort {
        /// Minimum allowed length.
        min: usize,
    },
    /// More than [`Username::MAX_LENGTH`] characters.
    #[error("username must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// A character outside `[A-Za-z0-9_]`.
    #[error("username may only contain letters, digits, and underscores")]
    InvalidCharacter,
}

/// A login name: 3 to 50 ASCII letters, digits, or underscores.
///
/// ```
/// use gachadex_core::Username;
///
/// assert!(Username::parse("red_2024").is_ok());
/// assert!(Username::parse("ab").is_err());
/// assert!(Username::parse("no-dashes").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Minimum length in characters.
    pub const MIN_LENGTH: usize = 3;
    /// Maximum length in characters.
    pub const MAX_LENGTH: usize = 50;

    /// Parse a `Username`.
    ///
    /// # Errors
    ///
    /// Returns a [`UsernameError`] if the length or character set is wrong.
    pub fn parse(s: &str) -> Result<Self, UsernameError> {
        if s.chars().any(|c| !(c.is_ascii_alphanumeric() || c == '_')) {
            return Err(UsernameError::InvalidCharacter);
        }
        // Only ASCII past this point, so byte length equals char count.
        if s.len() < Self::MIN_LENGTH {
            return Err(UsernameError::TooShort {
                min: Self::MIN_LENGTH,
            });
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(UsernameError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the username as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Username` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_bounds() {
        assert!(Username::parse("abc").is_ok());
        assert!(Username::parse(&"a".repeat(50)).is_ok());
        assert!(Username::parse("Trainer_Red_01").is_ok());
    }

    #[test]
    fn test_rejects_short_and_long() {
        assert_eq!(
            Username::parse("ab"),
            Err(UsernameError::TooShort { min: 3 })
        );
        assert_eq!(
            Username::parse(&"a".repeat(51)),
            Err(UsernameError::TooLong { max: 50 })
        );
    }

    #[test]
    fn test_rejects_other_characters() {
        for bad in ["has space", "dash-ed", "dot.ted", "émile", "at@sign"] {
            assert_eq!(
                Username::parse(bad),
                Err(UsernameError::InvalidCharacter),
                "{bad}"
            );
        }
    }
}
