//! Email address type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The input string is empty.
    #[error("email cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("email must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains whitespace.
    #[error("email cannot contain whitespace")]
    ContainsWhitespace,
    /// The input does not contain exactly one @ symbol.
    #[error("email must contain exactly one @ symbol")]
    InvalidAtSymbol,
    /// The local part (before @) is empty.
    #[error("email local part cannot be empty")]
    EmptyLocalPart,
    /// The domain part has no dot-separated labels.
    #[error("email domain must look like name.tld")]
    InvalidDomain,
}

/// A registered user's email address.
///
/// Surrounding whitespace is trimmed before validation. The shape accepted is
/// `local@name.tld`: no inner whitespace, exactly one `@`, and a domain with a
/// dot that has characters on both sides.
///
/// ## Examples
///
/// ```
/// use gachadex_core::Email;
///
/// assert!(Email::parse("ash@pallet.town").is_ok());
/// assert!(Email::parse("  misty+gym@cerulean.kanto.jp ").is_ok());
///
/// assert!(Email::parse("").is_err());
/// assert!(Email::parse("brock@pewter").is_err());
/// assert!(Email::parse("gary@@oak.lab").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an `Email` from user input.
    ///
    /// # Errors
    ///
    /// Returns an [`EmailError`] describing the first rule the input breaks.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EmailError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if s.chars().any(char::is_whitespace) {
            return Err(EmailError::ContainsWhitespace);
        }

        let (local, domain) = s.split_once('@').ok_or(EmailError::InvalidAtSymbol)?;
        if domain.contains('@') {
            return Err(EmailError::InvalidAtSymbol);
        }
        if local.is_empty() {
            return Err(EmailError::EmptyLocalPart);
        }

        let has_dotted_label = domain
            .char_indices()
            .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len());
        if !has_dotted_label {
            return Err(EmailError::InvalidDomain);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Email` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Returns the domain part of the email (after the @).
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.split_once('@').map_or("", |(_, domain)| domain)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Email {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Email {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        // Rows were validated on insert.
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Email {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_common_shapes() {
        assert!(Email::parse("ash@pallet.town").is_ok());
        assert!(Email::parse("prof.oak+lab@research.kanto.jp").is_ok());
        assert!(Email::parse("a@b.c").is_ok());
    }

    #[test]
    fn test_trims_surrounding_whitespace() {
        let email = Email::parse("  ash@pallet.town\n").unwrap();
        assert_eq!(email.as_str(), "ash@pallet.town");
    }

    #[test]
    fn test_rejects_empty_and_blank() {
        assert_eq!(Email::parse(""), Err(EmailError::Empty));
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
    }

    #[test]
    fn test_rejects_too_long() {
        let long = format!("{}@pallet.town", "a".repeat(250));
        assert!(matches!(
            Email::parse(&long),
            Err(EmailError::TooLong { .. })
        ));
    }

    #[test]
    fn test_rejects_inner_whitespace() {
        assert_eq!(
            Email::parse("ash ketchum@pallet.town"),
            Err(EmailError::ContainsWhitespace)
        );
    }

    #[test]
    fn test_rejects_missing_or_repeated_at() {
        assert_eq!(Email::parse("pallet.town"), Err(EmailError::InvalidAtSymbol));
        assert_eq!(
            Email::parse("ash@home@pallet.town"),
            Err(EmailError::InvalidAtSymbol)
        );
    }

    #[test]
    fn test_rejects_empty_local_part() {
        assert_eq!(Email::parse("@pallet.town"), Err(EmailError::EmptyLocalPart));
    }

    #[test]
    fn test_rejects_undotted_domain() {
        assert_eq!(Email::parse("ash@pallet"), Err(EmailError::InvalidDomain));
        assert_eq!(Email::parse("ash@.town"), Err(EmailError::InvalidDomain));
        assert_eq!(Email::parse("ash@pallet."), Err(EmailError::InvalidDomain));
        assert_eq!(Email::parse("ash@"), Err(EmailError::InvalidDomain));
    }

    #[test]
    fn test_domain() {
        let email = Email::parse("ash@pallet.town").unwrap();
        assert_eq!(email.domain(), "pallet.town");
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let email = Email::parse("ash@pallet.town").unwrap();
        assert_eq!(serde_json::to_string(&email).unwrap(), "\"ash@pallet.town\"");
    }
}
