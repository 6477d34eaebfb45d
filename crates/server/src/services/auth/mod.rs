//! Authentication service.
//!
//! Password accounts with an optional emailed one-time code as a second
//! factor. New accounts have the second factor enabled.

mod error;

pub use error::AuthError;

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use gachadex_core::{Credits, Email, OneTimeCode, UserId, Username};

use crate::db::{CodeStore, RepositoryError, UserStore};
use crate::models::{NewUser, User};
use crate::services::email::EmailSender;
use crate::services::two_factor::{Clock, TwoFactorService};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Symbols allowed in passwords besides ASCII letters and digits.
const PASSWORD_SYMBOLS: &str = "@$!%*#?&";

/// Argon2id hash of a random secret, checked when a username is unknown so
/// that path costs the same as a wrong password.
static UNKNOWN_USER_HASH: LazyLock<Option<String>> = LazyLock::new(|| {
    let secret = SaltString::generate(&mut OsRng);
    hash_password(secret.as_str()).ok()
});

/// Result of a successful password check.
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    /// A code was emailed; the session is not established yet.
    TwoFactorRequired { user_id: UserId },
    /// No second factor; the user is logged in.
    Authenticated(User),
}

/// Authentication service.
///
/// Handles registration, password login, and the second-factor step.
pub struct AuthService<'a, S, C, E> {
    store: &'a S,
    clock: &'a C,
    mailer: &'a E,
    starting_credits: u32,
}

impl<'a, S, C, E> AuthService<'a, S, C, E>
where
    S: UserStore + CodeStore,
    C: Clock,
    E: EmailSender,
{
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a S, clock: &'a C, mailer: &'a E, starting_credits: u32) -> Self {
        Self {
            store,
            clock,
            mailer,
            starting_credits,
        }
    }

    fn codes(&self) -> TwoFactorService<'a, S, C> {
        TwoFactorService::new(self.store, self.clock)
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a new account and email its first login code.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail`, `InvalidUsername`, or `WeakPassword`
    /// for malformed input, `AuthError::UserAlreadyExists` if the email or
    /// username is taken, and `Repository`/`Delivery` on collaborator failure.
    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        let username = Username::parse(username)?;
        validate_password(password)?;

        let password_hash = hash_password(password)?;

        let user = self
            .store
            .create_user(NewUser {
                email,
                username,
                password_hash,
                credits: Credits::new(self.starting_credits),
                two_factor_enabled: true,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(field) => AuthError::UserAlreadyExists(field),
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");

        self.send_login_code(&user).await?;
        Ok(user)
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Check a username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for any unknown username or
    /// wrong password, and `Repository`/`Delivery` on collaborator failure.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let Ok(username) = Username::parse(username) else {
            return Err(reject_unknown_user(password));
        };

        let Some(credentials) = self.store.find_credentials(&username).await? else {
            return Err(reject_unknown_user(password));
        };

        verify_password(password, &credentials.password_hash)?;

        let user = credentials.user;
        if user.two_factor_enabled {
            self.send_login_code(&user).await?;
            return Ok(LoginOutcome::TwoFactorRequired { user_id: user.id });
        }

        Ok(LoginOutcome::Authenticated(user))
    }

    /// Complete a login with the emailed code.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MalformedCode` before any lookup if `code` is not
    /// six digits, and `AuthError::InvalidCode` for every other rejection.
    pub async fn verify_two_factor(&self, user_id: UserId, code: &str) -> Result<User, AuthError> {
        let code = OneTimeCode::parse(code)?;

        if !self.codes().verify(user_id, &code).await? {
            return Err(AuthError::InvalidCode);
        }

        self.store
            .find_user(user_id)
            .await?
            .ok_or(AuthError::InvalidCode)
    }

    // =========================================================================
    // Account
    // =========================================================================

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Turn the emailed second factor on or off.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn set_two_factor(&self, user_id: UserId, enabled: bool) -> Result<User, AuthError> {
        let user = self
            .store
            .set_two_factor(user_id, enabled)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })?;
        tracing::info!(user_id = %user_id, enabled, "Two-factor setting changed");
        Ok(user)
    }

    /// Issue a fresh code and email it. Nothing is sent if issuing fails.
    async fn send_login_code(&self, user: &User) -> Result<(), AuthError> {
        let code = self.codes().issue_new(user.id).await?;
        self.mailer.send_code(&user.email, &code).await?;
        Ok(())
    }
}

/// Validate password meets requirements.
///
/// At least eight characters, at least one letter and one digit, and nothing
/// outside ASCII letters, digits, and `@$!%*#?&`.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    if let Some(bad) = password
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && !PASSWORD_SYMBOLS.contains(*c))
    {
        return Err(AuthError::WeakPassword(format!(
            "password may not contain '{bad}'; allowed symbols are {PASSWORD_SYMBOLS}"
        )));
    }

    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err(AuthError::WeakPassword(
            "password must contain a letter".to_owned(),
        ));
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AuthError::WeakPassword(
            "password must contain a digit".to_owned(),
        ));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Spend one password verification, then fail.
fn reject_unknown_user(password: &str) -> AuthError {
    if let Some(hash) = UNKNOWN_USER_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
    AuthError::InvalidCredentials
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_password_rules() {
        assert!(validate_password("pikachu25").is_ok());
        assert!(validate_password("Ch@rm4nder!").is_ok());

        assert!(validate_password("short1").is_err());
        assert!(validate_password("onlyletters").is_err());
        assert!(validate_password("12345678").is_err());
        assert!(validate_password("has space 1").is_err());
        assert!(validate_password("tilde~1234").is_err());
    }

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("pikachu25").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("pikachu25", &hash).is_ok());
        assert!(matches!(
            verify_password("raichu25", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_unknown_user_hash_is_argon2id() {
        let hash = UNKNOWN_USER_HASH.as_deref().unwrap();
        let parsed = PasswordHash::new(hash).unwrap();
        assert_eq!(parsed.algorithm.as_str(), "argon2id");
        assert!(verify_password("pikachu25", hash).is_err());
    }

    #[test]
    fn test_unknown_user_is_invalid_credentials() {
        assert!(matches!(
            reject_unknown_user("pikachu25"),
            AuthError::InvalidCredentials
        ));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("pikachu25", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
