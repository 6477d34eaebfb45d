//! Delivery of one-time login codes.
//!
//! [`SmtpEmailSender`] sends multipart mail through lettre with Askama
//! templates. [`LogEmailSender`] only writes the delivery to the log and is
//! used when no SMTP relay is configured.

use askama::Template;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use gachadex_core::{CODE_TTL_SECONDS, Email, OneTimeCode};

use crate::config::SmtpConfig;

const CODE_SUBJECT: &str = "Your Gachadex login code";

/// HTML body for a login code.
#[derive(Template)]
#[template(path = "email/two_factor_code.html")]
struct TwoFactorCodeHtml<'a> {
    code: &'a str,
    minutes: i64,
}

/// Plain text body for a login code.
#[derive(Template)]
#[template(path = "email/two_factor_code.txt")]
struct TwoFactorCodeText<'a> {
    code: &'a str,
    minutes: i64,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Something that can deliver a one-time code to a mailbox.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver `code` to `to`. No retries.
    async fn send_code(&self, to: &Email, code: &OneTimeCode) -> Result<(), EmailError>;
}

// =============================================================================
// Log sender
// =============================================================================

/// Development sender that logs instead of delivering.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send_code(&self, to: &Email, code: &OneTimeCode) -> Result<(), EmailError> {
        tracing::info!(
            to = %to,
            code = %code,
            "SMTP not configured, login code logged instead of sent"
        );
        Ok(())
    }
}

// =============================================================================
// SMTP sender
// =============================================================================

/// SMTP sender using STARTTLS.
#[derive(Clone)]
pub struct SmtpEmailSender {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpEmailSender {
    /// Create a sender from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the relay cannot be configured.
    pub fn new(config: &SmtpConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from.clone(),
        })
    }

    fn build_message(&self, to: &Email, code: &OneTimeCode) -> Result<Message, EmailError> {
        let (text, html) = render_code_bodies(code)?;

        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .as_str()
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(CODE_SUBJECT)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html),
                    ),
            )?;

        Ok(message)
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send_code(&self, to: &Email, code: &OneTimeCode) -> Result<(), EmailError> {
        let message = self.build_message(to, code)?;
        self.mailer.send(message).await?;

        tracing::info!(to = %to, "Login code email sent");
        Ok(())
    }
}

/// Render the plain text and HTML bodies for a login code.
fn render_code_bodies(code: &OneTimeCode) -> Result<(String, String), EmailError> {
    let minutes = CODE_TTL_SECONDS / 60;
    let text = TwoFactorCodeText {
        code: code.as_str(),
        minutes,
    }
    .render()?;
    let html = TwoFactorCodeHtml {
        code: code.as_str(),
        minutes,
    }
    .render()?;
    Ok((text, html))
}

// =============================================================================
// Mailer
// =============================================================================

/// The configured sender.
#[derive(Clone)]
pub enum Mailer {
    Log(LogEmailSender),
    Smtp(SmtpEmailSender),
}

impl Mailer {
    /// Pick SMTP when configured, otherwise the log sender.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn from_config(smtp: Option<&SmtpConfig>) -> Result<Self, SmtpError> {
        match smtp {
            Some(config) => Ok(Self::Smtp(SmtpEmailSender::new(config)?)),
            None => Ok(Self::Log(LogEmailSender)),
        }
    }

    /// Short label for startup logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Log(_) => "log",
            Self::Smtp(_) => "smtp",
        }
    }
}

#[async_trait]
impl EmailSender for Mailer {
    async fn send_code(&self, to: &Email, code: &OneTimeCode) -> Result<(), EmailError> {
        match self {
            Self::Log(sender) => sender.send_code(to, code).await,
            Self::Smtp(sender) => sender.send_code(to, code).await,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn smtp_config() -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.net".to_string(),
            port: 587,
            username: "mailer".to_string(),
            password: SecretString::from("app-password-1234"),
            from: "Gachadex <no-reply@gachadex.dev>".to_string(),
        }
    }

    #[test]
    fn test_bodies_contain_code_and_expiry() {
        let code = OneTimeCode::parse("482913").unwrap();
        let (text, html) = render_code_bodies(&code).unwrap();
        assert!(text.contains("482913"));
        assert!(text.contains("5 minutes"));
        assert!(html.contains("482913"));
        assert!(html.contains("5 minutes"));
    }

    #[test]
    fn test_mailer_defaults_to_log() {
        let mailer = Mailer::from_config(None).unwrap();
        assert_eq!(mailer.kind(), "log");
    }

    #[tokio::test]
    async fn test_mailer_uses_smtp_when_configured() {
        let mailer = Mailer::from_config(Some(&smtp_config())).unwrap();
        assert_eq!(mailer.kind(), "smtp");
    }

    #[tokio::test]
    async fn test_message_builds_for_valid_addresses() {
        let sender = SmtpEmailSender::new(&smtp_config()).unwrap();
        let to = Email::parse("ash@pallet.town").unwrap();
        let code = OneTimeCode::parse("000123").unwrap();
        assert!(sender.build_message(&to, &code).is_ok());
    }

    #[tokio::test]
    async fn test_log_sender_always_succeeds() {
        let to = Email::parse("ash@pallet.town").unwrap();
        let code = OneTimeCode::parse("123456").unwrap();
        assert!(LogEmailSender.send_code(&to, &code).await.is_ok());
    }
}
