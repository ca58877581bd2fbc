//! Email notifications to members.
//!
//! Uses SMTP via lettre. Mail is a courtesy: callers log failures and carry
//! on.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;

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
}

/// Subject and body of a plain-text mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composed {
    pub subject: String,
    pub body: String,
}

/// Email service for transactional mail.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the relay host is invalid.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Tell a member their inquiry was answered.
    ///
    /// # Errors
    ///
    /// Returns error if the message cannot be built or delivered.
    pub async fn send_inquiry_answer(
        &self,
        to: &str,
        member_name: &str,
        title: &str,
        answer: &str,
    ) -> Result<(), EmailError> {
        let mail = compose_inquiry_answer(member_name, title, answer);
        self.send_text_email(to, &mail.subject, &mail.body).await
    }

    async fn send_text_email(&self, to: &str, subject: &str, body: &str) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent");
        Ok(())
    }
}

/// Mail sent when an inquiry is answered.
#[must_use]
pub fn compose_inquiry_answer(member_name: &str, title: &str, answer: &str) -> Composed {
    Composed {
        subject: format!("[Purewell] Your inquiry has been answered: {title}"),
        body: format!(
            "Hello {member_name},\n\n\
             We have answered your inquiry \"{title}\".\n\n\
             {answer}\n\n\
             You can review the full conversation under My Page > Inquiries.\n\n\
             Purewell Customer Care"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_inquiry_answer() {
        let mail = compose_inquiry_answer("Kim", "[Refund] Leaking housing", "Refund issued.");
        assert_eq!(
            mail.subject,
            "[Purewell] Your inquiry has been answered: [Refund] Leaking housing"
        );
        assert!(mail.body.starts_with("Hello Kim,"));
        assert!(mail.body.contains("Refund issued."));
    }
}
