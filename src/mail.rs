// src/mail.rs

//! Outgoing mail. Delivery failures surface as internal errors; nothing retries.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType, transport::smtp::authentication::Credentials,
};

use crate::{config::SmtpConfig, error::AppError};

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, subject: &str, body: &str, from: &str, to: &str) -> Result<(), AppError>;
}

pub type DynMailer = Arc<dyn Mailer>;

/// Sends mail through an SMTP relay using STARTTLS.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, lettre::transport::smtp::Error> {
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?.port(config.port);

        if let (Some(user), Some(pass)) = (&config.user, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, subject: &str, body: &str, from: &str, to: &str) -> Result<(), AppError> {
        let email = Message::builder()
            .from(from.parse().map_err(|e| mail_error("sender", e))?)
            .to(to.parse().map_err(|e| mail_error("recipient", e))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| mail_error("message", e))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| mail_error("transport", e))?;

        tracing::info!(to = to, "Mail sent");
        Ok(())
    }
}

fn mail_error(stage: &str, err: impl std::fmt::Display) -> AppError {
    AppError::InternalServerError(format!("Mail {} error: {}", stage, err))
}

/// Writes mail to the log instead of delivering it. Used when no relay is configured.
#[derive(Debug, Default, Clone)]
pub struct ConsoleMailer;

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, subject: &str, body: &str, from: &str, to: &str) -> Result<(), AppError> {
        tracing::info!(from = from, to = to, subject = subject, "Mail (console): {}", body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn console_mailer_accepts_any_message() {
        let mailer: DynMailer = Arc::new(ConsoleMailer);
        assert!(mailer.send("Hi", "body", "noreply@x", "a@x.com").await.is_ok());
    }
}
