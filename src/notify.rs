//! Alert delivery.
//!
//! [`EmailNotifier`] wraps the `lettre` async SMTP transport. Addresses are
//! parsed once at construction so a bad sender or receiver fails at startup
//! rather than at the first alert.

use crate::alert::AlertLevel;
use crate::config::EmailConfig;
use crate::error::NotifyError;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// Outbound channel for alert messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, subject: &str, body: &str, level: AlertLevel) -> Result<(), NotifyError>;
}

/// Sends alerts as plain-text email over SMTP.
pub struct EmailNotifier {
    from: Mailbox,
    to: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailNotifier {
    pub fn new(config: &EmailConfig) -> Result<Self, NotifyError> {
        let from: Mailbox = config.sender.parse()?;
        let to: Mailbox = config.receiver.parse()?;

        let builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_server)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_server)
        };
        let mut builder = builder.port(config.smtp_port);

        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        Ok(Self {
            from,
            to,
            transport: builder.build(),
        })
    }

    pub(crate) fn build_message(&self, subject: &str, body: &str) -> Result<Message, NotifyError> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| NotifyError::Build(e.to_string()))
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn send(&self, subject: &str, body: &str, level: AlertLevel) -> Result<(), NotifyError> {
        let email = self.build_message(subject, body)?;
        self.transport.send(email).await?;

        tracing::info!(to = %self.to, level = %level, "alert email sent");
        Ok(())
    }
}
