//! Outbound email.
//!
//! Sending is best-effort: a failed email is logged at warn and never fails
//! the request that triggered it.

use std::sync::{Arc, Mutex};

use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use switchbook_moderation::EmailMessage;
use thiserror::Error;

use crate::config::SmtpConfig;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("Failed to build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

pub enum Mailer {
    /// Deliver through an SMTP relay (STARTTLS).
    Smtp {
        transport: AsyncSmtpTransport<Tokio1Executor>,
        from: Mailbox,
    },
    /// No SMTP server configured; messages are written to the log.
    Log,
    /// Collect messages in memory.
    Outbox(Arc<Mutex<Vec<EmailMessage>>>),
}

impl Mailer {
    pub fn from_config(smtp: Option<&SmtpConfig>) -> Result<Self, MailError> {
        let Some(smtp) = smtp else {
            log::info!("No SMTP host configured; emails will be logged");
            return Ok(Self::Log);
        };

        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)?.port(smtp.port);
        if let (Some(user), Some(pass)) = (&smtp.username, &smtp.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }
        log::info!("Sending email through {}:{}", smtp.host, smtp.port);
        Ok(Self::Smtp {
            transport: builder.build(),
            from: smtp.from.parse()?,
        })
    }

    pub fn outbox() -> (Self, Arc<Mutex<Vec<EmailMessage>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        (Self::Outbox(Arc::clone(&sent)), sent)
    }

    pub async fn send(&self, email: &EmailMessage) -> Result<(), MailError> {
        match self {
            Self::Smtp { transport, from } => {
                let message = Message::builder()
                    .from(from.clone())
                    .to(email.to.parse()?)
                    .subject(email.subject.clone())
                    .body(email.body.clone())?;
                transport.send(message).await?;
            }
            Self::Log => {
                log::info!("Email to {}: {}\n{}", email.to, email.subject, email.body);
            }
            Self::Outbox(sent) => {
                if let Ok(mut sent) = sent.lock() {
                    sent.push(email.clone());
                }
            }
        }
        Ok(())
    }

    /// Send each email, logging failures instead of returning them.
    pub async fn send_all(&self, emails: Vec<EmailMessage>) {
        for email in emails {
            if let Err(e) = self.send(&email).await {
                log::warn!("Failed to send '{}' to {}: {}", email.subject, email.to, e);
            }
        }
    }
}
