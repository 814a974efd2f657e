use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::info;

use crate::errors::ApplicationError;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid recipient address: {0}")]
    InvalidAddress(String),

    #[error("{0}")]
    DeliveryFailed(String),
}

/// A file uploaded by the user, forwarded as an email attachment
#[derive(Debug, Clone)]
pub struct EmailAttachment {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachment: Option<EmailAttachment>,
}

/// SMTP connection settings, read from the environment
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

/// Outbound mail transport. When SMTP is not configured the mailer degrades
/// to logging the message, so development and tests need no mail server.
pub enum Mailer {
    Smtp {
        transport: AsyncSmtpTransport<Tokio1Executor>,
        from: Mailbox,
    },
    Log,
}

impl Mailer {
    pub fn from_settings(settings: Option<SmtpSettings>) -> Result<Self, ApplicationError> {
        let Some(settings) = settings else {
            info!("SMTP not configured, outgoing mail will only be logged");
            return Ok(Mailer::Log);
        };

        let from: Mailbox = settings
            .from
            .parse()
            .map_err(|e| ApplicationError::Internal(format!("Invalid MEMO_MAIL_FROM: {e}")))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
            .map_err(|e| {
                ApplicationError::Internal(format!("Failed to set up SMTP transport: {e}"))
            })?
            .port(settings.port);

        if let (Some(username), Some(password)) = (settings.username, settings.password) {
            builder = builder.credentials(Credentials::new(username, password));
        }

        info!("Using SMTP relay {}:{}", settings.host, settings.port);
        Ok(Mailer::Smtp {
            transport: builder.build(),
            from,
        })
    }

    /// Send one message, returning the delivered count (always 1 on success)
    pub async fn send(&self, email: OutgoingEmail) -> Result<usize, MailError> {
        match self {
            Mailer::Log => {
                info!(
                    to = %email.to,
                    subject = %email.subject,
                    attachment = email.attachment.is_some(),
                    "mail transport not configured, logging message instead"
                );
                Ok(1)
            }
            Mailer::Smtp { transport, from } => {
                let message = build_message(from, email)?;

                let response = transport
                    .send(message)
                    .await
                    .map_err(|e| MailError::DeliveryFailed(e.to_string()))?;

                if response.is_positive() {
                    Ok(1)
                } else {
                    Err(MailError::DeliveryFailed(
                        response.message().collect::<Vec<_>>().join(" "),
                    ))
                }
            }
        }
    }
}

fn build_message(from: &Mailbox, email: OutgoingEmail) -> Result<Message, MailError> {
    let to: Mailbox = email
        .to
        .parse()
        .map_err(|_| MailError::InvalidAddress(email.to.clone()))?;

    let builder = Message::builder()
        .from(from.clone())
        .to(to)
        .subject(email.subject);

    let message = match email.attachment {
        Some(attachment) => {
            let content_type = ContentType::parse(&attachment.content_type)
                .or_else(|_| ContentType::parse("application/octet-stream"))
                .map_err(|e| MailError::DeliveryFailed(e.to_string()))?;

            builder.multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(email.body))
                    .singlepart(
                        Attachment::new(attachment.filename).body(attachment.bytes, content_type),
                    ),
            )
        }
        None => builder.body(email.body),
    };

    message.map_err(|e| MailError::DeliveryFailed(e.to_string()))
}
