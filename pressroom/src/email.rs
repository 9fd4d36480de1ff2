//! Notifies the operator by email over authenticated SMTP.
//!
//! Subject is the document title; the body is the published URL.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use pressroom_core::contract::{BoxError, Notifier};
use tracing::info;
use url::Url;

use crate::load_config::{require_env, NotifierSection, MAIL_SENDER_PASSWORD_VAR};

pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
    recipient: Mailbox,
}

impl EmailNotifier {
    /// Builds the transport. No connection is made until the first send.
    pub fn new(section: &NotifierSection, password: String) -> Result<Self, BoxError> {
        let sender: Mailbox = section.sender_email.parse()?;
        let recipient: Mailbox = section.recipient_email.parse()?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&section.smtp_server)?
            .port(section.smtp_port)
            .credentials(Credentials::new(section.sender_email.clone(), password))
            .build();
        Ok(Self {
            transport,
            sender,
            recipient,
        })
    }

    /// Builds a notifier from the notifier settings and `MAIL_SENDER_PASSWORD`.
    pub fn from_env(section: &NotifierSection) -> Result<Self, BoxError> {
        let password = require_env(MAIL_SENDER_PASSWORD_VAR)?;
        info!(
            smtp_server = %section.smtp_server,
            smtp_port = section.smtp_port,
            "Initialized email notifier from environment"
        );
        Self::new(section, password)
    }

    /// The message [`Notifier::notify`] sends.
    pub fn message(&self, location: &Url, title: &str) -> Result<Message, BoxError> {
        let message = Message::builder()
            .from(self.sender.clone())
            .to(self.recipient.clone())
            .subject(title)
            .header(ContentType::TEXT_PLAIN)
            .body(location.to_string())?;
        Ok(message)
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, location: &Url, title: &str) -> Result<(), BoxError> {
        let message = self.message(location, title)?;
        self.transport.send(message).await?;
        info!(recipient = %self.recipient, "[NOTIFY] Email sent");
        Ok(())
    }
}
