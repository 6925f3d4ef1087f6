//! Alert dispatch module
//!
//! Sends the alert email through a fixed SMTP relay. No authentication, no
//! TLS and no retries: a failed delivery is returned to the caller as is.

use crate::reporting::AlertEmail;
use crate::FailureReport;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::{Message, SmtpTransport, Transport};
use thiserror::Error;

pub const SMTP_RELAY: &str = "smtp.gu.se";
pub const SMTP_PORT: u16 = 25;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid mail address {address}: {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("Failed to build alert message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("Delivery through {relay} failed: {source}")]
    Transport {
        relay: String,
        #[source]
        source: lettre::transport::smtp::Error,
    },
}

/// Anything that can deliver an alert email
pub trait Mailer {
    fn send(&self, email: &AlertEmail) -> Result<(), MailError>;
}

/// Plain SMTP delivery to a single relay
pub struct SmtpMailer {
    pub relay: String,
    pub port: u16,
}

impl Default for SmtpMailer {
    fn default() -> Self {
        Self {
            relay: SMTP_RELAY.to_string(),
            port: SMTP_PORT,
        }
    }
}

impl SmtpMailer {
    pub fn new(relay: &str, port: u16) -> Self {
        Self {
            relay: relay.to_string(),
            port,
        }
    }
}

impl Mailer for SmtpMailer {
    fn send(&self, email: &AlertEmail) -> Result<(), MailError> {
        let message = build_message(email)?;

        // Unencrypted session; the connection is closed once the message is sent
        let transport = SmtpTransport::builder_dangerous(self.relay.as_str())
            .port(self.port)
            .build();
        transport
            .send(&message)
            .map_err(|source| MailError::Transport {
                relay: format!("{}:{}", self.relay, self.port),
                source,
            })?;

        log::info!("Sent QC alert to {} via {}", email.to, self.relay);
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.parse().map_err(|source| MailError::Address {
        address: address.to_string(),
        source,
    })
}

/// Convert an alert into a plain-text MIME message
pub fn build_message(email: &AlertEmail) -> Result<Message, MailError> {
    let message = Message::builder()
        .from(parse_mailbox(&email.from)?)
        .to(parse_mailbox(&email.to)?)
        .subject(email.subject.as_str())
        .header(ContentType::TEXT_PLAIN)
        .body(email.body.clone())?;
    Ok(message)
}

/// Compose the alert for `reports` and hand it to `mailer`
pub fn notify(
    reports: &[FailureReport],
    email: &str,
    source_label: &str,
    mailer: &dyn Mailer,
) -> Result<(), MailError> {
    let alert = AlertEmail::compose(reports, email, source_label);
    mailer.send(&alert)
}
