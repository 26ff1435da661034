//! SMTP submission channel.
//!
//! ```text
//! connect {host}:{port} ──► STARTTLS ──► AUTH LOGIN/PLAIN ──► MAIL FROM / RCPT TO owner, manager
//! ```
//!
//! Owner and manager are both `To` recipients; the body is a single
//! `text/html` part. Connections are made per send, so an idle channel
//! holds no socket.
use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, Message, SmtpTransport, Transport};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::channel::{DeliveryChannel, OutboundMessage, Recipient};
use crate::error::DeliveryError;

pub const DEFAULT_SMTP_HOST: &str = "smtp.office365.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;

fn default_host() -> String {
    DEFAULT_SMTP_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_SMTP_PORT
}

fn default_timeout_secs() -> u64 {
    30
}

/// Mail server settings for the SMTP channel.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// Default: [`DEFAULT_SMTP_HOST`]
    #[serde(default = "default_host")]
    pub host: String,
    /// Submission port. Default: 587
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(alias = "user")]
    pub username: String,
    pub password: String,
    /// `From` address; the username when unset.
    #[serde(default)]
    pub from: Option<String>,
    /// Per-command timeout. Default: 30
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("from", &self.from)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl SmtpConfig {
    pub fn validate(&self) -> Result<(), DeliveryError> {
        for (field, value) in [
            ("host", &self.host),
            ("username", &self.username),
            ("password", &self.password),
        ] {
            if value.trim().is_empty() {
                return Err(DeliveryError::Config(format!("smtp.{field} must not be empty")));
            }
        }
        if self.port == 0 {
            return Err(DeliveryError::Config("smtp.port must be > 0".into()));
        }
        if self.timeout_secs == 0 {
            return Err(DeliveryError::Config("smtp.timeout_secs must be > 0".into()));
        }
        self.sender()?;
        Ok(())
    }

    /// The `From` mailbox.
    pub fn sender(&self) -> Result<Mailbox, DeliveryError> {
        let from = self.from.as_deref().unwrap_or(&self.username);
        from.trim()
            .parse::<Mailbox>()
            .map_err(|err| DeliveryError::Config(format!("smtp sender {from:?}: {err}")))
    }
}

/// Sends digests over SMTP with STARTTLS and login.
pub struct SmtpChannel {
    cfg: SmtpConfig,
    sender: Mailbox,
    transport: SmtpTransport,
}

impl std::fmt::Debug for SmtpChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpChannel")
            .field("cfg", &self.cfg)
            .field("sender", &self.sender.to_string())
            .finish_non_exhaustive()
    }
}

impl SmtpChannel {
    /// Builds the transport. Nothing is sent and no connection is opened.
    pub fn new(cfg: SmtpConfig) -> Result<Self, DeliveryError> {
        cfg.validate()?;
        let sender = cfg.sender()?;
        let transport = SmtpTransport::starttls_relay(&cfg.host)
            .map_err(|err| DeliveryError::Config(format!("smtp relay {}: {err}", cfg.host)))?
            .port(cfg.port)
            .credentials(Credentials::new(cfg.username.clone(), cfg.password.clone()))
            .timeout(Some(Duration::from_secs(cfg.timeout_secs)))
            .build();
        Ok(Self {
            cfg,
            sender,
            transport,
        })
    }
}

impl DeliveryChannel for SmtpChannel {
    fn name(&self) -> &str {
        "smtp"
    }

    fn send(&mut self, message: &OutboundMessage) -> Result<(), DeliveryError> {
        let email = smtp_message(&self.sender, message)?;
        let response = self
            .transport
            .send(&email)
            .map_err(|err| DeliveryError::Transport(err.to_string()))?;
        info!(
            owner_email = %message.owner.address,
            host = %self.cfg.host,
            code = %response.code(),
            "smtp_send_accepted"
        );
        Ok(())
    }
}

fn mailbox(recipient: &Recipient) -> Result<Mailbox, DeliveryError> {
    let address: Address = recipient
        .address
        .trim()
        .parse()
        .map_err(|err| DeliveryError::Message(format!("address {:?}: {err}", recipient.address)))?;
    Ok(Mailbox::new(recipient.name.clone(), address))
}

/// The MIME message for `message`: owner and manager as `To`, HTML body.
pub fn smtp_message(sender: &Mailbox, message: &OutboundMessage) -> Result<Message, DeliveryError> {
    let mut builder = Message::builder()
        .from(sender.clone())
        .subject(message.subject.clone())
        .header(ContentType::TEXT_HTML);
    for recipient in message.recipients() {
        builder = builder.to(mailbox(recipient)?);
    }
    builder
        .body(message.html.clone())
        .map_err(|err| DeliveryError::Message(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.com".into(),
            port: DEFAULT_SMTP_PORT,
            username: "digests@example.com".into(),
            password: "hunter2".into(),
            from: None,
            timeout_secs: 5,
        }
    }

    fn message(owner: &str) -> OutboundMessage {
        OutboundMessage {
            owner: Recipient::new(owner, "Jana Sweid"),
            manager: Recipient::new("boss@example.com", "Abdo"),
            subject: "Follow-up".into(),
            html: "<p>hi</p>".into(),
        }
    }

    #[test]
    fn message_addresses_owner_and_manager_as_html() {
        let sender = config().sender().expect("sender");
        let email = smtp_message(&sender, &message("JSweid@example.com")).expect("builds");

        let envelope = email.envelope();
        let to: Vec<String> = envelope.to().iter().map(ToString::to_string).collect();
        assert_eq!(to, ["JSweid@example.com", "boss@example.com"]);
        assert_eq!(
            envelope.from().map(ToString::to_string).as_deref(),
            Some("digests@example.com")
        );

        let raw = String::from_utf8(email.formatted()).expect("utf-8");
        assert!(raw.contains("Content-Type: text/html; charset=utf-8"));
        assert!(raw.contains("Subject: Follow-up"));
        assert!(raw.contains("JSweid@example.com"));
        assert!(raw.contains("boss@example.com"));
    }

    #[test]
    fn invalid_owner_address_is_a_message_error() {
        let sender = config().sender().expect("sender");
        assert!(matches!(
            smtp_message(&sender, &message("not an address")),
            Err(DeliveryError::Message(_))
        ));
    }

    #[test]
    fn explicit_from_overrides_username() {
        let cfg = SmtpConfig {
            from: Some("Case Digests <noreply@example.com>".into()),
            ..config()
        };
        assert_eq!(cfg.sender().expect("sender").email.to_string(), "noreply@example.com");
    }

    #[test]
    fn blank_password_is_rejected() {
        let cfg = SmtpConfig {
            password: "".into(),
            ..config()
        };
        assert!(matches!(
            SmtpChannel::new(cfg),
            Err(DeliveryError::Config(message)) if message.contains("password")
        ));
    }

    #[test]
    fn channel_builds_without_connecting() {
        let channel = SmtpChannel::new(config()).expect("channel");
        assert_eq!(channel.name(), "smtp");
        let rendered = format!("{channel:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("hunter2"));
    }
}
