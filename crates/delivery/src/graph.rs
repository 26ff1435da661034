//! Microsoft Graph `sendMail` channel.
//!
//! ```text
//! POST {authority}/{tenant}/oauth2/v2.0/token      (client_credentials, once)
//!        │ access_token
//!        ▼
//! POST {graph}/v1.0/users/{sender}/sendMail        (per owner, bearer auth)
//! ```
//!
//! The token is fetched on first send and reused for the life of the channel.
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::channel::{DeliveryChannel, OutboundMessage, Recipient};
use crate::error::DeliveryError;

pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";
pub const DEFAULT_GRAPH_URL: &str = "https://graph.microsoft.com";
const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

fn default_timeout_secs() -> u64 {
    30
}

fn default_authority() -> String {
    DEFAULT_AUTHORITY.to_string()
}

fn default_graph_url() -> String {
    DEFAULT_GRAPH_URL.to_string()
}

/// App-registration settings for the Graph channel.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    /// Mailbox the digests are sent from.
    pub sender: String,
    /// Per-request timeout. Default: 30
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Identity endpoint base. Default: [`DEFAULT_AUTHORITY`]
    #[serde(default = "default_authority")]
    pub authority: String,
    /// Graph API base. Default: [`DEFAULT_GRAPH_URL`]
    #[serde(default = "default_graph_url")]
    pub graph_url: String,
}

impl std::fmt::Debug for GraphConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphConfig")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("sender", &self.sender)
            .field("timeout_secs", &self.timeout_secs)
            .field("authority", &self.authority)
            .field("graph_url", &self.graph_url)
            .finish()
    }
}

impl GraphConfig {
    pub fn validate(&self) -> Result<(), DeliveryError> {
        for (field, value) in [
            ("tenant_id", &self.tenant_id),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("sender", &self.sender),
        ] {
            if value.trim().is_empty() {
                return Err(DeliveryError::Config(format!("graph.{field} must not be empty")));
            }
        }
        if self.timeout_secs == 0 {
            return Err(DeliveryError::Config("graph.timeout_secs must be > 0".into()));
        }
        self.token_url()?;
        self.send_mail_url()?;
        Ok(())
    }

    fn token_url(&self) -> Result<Url, DeliveryError> {
        endpoint(&self.authority, [self.tenant_id.as_str(), "oauth2", "v2.0", "token"])
    }

    /// `{graph_url}/v1.0/users/{sender}/sendMail`, with `sender` as one
    /// percent-encoded path segment.
    pub fn send_mail_url(&self) -> Result<Url, DeliveryError> {
        endpoint(&self.graph_url, ["v1.0", "users", self.sender.as_str(), "sendMail"])
    }
}

fn endpoint<'a>(base: &str, segments: impl IntoIterator<Item = &'a str>) -> Result<Url, DeliveryError> {
    let mut url =
        Url::parse(base).map_err(|err| DeliveryError::Config(format!("invalid url {base:?}: {err}")))?;
    url.path_segments_mut()
        .map_err(|()| DeliveryError::Config(format!("url {base:?} cannot take a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Sends digests through the Graph API with a blocking HTTP client.
#[derive(Debug)]
pub struct GraphChannel {
    cfg: GraphConfig,
    client: Client,
    token: Option<String>,
}

impl GraphChannel {
    pub fn new(cfg: GraphConfig) -> Result<Self, DeliveryError> {
        cfg.validate()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|err| DeliveryError::Config(format!("http client: {err}")))?;
        Ok(Self {
            cfg,
            client,
            token: None,
        })
    }

    fn access_token(&mut self) -> Result<String, DeliveryError> {
        if let Some(token) = &self.token {
            return Ok(token.clone());
        }

        let response = self
            .client
            .post(self.cfg.token_url()?)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.cfg.client_id.as_str()),
                ("client_secret", self.cfg.client_secret.as_str()),
                ("scope", GRAPH_SCOPE),
            ])
            .send()
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response.json().map_err(transport)?;
        debug!(tenant_id = %self.cfg.tenant_id, "graph_token_acquired");
        self.token = Some(token.access_token.clone());
        Ok(token.access_token)
    }
}

impl DeliveryChannel for GraphChannel {
    fn name(&self) -> &str {
        "graph"
    }

    fn send(&mut self, message: &OutboundMessage) -> Result<(), DeliveryError> {
        let token = self.access_token()?;
        let response = self
            .client
            .post(self.cfg.send_mail_url()?)
            .bearer_auth(token)
            .json(&send_mail_payload(message))
            .send()
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!(owner_email = %message.owner.address, status = status.as_u16(), "graph_send_accepted");
        Ok(())
    }
}

fn transport(err: reqwest::Error) -> DeliveryError {
    DeliveryError::Transport(err.to_string())
}

fn email_address(recipient: &Recipient) -> Value {
    match &recipient.name {
        Some(name) => json!({ "emailAddress": { "address": recipient.address, "name": name } }),
        None => json!({ "emailAddress": { "address": recipient.address } }),
    }
}

/// Request body for `sendMail`: owner and manager both as `toRecipients`.
pub fn send_mail_payload(message: &OutboundMessage) -> Value {
    let to: Vec<Value> = message.recipients().into_iter().map(email_address).collect();
    json!({
        "message": {
            "subject": message.subject,
            "body": { "contentType": "HTML", "content": message.html },
            "toRecipients": to,
        },
        "saveToSentItems": true,
    })
}
