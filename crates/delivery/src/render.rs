//! Digest rendering.
//!
//! The follow-up template is embedded at compile time so the binary has no
//! runtime template directory to ship. HTML auto-escaping is always on: case
//! titles come straight from the CRM and may contain markup.
use std::path::PathBuf;

use chrono::NaiveDate;
use grouper::DigestSummary;
use minijinja::{context, AutoEscape, Environment};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::DeliveryError;

const TEMPLATE_NAME: &str = "followup_email.html";
const TEMPLATE_SOURCE: &str = include_str!("../templates/followup_email.html");

/// `today` as it appears in the subject line and body, e.g. `30 April 2024`.
pub const TODAY_FORMAT: &str = "%d %B %Y";

/// Subject prefix shared by every digest.
pub const SUBJECT_PREFIX: &str = "Action Required: Follow-Up on Your Top Aged Cases";

/// The manager named in every digest and copied on every delivery.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerIdentity {
    pub name: String,
    pub email: String,
}

impl ManagerIdentity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// A rendered digest for one owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    pub owner_email: String,
    pub owner_name: String,
    pub subject: String,
    pub html: String,
    /// Where the draft was written, once saved.
    pub path: Option<PathBuf>,
}

/// Renders [`DigestSummary`] values into [`Draft`]s.
#[derive(Debug)]
pub struct DigestRenderer {
    env: Environment<'static>,
    manager: ManagerIdentity,
    today: String,
}

impl DigestRenderer {
    pub fn new(manager: ManagerIdentity, today: NaiveDate) -> Result<Self, DeliveryError> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        env.add_template(TEMPLATE_NAME, TEMPLATE_SOURCE)?;

        Ok(Self {
            env,
            manager,
            today: today.format(TODAY_FORMAT).to_string(),
        })
    }

    /// Subject line for this run.
    pub fn subject(&self) -> String {
        format!("{SUBJECT_PREFIX} – {}", self.today)
    }

    pub fn manager(&self) -> &ManagerIdentity {
        &self.manager
    }

    pub fn render(&self, summary: &DigestSummary) -> Result<Draft, DeliveryError> {
        let template = self.env.get_template(TEMPLATE_NAME)?;
        let html = template.render(context! {
            owner_name => &summary.owner_name,
            top3 => &summary.top_n,
            total_cases => summary.total_cases,
            manager_name => &self.manager.name,
            manager_email => &self.manager.email,
            today => &self.today,
        })?;

        debug!(
            owner_email = %summary.owner_email,
            cases = summary.top_n.len(),
            bytes = html.len(),
            "digest_rendered"
        );

        Ok(Draft {
            owner_email: summary.owner_email.clone(),
            owner_name: summary.owner_name.clone(),
            subject: self.subject(),
            html,
            path: None,
        })
    }
}
