//! The seam between digest dispatch and an actual mail transport.
use serde::{Deserialize, Serialize};

use crate::error::DeliveryError;
use crate::render::{Draft, ManagerIdentity};

/// One addressee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub address: String,
    pub name: Option<String>,
}

impl Recipient {
    pub fn new(address: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            address: address.into(),
            name: (!name.trim().is_empty()).then_some(name),
        }
    }
}

/// A digest ready to send: the owner plus the manager as co-recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub owner: Recipient,
    pub manager: Recipient,
    pub subject: String,
    pub html: String,
}

impl OutboundMessage {
    pub fn for_draft(draft: &Draft, manager: &ManagerIdentity) -> Self {
        Self {
            owner: Recipient::new(&draft.owner_email, &draft.owner_name),
            manager: Recipient::new(&manager.email, &manager.name),
            subject: draft.subject.clone(),
            html: draft.html.clone(),
        }
    }

    /// Both primary recipients, owner first.
    pub fn recipients(&self) -> [&Recipient; 2] {
        [&self.owner, &self.manager]
    }
}

/// A mail transport.
///
/// `send` is called once per owner. Errors are turned into a per-owner
/// status by the dispatcher and never stop the batch.
pub trait DeliveryChannel {
    /// Short name for logs, e.g. `graph`.
    fn name(&self) -> &str;

    fn send(&mut self, message: &OutboundMessage) -> Result<(), DeliveryError>;
}

impl<C: DeliveryChannel + ?Sized> DeliveryChannel for Box<C> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn send(&mut self, message: &OutboundMessage) -> Result<(), DeliveryError> {
        (**self).send(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_addresses_owner_and_manager() {
        let draft = Draft {
            owner_email: "JSweid@example.com".into(),
            owner_name: "Jana Sweid".into(),
            subject: "s".into(),
            html: "<p/>".into(),
            path: None,
        };
        let message = OutboundMessage::for_draft(&draft, &ManagerIdentity::new("", "boss@example.com"));
        let [owner, manager] = message.recipients();
        assert_eq!(owner.address, "JSweid@example.com");
        assert_eq!(owner.name.as_deref(), Some("Jana Sweid"));
        assert_eq!(manager.address, "boss@example.com");
        assert_eq!(manager.name, None);
    }
}
