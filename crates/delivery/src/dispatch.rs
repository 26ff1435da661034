//! Per-owner delivery with failure isolation.
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn, Level};

use crate::channel::{DeliveryChannel, OutboundMessage};
use crate::render::{Draft, ManagerIdentity};

/// Outcome of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryStatus {
    Sent,
    Failed(String),
}

impl DeliveryStatus {
    pub fn is_sent(&self) -> bool {
        matches!(self, DeliveryStatus::Sent)
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryStatus::Sent => f.write_str("SENT"),
            DeliveryStatus::Failed(reason) => write!(f, "FAILED: {reason}"),
        }
    }
}

/// One row of the run's delivery results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReport {
    pub owner_email: String,
    pub owner_name: String,
    pub subject: String,
    pub status: DeliveryStatus,
}

/// Send every draft through `channel`, in order.
///
/// A failure is recorded against its owner and the batch moves on; this
/// function never returns early.
pub fn dispatch(
    drafts: &[Draft],
    channel: &mut dyn DeliveryChannel,
    manager: &ManagerIdentity,
) -> Vec<DeliveryReport> {
    let span = tracing::span!(
        Level::INFO,
        "delivery.dispatch",
        channel = channel.name(),
        drafts = drafts.len()
    );
    let _guard = span.enter();

    drafts
        .iter()
        .map(|draft| {
            let message = OutboundMessage::for_draft(draft, manager);
            let status = match channel.send(&message) {
                Ok(()) => {
                    info!(owner_email = %draft.owner_email, "delivery_success");
                    DeliveryStatus::Sent
                }
                Err(err) => {
                    warn!(owner_email = %draft.owner_email, error = %err, "delivery_failure");
                    DeliveryStatus::Failed(err.to_string())
                }
            };
            DeliveryReport {
                owner_email: draft.owner_email.clone(),
                owner_name: draft.owner_name.clone(),
                subject: draft.subject.clone(),
                status,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeliveryError;

    /// Records every message and fails for one address.
    struct FlakyChannel {
        fail_for: &'static str,
        sent: Vec<OutboundMessage>,
    }

    impl DeliveryChannel for FlakyChannel {
        fn name(&self) -> &str {
            "flaky"
        }

        fn send(&mut self, message: &OutboundMessage) -> Result<(), DeliveryError> {
            self.sent.push(message.clone());
            if message.owner.address == self.fail_for {
                Err(DeliveryError::Transport("connection reset".into()))
            } else {
                Ok(())
            }
        }
    }

    fn draft(email: &str) -> Draft {
        Draft {
            owner_email: email.into(),
            owner_name: "Owner".into(),
            subject: "subject".into(),
            html: "<p/>".into(),
            path: None,
        }
    }

    #[test]
    fn one_failure_does_not_stop_the_batch() {
        let drafts = vec![draft("a@x.com"), draft("b@x.com"), draft("c@x.com")];
        let mut channel = FlakyChannel {
            fail_for: "b@x.com",
            sent: Vec::new(),
        };
        let reports = dispatch(
            &drafts,
            &mut channel,
            &ManagerIdentity::new("Abdo", "boss@x.com"),
        );

        let statuses: Vec<String> = reports.iter().map(|r| r.status.to_string()).collect();
        assert_eq!(
            statuses,
            vec![
                "SENT",
                "FAILED: transport error: connection reset",
                "SENT"
            ]
        );
        assert_eq!(channel.sent.len(), 3);
        assert!(channel
            .sent
            .iter()
            .all(|m| m.manager.address == "boss@x.com"));
    }

    #[test]
    fn reports_follow_draft_order() {
        let drafts = vec![draft("z@x.com"), draft("a@x.com")];
        let mut channel = FlakyChannel {
            fail_for: "",
            sent: Vec::new(),
        };
        let reports = dispatch(&drafts, &mut channel, &ManagerIdentity::default());
        let owners: Vec<&str> = reports.iter().map(|r| r.owner_email.as_str()).collect();
        assert_eq!(owners, vec!["z@x.com", "a@x.com"]);
        assert!(reports.iter().all(|r| r.status.is_sent()));
    }
}
