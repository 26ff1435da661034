//! Case Delivery Layer
//!
//! Everything that happens to a digest after grouping: render it to HTML,
//! keep a draft on disk, and optionally send it.
//!
//! ## Pieces
//!
//! | Type | Job |
//! |------|-----|
//! | [`DigestRenderer`] | `DigestSummary` → [`Draft`] via the embedded minijinja template |
//! | [`DraftStore`] | writes `<dir>/<owner email, made file-safe>.html` |
//! | [`DeliveryChannel`] | transport seam; `GraphChannel` and `SmtpChannel` ship behind features |
//! | [`dispatch`] | one attempt per draft, failures isolated per owner |
//! | [`SendLog`] | append-only CSV of every attempt |
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use delivery::{DigestRenderer, ManagerIdentity};
//! use grouper::DigestSummary;
//!
//! let today = NaiveDate::from_ymd_opt(2024, 4, 30).expect("valid date");
//! let renderer = DigestRenderer::new(ManagerIdentity::new("Abdo", "boss@example.com"), today)
//!     .expect("template compiles");
//!
//! let draft = renderer
//!     .render(&DigestSummary {
//!         owner_name: "Jana Sweid".into(),
//!         owner_email: "JSweid@example.com".into(),
//!         total_cases: 0,
//!         top_n: Vec::new(),
//!     })
//!     .expect("renders");
//! assert!(draft.subject.ends_with("30 April 2024"));
//! ```
mod channel;
mod dispatch;
mod drafts;
mod error;
#[cfg(feature = "graph")]
mod graph;
mod render;
mod sendlog;
#[cfg(feature = "smtp")]
mod smtp;

pub use crate::channel::{DeliveryChannel, OutboundMessage, Recipient};
pub use crate::dispatch::{dispatch, DeliveryReport, DeliveryStatus};
pub use crate::drafts::{draft_filename, DraftStore};
pub use crate::error::DeliveryError;
#[cfg(feature = "graph")]
pub use crate::graph::{send_mail_payload, GraphChannel, GraphConfig, DEFAULT_AUTHORITY, DEFAULT_GRAPH_URL};
pub use crate::render::{DigestRenderer, Draft, ManagerIdentity, SUBJECT_PREFIX, TODAY_FORMAT};
pub use crate::sendlog::{SendLog, SendLogEntry};
#[cfg(feature = "smtp")]
pub use crate::smtp::{smtp_message, SmtpChannel, SmtpConfig, DEFAULT_SMTP_HOST, DEFAULT_SMTP_PORT};
