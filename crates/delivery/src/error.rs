//! Error types for rendering, draft storage and delivery.
//!
//! | Error | Raised by | Fatal for the run? |
//! |-------|-----------|--------------------|
//! | [`Render`](DeliveryError::Render) | renderer | yes |
//! | [`Io`](DeliveryError::Io) | draft store, send log | yes |
//! | [`Config`](DeliveryError::Config) | channel construction | yes |
//! | [`Message`](DeliveryError::Message) | SMTP channel, bad address | no, becomes a per-owner status |
//! | [`Transport`](DeliveryError::Transport) | channel | no, becomes a per-owner status |
//! | [`Rejected`](DeliveryError::Rejected) | channel | no, becomes a per-owner status |
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DeliveryError {
    /// The template failed to compile or render.
    #[error("template error: {0}")]
    Render(String),

    /// A draft or the send log could not be written or read.
    #[error("i/o error on {}: {message}", .path.display())]
    Io { path: PathBuf, message: String },

    /// The request never got a response (connect, TLS, timeout, decode).
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The outgoing message could not be assembled, e.g. an invalid address.
    #[error("could not build message: {0}")]
    Message(String),

    /// A channel was constructed from incomplete settings.
    #[error("invalid delivery configuration: {0}")]
    Config(String),
}

impl DeliveryError {
    pub(crate) fn io(path: &Path, err: impl std::fmt::Display) -> Self {
        DeliveryError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

impl From<minijinja::Error> for DeliveryError {
    fn from(err: minijinja::Error) -> Self {
        DeliveryError::Render(err.to_string())
    }
}
