//! Error type shared by the authenticator and the team API client.

use crate::types::DropboxApiError;
use thiserror::Error;

/// Every failure surfaced by this crate.
///
/// Nothing is retried internally: a variant reaching the caller describes the
/// single request (or precondition check) that failed.
#[derive(Debug, Error)]
pub enum DropboxError {
    /// A caller-supplied value violates a precondition. Raised before any I/O.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation needs a prior step that has not happened yet.
    #[error("illegal state: {0}")]
    IllegalState(String),

    /// Dropbox answered with a non-2xx status.
    #[error("Dropbox API error (status {status}): {body}")]
    Remote { status: u16, body: String },

    /// Success status but no body where one was required.
    #[error("empty response body")]
    EmptyResponse,

    /// The body was present but did not match the expected JSON shape.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Connect/read failure or timeout in the HTTP layer.
    #[error("HTTP transport error: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, DropboxError>;

impl DropboxError {
    /// HTTP status of a [`DropboxError::Remote`] failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            DropboxError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// `error_summary` from Dropbox's JSON error envelope, if the remote body
    /// carried one.
    pub fn error_summary(&self) -> Option<String> {
        match self {
            DropboxError::Remote { body, .. } => serde_json::from_str::<DropboxApiError>(body)
                .ok()
                .and_then(|e| e.error_summary),
            _ => None,
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        DropboxError::InvalidArgument(msg.into())
    }

    pub(crate) fn illegal_state(msg: impl Into<String>) -> Self {
        DropboxError::IllegalState(msg.into())
    }
}

impl From<reqwest::Error> for DropboxError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DropboxError::Transport(format!("request timed out: {err}"))
        } else if err.is_connect() {
            DropboxError::Transport(format!("connection failed: {err}"))
        } else {
            DropboxError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DropboxError {
    fn from(err: serde_json::Error) -> Self {
        DropboxError::Decode(err.to_string())
    }
}
