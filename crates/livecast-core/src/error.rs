//! Error types for the broadcast controller.
//!
//! Two layers: [`ActionError`] is the user-facing taxonomy for rejected
//! actions (surfaced as a blocking notification, never a state change), and
//! [`StoreError`] describes remote store failures, which are logged and
//! retried by the next poll tick.

use thiserror::Error;

/// A user action that was refused before any state change.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// No viewer identity is set.
    #[error("connect a wallet first")]
    Unauthenticated,

    /// Only the viewer that started the live slot may do this.
    #[error("only the current streamer can end this broadcast")]
    NotOwner,

    /// The requested URL does not contain a recognisable video identifier.
    #[error("not a valid YouTube URL: {input:?}")]
    InvalidUrl {
        /// Raw input the viewer entered.
        input: String,
    },
}

/// Remote store failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Request could not be sent or no response arrived.
    #[error("transport error: {0}")]
    Transport(String),

    /// Server answered with a non-success status.
    #[error("unexpected status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// Response body could not be decoded (or request body encoded).
    #[error("decode error: {0}")]
    Decode(String),

    /// Server accepted the request but refused it with an `error` field.
    #[error("{0}")]
    Rejected(String),
}

impl StoreError {
    /// Returns true if retrying the same request may succeed.
    ///
    /// Explicit rejections and malformed bodies will repeat; transport
    /// failures and server-side errors may not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Decode(_) | Self::Rejected(_) => false,
        }
    }
}
