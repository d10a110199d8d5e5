//! Runtime errors.

use thiserror::Error;

/// Errors surfaced to holders of a [`crate::SessionHandle`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuntimeError {
    /// The runtime task has exited; commands can no longer be delivered.
    #[error("session runtime stopped")]
    Stopped,

    /// The store could not be constructed.
    #[error("store setup failed: {0}")]
    StoreSetup(String),
}
