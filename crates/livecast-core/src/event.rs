//! Controller events and actions.

use std::fmt;

use crate::{
    error::{ActionError, StoreError},
    wire::{RemoteSnapshot, StoreRequest, WriteReply},
};

/// Why a write was issued. Routes the completion back to the right handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WritePurpose {
    /// First appearance of an embed URL in this session.
    ViewJoin {
        /// Embed URL the view was registered for.
        embed_url: String,
    },
    /// Optimistic like.
    Like,
    /// Chat line.
    Chat,
    /// User-initiated claim of the slot. Failure rolls back.
    BeginBroadcast {
        /// Attempt number; stale failures are ignored.
        attempt: u64,
    },
    /// Owner restoring a slot the server lost. Failure is logged only.
    Reassert,
    /// User-initiated release of the slot. Best effort.
    EndBroadcast,
}

/// A write to the remote store plus the reason it was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreWrite {
    /// Request body.
    pub request: StoreRequest,
    /// Completion routing.
    pub purpose: WritePurpose,
}

/// One-time user notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    /// An action was refused before any state change.
    Rejected(ActionError),
    /// Claiming the slot failed; local state was rolled back.
    BroadcastFailed {
        /// Server or transport message.
        reason: String,
    },
    /// The owner gave up restoring a slot the server keeps reporting as ended.
    ReassertAbandoned {
        /// Consecutive re-assertions issued before giving up.
        attempts: u32,
    },
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected(err) => write!(f, "{err}"),
            Self::BroadcastFailed { reason } => write!(f, "failed to start broadcast: {reason}"),
            Self::ReassertAbandoned { attempts } => {
                write!(f, "server stopped tracking the broadcast after {attempts} recovery attempts")
            },
        }
    }
}

/// Events the caller feeds into the controller.
///
/// The caller is responsible for:
/// - Firing [`ControllerEvent::Tick`] on the poll interval while polling
/// - Executing fetches and writes, then reporting their outcomes
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    /// Poll interval elapsed.
    Tick,

    /// A fetch completed.
    SnapshotFetched {
        /// Generation the fetch was issued under.
        generation: u64,
        /// Decoded state blob.
        snapshot: RemoteSnapshot,
    },

    /// A fetch failed.
    FetchFailed {
        /// Generation the fetch was issued under.
        generation: u64,
        /// What went wrong.
        error: StoreError,
    },

    /// A write was acknowledged.
    WriteSucceeded {
        /// The write as issued.
        write: StoreWrite,
        /// Decoded reply.
        reply: WriteReply,
    },

    /// A write failed or was rejected.
    WriteFailed {
        /// The write as issued.
        write: StoreWrite,
        /// What went wrong.
        error: StoreError,
    },
}

/// Actions the controller produces for the caller to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerAction {
    /// Read the remote snapshot and report back with the same generation.
    Fetch {
        /// Current poll generation.
        generation: u64,
    },

    /// Send a write. Completion is reported back, but the caller must not
    /// block user input on it.
    Write(StoreWrite),

    /// Begin firing ticks on the poll interval.
    StartPolling,

    /// Stop firing ticks.
    StopPolling,

    /// Show a blocking notification.
    Alert(Alert),

    /// Session state changed; re-render the view.
    Render,
}
