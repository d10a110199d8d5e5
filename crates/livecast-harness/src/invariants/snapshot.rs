//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture every viewer and the store's slot at one point in time,
//! so invariants see a consistent picture.

use livecast_core::CurrentStream;
use serde::Serialize;

use crate::{SimStore, SimViewer};

/// Snapshot of the entire system state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SystemSnapshot {
    /// Per-viewer state snapshots.
    pub viewers: Vec<ViewerSnapshot>,
    /// Stream record held by the store, live or not.
    pub slot: Option<CurrentStream>,
}

impl SystemSnapshot {
    /// Create an empty snapshot (no viewers, no slot).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Capture viewers and the store they share.
    pub fn capture(viewers: &[SimViewer], store: &SimStore) -> Self {
        Self {
            viewers: viewers.iter().map(SimViewer::snapshot).collect(),
            slot: store.current_stream(),
        }
    }

    /// Add a viewer snapshot.
    pub fn add_viewer(&mut self, viewer: ViewerSnapshot) {
        self.viewers.push(viewer);
    }

    /// Set the slot record.
    pub fn with_slot(mut self, slot: Option<CurrentStream>) -> Self {
        self.slot = slot;
        self
    }

    /// The slot if it is live.
    pub fn live_slot(&self) -> Option<&CurrentStream> {
        self.slot.as_ref().filter(|s| s.is_live)
    }
}

/// Snapshot of a single viewer's observable state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ViewerSnapshot {
    /// Viewer id.
    pub id: String,
    /// Viewer believes it owns the slot.
    pub is_owner: bool,
    /// Viewer shows the slot as live.
    pub is_broadcasting: bool,
    /// Raw URL input.
    pub requested_url: String,
    /// Embed URL being played.
    pub active_embed_url: String,
    /// Poll loop running.
    pub polling: bool,
    /// Like flag after every processed batch of actions.
    #[serde(skip)]
    pub like_history: Vec<bool>,
}

impl ViewerSnapshot {
    /// Create a viewer snapshot.
    pub fn new(id: &str) -> Self {
        Self { id: id.to_owned(), ..Default::default() }
    }

    /// Mark as broadcasting owner of `url`.
    pub fn broadcasting(mut self, url: &str, embed_url: &str, is_owner: bool) -> Self {
        self.is_broadcasting = true;
        self.is_owner = is_owner;
        url.clone_into(&mut self.requested_url);
        embed_url.clone_into(&mut self.active_embed_url);
        self.polling = true;
        self
    }

    /// Set like history.
    pub fn with_like_history(mut self, history: impl IntoIterator<Item = bool>) -> Self {
        self.like_history = history.into_iter().collect();
        self
    }
}
