//! Local session state and its read-only projection.
//!
//! [`LocalSession`] is owned exclusively by the [`crate::Controller`]. The
//! view layer only ever gets a shared reference or a cloned snapshot.

use std::fmt;

use crate::wire::ChatMessage;

/// Player quality label chosen by the viewer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Quality {
    /// Let the player decide.
    #[default]
    Auto,
    /// 1080p.
    Hd1080,
    /// 720p.
    Hd720,
    /// 480p.
    Sd480,
    /// 360p.
    Sd360,
}

impl Quality {
    /// Label shown in the quality picker.
    pub fn label(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Hd1080 => "1080p",
            Self::Hd720 => "720p",
            Self::Sd480 => "480p",
            Self::Sd360 => "360p",
        }
    }

    /// Parse a picker label.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "auto" => Some(Self::Auto),
            "1080p" => Some(Self::Hd1080),
            "720p" => Some(Self::Hd720),
            "480p" => Some(Self::Sd480),
            "360p" => Some(Self::Sd360),
            _ => None,
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Player chrome state. Purely local, never synced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    /// Player is fullscreen.
    pub fullscreen: bool,
    /// Overlay controls are shown.
    pub controls_visible: bool,
    /// Selected quality label.
    pub quality: Quality,
}

impl Default for UiState {
    fn default() -> Self {
        Self { fullscreen: false, controls_visible: true, quality: Quality::Auto }
    }
}

/// Mutable state of one viewer session.
///
/// Created empty at session start and discarded on navigation away.
///
/// # Invariants
///
/// - `is_broadcasting` implies `active_embed_url` is non-empty.
/// - `has_liked_this_slot` only ever goes from `false` to `true`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools, reason = "flags mirror independent view state")]
pub struct LocalSession {
    /// Raw URL text last entered or adopted.
    pub requested_url: String,
    /// Derived playback URL. Empty means "awaiting input".
    pub active_embed_url: String,
    /// Local belief that the slot is live.
    pub is_broadcasting: bool,
    /// This viewer owns the live slot.
    pub is_owner: bool,
    /// Wallet address. `None` until the wallet is connected.
    pub viewer_id: Option<String>,
    /// This viewer already liked the current slot.
    pub has_liked_this_slot: bool,
    /// View counter shown to the user.
    pub displayed_view_count: u64,
    /// Like counter shown to the user.
    pub displayed_like_count: u64,
    /// `displayed_like_count` includes an unconfirmed local bump.
    pub like_count_provisional: bool,
    /// Chat lines in server order.
    pub chat_history: Vec<ChatMessage>,
    /// Text in the chat compose field.
    pub compose: String,
    /// Title used when claiming the slot.
    pub stream_title: String,
    /// Player chrome.
    pub ui: UiState,
}
