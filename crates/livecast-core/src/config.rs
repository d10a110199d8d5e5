//! Controller configuration.

/// Title used when the viewer never set one.
pub const DEFAULT_STREAM_TITLE: &str = "Live Stream";

/// Tunables for [`crate::Controller`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Initial stream title for slot claims.
    pub stream_title: String,

    /// Maximum consecutive `start_stream` re-assertions while the server
    /// reports the owner's slot as ended. `None` retries on every tick for as
    /// long as the divergence lasts.
    pub reassert_limit: Option<u32>,

    /// Poll even when no embed URL is active, so an idle viewer discovers a
    /// live slot without entering a URL first.
    pub poll_while_idle: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            stream_title: DEFAULT_STREAM_TITLE.to_owned(),
            reassert_limit: None,
            poll_while_idle: false,
        }
    }
}
