//! Turns session renders into log lines.
//!
//! Renders arrive as whole sessions. [`Presenter`] diffs each one against the
//! previous and reports only what changed.

use livecast_core::{ChatMessage, LocalSession};

/// Diffs consecutive renders.
#[derive(Debug, Default)]
pub struct Presenter {
    last: LocalSession,
}

impl Presenter {
    /// Create a presenter that treats the empty session as already shown.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines describing what changed since the previous render.
    pub fn present(&mut self, session: &LocalSession) -> Vec<String> {
        let mut lines = Vec::new();
        let last = &self.last;

        if session.is_broadcasting != last.is_broadcasting
            || session.is_owner != last.is_owner
            || session.active_embed_url != last.active_embed_url
        {
            lines.push(status(session));
        }

        if session.displayed_view_count != last.displayed_view_count
            || session.displayed_like_count != last.displayed_like_count
            || session.like_count_provisional != last.like_count_provisional
        {
            lines.push(counts(session));
        }

        if session.viewer_id != last.viewer_id {
            lines.push(match &session.viewer_id {
                Some(id) => format!("connected as {id}"),
                None => "disconnected".to_owned(),
            });
        }

        if session.stream_title != last.stream_title {
            lines.push(format!("title: {}", session.stream_title));
        }

        if session.ui != last.ui {
            let ui = &session.ui;
            lines.push(format!(
                "player: quality {}, fullscreen {}, controls {}",
                ui.quality,
                on_off(ui.fullscreen),
                on_off(ui.controls_visible)
            ));
        }

        lines.extend(new_chat(&last.chat_history, &session.chat_history));

        self.last = session.clone();
        lines
    }
}

/// One-line playback status.
pub fn status(session: &LocalSession) -> String {
    match (session.is_broadcasting, session.is_owner, session.active_embed_url.is_empty()) {
        (true, true, _) => format!("LIVE (you) {}", session.active_embed_url),
        (true, false, _) => format!("LIVE {}", session.active_embed_url),
        (false, _, false) => format!("preview {}", session.active_embed_url),
        (false, _, true) => "idle".to_owned(),
    }
}

/// View and like counters. Unconfirmed likes are marked with `*`.
pub fn counts(session: &LocalSession) -> String {
    let marker = if session.like_count_provisional { "*" } else { "" };
    format!(
        "views {} likes {}{marker}",
        session.displayed_view_count, session.displayed_like_count
    )
}

/// Chat lines in `next` that extend `prev`. A history that does not extend
/// the previous one is shown in full.
fn new_chat(prev: &[ChatMessage], next: &[ChatMessage]) -> Vec<String> {
    let fresh = if next.starts_with(prev) { &next[prev.len()..] } else { next };
    fresh.iter().map(|m| format!("<{}> {}", m.author, m.text)).collect()
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}
