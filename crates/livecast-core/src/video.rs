//! Video identifier extraction and embed URL derivation.
//!
//! A broadcast is addressed by whatever URL the streamer pasted. Viewers only
//! care about the 11-character video identifier buried in it, because two
//! different URL shapes for the same video must not restart playback.
//!
//! Recognised shapes, matched anywhere in the first line of input:
//!
//! - `youtu.be/<id>`
//! - `v/<id>`
//! - `u/<c>/<id>` (single word character between slashes)
//! - `embed/<id>`
//! - `watch?v=<id>`
//! - `&v=<id>`
//!
//! The identifier runs until the next `#`, `&` or `?`. When several markers
//! appear, the rightmost one wins.

use std::fmt;

/// Length of a valid video identifier, in characters.
pub const VIDEO_ID_LEN: usize = 11;

/// Query string appended to every embed URL: autoplay on, player chrome off.
const EMBED_QUERY: &str = "autoplay=1&controls=0&modestbranding=1&rel=0&showinfo=0";

/// Markers tried at each candidate position, in priority order.
const PREFIX_MARKERS: [&str; 5] = ["youtu.be/", "v/", "embed/", "watch?v=", "&v="];

/// Normalized 11-character video identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    /// Extract a video identifier from arbitrary user input.
    ///
    /// Returns `None` when no marker is present or the captured identifier is
    /// not exactly [`VIDEO_ID_LEN`] characters. Never fails otherwise.
    pub fn parse(input: &str) -> Option<Self> {
        let candidate = capture(input)?;
        (candidate.chars().count() == VIDEO_ID_LEN).then(|| Self(candidate.to_owned()))
    }

    /// Identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Playback URL with autoplay enabled and UI chrome suppressed.
    pub fn embed_url(&self) -> String {
        format!("https://www.youtube.com/embed/{}?{EMBED_QUERY}", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the embed URL for raw input, or an empty string on a non-match.
pub fn embed_url_for(input: &str) -> String {
    VideoId::parse(input).map(|id| id.embed_url()).unwrap_or_default()
}

/// Raw identifier text following the rightmost marker, before length checks.
fn capture(input: &str) -> Option<&str> {
    let first_line_end = input.find(['\n', '\r', '\u{2028}', '\u{2029}']).unwrap_or(input.len());

    let (start, marker_len) = input[..first_line_end]
        .char_indices()
        .rev()
        .find_map(|(idx, _)| marker_at(&input[idx..first_line_end]).map(|len| (idx, len)))?;

    let rest = &input[start + marker_len..];
    let end = rest.find(['#', '&', '?']).unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Length of the marker starting at the beginning of `text`, if any.
fn marker_at(text: &str) -> Option<usize> {
    if let Some(len) = PREFIX_MARKERS
        .iter()
        .find(|marker| text.starts_with(**marker))
        .map(|marker| marker.len())
    {
        return Some(len);
    }

    // `u/<word char>/`
    let bytes = text.as_bytes();
    let is_user_marker = bytes.len() >= 4
        && bytes[0] == b'u'
        && bytes[1] == b'/'
        && (bytes[2].is_ascii_alphanumeric() || bytes[2] == b'_')
        && bytes[3] == b'/';
    is_user_marker.then_some(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_link() {
        let id = VideoId::parse("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert_eq!(id.as_str(), "dQw4w9WgXcQ");
    }

    #[test]
    fn watch_link_with_extra_params() {
        let id = VideoId::parse("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s").unwrap();
        assert_eq!(id.as_str(), "dQw4w9WgXcQ");
    }

    #[test]
    fn ampersand_v_param() {
        let id = VideoId::parse("https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ").unwrap();
        assert_eq!(id.as_str(), "dQw4w9WgXcQ");
    }

    #[test]
    fn embed_and_v_paths() {
        assert!(VideoId::parse("https://www.youtube.com/embed/dQw4w9WgXcQ?rel=0").is_some());
        assert!(VideoId::parse("https://www.youtube.com/v/dQw4w9WgXcQ").is_some());
    }

    #[test]
    fn user_path_needs_single_word_char() {
        let id = VideoId::parse("https://www.youtube.com/u/w/dQw4w9WgXcQ").unwrap();
        assert_eq!(id.as_str(), "dQw4w9WgXcQ");
    }

    #[test]
    fn live_path_is_not_a_marker() {
        assert!(VideoId::parse("https://www.youtube.com/live/dQw4w9WgXcQ").is_none());
    }

    #[test]
    fn rightmost_marker_wins() {
        let id = VideoId::parse("https://youtu.be/aaaaaaaaaaa?x=1&v=bbbbbbbbbbb").unwrap();
        assert_eq!(id.as_str(), "bbbbbbbbbbb");
    }

    #[test]
    fn wrong_length_rejected() {
        assert!(VideoId::parse("https://youtu.be/short").is_none());
        assert!(VideoId::parse("https://youtu.be/dQw4w9WgXcQX").is_none());
    }

    #[test]
    fn no_marker_rejected() {
        assert!(VideoId::parse("https://example.com").is_none());
        assert!(VideoId::parse("").is_none());
        assert!(VideoId::parse("dQw4w9WgXcQ").is_none());
    }

    #[test]
    fn marker_on_second_line_ignored() {
        assert!(VideoId::parse("hello\nhttps://youtu.be/dQw4w9WgXcQ").is_none());
    }

    #[test]
    fn embed_url_shape() {
        let url = embed_url_for("https://youtu.be/dQw4w9WgXcQ");
        assert!(url.starts_with("https://www.youtube.com/embed/dQw4w9WgXcQ?"));
        assert!(url.contains("autoplay=1"));
        assert!(url.contains("controls=0"));
    }

    #[test]
    fn embed_url_empty_on_non_match() {
        assert_eq!(embed_url_for("https://example.com"), "");
    }
}
