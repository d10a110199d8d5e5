//! Remote store wire format.
//!
//! The store is an opaque HTTP key-value holder for the single broadcast slot.
//! Reads return a [`RemoteSnapshot`]; writes are [`StoreRequest`]s tagged by
//! an `action` field. Field names are camelCase on the wire.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};

use crate::{error::StoreError, video::VideoId};

/// A single chat line.
///
/// Immutable once created. There is no id on the wire, so equality is full
/// tuple equality and ordering is the server's array order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Display name or wallet address of the sender.
    #[serde(rename = "user", alias = "author", default, deserialize_with = "null_as_default")]
    pub author: String,
    /// Message body.
    #[serde(rename = "message", alias = "text", default, deserialize_with = "null_as_default")]
    pub text: String,
    /// Send time in milliseconds since the Unix epoch.
    #[serde(
        rename = "timestamp",
        alias = "sentAtEpochMs",
        default,
        deserialize_with = "null_as_default"
    )]
    pub sent_at_epoch_ms: i64,
}

/// The global broadcast slot as the server sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentStream {
    /// URL the streamer submitted.
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    /// Human-readable title.
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// Identity of the viewer that started the slot.
    #[serde(
        rename = "streamerAddress",
        alias = "streamerId",
        default,
        deserialize_with = "null_as_default"
    )]
    pub streamer_id: String,
    /// Whether the slot is currently live.
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_live: bool,
}

impl CurrentStream {
    /// Video identifier extracted from [`CurrentStream::url`].
    pub fn video_id(&self) -> Option<VideoId> {
        VideoId::parse(&self.url)
    }
}

/// Full state blob returned by a poll read.
///
/// Fetched, never mutated locally. Every field is optional on the wire: an
/// absent field means "no information", not "reset to empty".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSnapshot {
    /// Authoritative view count.
    #[serde(default)]
    pub views: Option<u64>,
    /// Authoritative like count.
    #[serde(default)]
    pub likes: Option<u64>,
    /// Viewer identities that already liked the current slot.
    #[serde(
        rename = "likedBy",
        alias = "likedViewerIds",
        default,
        deserialize_with = "null_as_default"
    )]
    pub liked_viewer_ids: BTreeSet<String>,
    /// Chat history in server order.
    #[serde(default)]
    pub chat_history: Option<Vec<ChatMessage>>,
    /// The broadcast slot. `None` when absent or `null`.
    #[serde(default)]
    pub current_stream: Option<CurrentStream>,
}

/// Treat an explicit `null` like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl RemoteSnapshot {
    /// Decode a snapshot from a response body.
    pub fn from_json(body: &[u8]) -> Result<Self, StoreError> {
        serde_json::from_slice(body).map_err(|e| StoreError::Decode(e.to_string()))
    }
}

/// Write sent to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StoreRequest {
    /// Register one more viewer.
    View,

    /// Like the current slot.
    #[serde(rename_all = "camelCase")]
    Like {
        /// Viewer identity.
        user_address: String,
    },

    /// Post a chat line.
    #[serde(rename_all = "camelCase")]
    Chat {
        /// Message body.
        message: String,
        /// Viewer identity. Omitted for anonymous viewers.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_address: Option<String>,
    },

    /// Claim the broadcast slot (or re-assert a claim the server lost).
    #[serde(rename_all = "camelCase")]
    StartStream {
        /// Stream URL as the streamer entered it.
        url: String,
        /// Stream title.
        title: String,
        /// Streamer identity.
        user_address: String,
    },

    /// Release the broadcast slot.
    #[serde(rename_all = "camelCase")]
    EndStream {
        /// Streamer identity.
        user_address: String,
    },
}

impl StoreRequest {
    /// Wire name of the action, for logging.
    pub fn action(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Like { .. } => "like",
            Self::Chat { .. } => "chat",
            Self::StartStream { .. } => "start_stream",
            Self::EndStream { .. } => "end_stream",
        }
    }

    /// Encode the request body.
    pub fn to_json(&self) -> Result<Vec<u8>, StoreError> {
        serde_json::to_vec(self).map_err(|e| StoreError::Decode(e.to_string()))
    }

    /// Decode a successful (2xx) response body for this request.
    ///
    /// `start_stream` bodies carrying an `error` field are rejections. Other
    /// acknowledgements are not inspected beyond being valid JSON, and an
    /// empty body counts as a plain acknowledgement.
    pub fn decode_reply(&self, body: &[u8]) -> Result<WriteReply, StoreError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return match self {
                Self::View => Err(StoreError::Decode("empty view reply".into())),
                _ => Ok(WriteReply::Ack),
            };
        }

        match self {
            Self::View => {
                let reply: ViewReply =
                    serde_json::from_slice(body).map_err(|e| StoreError::Decode(e.to_string()))?;
                Ok(WriteReply::Views { success: reply.success, views: reply.views })
            },
            Self::StartStream { .. } => {
                let reply: ErrorReply =
                    serde_json::from_slice(body).map_err(|e| StoreError::Decode(e.to_string()))?;
                match reply.error {
                    Some(reason) => Err(StoreError::Rejected(reason)),
                    None => Ok(WriteReply::Ack),
                }
            },
            Self::Like { .. } | Self::Chat { .. } | Self::EndStream { .. } => {
                serde_json::from_slice::<serde_json::Value>(body)
                    .map_err(|e| StoreError::Decode(e.to_string()))?;
                Ok(WriteReply::Ack)
            },
        }
    }
}

/// Decoded reply to a [`StoreRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteReply {
    /// Plain acknowledgement.
    Ack,
    /// Reply to a `view` registration.
    Views {
        /// Whether the server counted the view.
        success: bool,
        /// Updated view count, when provided.
        views: Option<u64>,
    },
}

#[derive(Deserialize)]
struct ViewReply {
    #[serde(default, deserialize_with = "null_as_default")]
    success: bool,
    #[serde(default)]
    views: Option<u64>,
}

#[derive(Deserialize)]
struct ErrorReply {
    #[serde(default)]
    error: Option<String>,
}
