//! Livecast core
//!
//! Client-side reconciliation for a single shared live broadcast slot: one
//! video designated as the current stream, with view/like counters and a chat
//! feed, kept in sync across independent viewers by polling a shared store.
//!
//! # Architecture
//!
//! Sans-IO and action-based. The [`Controller`] receives user intents through
//! its entry-point methods and remote outcomes as [`ControllerEvent`]s, and
//! returns [`ControllerAction`]s for the caller to execute. Timers, HTTP and
//! rendering all live outside this crate.
//!
//! # Components
//!
//! - [`Controller`]: Reconciliation state machine owning the session
//! - [`LocalSession`]: Per-viewer state the view layer renders
//! - [`RemoteSnapshot`], [`StoreRequest`]: Remote store wire format
//! - [`VideoId`]: URL parsing and embed URL derivation

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod controller;
mod error;
mod event;
mod session;
pub mod video;
mod wire;

pub use config::{ControllerConfig, DEFAULT_STREAM_TITLE};
pub use controller::Controller;
pub use error::{ActionError, StoreError};
pub use event::{Alert, ControllerAction, ControllerEvent, StoreWrite, WritePurpose};
pub use session::{LocalSession, Quality, UiState};
pub use video::VideoId;
pub use wire::{ChatMessage, CurrentStream, RemoteSnapshot, StoreRequest, WriteReply};
