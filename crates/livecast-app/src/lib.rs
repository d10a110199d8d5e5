//! Livecast application runtime
//!
//! Drives a [`livecast_core::Controller`] against a remote [`Store`]: fires
//! poll ticks while the controller asks for them, runs fetches and writes as
//! independent tasks, and feeds their outcomes back in arrival order.
//!
//! # Architecture
//!
//! ```text
//! SessionHandle ──Command──► Runtime ──Fetch/Write──► Store (spawned task)
//!       ▲                       │  ▲                        │
//!       │ view / alerts         │  └───ControllerEvent──────┘
//!       └───────────────────────┘
//! ```
//!
//! The controller itself never awaits. All I/O happens in tasks spawned by
//! [`Runtime`], so a slow response never blocks user input.
//!
//! # Features
//!
//! - `transport`: [`transport::HttpStore`], a `reqwest` implementation of
//!   [`Store`]

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
mod handle;
mod runtime;
mod store;
#[cfg(feature = "transport")]
pub mod transport;

pub use error::RuntimeError;
pub use handle::{Command, SessionHandle, StopHandle, Update};
pub use runtime::{DEFAULT_POLL_INTERVAL, Runtime, RuntimeConfig};
pub use store::Store;
