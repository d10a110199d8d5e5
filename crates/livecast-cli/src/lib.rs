//! Line-oriented client for a shared livecast slot
//!
//! A thin shell over [`livecast_app::Runtime`]: reads commands from stdin,
//! forwards them to the runtime, and reports view changes and alerts through
//! `tracing`. All reconciliation logic lives in [`livecast_core`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod commands;
pub mod error;
pub mod present;

pub use commands::{HELP, Input, parse_line};
pub use error::CliError;
pub use present::Presenter;
