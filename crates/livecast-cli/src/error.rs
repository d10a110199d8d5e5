//! CLI errors.

use livecast_app::RuntimeError;
use thiserror::Error;

/// Errors from parsing input or driving the runtime.
#[derive(Debug, Error)]
pub enum CliError {
    /// Slash command not recognised.
    #[error("unknown command: /{0} (try /help)")]
    UnknownCommand(String),

    /// Command needs an argument that was not given.
    #[error("/{command} needs {argument}")]
    MissingArgument {
        /// Command name without the slash.
        command: &'static str,
        /// What was expected.
        argument: &'static str,
    },

    /// Value outside what a command accepts.
    #[error("invalid value for /{command}: {value}")]
    InvalidValue {
        /// Command name without the slash.
        command: &'static str,
        /// Rejected value.
        value: String,
    },

    /// Runtime setup or delivery failed.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Reading stdin failed.
    #[error("input error: {0}")]
    Io(#[from] std::io::Error),
}
