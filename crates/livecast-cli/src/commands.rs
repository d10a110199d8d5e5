//! Input line parsing.
//!
//! Lines starting with `/` are commands; anything else is a chat message.

use livecast_app::Command;
use livecast_core::Quality;

use crate::error::CliError;

/// Command reference shown by `/help`.
pub const HELP: &str = "\
/url <url>          set the video to broadcast or preview
/watch <url>        preview a video without claiming the slot
/live               start or stop broadcasting
/like               like the current stream
/title <text>       title for the next broadcast
/viewer [id]        connect as id, or disconnect
/fullscreen         toggle fullscreen
/controls on|off    show or hide player controls
/quality <label>    auto, 1080p, 720p, 480p or 360p
/quit               exit
<text>              send a chat message";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Forward to the runtime.
    Command(Command),
    /// Show the command reference.
    Help,
    /// Exit.
    Quit,
    /// Blank line.
    Empty,
}

/// Parse one line of user input.
///
/// # Errors
///
/// [`CliError`] for unknown commands, missing arguments and invalid values.
pub fn parse_line(line: &str) -> Result<Input, CliError> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        if line.is_empty() {
            return Ok(Input::Empty);
        }
        return Ok(Input::Command(Command::SendMessage(line.to_owned())));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    let command = match name {
        "help" | "h" => return Ok(Input::Help),
        "quit" | "q" | "exit" => return Ok(Input::Quit),
        "url" => Command::SetRequestedUrl(arg.to_owned()),
        "watch" => Command::WatchStream(required(arg, "watch", "a URL")?),
        "live" | "start" | "stop" => Command::ToggleBroadcast,
        "like" => Command::Like,
        "title" => Command::SetTitle(required(arg, "title", "a title")?),
        "viewer" => Command::SetViewer((!arg.is_empty()).then(|| arg.to_owned())),
        "fullscreen" | "fs" => Command::ToggleFullscreen,
        "controls" => match arg {
            "on" => Command::SetControlsVisible(true),
            "off" => Command::SetControlsVisible(false),
            "" => return Err(CliError::MissingArgument { command: "controls", argument: "on|off" }),
            other => {
                return Err(CliError::InvalidValue { command: "controls", value: other.to_owned() });
            },
        },
        "quality" => {
            let label = required(arg, "quality", "a label")?;
            let quality = Quality::from_label(&label)
                .ok_or(CliError::InvalidValue { command: "quality", value: label })?;
            Command::SetQuality(quality)
        },
        other => return Err(CliError::UnknownCommand(other.to_owned())),
    };
    Ok(Input::Command(command))
}

fn required(
    arg: &str,
    command: &'static str,
    argument: &'static str,
) -> Result<String, CliError> {
    if arg.is_empty() {
        return Err(CliError::MissingArgument { command, argument });
    }
    Ok(arg.to_owned())
}
