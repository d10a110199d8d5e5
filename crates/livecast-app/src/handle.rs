//! Handles held by the view layer.

use livecast_core::{Alert, LocalSession, Quality};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::error::RuntimeError;

/// User intents forwarded to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Viewer identity appeared, changed or went away.
    SetViewer(Option<String>),
    /// Edit the pending URL.
    SetRequestedUrl(String),
    /// Begin or end broadcasting.
    ToggleBroadcast,
    /// Like the current slot.
    Like,
    /// Send a chat line.
    SendMessage(String),
    /// Preview a URL without claiming the slot.
    WatchStream(String),
    /// Title sent with the next start.
    SetTitle(String),
    /// Edit the chat compose buffer.
    SetCompose(String),
    /// Flip fullscreen.
    ToggleFullscreen,
    /// Show or hide player controls.
    SetControlsVisible(bool),
    /// Pick a playback quality.
    SetQuality(Quality),
}

/// Something the view layer should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    /// Session re-rendered.
    View(LocalSession),
    /// Blocking notification.
    Alert(Alert),
}

/// Stops a running [`crate::Runtime`].
///
/// Cloneable; any clone may stop the runtime. Stopping is idempotent.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    token: CancellationToken,
}

impl StopHandle {
    pub(crate) fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    /// Request shutdown. In-flight requests are not aborted; their results
    /// are discarded.
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// Whether shutdown was requested.
    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once shutdown was requested.
    pub async fn stopped(&self) {
        self.token.cancelled().await;
    }
}

/// Command entry points plus the view subscription and alert stream.
#[derive(Debug)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    view: watch::Receiver<LocalSession>,
    alerts: mpsc::UnboundedReceiver<Alert>,
    stop: StopHandle,
}

impl SessionHandle {
    pub(crate) fn new(
        commands: mpsc::Sender<Command>,
        view: watch::Receiver<LocalSession>,
        alerts: mpsc::UnboundedReceiver<Alert>,
        stop: StopHandle,
    ) -> Self {
        Self { commands, view, alerts, stop }
    }

    /// Forward a command to the runtime.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::Stopped`] once the runtime has exited.
    pub async fn send(&self, command: Command) -> Result<(), RuntimeError> {
        self.commands.send(command).await.map_err(|_| RuntimeError::Stopped)
    }

    /// Latest rendered session.
    pub fn view(&self) -> LocalSession {
        self.view.borrow().clone()
    }

    /// Wait for the next render and return it.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::Stopped`] once the runtime has exited.
    pub async fn changed(&mut self) -> Result<LocalSession, RuntimeError> {
        self.view.changed().await.map_err(|_| RuntimeError::Stopped)?;
        Ok(self.view.borrow_and_update().clone())
    }

    /// Next alert, or `None` once the runtime has exited and all alerts were
    /// drained.
    pub async fn next_alert(&mut self) -> Option<Alert> {
        self.alerts.recv().await
    }

    /// Next render or alert, whichever comes first. Alerts win ties.
    ///
    /// Returns `None` once the runtime has exited and all alerts were drained.
    pub async fn next_update(&mut self) -> Option<Update> {
        tokio::select! {
            biased;

            Some(alert) = self.alerts.recv() => Some(Update::Alert(alert)),

            changed = self.view.changed() => match changed {
                Ok(()) => Some(Update::View(self.view.borrow_and_update().clone())),
                Err(_) => self.alerts.recv().await.map(Update::Alert),
            },
        }
    }

    /// Alert already queued, if any.
    pub fn try_alert(&mut self) -> Option<Alert> {
        self.alerts.try_recv().ok()
    }

    /// Handle that stops the runtime.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }
}
