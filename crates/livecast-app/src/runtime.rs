//! Runtime that executes controller actions.
//!
//! The Runtime owns the [`Controller`] and coordinates:
//! - Commands arriving from a [`SessionHandle`]
//! - Poll ticks, fired only while the controller asks for them
//! - Fetch and write outcomes reported by spawned [`Store`] tasks
//!
//! Everything that touches the controller runs on the runtime's own task,
//! so controller state is never shared.

use std::time::Duration;

use livecast_core::{
    Alert, Controller, ControllerAction, ControllerConfig, ControllerEvent, LocalSession,
    StoreWrite,
};
use tokio::{
    sync::{mpsc, watch},
    time::{Interval, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    Store,
    handle::{Command, SessionHandle, StopHandle},
};

/// Default delay between poll ticks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Runtime tuning.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Delay between poll ticks.
    pub poll_interval: Duration,
    /// Capacity of the command channel.
    pub command_buffer: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { poll_interval: DEFAULT_POLL_INTERVAL, command_buffer: 64 }
    }
}

/// Cancellable periodic task driving one viewer's controller.
pub struct Runtime<S: Store> {
    store: S,
    controller: Controller,
    config: RuntimeConfig,
    commands: mpsc::Receiver<Command>,
    outcomes_tx: mpsc::UnboundedSender<ControllerEvent>,
    outcomes_rx: mpsc::UnboundedReceiver<ControllerEvent>,
    view_tx: watch::Sender<LocalSession>,
    alerts_tx: mpsc::UnboundedSender<Alert>,
    cancel: CancellationToken,
    ticker: Option<Interval>,
}

impl<S: Store> Runtime<S> {
    /// Create a runtime and the handle used to drive it.
    pub fn new(
        store: S,
        controller_config: ControllerConfig,
        config: RuntimeConfig,
    ) -> (Self, SessionHandle) {
        let controller = Controller::new(controller_config);
        let (commands_tx, commands) = mpsc::channel(config.command_buffer.max(1));
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(controller.session().clone());
        let (alerts_tx, alerts_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let handle = SessionHandle::new(
            commands_tx,
            view_rx,
            alerts_rx,
            StopHandle::new(cancel.clone()),
        );
        let runtime = Self {
            store,
            controller,
            config,
            commands,
            outcomes_tx,
            outcomes_rx,
            view_tx,
            alerts_tx,
            cancel,
            ticker: None,
        };
        (runtime, handle)
    }

    /// Run until stopped or every [`SessionHandle`] is dropped.
    ///
    /// Requests still in flight at shutdown are left to finish on their own;
    /// their outcomes are discarded.
    pub async fn run(mut self) {
        let actions = self.controller.start();
        self.execute(actions);

        loop {
            let actions = tokio::select! {
                biased;

                () = self.cancel.cancelled() => break,

                Some(event) = self.outcomes_rx.recv() => self.controller.handle(event),

                command = self.commands.recv() => match command {
                    Some(command) => self.apply(command),
                    None => break,
                },

                () = next_tick(&mut self.ticker) => self.controller.handle(ControllerEvent::Tick),
            };
            self.execute(actions);
        }

        self.ticker = None;
        tracing::info!("session runtime stopped");
    }

    fn apply(&mut self, command: Command) -> Vec<ControllerAction> {
        tracing::debug!(?command, "command");
        match command {
            Command::SetViewer(viewer_id) => self.controller.set_viewer_id(viewer_id),
            Command::SetRequestedUrl(url) => self.controller.set_requested_url(&url),
            Command::ToggleBroadcast => self.controller.toggle_broadcast(),
            Command::Like => self.controller.like(),
            Command::SendMessage(text) => self.controller.send_message(&text),
            Command::WatchStream(url) => self.controller.watch_stream(&url),
            Command::SetTitle(title) => self.controller.set_title(&title),
            Command::SetCompose(text) => self.controller.set_compose(&text),
            Command::ToggleFullscreen => self.controller.toggle_fullscreen(),
            Command::SetControlsVisible(visible) => self.controller.set_controls_visible(visible),
            Command::SetQuality(quality) => self.controller.set_quality(quality),
        }
    }

    fn execute(&mut self, actions: Vec<ControllerAction>) {
        for action in actions {
            match action {
                ControllerAction::Fetch { generation } => self.spawn_fetch(generation),
                ControllerAction::Write(write) => self.spawn_write(write),
                ControllerAction::StartPolling => {
                    let mut interval = tokio::time::interval(self.config.poll_interval);
                    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                    self.ticker = Some(interval);
                    tracing::debug!(interval = ?self.config.poll_interval, "polling started");
                },
                ControllerAction::StopPolling => {
                    self.ticker = None;
                    tracing::debug!("polling stopped");
                },
                ControllerAction::Alert(alert) => {
                    tracing::warn!(%alert, "alert");
                    // Receiver gone means nobody is listening; drop it.
                    let _ = self.alerts_tx.send(alert);
                },
                ControllerAction::Render => {
                    self.view_tx.send_replace(self.controller.session().clone());
                },
            }
        }
    }

    fn spawn_fetch(&self, generation: u64) {
        let store = self.store.clone();
        let outcomes = self.outcomes_tx.clone();
        tokio::spawn(async move {
            let event = match store.fetch_snapshot().await {
                Ok(snapshot) => ControllerEvent::SnapshotFetched { generation, snapshot },
                Err(error) => ControllerEvent::FetchFailed { generation, error },
            };
            let _ = outcomes.send(event);
        });
    }

    fn spawn_write(&self, write: StoreWrite) {
        let store = self.store.clone();
        let outcomes = self.outcomes_tx.clone();
        tracing::debug!(action = write.request.action(), "write issued");
        tokio::spawn(async move {
            let event = match store.submit(write.request.clone()).await {
                Ok(reply) => ControllerEvent::WriteSucceeded { write, reply },
                Err(error) => ControllerEvent::WriteFailed { write, error },
            };
            let _ = outcomes.send(event);
        });
    }
}

/// Next poll tick, or never while polling is off.
async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        },
        None => std::future::pending().await,
    }
}
