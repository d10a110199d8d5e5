//! Synchronous controller driver for simulation.
//!
//! `SimViewer` executes a [`Controller`]'s actions against a [`SimStore`]
//! without tasks or timers. Writes are queued and only reach the store on
//! [`SimViewer::flush`], so tests control exactly how user actions interleave
//! with other viewers' polls.

use std::collections::VecDeque;

use livecast_core::{
    Alert, Controller, ControllerAction, ControllerConfig, ControllerEvent, LocalSession,
    RemoteSnapshot, StoreError, StoreWrite,
};

use crate::{invariants::ViewerSnapshot, sim_store::SimStore};

/// One viewer's controller wired to a shared [`SimStore`].
pub struct SimViewer {
    id: String,
    controller: Controller,
    store: SimStore,
    pending_writes: VecDeque<StoreWrite>,
    pending_fetch: Option<u64>,
    held_result: Option<(u64, Result<RemoteSnapshot, StoreError>)>,
    issued: Vec<StoreWrite>,
    alerts: Vec<Alert>,
    like_history: Vec<bool>,
    renders: usize,
}

impl SimViewer {
    /// Connected viewer with the default controller config.
    pub fn new(id: &str, store: SimStore) -> Self {
        Self::with_config(id, store, ControllerConfig::default())
    }

    /// Connected viewer with a custom controller config.
    pub fn with_config(id: &str, store: SimStore, config: ControllerConfig) -> Self {
        let mut viewer = Self {
            id: id.to_owned(),
            controller: Controller::new(config),
            store,
            pending_writes: VecDeque::new(),
            pending_fetch: None,
            held_result: None,
            issued: Vec::new(),
            alerts: Vec::new(),
            like_history: Vec::new(),
            renders: 0,
        };
        let actions = viewer.controller.start();
        viewer.absorb(actions);
        viewer.act(|c| c.set_viewer_id(Some(id.to_owned())));
        viewer
    }

    /// Viewer id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The driven controller.
    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Session as the view layer would render it.
    pub fn session(&self) -> &LocalSession {
        self.controller.session()
    }

    /// Run a user entry point and queue whatever it produces.
    pub fn act(&mut self, f: impl FnOnce(&mut Controller) -> Vec<ControllerAction>) {
        let actions = f(&mut self.controller);
        self.absorb(actions);
    }

    /// Deliver queued writes to the store in issue order, feeding each
    /// outcome back. Returns the number delivered.
    pub fn flush(&mut self) -> usize {
        let mut delivered = 0;
        while let Some(write) = self.pending_writes.pop_front() {
            let event = match self.store.write(write.request.clone()) {
                Ok(reply) => ControllerEvent::WriteSucceeded { write, reply },
                Err(error) => ControllerEvent::WriteFailed { write, error },
            };
            let actions = self.controller.handle(event);
            self.absorb(actions);
            delivered += 1;
        }
        delivered
    }

    /// Fire one tick and, if it issues a fetch, merge the result right away.
    /// Returns whether a fetch happened.
    pub fn poll(&mut self) -> bool {
        let actions = self.controller.handle(ControllerEvent::Tick);
        self.absorb(actions);
        let Some(generation) = self.pending_fetch.take() else {
            return false;
        };
        let result = self.store.read();
        self.deliver(generation, result);
        true
    }

    /// Fire one tick and read the store, but hold the result back until
    /// [`SimViewer::release_poll`]. Models a slow response. Returns whether a
    /// fetch happened.
    pub fn poll_held(&mut self) -> bool {
        let actions = self.controller.handle(ControllerEvent::Tick);
        self.absorb(actions);
        let Some(generation) = self.pending_fetch.take() else {
            return false;
        };
        self.held_result = Some((generation, self.store.read()));
        true
    }

    /// Deliver a result held by [`SimViewer::poll_held`].
    pub fn release_poll(&mut self) {
        if let Some((generation, result)) = self.held_result.take() {
            self.deliver(generation, result);
        }
    }

    /// Flush, poll, then flush anything the poll produced.
    pub fn step(&mut self) {
        self.flush();
        self.poll();
        self.flush();
    }

    /// Writes issued so far, delivered or not.
    pub fn issued(&self) -> &[StoreWrite] {
        &self.issued
    }

    /// Writes still queued.
    pub fn pending_writes(&self) -> usize {
        self.pending_writes.len()
    }

    /// Alerts raised so far.
    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    /// Number of render requests seen.
    pub fn renders(&self) -> usize {
        self.renders
    }

    /// Observable state for invariant checks.
    pub fn snapshot(&self) -> ViewerSnapshot {
        let session = self.session();
        ViewerSnapshot {
            id: self.id.clone(),
            is_owner: session.is_owner,
            is_broadcasting: session.is_broadcasting,
            requested_url: session.requested_url.clone(),
            active_embed_url: session.active_embed_url.clone(),
            polling: self.controller.is_polling(),
            like_history: self.like_history.clone(),
        }
    }

    fn deliver(&mut self, generation: u64, result: Result<RemoteSnapshot, StoreError>) {
        let event = match result {
            Ok(snapshot) => ControllerEvent::SnapshotFetched { generation, snapshot },
            Err(error) => ControllerEvent::FetchFailed { generation, error },
        };
        let actions = self.controller.handle(event);
        self.absorb(actions);
    }

    fn absorb(&mut self, actions: Vec<ControllerAction>) {
        for action in actions {
            match action {
                ControllerAction::Write(write) => {
                    self.issued.push(write.clone());
                    self.pending_writes.push_back(write);
                },
                ControllerAction::Fetch { generation } => self.pending_fetch = Some(generation),
                ControllerAction::Alert(alert) => self.alerts.push(alert),
                ControllerAction::Render => self.renders += 1,
                ControllerAction::StartPolling | ControllerAction::StopPolling => {},
            }
        }
        self.like_history.push(self.controller.session().has_liked_this_slot);
    }
}

/// Step every viewer once, in order.
pub fn round(viewers: &mut [SimViewer]) {
    for viewer in viewers.iter_mut() {
        viewer.step();
    }
}

/// Run rounds until one passes without any viewer issuing a write, capped at
/// `max_rounds`. Returns whether that quiet round was reached.
pub fn settle(viewers: &mut [SimViewer], max_rounds: usize) -> bool {
    for _ in 0..max_rounds {
        let issued_before: usize = viewers.iter().map(|v| v.issued().len()).sum();
        round(viewers);
        let issued_after: usize = viewers.iter().map(|v| v.issued().len()).sum();
        if issued_after == issued_before {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    const V1: &str = "https://youtu.be/dQw4w9WgXcQ";

    #[test]
    fn new_viewer_is_connected_and_idle() {
        let mut viewer = SimViewer::new("0xa", SimStore::new());
        assert_eq!(viewer.session().viewer_id.as_deref(), Some("0xa"));
        assert!(!viewer.controller().is_polling());
        assert!(!viewer.poll());
    }

    #[test]
    fn writes_wait_for_flush() {
        let store = SimStore::new();
        let mut viewer = SimViewer::new("0xa", store.clone());

        viewer.act(|c| c.set_requested_url(V1));
        assert_eq!(viewer.pending_writes(), 1);
        assert!(store.requests().is_empty());

        assert_eq!(viewer.flush(), 1);
        assert_eq!(store.snapshot().views, Some(1));
        assert_eq!(viewer.session().displayed_view_count, 1);
    }

    #[test]
    fn held_poll_goes_stale_after_claim() {
        let store = SimStore::new();
        let mut viewer = SimViewer::new("0xa", store);
        viewer.act(|c| c.set_requested_url(V1));
        viewer.flush();

        assert!(viewer.poll_held());
        viewer.act(Controller::toggle_broadcast);
        viewer.release_poll();

        assert!(viewer.session().is_broadcasting);
        assert!(!viewer.controller().fetch_in_flight());
    }
}
