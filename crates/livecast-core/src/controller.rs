//! Broadcast sync controller.
//!
//! The [`Controller`] owns the [`LocalSession`] and decides, on every poll
//! tick, whether this viewer should adopt a remote stream, stop playback,
//! or restore a slot the server lost track of. It is a pure state machine:
//! user entry points and [`ControllerEvent`]s go in, [`ControllerAction`]s
//! come out. No clock, no network.
//!
//! # Reconciliation
//!
//! Each merged snapshot applies, in order:
//!
//! 1. Counts: `views`/`likes` overwrite the displayed counters, discarding any
//!    optimistic local bump.
//! 2. Chat: replaced only on structural difference.
//! 3. Like flag: set when the server lists this viewer, never cleared.
//! 4. Ownership: set when the server names this viewer as streamer.
//! 5. Takeover protocol on `currentStream` (adopt, end, or re-assert).
//!
//! # Liveness
//!
//! Fetches are tagged with a poll generation. Stopping or restarting the poll
//! loop, and any local change to slot ownership, bumps the generation so a
//! response that raced with the change is dropped instead of merged.

use tracing::{debug, info, warn};

use crate::{
    config::ControllerConfig,
    error::{ActionError, StoreError},
    event::{Alert, ControllerAction, ControllerEvent, StoreWrite, WritePurpose},
    session::{LocalSession, Quality},
    video::VideoId,
    wire::{CurrentStream, RemoteSnapshot, StoreRequest, WriteReply},
};

/// Client-side reconciliation state machine for the shared broadcast slot.
#[derive(Debug, Clone)]
pub struct Controller {
    config: ControllerConfig,

    /// Session state exposed read-only to the view layer.
    session: LocalSession,

    /// Video behind `session.active_embed_url`. `None` iff the URL is empty.
    active_video: Option<VideoId>,

    /// Poll loop is running.
    polling: bool,

    /// Bumped whenever in-flight fetch results must be discarded.
    generation: u64,

    /// A fetch for the current generation is outstanding.
    fetch_in_flight: bool,

    /// Embed URL a view was last registered for.
    joined_embed_url: Option<String>,

    /// Monotonic counter for user-initiated slot claims.
    begin_attempts: u64,

    /// Claim awaiting the server's acknowledgement.
    pending_begin: Option<u64>,

    /// Consecutive ticks on which the owner re-asserted the slot.
    reassert_streak: u32,
}

impl Controller {
    /// Create a controller with an empty session.
    pub fn new(config: ControllerConfig) -> Self {
        let session =
            LocalSession { stream_title: config.stream_title.clone(), ..LocalSession::default() };
        Self {
            config,
            session,
            active_video: None,
            polling: false,
            generation: 0,
            fetch_in_flight: false,
            joined_embed_url: None,
            begin_attempts: 0,
            pending_begin: None,
            reassert_streak: 0,
        }
    }

    /// Initial actions at session start.
    pub fn start(&mut self) -> Vec<ControllerAction> {
        let mut actions = Vec::new();
        self.sync_polling(&mut actions);
        actions.push(ControllerAction::Render);
        actions
    }

    /// Session state.
    pub fn session(&self) -> &LocalSession {
        &self.session
    }

    /// Whether the poll loop should be running.
    pub fn is_polling(&self) -> bool {
        self.polling
    }

    /// Current poll generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a fetch for the current generation is outstanding.
    pub fn fetch_in_flight(&self) -> bool {
        self.fetch_in_flight
    }

    /// Whether a slot claim is awaiting acknowledgement.
    pub fn begin_pending(&self) -> bool {
        self.pending_begin.is_some()
    }

    /// Process an event and return resulting actions.
    pub fn handle(&mut self, event: ControllerEvent) -> Vec<ControllerAction> {
        match event {
            ControllerEvent::Tick => self.handle_tick(),
            ControllerEvent::SnapshotFetched { generation, snapshot } => {
                if !self.accept_fetch_result(generation) {
                    return vec![];
                }
                self.merge_snapshot(&snapshot)
            },
            ControllerEvent::FetchFailed { generation, error } => {
                if self.accept_fetch_result(generation) {
                    warn!(%error, transient = error.is_transient(), "poll failed, skipping tick");
                }
                vec![]
            },
            ControllerEvent::WriteSucceeded { write, reply } => {
                self.handle_write_succeeded(write, reply)
            },
            ControllerEvent::WriteFailed { write, error } => {
                self.handle_write_failed(write, &error)
            },
        }
    }

    /// Connect or disconnect the viewer identity.
    pub fn set_viewer_id(&mut self, viewer_id: Option<String>) -> Vec<ControllerAction> {
        self.session.viewer_id = viewer_id.filter(|id| !id.is_empty());
        vec![ControllerAction::Render]
    }

    /// Store raw URL input and derive the embed URL from it.
    ///
    /// Invalid input is not an error: it clears the embed URL. The owner's
    /// edits are ignored while live, since the active embed must keep matching
    /// the claimed slot. A follower's edit leaves the adopted broadcast; a
    /// live remote slot is adopted again on the next tick.
    pub fn set_requested_url(&mut self, raw: &str) -> Vec<ControllerAction> {
        if self.session.is_broadcasting && self.session.is_owner {
            debug!("ignoring URL edit while broadcasting");
            return vec![];
        }

        let mut actions = Vec::new();
        self.session.is_broadcasting = false;
        self.session.requested_url = raw.to_owned();
        self.set_active_video(VideoId::parse(raw), &mut actions);
        actions.push(ControllerAction::Render);
        actions
    }

    /// Begin or end broadcasting `requested_url` as the global slot.
    pub fn toggle_broadcast(&mut self) -> Vec<ControllerAction> {
        let Some(viewer_id) = self.session.viewer_id.clone() else {
            return reject(ActionError::Unauthenticated);
        };

        if self.session.is_broadcasting {
            if !self.session.is_owner {
                return reject(ActionError::NotOwner);
            }
            self.end_broadcast(viewer_id)
        } else {
            self.begin_broadcast(viewer_id)
        }
    }

    /// Like the current slot once.
    pub fn like(&mut self) -> Vec<ControllerAction> {
        if self.session.has_liked_this_slot {
            return vec![];
        }
        let Some(viewer_id) = self.session.viewer_id.clone() else {
            return reject(ActionError::Unauthenticated);
        };

        self.session.displayed_like_count = self.session.displayed_like_count.saturating_add(1);
        self.session.like_count_provisional = true;
        self.session.has_liked_this_slot = true;

        vec![
            ControllerAction::Write(StoreWrite {
                request: StoreRequest::Like { user_address: viewer_id },
                purpose: WritePurpose::Like,
            }),
            ControllerAction::Render,
        ]
    }

    /// Post a chat line.
    ///
    /// The line is not echoed locally; it shows up once a later snapshot
    /// carries it.
    pub fn send_message(&mut self, text: &str) -> Vec<ControllerAction> {
        let text = text.trim();
        if text.is_empty() {
            return vec![];
        }

        self.session.compose.clear();
        vec![
            ControllerAction::Write(StoreWrite {
                request: StoreRequest::Chat {
                    message: text.to_owned(),
                    user_address: self.session.viewer_id.clone(),
                },
                purpose: WritePurpose::Chat,
            }),
            ControllerAction::Render,
        ]
    }

    /// Switch local playback to another video without touching the slot.
    ///
    /// A live remote slot still wins on the next tick for non-owners.
    pub fn watch_stream(&mut self, raw: &str) -> Vec<ControllerAction> {
        if self.session.is_owner && self.session.is_broadcasting {
            return reject(ActionError::NotOwner);
        }
        let Some(video) = VideoId::parse(raw) else {
            return reject(ActionError::InvalidUrl { input: raw.to_owned() });
        };

        let mut actions = Vec::new();
        self.session.requested_url = raw.to_owned();
        self.set_active_video(Some(video), &mut actions);
        actions.push(ControllerAction::Render);
        actions
    }

    /// Set the title used for slot claims. A blank title restores the
    /// configured one.
    pub fn set_title(&mut self, title: &str) -> Vec<ControllerAction> {
        let title = title.trim();
        self.session.stream_title =
            if title.is_empty() { self.config.stream_title.clone() } else { title.to_owned() };
        vec![ControllerAction::Render]
    }

    /// Update the chat compose field.
    pub fn set_compose(&mut self, text: &str) -> Vec<ControllerAction> {
        self.session.compose = text.to_owned();
        vec![ControllerAction::Render]
    }

    /// Toggle fullscreen playback.
    pub fn toggle_fullscreen(&mut self) -> Vec<ControllerAction> {
        self.session.ui.fullscreen = !self.session.ui.fullscreen;
        vec![ControllerAction::Render]
    }

    /// Show or hide the player overlay controls.
    pub fn set_controls_visible(&mut self, visible: bool) -> Vec<ControllerAction> {
        self.session.ui.controls_visible = visible;
        vec![ControllerAction::Render]
    }

    /// Select a playback quality.
    pub fn set_quality(&mut self, quality: Quality) -> Vec<ControllerAction> {
        self.session.ui.quality = quality;
        vec![ControllerAction::Render]
    }

    fn handle_tick(&mut self) -> Vec<ControllerAction> {
        if !self.polling {
            return vec![];
        }
        if self.fetch_in_flight {
            debug!(generation = self.generation, "previous poll still in flight, skipping tick");
            return vec![];
        }

        self.fetch_in_flight = true;
        vec![ControllerAction::Fetch { generation: self.generation }]
    }

    /// Clears the in-flight guard for current-generation results. Returns
    /// `false` if the result is stale and must be dropped.
    fn accept_fetch_result(&mut self, generation: u64) -> bool {
        if generation != self.generation || !self.polling {
            debug!(generation, current = self.generation, "dropping stale poll result");
            return false;
        }
        self.fetch_in_flight = false;
        true
    }

    fn begin_broadcast(&mut self, viewer_id: String) -> Vec<ControllerAction> {
        let Some(video) = VideoId::parse(&self.session.requested_url) else {
            return reject(ActionError::InvalidUrl { input: self.session.requested_url.clone() });
        };

        let mut actions = Vec::new();
        self.session.is_broadcasting = true;
        self.session.is_owner = true;
        self.set_active_video(Some(video), &mut actions);

        self.begin_attempts += 1;
        self.pending_begin = Some(self.begin_attempts);
        self.reassert_streak = 0;
        self.invalidate_in_flight();

        info!(url = %self.session.requested_url, "claiming broadcast slot");
        actions.push(ControllerAction::Write(StoreWrite {
            request: self.start_stream_request(viewer_id),
            purpose: WritePurpose::BeginBroadcast { attempt: self.begin_attempts },
        }));
        actions.push(ControllerAction::Render);
        actions
    }

    fn end_broadcast(&mut self, viewer_id: String) -> Vec<ControllerAction> {
        let mut actions = Vec::new();
        self.session.is_broadcasting = false;
        self.set_active_video(None, &mut actions);

        info!("releasing broadcast slot");
        actions.push(ControllerAction::Write(StoreWrite {
            request: StoreRequest::EndStream { user_address: viewer_id },
            purpose: WritePurpose::EndBroadcast,
        }));

        self.session.is_owner = false;
        self.pending_begin = None;
        self.reassert_streak = 0;
        self.invalidate_in_flight();

        actions.push(ControllerAction::Render);
        actions
    }

    fn start_stream_request(&self, viewer_id: String) -> StoreRequest {
        StoreRequest::StartStream {
            url: self.session.requested_url.clone(),
            title: self.session.stream_title.clone(),
            user_address: viewer_id,
        }
    }

    fn handle_write_succeeded(
        &mut self,
        write: StoreWrite,
        reply: WriteReply,
    ) -> Vec<ControllerAction> {
        match (write.purpose, reply) {
            (WritePurpose::ViewJoin { embed_url }, WriteReply::Views { success, views }) => {
                match (success, views) {
                    (true, Some(views)) => {
                        self.session.displayed_view_count = views;
                        vec![ControllerAction::Render]
                    },
                    (true, None) => vec![],
                    (false, _) => {
                        warn!(%embed_url, "view registration not counted");
                        vec![]
                    },
                }
            },
            (WritePurpose::BeginBroadcast { attempt }, _) => {
                if self.pending_begin == Some(attempt) {
                    self.pending_begin = None;
                    self.invalidate_in_flight();
                }
                debug!(attempt, "slot claim acknowledged");
                vec![]
            },
            (purpose, _) => {
                debug!(action = write.request.action(), ?purpose, "write acknowledged");
                vec![]
            },
        }
    }

    fn handle_write_failed(
        &mut self,
        write: StoreWrite,
        error: &StoreError,
    ) -> Vec<ControllerAction> {
        match write.purpose {
            WritePurpose::BeginBroadcast { attempt } if self.pending_begin == Some(attempt) => {
                warn!(%error, attempt, "slot claim failed, rolling back");
                let mut actions = Vec::new();
                self.session.is_broadcasting = false;
                self.session.is_owner = false;
                self.set_active_video(None, &mut actions);
                self.pending_begin = None;
                self.invalidate_in_flight();

                actions.push(ControllerAction::Alert(Alert::BroadcastFailed {
                    reason: error.to_string(),
                }));
                actions.push(ControllerAction::Render);
                actions
            },
            purpose => {
                warn!(%error, action = write.request.action(), ?purpose, "write failed");
                vec![]
            },
        }
    }

    /// Merge an authoritative snapshot into the session.
    fn merge_snapshot(&mut self, snapshot: &RemoteSnapshot) -> Vec<ControllerAction> {
        let mut actions = Vec::new();
        let before = self.session.clone();

        if let Some(views) = snapshot.views {
            self.session.displayed_view_count = views;
        }
        if let Some(likes) = snapshot.likes {
            self.session.displayed_like_count = likes;
            self.session.like_count_provisional = false;
        }

        if let Some(chat) = &snapshot.chat_history
            && *chat != self.session.chat_history
        {
            self.session.chat_history.clone_from(chat);
        }

        if let Some(viewer_id) = &self.session.viewer_id
            && snapshot.liked_viewer_ids.contains(viewer_id)
        {
            self.session.has_liked_this_slot = true;
        }

        if let Some(stream) = &snapshot.current_stream
            && self.is_streamer(stream)
        {
            self.session.is_owner = true;
        }

        if self.pending_begin.is_some() {
            debug!("slot claim unacknowledged, deferring takeover");
        } else if let Some(stream) = &snapshot.current_stream {
            self.reconcile_stream(stream, &mut actions);
        }

        if self.session != before {
            actions.push(ControllerAction::Render);
        }
        actions
    }

    fn reconcile_stream(&mut self, stream: &CurrentStream, actions: &mut Vec<ControllerAction>) {
        if stream.is_live {
            self.reassert_streak = 0;
            if !self.is_streamer(stream) {
                self.adopt_remote(stream, actions);
            }
            return;
        }

        if !self.session.is_broadcasting {
            return;
        }

        if self.session.is_owner {
            self.reassert_slot(actions);
        } else {
            info!(streamer = %stream.streamer_id, "broadcast ended remotely");
            self.session.is_broadcasting = false;
            self.set_active_video(None, actions);
        }
    }

    fn adopt_remote(&mut self, stream: &CurrentStream, actions: &mut Vec<ControllerAction>) {
        let Some(remote) = stream.video_id() else {
            warn!(url = %stream.url, "live stream has no recognisable video id");
            return;
        };

        // Someone else holds the slot now.
        self.session.is_owner = false;
        self.session.is_broadcasting = true;

        if self.active_video.as_ref() == Some(&remote) {
            return;
        }

        info!(video = %remote, streamer = %stream.streamer_id, "adopting remote broadcast");
        self.session.requested_url.clone_from(&stream.url);
        self.set_active_video(Some(remote), actions);
    }

    fn reassert_slot(&mut self, actions: &mut Vec<ControllerAction>) {
        let Some(viewer_id) = self.session.viewer_id.clone() else {
            warn!("owner lost viewer identity, cannot restore slot");
            return;
        };

        if let Some(limit) = self.config.reassert_limit
            && self.reassert_streak >= limit
        {
            if self.reassert_streak == limit {
                warn!(attempts = limit, "giving up on restoring broadcast slot");
                self.reassert_streak += 1;
                actions.push(ControllerAction::Alert(Alert::ReassertAbandoned { attempts: limit }));
            }
            return;
        }

        self.reassert_streak += 1;
        info!(streak = self.reassert_streak, "server lost live slot, re-asserting");
        actions.push(ControllerAction::Write(StoreWrite {
            request: self.start_stream_request(viewer_id),
            purpose: WritePurpose::Reassert,
        }));
    }

    fn is_streamer(&self, stream: &CurrentStream) -> bool {
        !stream.streamer_id.is_empty()
            && self.session.viewer_id.as_deref() == Some(stream.streamer_id.as_str())
    }

    /// Swap the active video, keeping the embed URL, poll loop and view
    /// registration consistent with it.
    fn set_active_video(&mut self, video: Option<VideoId>, actions: &mut Vec<ControllerAction>) {
        let was_empty = self.session.active_embed_url.is_empty();
        self.session.active_embed_url = video.as_ref().map(VideoId::embed_url).unwrap_or_default();
        self.active_video = video;

        if was_empty && !self.session.active_embed_url.is_empty() {
            self.register_view(actions);
        }
        self.sync_polling(actions);
    }

    fn register_view(&mut self, actions: &mut Vec<ControllerAction>) {
        let embed_url = &self.session.active_embed_url;
        if self.joined_embed_url.as_ref() == Some(embed_url) {
            return;
        }

        self.joined_embed_url = Some(embed_url.clone());
        actions.push(ControllerAction::Write(StoreWrite {
            request: StoreRequest::View,
            purpose: WritePurpose::ViewJoin { embed_url: embed_url.clone() },
        }));
    }

    fn sync_polling(&mut self, actions: &mut Vec<ControllerAction>) {
        let should_poll =
            !self.session.active_embed_url.is_empty() || self.config.poll_while_idle;
        if should_poll == self.polling {
            return;
        }

        self.polling = should_poll;
        self.invalidate_in_flight();
        actions.push(if should_poll {
            ControllerAction::StartPolling
        } else {
            ControllerAction::StopPolling
        });
    }

    fn invalidate_in_flight(&mut self) {
        self.generation += 1;
        self.fetch_in_flight = false;
    }
}

fn reject(error: ActionError) -> Vec<ControllerAction> {
    debug!(%error, "action rejected");
    vec![ControllerAction::Alert(Alert::Rejected(error))]
}
