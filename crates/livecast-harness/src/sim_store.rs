//! In-memory single-slot store for simulation.
//!
//! `SimStore` holds the same state a production stats endpoint does (view and
//! like counters, liked-by set, chat log, current stream) and applies writes
//! with the server's rules:
//!
//! - `start_stream` is refused while another viewer's stream is live
//! - `end_stream` is refused unless it comes from the streamer
//! - `like` counts once per viewer
//!
//! Faults are injected through [`Faults`]: scripted failures, seeded random
//! failures, and latency for async use through [`Store`].

use std::{
    collections::BTreeSet,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use livecast_app::Store;
use livecast_core::{
    ChatMessage, CurrentStream, RemoteSnapshot, StoreError, StoreRequest, WriteReply,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Author recorded for chat lines sent without a viewer id.
pub const ANONYMOUS_AUTHOR: &str = "anonymous";

/// Fault injection settings.
#[derive(Debug, Clone, Default)]
pub struct Faults {
    /// Fail this many upcoming fetches.
    pub fail_fetches: u32,
    /// Fail this many upcoming writes.
    pub fail_writes: u32,
    /// Probability in `[0, 1]` that any request fails, drawn from the seeded RNG.
    pub failure_rate: f64,
    /// Delay before each async request completes.
    pub latency: Duration,
}

#[derive(Debug)]
struct SimState {
    views: u64,
    likes: u64,
    liked_by: BTreeSet<String>,
    chat: Vec<ChatMessage>,
    current_stream: Option<CurrentStream>,
    faults: Faults,
    rng: ChaCha8Rng,
    clock_ms: i64,
    fetches: u64,
    requests: Vec<StoreRequest>,
}

impl SimState {
    fn new(seed: u64) -> Self {
        Self {
            views: 0,
            likes: 0,
            liked_by: BTreeSet::new(),
            chat: Vec::new(),
            current_stream: None,
            faults: Faults::default(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            clock_ms: 0,
            fetches: 0,
            requests: Vec::new(),
        }
    }

    fn snapshot(&self) -> RemoteSnapshot {
        RemoteSnapshot {
            views: Some(self.views),
            likes: Some(self.likes),
            liked_viewer_ids: self.liked_by.clone(),
            chat_history: Some(self.chat.clone()),
            current_stream: self.current_stream.clone(),
        }
    }

    fn random_failure(&mut self) -> bool {
        let rate = self.faults.failure_rate;
        rate > 0.0 && self.rng.gen_bool(rate.min(1.0))
    }

    fn live_streamer(&self) -> Option<&str> {
        self.current_stream.as_ref().filter(|s| s.is_live).map(|s| s.streamer_id.as_str())
    }

    fn apply(&mut self, request: StoreRequest) -> Result<WriteReply, StoreError> {
        match request {
            StoreRequest::View => {
                self.views += 1;
                Ok(WriteReply::Views { success: true, views: Some(self.views) })
            },
            StoreRequest::Like { user_address } => {
                if self.liked_by.insert(user_address) {
                    self.likes += 1;
                }
                Ok(WriteReply::Ack)
            },
            StoreRequest::Chat { message, user_address } => {
                self.clock_ms += 1;
                self.chat.push(ChatMessage {
                    author: user_address.unwrap_or_else(|| ANONYMOUS_AUTHOR.to_owned()),
                    text: message,
                    sent_at_epoch_ms: self.clock_ms,
                });
                Ok(WriteReply::Ack)
            },
            StoreRequest::StartStream { url, title, user_address } => {
                if let Some(streamer) = self.live_streamer()
                    && streamer != user_address
                {
                    return Err(StoreError::Rejected(format!("{streamer} is already live")));
                }
                self.current_stream =
                    Some(CurrentStream { url, title, streamer_id: user_address, is_live: true });
                Ok(WriteReply::Ack)
            },
            StoreRequest::EndStream { user_address } => match &mut self.current_stream {
                Some(stream) if stream.is_live && stream.streamer_id == user_address => {
                    stream.is_live = false;
                    Ok(WriteReply::Ack)
                },
                _ => Err(StoreError::Rejected("not the current streamer".into())),
            },
        }
    }
}

/// Shared in-memory store. Clones share state.
#[derive(Debug, Clone)]
pub struct SimStore {
    state: Arc<Mutex<SimState>>,
}

impl Default for SimStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SimStore {
    /// Empty store with a fixed RNG seed.
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// Empty store whose random faults follow `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self { state: Arc::new(Mutex::new(SimState::new(seed))) }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the fault settings.
    pub fn set_faults(&self, faults: Faults) {
        self.lock().faults = faults;
    }

    /// Fail the next `count` fetches.
    pub fn fail_next_fetches(&self, count: u32) {
        self.lock().faults.fail_fetches = count;
    }

    /// Fail the next `count` writes.
    pub fn fail_next_writes(&self, count: u32) {
        self.lock().faults.fail_writes = count;
    }

    /// Read the state blob, subject to injected faults.
    ///
    /// # Errors
    ///
    /// [`StoreError::Transport`] when a fault fires.
    pub fn read(&self) -> Result<RemoteSnapshot, StoreError> {
        let mut state = self.lock();
        state.fetches += 1;
        if state.faults.fail_fetches > 0 {
            state.faults.fail_fetches -= 1;
            return Err(StoreError::Transport("injected fetch failure".into()));
        }
        if state.random_failure() {
            return Err(StoreError::Transport("random fetch failure".into()));
        }
        Ok(state.snapshot())
    }

    /// Apply a write, subject to injected faults.
    ///
    /// A faulted write never reaches the state.
    ///
    /// # Errors
    ///
    /// [`StoreError::Transport`] when a fault fires, [`StoreError::Rejected`]
    /// when the server rules refuse the write.
    pub fn write(&self, request: StoreRequest) -> Result<WriteReply, StoreError> {
        tracing::trace!(action = request.action(), "sim store write");
        let mut state = self.lock();
        state.requests.push(request.clone());
        if state.faults.fail_writes > 0 {
            state.faults.fail_writes -= 1;
            return Err(StoreError::Transport("injected write failure".into()));
        }
        if state.random_failure() {
            return Err(StoreError::Transport("random write failure".into()));
        }
        let result = state.apply(request);
        if let Err(error) = &result {
            tracing::debug!(%error, "sim store refused write");
        }
        result
    }

    /// Current state, bypassing faults.
    pub fn snapshot(&self) -> RemoteSnapshot {
        self.lock().snapshot()
    }

    /// Current stream record, live or not.
    pub fn current_stream(&self) -> Option<CurrentStream> {
        self.lock().current_stream.clone()
    }

    /// Clear the live flag without an `end_stream`, as when the server
    /// restarts and loses the slot.
    pub fn drop_live_flag(&self) {
        if let Some(stream) = &mut self.lock().current_stream {
            stream.is_live = false;
        }
    }

    /// Overwrite the like counter, as another replica might.
    pub fn set_likes(&self, likes: u64) {
        self.lock().likes = likes;
    }

    /// Fetches attempted so far, including faulted ones.
    pub fn fetch_count(&self) -> u64 {
        self.lock().fetches
    }

    /// Every write attempted so far, in arrival order.
    pub fn requests(&self) -> Vec<StoreRequest> {
        self.lock().requests.clone()
    }

    fn latency(&self) -> Duration {
        self.lock().faults.latency
    }
}

impl Store for SimStore {
    async fn fetch_snapshot(&self) -> Result<RemoteSnapshot, StoreError> {
        let latency = self.latency();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.read()
    }

    async fn submit(&self, request: StoreRequest) -> Result<WriteReply, StoreError> {
        let latency = self.latency();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.write(request)
    }
}
