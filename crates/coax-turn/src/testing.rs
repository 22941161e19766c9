//! In-memory collaborators for driving the pipeline without a network or a
//! game engine.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::action::CharacterAction;
use crate::executor::{ActionPresenter, ActionReport};
use crate::host::LevelHost;
use crate::model::{ModelClient, ModelError, ModelRequest};

const IDLE_REPLY: &str = r#"{"dialogue": "Hmm?", "actions": [], "emotion": "confused"}"#;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A model that plays back queued replies in order.
///
/// Once the queue runs dry every call answers with a bare "Hmm?".
#[derive(Debug, Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, ModelError>>>,
    requests: Mutex<Vec<ModelRequest>>,
    calls: AtomicUsize,
}

impl ScriptedModel {
    /// An empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply.
    pub fn reply(self, text: impl Into<String>) -> Self {
        lock(&self.replies).push_back(Ok(text.into()));
        self
    }

    /// Queue a failure.
    pub fn fail(self, error: ModelError) -> Self {
        lock(&self.replies).push_back(Err(error));
        self
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<ModelRequest> {
        lock(&self.requests).clone()
    }

    /// How many times the model was called.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn complete(&self, request: &ModelRequest) -> Result<String, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.requests).push(request.clone());
        lock(&self.replies)
            .pop_front()
            .unwrap_or_else(|| Ok(IDLE_REPLY.to_string()))
    }
}

/// A level host keeping its budget in memory.
#[derive(Debug)]
pub struct InMemoryLevelHost {
    playing: AtomicBool,
    remaining: AtomicU32,
    consumed: AtomicU32,
    refunded: AtomicU32,
    exits: AtomicU32,
    failures: Mutex<Vec<String>>,
}

impl InMemoryLevelHost {
    /// A level in play with `budget` prompts.
    pub fn new(budget: u32) -> Self {
        Self {
            playing: AtomicBool::new(true),
            remaining: AtomicU32::new(budget),
            consumed: AtomicU32::new(0),
            refunded: AtomicU32::new(0),
            exits: AtomicU32::new(0),
            failures: Mutex::new(Vec::new()),
        }
    }

    /// Toggle whether the level accepts turns.
    pub fn set_playing(&self, playing: bool) {
        self.playing.store(playing, Ordering::SeqCst);
    }

    /// Prompts spent, refunds not subtracted.
    pub fn consumed(&self) -> u32 {
        self.consumed.load(Ordering::SeqCst)
    }

    /// Prompts given back.
    pub fn refunded(&self) -> u32 {
        self.refunded.load(Ordering::SeqCst)
    }

    /// How often the character reached an open exit.
    pub fn exits_reached(&self) -> u32 {
        self.exits.load(Ordering::SeqCst)
    }

    /// Reasons passed to `fail_level`.
    pub fn failures(&self) -> Vec<String> {
        lock(&self.failures).clone()
    }
}

impl LevelHost for InMemoryLevelHost {
    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    fn consume_prompt_unit(&self) -> bool {
        let spent = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if spent {
            self.consumed.fetch_add(1, Ordering::SeqCst);
        }
        spent
    }

    fn refund_prompt_unit(&self) {
        self.remaining.fetch_add(1, Ordering::SeqCst);
        self.refunded.fetch_add(1, Ordering::SeqCst);
    }

    fn prompts_remaining(&self) -> u32 {
        self.remaining.load(Ordering::SeqCst)
    }

    fn exit_reached(&self) {
        self.exits.fetch_add(1, Ordering::SeqCst);
        self.set_playing(false);
    }

    fn fail_level(&self, reason: &str) {
        lock(&self.failures).push(reason.to_string());
    }
}

/// A presenter that takes a fixed time per action.
#[derive(Debug, Clone, Copy)]
pub struct DelayedPresenter(pub Duration);

#[async_trait]
impl ActionPresenter for DelayedPresenter {
    async fn present(&self, _action: &CharacterAction, _report: &ActionReport) {
        tokio::time::sleep(self.0).await;
    }
}
