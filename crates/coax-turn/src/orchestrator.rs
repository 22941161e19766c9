//! The state machine tying the pipeline together.
//!
//! One call to [`TurnOrchestrator::process_turn`] walks a player message
//! through every stage:
//!
//! ```text
//! Idle → Sanitizing → BudgetCheck → PromptBuilding → AwaitingModel
//!      → Parsing → ProcessingActionChain → Idle
//! ```
//!
//! Any stage may end the turn early. The in-flight flag is cleared by a
//! guard, so neither an error nor a dropped future can leave it set.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::action::{CharacterAction, Emotion};
use crate::config::TurnConfig;
use crate::error::TurnResult;
use crate::event::{EventReceiver, EventSender, TurnEvent, TurnOutcome};
use crate::executor::{ActionPresenter, ActionReport, ImmediatePresenter, execute};
use crate::host::LevelHost;
use crate::model::{ModelClient, ModelError, ModelRequest};
use crate::parser::parse_response;
use crate::personality::apply_personality;
use crate::prompt::PromptBuilder;
use crate::room::Room;
use crate::sanitizer::sanitize;
use crate::state::TurnState;
use crate::validator::validate;

const CONNECTION_LINE: &str = "The connection wavers... try again in a moment.";
const FAULT_LINE: &str = "Huh? I lost my train of thought. Let's try that again.";
const OVERFLOW_NOTE: &str = "(That's all I can manage at once.)";
const OUT_OF_PROMPTS_LINE: &str = "I think we're out of chances. Let's start over.";
const OUT_OF_PROMPTS_REASON: &str = "prompt budget exhausted";

/// Where a turn currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnPhase {
    /// No turn in flight.
    #[default]
    Idle,
    /// Screening the player's text.
    Sanitizing,
    /// Spending a prompt.
    BudgetCheck,
    /// Rendering the model instruction.
    PromptBuilding,
    /// Waiting on the model.
    AwaitingModel,
    /// Turning the reply into actions.
    Parsing,
    /// Filtering, validating, and carrying out actions.
    ProcessingActionChain,
}

/// Clears the in-flight flag when the turn ends, however it ends.
struct ProcessingGuard(Arc<AtomicBool>);

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives turns for one character in one room.
pub struct TurnOrchestrator {
    room: Room,
    state: TurnState,
    config: TurnConfig,
    prompts: PromptBuilder,
    model: Arc<dyn ModelClient>,
    host: Arc<dyn LevelHost>,
    presenter: Arc<dyn ActionPresenter>,
    events: EventSender,
    processing: Arc<AtomicBool>,
    phase: TurnPhase,
}

impl std::fmt::Debug for TurnOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnOrchestrator")
            .field("character", &self.room.character.name)
            .field("phase", &self.phase)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl TurnOrchestrator {
    /// Create an orchestrator and the receiving end of its event channel.
    pub fn new(room: Room, model: Arc<dyn ModelClient>, host: Arc<dyn LevelHost>) -> (Self, EventReceiver) {
        let (events, receiver) = mpsc::unbounded_channel();
        let config = TurnConfig::default();
        let orchestrator = Self {
            room,
            state: TurnState::new(),
            prompts: PromptBuilder::new(config.history_len),
            config,
            model,
            host,
            presenter: Arc::new(ImmediatePresenter),
            events,
            processing: Arc::new(AtomicBool::new(false)),
            phase: TurnPhase::Idle,
        };
        (orchestrator, receiver)
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: TurnConfig) -> Self {
        self.prompts = PromptBuilder::new(config.history_len);
        self.config = config;
        self
    }

    /// Set the presenter awaited after each action.
    pub fn with_presenter(mut self, presenter: Arc<dyn ActionPresenter>) -> Self {
        self.presenter = presenter;
        self
    }

    /// The live room.
    pub fn room(&self) -> &Room {
        &self.room
    }

    /// Per-level counters.
    pub fn state(&self) -> &TurnState {
        &self.state
    }

    /// The stage the current turn is in.
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// True while a turn is in flight.
    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::Acquire)
    }

    /// Swap in a freshly built room and clear all per-level counters.
    pub fn reset_level(&mut self, room: Room) {
        info!(character = %room.character.name, "level reset");
        self.room = room;
        self.state.reset();
        self.phase = TurnPhase::Idle;
    }

    /// Run one player message through the whole pipeline.
    ///
    /// Taking `&mut self` keeps a second turn from starting while one is in
    /// flight; callers sharing a character across tasks go through
    /// [`TurnRunner`](crate::runner::TurnRunner), which turns extra
    /// submissions away as busy.
    pub async fn process_turn(&mut self, input: &str) -> TurnOutcome {
        self.processing.store(true, Ordering::Release);
        let _guard = ProcessingGuard(Arc::clone(&self.processing));

        if !self.host.is_playing() {
            debug!("turn rejected, level is not in play");
            return TurnOutcome::NotPlaying;
        }

        let outcome = match self.run_turn(input).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(error = %err, phase = ?self.phase, "turn faulted");
                self.emit(TurnEvent::CharacterResponse {
                    dialogue: FAULT_LINE.to_string(),
                    emotion: Emotion::Confused,
                });
                TurnOutcome::Faulted
            }
        };
        self.set_phase(TurnPhase::Idle);
        self.emit(TurnEvent::TurnCompleted { outcome });
        outcome
    }

    async fn run_turn(&mut self, input: &str) -> TurnResult<TurnOutcome> {
        self.emit(TurnEvent::TurnStarted {
            input: input.to_string(),
        });

        self.set_phase(TurnPhase::Sanitizing);
        if let Err(rejection) = sanitize(input, self.config.max_input_length, &self.room.profile) {
            let costs_prompt = rejection.costs_prompt();
            if costs_prompt {
                self.host.consume_prompt_unit();
            }
            self.emit(TurnEvent::InputRejected {
                dialogue: rejection.dialogue,
                costs_prompt,
            });
            if costs_prompt {
                self.check_budget();
            }
            return Ok(TurnOutcome::Rejected { costs_prompt });
        }

        self.set_phase(TurnPhase::BudgetCheck);
        if !self.host.consume_prompt_unit() {
            info!("no prompts left");
            return Ok(TurnOutcome::OutOfPrompts);
        }
        debug!(remaining = self.host.prompts_remaining(), "prompt consumed");

        self.set_phase(TurnPhase::PromptBuilding);
        let request = self.prompts.request(&self.room, &self.state, input);

        self.set_phase(TurnPhase::AwaitingModel);
        let raw = match self.call_model(&request).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, "model unavailable, refunding prompt");
                self.host.refund_prompt_unit();
                self.emit(TurnEvent::CharacterResponse {
                    dialogue: CONNECTION_LINE.to_string(),
                    emotion: Emotion::Confused,
                });
                return Ok(TurnOutcome::ModelUnavailable);
            }
        };

        self.set_phase(TurnPhase::Parsing);
        let mut actions = parse_response(&raw, self.config.fallback_dialogue_len);
        let truncated = limit_actions(&mut actions, self.room.profile.comprehension.max_actions());
        vocabulary_gate(&self.room, input, &mut actions);
        let first_type = actions.first().map(|a| a.action_type);

        self.set_phase(TurnPhase::ProcessingActionChain);
        let (executed, reply) = self.run_chain(actions, truncated).await?;
        self.state.last_action_type = first_type;
        self.state.record_exchange(input.trim(), reply);

        self.check_budget();
        Ok(TurnOutcome::Completed { executed })
    }

    /// Call the model, retrying rate limits with a linearly growing backoff.
    async fn call_model(&self, request: &ModelRequest) -> Result<String, ModelError> {
        let attempts = self.config.max_model_attempts.max(1);
        let mut last = ModelError::RateLimited;
        for attempt in 1..=attempts {
            debug!(attempt, "calling model");
            let result = tokio::time::timeout(self.config.model_timeout, self.model.complete(request))
                .await
                .unwrap_or(Err(ModelError::Timeout));
            match result {
                Ok(text) if text.trim().is_empty() => return Err(ModelError::EmptyResponse),
                Ok(text) => return Ok(text),
                Err(err) if err.is_rate_limited() => {
                    let backoff = self.config.retry_backoff_step * attempt;
                    warn!(attempt, backoff_ms = backoff.as_millis() as u64, "model rate limited, backing off");
                    tokio::time::sleep(backoff).await;
                    last = err;
                }
                Err(err) => return Err(err),
            }
        }
        Err(last)
    }

    /// Filter, validate, and carry out actions in order. Returns how many
    /// actions were carried out and everything the character said.
    ///
    /// When `truncated` is set, the last action carries the overflow note and
    /// its dialogue is spoken even if the action runs.
    async fn run_chain(&mut self, actions: Vec<CharacterAction>, truncated: bool) -> TurnResult<(usize, String)> {
        let count = actions.len();
        let mut executed = 0;
        let mut reply = String::new();

        for (index, mut action) in actions.into_iter().enumerate() {
            if !self.host.is_playing() {
                info!(index, "level left play, stopping action chain");
                break;
            }
            let first = index == 0;
            let carries_note = truncated && index + 1 == count;
            if first {
                apply_personality(&mut action, &self.room, &mut self.state);
            }
            if !action.is_none() {
                validate(&mut action, &self.room);
            }

            if (first || carries_note || action.is_none()) && !action.dialogue.trim().is_empty() {
                if !reply.is_empty() {
                    reply.push(' ');
                }
                reply.push_str(action.dialogue.trim());
                self.emit(TurnEvent::CharacterResponse {
                    dialogue: action.dialogue.clone(),
                    emotion: action.emotion,
                });
            }

            if action.is_none() {
                let level = self.state.escalate_hint();
                debug!(level, "hint escalated");
                self.emit(TurnEvent::HintEscalated { level });
                if first {
                    break;
                }
                continue;
            }

            let report = execute(&action, &mut self.room)?;
            executed += 1;
            self.emit(TurnEvent::ActionExecuted {
                action: report.action_type,
                path: report.path.clone(),
                succeeded: report.succeeded,
            });
            for id in &report.changed {
                self.emit(TurnEvent::ObjectChanged { id: id.clone() });
            }
            if let Some(message) = &report.message {
                self.emit(TurnEvent::CharacterResponse {
                    dialogue: message.clone(),
                    emotion: if report.succeeded {
                        Emotion::Neutral
                    } else {
                        Emotion::Confused
                    },
                });
            }

            self.await_presentation(&action, &report).await;

            if report.reached_exit {
                self.emit(TurnEvent::ReachedExit {
                    position: self.room.character.position,
                });
                self.host.exit_reached();
            }
            if index + 1 < count && !self.config.action_pacing.is_zero() {
                tokio::time::sleep(self.config.action_pacing).await;
            }
        }
        Ok((executed, reply))
    }

    async fn await_presentation(&self, action: &CharacterAction, report: &ActionReport) {
        let presented = tokio::time::timeout(self.config.action_timeout, self.presenter.present(action, report)).await;
        if presented.is_err() {
            warn!(
                action = %action.action_type,
                timeout_ms = self.config.action_timeout.as_millis() as u64,
                "action completion timed out, continuing"
            );
            self.emit(TurnEvent::ActionTimedOut {
                action: action.action_type,
            });
        }
    }

    /// Fail the level once the budget is spent and the level is still going.
    fn check_budget(&self) {
        if self.host.prompts_remaining() == 0 && self.host.is_playing() {
            warn!("prompt budget exhausted, failing level");
            self.emit(TurnEvent::CharacterResponse {
                dialogue: OUT_OF_PROMPTS_LINE.to_string(),
                emotion: Emotion::Sad,
            });
            self.emit(TurnEvent::LevelFailed {
                reason: OUT_OF_PROMPTS_REASON.to_string(),
            });
            self.host.fail_level(OUT_OF_PROMPTS_REASON);
        }
    }

    fn set_phase(&mut self, phase: TurnPhase) {
        debug!(?phase, "turn phase");
        self.phase = phase;
    }

    fn emit(&self, event: TurnEvent) {
        if self.events.send(event).is_err() {
            debug!("event receiver dropped");
        }
    }
}

/// Keep at most `max` actions, noting the cut on the last one kept.
/// Returns whether any were dropped.
fn limit_actions(actions: &mut Vec<CharacterAction>, max: usize) -> bool {
    if actions.len() <= max {
        return false;
    }
    debug!(parsed = actions.len(), kept = max, "action list truncated");
    actions.truncate(max);
    if let Some(last) = actions.last_mut() {
        last.append_dialogue(OVERFLOW_NOTE);
    }
    true
}

/// Block physical actions when the player used a real name the character
/// only knows by its own term.
fn vocabulary_gate(room: &Room, input: &str, actions: &mut [CharacterAction]) {
    let Some(vocabulary) = room.profile.vocabulary() else {
        return;
    };
    let Some(&(real, own)) = vocabulary.real_names_in(input).first() else {
        return;
    };
    info!(real, own, "player used an unfamiliar name");
    for action in actions.iter_mut() {
        if action.action_type.is_physical() {
            action.action_type = crate::action::ActionType::None;
        }
    }
    if let Some(first) = actions.first_mut() {
        first.dialogue = format!("{}? I don't know what that is. Do you mean the {own}?", capitalize(real));
        first.emotion = Emotion::Confused;
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
