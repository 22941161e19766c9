//! Events emitted to the presentation layer.

use coax_world::{GridPosition, ObjectId};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::action::{ActionType, Emotion};

/// Sending half of the event channel.
pub type EventSender = mpsc::UnboundedSender<TurnEvent>;
/// Receiving half of the event channel.
pub type EventReceiver = mpsc::UnboundedReceiver<TurnEvent>;

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnOutcome {
    /// The level was not accepting turns.
    NotPlaying,
    /// The sanitizer turned the input away.
    Rejected {
        /// Whether a prompt was spent.
        costs_prompt: bool,
    },
    /// No prompts were left.
    OutOfPrompts,
    /// The model could not be reached; the prompt was refunded.
    ModelUnavailable,
    /// The action chain ran.
    Completed {
        /// Actions carried out, not counting conversational ones.
        executed: usize,
    },
    /// An internal fault ended the turn.
    Faulted,
}

/// Progress notifications, in the order they happen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TurnEvent {
    /// A turn began processing.
    TurnStarted {
        /// The player's raw text.
        input: String,
    },
    /// The sanitizer turned the input away.
    InputRejected {
        /// In-character reply.
        dialogue: String,
        /// Whether a prompt was spent.
        costs_prompt: bool,
    },
    /// The character says something.
    CharacterResponse {
        /// What is said.
        dialogue: String,
        /// How the character feels.
        emotion: Emotion,
    },
    /// An action was carried out.
    ActionExecuted {
        /// Kind of action.
        action: ActionType,
        /// Tiles walked, starting tile first.
        path: Vec<GridPosition>,
        /// Whether the effect happened.
        succeeded: bool,
    },
    /// An action's completion signal did not arrive in time.
    ActionTimedOut {
        /// Kind of action.
        action: ActionType,
    },
    /// An object's state changed.
    ObjectChanged {
        /// Which object.
        id: ObjectId,
    },
    /// The hint level went up.
    HintEscalated {
        /// New level.
        level: u32,
    },
    /// The character stepped onto an open exit.
    ReachedExit {
        /// Where.
        position: GridPosition,
    },
    /// The level was failed and will restart.
    LevelFailed {
        /// Why.
        reason: String,
    },
    /// A turn finished.
    TurnCompleted {
        /// How it ended.
        outcome: TurnOutcome,
    },
}
