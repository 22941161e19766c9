//! Turn resolution pipeline for Coax.
//!
//! Takes free-form player text, asks a language model what the character
//! intends, and turns that intention into safe, grid-legal, personality
//! consistent behavior. One turn flows through:
//!
//! sanitizer → budget → prompt builder → model → response parser →
//! personality filter → validator → executor, orchestrated by
//! [`TurnOrchestrator`], which reports progress on a [`TurnEvent`] channel.

/// Typed character actions and emotions.
pub mod action;
/// Tunables for the pipeline.
pub mod config;
/// Error types for the turn pipeline.
pub mod error;
/// Events emitted to the presentation layer.
pub mod event;
/// Carries out validated actions against the room.
pub mod executor;
/// Contract with the game-state collaborator that owns the turn budget.
pub mod host;
/// Contract with the language model service.
pub mod model;
/// The state machine tying the pipeline together.
pub mod orchestrator;
/// Model response parsing and target resolution.
pub mod parser;
/// Stateful per-character behavioral filters.
pub mod personality;
/// Renders room, character, and hints into a model instruction.
pub mod prompt;
/// The live room a turn operates on.
pub mod room;
/// Serializes turns for one character on a background task.
pub mod runner;
/// Screens raw player text before any model call.
pub mod sanitizer;
/// Mutable per-level turn counters.
pub mod state;
/// In-memory collaborators for tests and demos.
pub mod testing;
/// Checks actions against the live room.
pub mod validator;

pub use action::{ActionType, CharacterAction, Emotion};
pub use config::TurnConfig;
pub use error::{SubmitError, TurnError, TurnResult};
pub use event::{TurnEvent, TurnOutcome};
pub use executor::{ActionPresenter, ActionReport, ImmediatePresenter};
pub use host::LevelHost;
pub use model::{ModelClient, ModelError, ModelRequest};
pub use orchestrator::{TurnOrchestrator, TurnPhase};
pub use room::Room;
pub use runner::{TurnHandle, TurnRunner};
pub use sanitizer::{RejectReason, Rejection, sanitize};
pub use state::TurnState;
