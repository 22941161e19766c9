//! Error types for the turn pipeline.
//!
//! Only transport and internal faults are errors. A model naming something
//! that does not exist, or an action the room cannot support, is answered in
//! character with a `None` action instead.

use thiserror::Error;

use crate::model::ModelError;

/// Result type for pipeline operations.
pub type TurnResult<T> = Result<T, TurnError>;

/// Faults that end a turn early.
#[derive(Debug, Error)]
pub enum TurnError {
    /// The room model rejected an operation.
    #[error("world error: {0}")]
    World(#[from] coax_world::WorldError),

    /// The model call failed for good.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// A pipeline stage hit an unexpected state.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Why a turn could not be queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// A turn is already in flight for this character.
    #[error("a turn is already in progress")]
    Busy,

    /// The runner task has stopped.
    #[error("turn runner has shut down")]
    Closed,
}
