use crate::object::ObjectId;
use crate::position::GridPosition;

/// Alias for `Result<T, WorldError>`.
pub type WorldResult<T> = Result<T, WorldError>;

/// Errors that can occur when manipulating a room.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The position lies outside the grid.
    #[error("position {0} is outside the grid")]
    OutOfBounds(GridPosition),

    /// The requested object ID is not registered.
    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// An object with the same ID is already registered.
    #[error("object already registered: {0}")]
    DuplicateObject(ObjectId),

    /// The object exists but is the wrong kind for the operation.
    #[error("object {id} is not a {expected}")]
    WrongKind {
        /// The offending object.
        id: ObjectId,
        /// The kind the operation needed.
        expected: &'static str,
    },

    /// The destination tile cannot receive the object.
    #[error("destination {0} is blocked")]
    Blocked(GridPosition),

    /// Level data described an impossible grid.
    #[error("invalid grid: {0}")]
    InvalidGrid(String),
}
