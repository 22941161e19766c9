//! Grid, pathfinding, objects, and character model for Coax puzzle rooms.
//!
//! A room is a rectangular [`Grid`] of typed tiles. Every tile carries four
//! sub-tile slots so a character and a few objects can share it. Interactable
//! things (keys, gems, boxes, doors, pedestals, pressure plates) live in an
//! [`ObjectRegistry`]. The character being coaxed through the room is a
//! [`Character`] configured by an immutable [`CharacterProfile`].
//!
//! Nothing here performs I/O or waits on anything; the turn pipeline in
//! `coax-turn` drives these types.

/// The character being guided and its mutable physical state.
pub mod character;
/// Compass directions and the character's direction interpretation modes.
pub mod direction;
/// Error types used throughout the crate.
pub mod error;
/// Tile storage, walkability, and sub-tile occupancy.
pub mod grid;
/// Interactable grid objects and their capabilities.
pub mod object;
/// A* search over the grid.
pub mod pathfinding;
/// Integer grid coordinates.
pub mod position;
/// Per-level character configuration: comprehension and quirks.
pub mod profile;
/// Indexed collection of grid objects with spatial queries.
pub mod registry;

/// Re-export character types.
pub use character::Character;
/// Re-export direction types.
pub use direction::{Direction, DirectionMode};
/// Re-export error types.
pub use error::{WorldError, WorldResult};
/// Re-export grid types.
pub use grid::{Grid, Occupant, SubTile, Tile, TileType};
/// Re-export object types.
pub use object::{Capabilities, GridObject, ObjectId, ObjectKind};
/// Re-export position type.
pub use position::GridPosition;
/// Re-export profile types.
pub use profile::{
    CharacterProfile, ColorblindConfig, Comprehension, DistrustfulConfig, ForgetfulConfig, PerceptionQuirk,
    PersonalityQuirk, PoliteConfig, SizeDistortionConfig, StubbornConfig, UnmotivatedConfig, VocabularyConfig,
};
/// Re-export registry type.
pub use registry::ObjectRegistry;
