//! Interactable grid objects.
//!
//! Objects form a closed set of kinds. Behavior is dispatched on [`ObjectKind`]
//! and what a character may do with an object is summarized by
//! [`Capabilities`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::position::GridPosition;

/// Level-unique object identifier, e.g. `"red_key"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub String);

impl ObjectId {
    /// Create an ID from any string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw ID string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// What a character can do with an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// Can be carried.
    pub can_pick_up: bool,
    /// Can be shoved one tile.
    pub can_push: bool,
    /// A held item can be used on it.
    pub can_use_item_on: bool,
    /// Can be opened and closed.
    pub can_open_close: bool,
    /// Stops pushed objects from entering its tile.
    pub blocks_movement: bool,
}

/// Kind-specific object state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObjectKind {
    /// Unlocks doors. `opens` restricts it to one door.
    Key {
        /// The only door this key fits, if any.
        #[serde(default)]
        opens: Option<ObjectId>,
    },
    /// A colored gem that can be set on a pedestal.
    Gem {
        /// Color word, e.g. `"red"`.
        color: String,
    },
    /// A pushable crate.
    Box {
        /// Relative heft, used only for description.
        #[serde(default = "default_weight")]
        weight: u32,
    },
    /// A door standing on a `Door` tile.
    Door {
        /// Locked doors need a key and never open by toggling.
        locked: bool,
        /// Current open state.
        #[serde(default)]
        open: bool,
    },
    /// Accepts exactly one gem.
    Pedestal {
        /// The gem this pedestal accepts.
        accepts: ObjectId,
        /// The gem currently resting on it.
        #[serde(default)]
        placed: Option<ObjectId>,
    },
    /// Opens its linked door while weighed down.
    PressurePlate {
        /// The door this plate controls.
        #[serde(default)]
        linked: Option<ObjectId>,
        /// Whether something is standing on it.
        #[serde(default)]
        pressed: bool,
    },
}

fn default_weight() -> u32 {
    1
}

impl ObjectKind {
    /// Lowercase kind label for messages and prompts.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Key { .. } => "key",
            Self::Gem { .. } => "gem",
            Self::Box { .. } => "box",
            Self::Door { .. } => "door",
            Self::Pedestal { .. } => "pedestal",
            Self::PressurePlate { .. } => "pressure plate",
        }
    }

    /// Capability flags for this kind in its current state.
    pub fn capabilities(&self) -> Capabilities {
        match self {
            Self::Key { .. } | Self::Gem { .. } => Capabilities {
                can_pick_up: true,
                ..Capabilities::default()
            },
            Self::Box { .. } => Capabilities {
                can_push: true,
                blocks_movement: true,
                ..Capabilities::default()
            },
            Self::Door { open, .. } => Capabilities {
                can_use_item_on: true,
                can_open_close: true,
                blocks_movement: !open,
                ..Capabilities::default()
            },
            Self::Pedestal { .. } => Capabilities {
                can_use_item_on: true,
                ..Capabilities::default()
            },
            Self::PressurePlate { .. } => Capabilities::default(),
        }
    }
}

/// An interactable entity on the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridObject {
    /// Unique identity.
    pub id: ObjectId,
    /// Name shown to players and the model.
    pub display_name: String,
    /// Tile the object rests on. Tracks the carrier while carried.
    pub position: GridPosition,
    /// Kind and kind-specific state.
    #[serde(flatten)]
    pub kind: ObjectKind,
    /// True while a character holds it.
    #[serde(default)]
    pub carried: bool,
}

impl GridObject {
    /// Create an object resting on `position`.
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        position: GridPosition,
        kind: ObjectKind,
    ) -> Self {
        Self {
            id: ObjectId::new(id),
            display_name: display_name.into(),
            position,
            kind,
            carried: false,
        }
    }

    /// Capability flags.
    pub fn capabilities(&self) -> Capabilities {
        self.kind.capabilities()
    }

    /// True for a door that is still locked.
    pub fn is_locked_door(&self) -> bool {
        matches!(self.kind, ObjectKind::Door { locked: true, .. })
    }

    /// True for a door, open or not.
    pub fn is_door(&self) -> bool {
        matches!(self.kind, ObjectKind::Door { .. })
    }
}
