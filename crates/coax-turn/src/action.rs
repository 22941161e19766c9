//! Typed character actions and emotions.

use std::fmt;

use coax_world::{Direction, GridPosition};
use serde::{Deserialize, Serialize};

/// The kind of thing a character intends to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Talk only.
    #[default]
    None,
    /// Walk a number of tiles in a direction.
    Move,
    /// Walk to a named object or coordinate.
    MoveTo,
    /// Face a direction without moving.
    Turn,
    /// Describe the surroundings.
    Look,
    /// Describe one object.
    Examine,
    /// Take an item into hand.
    PickUp,
    /// Drop the held item.
    PutDown,
    /// Use the held item on something.
    Use,
    /// Shove a box.
    Push,
    /// Toggle a door.
    OpenClose,
    /// Do nothing for a moment.
    Wait,
}

impl ActionType {
    /// Parse an action tag as the model emits it. Unknown tags are `None`.
    pub fn parse(tag: &str) -> Self {
        let normalized: String = tag
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '-' || c == ' ' { '_' } else { c })
            .collect();
        match normalized.as_str() {
            "move" | "walk" => Self::Move,
            "move_to" | "moveto" | "go_to" | "goto" => Self::MoveTo,
            "turn" | "face" => Self::Turn,
            "look" => Self::Look,
            "examine" | "inspect" => Self::Examine,
            "pick_up" | "pickup" | "take" | "grab" => Self::PickUp,
            "put_down" | "putdown" | "drop" => Self::PutDown,
            "use" => Self::Use,
            "push" => Self::Push,
            "open_close" | "open" | "close" => Self::OpenClose,
            "wait" => Self::Wait,
            _ => Self::None,
        }
    }

    /// Tag used in the model schema.
    pub fn tag(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Move => "move",
            Self::MoveTo => "move_to",
            Self::Turn => "turn",
            Self::Look => "look",
            Self::Examine => "examine",
            Self::PickUp => "pick_up",
            Self::PutDown => "put_down",
            Self::Use => "use",
            Self::Push => "push",
            Self::OpenClose => "open_close",
            Self::Wait => "wait",
        }
    }

    /// True for actions that change the room or the character's place in it.
    pub fn is_physical(self) -> bool {
        !matches!(self, Self::None | Self::Look | Self::Examine | Self::Wait)
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// How the character feels about the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    /// Did not follow.
    Confused,
    /// Pleased.
    Happy,
    /// Irritated.
    Annoyed,
    /// Frightened.
    Scared,
    /// No particular feeling.
    #[default]
    Neutral,
    /// Pleased with itself.
    Proud,
    /// Unhappy.
    Sad,
}

impl Emotion {
    /// Parse an emotion tag. Unknown tags are neutral.
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "confused" => Self::Confused,
            "happy" => Self::Happy,
            "annoyed" => Self::Annoyed,
            "scared" => Self::Scared,
            "proud" => Self::Proud,
            "sad" => Self::Sad,
            _ => Self::Neutral,
        }
    }
}

/// One typed intention derived from model output.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CharacterAction {
    /// What to do.
    pub action_type: ActionType,
    /// Direction as the model stated it, before the character's direction mode.
    pub direction: Option<Direction>,
    /// Tiles to walk for `Move`. Always at least 1.
    pub steps: u32,
    /// Object name, object ID, or coordinate text.
    pub target: Option<String>,
    /// Recipient for `Use`.
    pub use_on: Option<String>,
    /// Tile chosen for `MoveTo` once validated.
    pub destination: Option<GridPosition>,
    /// Line the character says.
    pub dialogue: String,
    /// Accompanying emotion.
    pub emotion: Emotion,
}

impl CharacterAction {
    /// An action of `action_type` with default fields.
    pub fn new(action_type: ActionType) -> Self {
        Self {
            action_type,
            steps: 1,
            ..Self::default()
        }
    }

    /// A conversational action that only speaks.
    pub fn say(dialogue: impl Into<String>, emotion: Emotion) -> Self {
        Self {
            dialogue: dialogue.into(),
            emotion,
            ..Self::new(ActionType::None)
        }
    }

    /// Set the direction.
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Set the step count.
    pub fn with_steps(mut self, steps: u32) -> Self {
        self.steps = steps.max(1);
        self
    }

    /// Set the target text.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Set the `Use` recipient text.
    pub fn with_use_on(mut self, use_on: impl Into<String>) -> Self {
        self.use_on = Some(use_on.into());
        self
    }

    /// Downgrade to `None`, adding `line` to whatever was already said.
    pub fn refuse(&mut self, line: impl AsRef<str>) {
        self.action_type = ActionType::None;
        self.append_dialogue(line);
    }

    /// Add a sentence to the dialogue.
    pub fn append_dialogue(&mut self, line: impl AsRef<str>) {
        let line = line.as_ref();
        if self.dialogue.trim().is_empty() {
            self.dialogue = line.to_string();
        } else {
            self.dialogue = format!("{} {}", self.dialogue.trim_end(), line);
        }
    }

    /// True once the action only speaks.
    pub fn is_none(&self) -> bool {
        self.action_type == ActionType::None
    }
}
