//! Compass directions and how a character interprets them.

use serde::{Deserialize, Serialize};

/// Cardinal direction on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Toward `y + 1`.
    #[default]
    North,
    /// Toward `y - 1`.
    South,
    /// Toward `x + 1`.
    East,
    /// Toward `x - 1`.
    West,
}

impl Direction {
    /// All four directions in clockwise order starting at north.
    pub const ALL: [Direction; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// Parse a direction word as the model might emit it.
    ///
    /// `forward`/`backward` collapse onto north/south here; characters with a
    /// relative direction mode turn them back into facing-relative moves later.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "n" | "north" | "up" | "forward" | "forwards" => Some(Self::North),
            "s" | "south" | "down" | "backward" | "backwards" | "back" => Some(Self::South),
            "e" | "east" | "right" => Some(Self::East),
            "w" | "west" | "left" => Some(Self::West),
            _ => None,
        }
    }

    /// Lowercase compass name.
    pub fn name(self) -> &'static str {
        match self {
            Self::North => "north",
            Self::South => "south",
            Self::East => "east",
            Self::West => "west",
        }
    }

    /// Unit step `(dx, dy)`.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (0, 1),
            Self::South => (0, -1),
            Self::East => (1, 0),
            Self::West => (-1, 0),
        }
    }

    /// The compass opposite.
    pub fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::South => Self::North,
            Self::East => Self::West,
            Self::West => Self::East,
        }
    }

    /// Rotate 90 degrees clockwise.
    pub fn right_of(self) -> Self {
        match self {
            Self::North => Self::East,
            Self::East => Self::South,
            Self::South => Self::West,
            Self::West => Self::North,
        }
    }

    /// Rotate 90 degrees counter-clockwise.
    pub fn left_of(self) -> Self {
        self.right_of().opposite()
    }
}

/// How a character maps the directions it is told onto the compass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionMode {
    /// Directions mean what they say.
    #[default]
    Absolute,
    /// North is "ahead", south "behind", east/west are right/left of facing.
    Relative,
    /// East and west are swapped.
    InvertedLeftRight,
    /// North and south are swapped.
    InvertedNorthSouth,
}

impl DirectionMode {
    /// Map a parsed direction onto the compass for a character facing `facing`.
    pub fn apply(self, direction: Direction, facing: Direction) -> Direction {
        match self {
            Self::Absolute => direction,
            Self::Relative => match direction {
                Direction::North => facing,
                Direction::South => facing.opposite(),
                Direction::East => facing.right_of(),
                Direction::West => facing.left_of(),
            },
            Self::InvertedLeftRight => match direction {
                Direction::East | Direction::West => direction.opposite(),
                other => other,
            },
            Self::InvertedNorthSouth => match direction {
                Direction::North | Direction::South => direction.opposite(),
                other => other,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_synonyms() {
        assert_eq!(Direction::parse("North"), Some(Direction::North));
        assert_eq!(Direction::parse("up"), Some(Direction::North));
        assert_eq!(Direction::parse("left"), Some(Direction::West));
        assert_eq!(Direction::parse(" right "), Some(Direction::East));
        assert_eq!(Direction::parse("diagonal"), None);
    }

    #[test]
    fn forward_and_backward_collapse_to_north_south() {
        assert_eq!(Direction::parse("forward"), Some(Direction::North));
        assert_eq!(Direction::parse("backward"), Some(Direction::South));
        assert_eq!(Direction::parse("back"), Some(Direction::South));
    }

    #[test]
    fn rotation() {
        assert_eq!(Direction::North.right_of(), Direction::East);
        assert_eq!(Direction::North.left_of(), Direction::West);
        assert_eq!(Direction::West.left_of(), Direction::South);
        for d in Direction::ALL {
            assert_eq!(d.opposite().opposite(), d);
            assert_eq!(d.right_of().left_of(), d);
        }
    }

    #[test]
    fn absolute_mode_is_identity() {
        for d in Direction::ALL {
            assert_eq!(DirectionMode::Absolute.apply(d, Direction::West), d);
        }
    }

    #[test]
    fn relative_mode_uses_facing() {
        let mode = DirectionMode::Relative;
        // "forward" parsed to north, then re-mapped to the facing direction.
        let forward = Direction::parse("forward").unwrap();
        assert_eq!(mode.apply(forward, Direction::East), Direction::East);
        assert_eq!(mode.apply(Direction::South, Direction::East), Direction::West);
        assert_eq!(mode.apply(Direction::East, Direction::East), Direction::South);
        assert_eq!(mode.apply(Direction::West, Direction::East), Direction::North);
    }

    #[test]
    fn inverted_modes_swap_one_axis() {
        assert_eq!(
            DirectionMode::InvertedLeftRight.apply(Direction::East, Direction::North),
            Direction::West
        );
        assert_eq!(
            DirectionMode::InvertedLeftRight.apply(Direction::North, Direction::North),
            Direction::North
        );
        assert_eq!(
            DirectionMode::InvertedNorthSouth.apply(Direction::North, Direction::North),
            Direction::South
        );
        assert_eq!(
            DirectionMode::InvertedNorthSouth.apply(Direction::West, Direction::North),
            Direction::West
        );
    }
}
