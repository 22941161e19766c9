use std::fmt;

use serde::{Deserialize, Serialize};

use crate::direction::Direction;

/// Integer tile coordinate. North is `y + 1`, east is `x + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPosition {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl GridPosition {
    /// Create a position.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The position `steps` tiles away in `direction`.
    pub fn offset(self, direction: Direction, steps: i32) -> Self {
        let (dx, dy) = direction.delta();
        Self {
            x: self.x + dx * steps,
            y: self.y + dy * steps,
        }
    }

    /// The four orthogonal neighbors in N, E, S, W order. May be out of bounds.
    pub fn neighbors(self) -> [Self; 4] {
        [
            self.offset(Direction::North, 1),
            self.offset(Direction::East, 1),
            self.offset(Direction::South, 1),
            self.offset(Direction::West, 1),
        ]
    }

    /// Manhattan distance.
    pub fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// True if `other` is this tile or one of its orthogonal neighbors.
    pub fn is_within_one(self, other: Self) -> bool {
        self.manhattan(other) <= 1
    }

    /// The single compass step from `self` to an orthogonally adjacent `other`.
    pub fn direction_to(self, other: Self) -> Option<Direction> {
        match (other.x - self.x, other.y - self.y) {
            (0, 1) => Some(Direction::North),
            (0, -1) => Some(Direction::South),
            (1, 0) => Some(Direction::East),
            (-1, 0) => Some(Direction::West),
            _ => None,
        }
    }

    /// Parse `"x,y"`, `"(x, y)"`, or `"x y"`.
    pub fn parse(s: &str) -> Option<Self> {
        let inner = s
            .trim()
            .trim_start_matches(['(', '['])
            .trim_end_matches([')', ']']);
        let mut parts = inner
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|p| !p.is_empty());
        let x = parts.next()?.parse().ok()?;
        let y = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self { x, y })
    }
}

impl fmt::Display for GridPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_follows_compass() {
        let p = GridPosition::new(2, 2);
        assert_eq!(p.offset(Direction::North, 1), GridPosition::new(2, 3));
        assert_eq!(p.offset(Direction::South, 2), GridPosition::new(2, 0));
        assert_eq!(p.offset(Direction::East, 1), GridPosition::new(3, 2));
        assert_eq!(p.offset(Direction::West, 3), GridPosition::new(-1, 2));
    }

    #[test]
    fn manhattan_and_adjacency() {
        let a = GridPosition::new(0, 0);
        assert_eq!(a.manhattan(GridPosition::new(3, 4)), 7);
        assert!(a.is_within_one(GridPosition::new(0, 1)));
        assert!(a.is_within_one(a));
        assert!(!a.is_within_one(GridPosition::new(1, 1)));
    }

    #[test]
    fn direction_to_neighbor() {
        let a = GridPosition::new(1, 1);
        assert_eq!(a.direction_to(GridPosition::new(1, 2)), Some(Direction::North));
        assert_eq!(a.direction_to(GridPosition::new(0, 1)), Some(Direction::West));
        assert_eq!(a.direction_to(GridPosition::new(2, 2)), None);
    }

    #[test]
    fn parse_coordinate_strings() {
        assert_eq!(GridPosition::parse("3,4"), Some(GridPosition::new(3, 4)));
        assert_eq!(GridPosition::parse("(3, 4)"), Some(GridPosition::new(3, 4)));
        assert_eq!(GridPosition::parse("[0 7]"), Some(GridPosition::new(0, 7)));
        assert_eq!(GridPosition::parse("red key"), None);
        assert_eq!(GridPosition::parse("1,2,3"), None);
    }

    #[test]
    fn display_format() {
        assert_eq!(GridPosition::new(-1, 5).to_string(), "(-1, 5)");
    }
}
