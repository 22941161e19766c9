use serde::{Deserialize, Serialize};

use crate::direction::Direction;
use crate::error::WorldResult;
use crate::grid::{Grid, Occupant, SubTile};
use crate::object::ObjectId;
use crate::position::GridPosition;

/// The character the player is coaxing through the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    /// Display name, also the character's occupant identity.
    pub name: String,
    /// Current tile.
    pub position: GridPosition,
    /// Direction the character is looking.
    pub facing: Direction,
    /// The single item in hand, if any.
    pub held: Option<ObjectId>,
    /// Slot the character prefers within a tile.
    #[serde(default)]
    pub preferred_slot: SubTile,
}

impl Character {
    /// Create a character standing on `position`, facing north, empty-handed.
    pub fn new(name: impl Into<String>, position: GridPosition) -> Self {
        Self {
            name: name.into(),
            position,
            facing: Direction::North,
            held: None,
            preferred_slot: SubTile::FrontLeft,
        }
    }

    /// Set the initial facing.
    pub fn facing(mut self, facing: Direction) -> Self {
        self.facing = facing;
        self
    }

    /// This character as a grid occupant.
    pub fn occupant(&self) -> Occupant {
        Occupant::Character(self.name.clone())
    }

    /// True if something is in hand.
    pub fn hands_full(&self) -> bool {
        self.held.is_some()
    }

    /// True if `pos` is this tile or orthogonally adjacent.
    pub fn is_within_one(&self, pos: GridPosition) -> bool {
        self.position.is_within_one(pos)
    }

    /// Register the character's current tile on the grid.
    pub fn place(&self, grid: &mut Grid) -> WorldResult<SubTile> {
        grid.set_occupant(self.occupant(), self.position, self.preferred_slot)
    }

    /// Step onto `to`, updating grid occupancy.
    pub fn move_to(&mut self, to: GridPosition, grid: &mut Grid) -> WorldResult<SubTile> {
        if let Some(direction) = self.position.direction_to(to) {
            self.facing = direction;
        }
        self.position = to;
        self.place(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_updates_facing_and_occupancy() {
        let mut grid = Grid::new(3, 3).unwrap();
        let mut pip = Character::new("Pip", GridPosition::new(0, 0));
        pip.place(&mut grid).unwrap();

        pip.move_to(GridPosition::new(1, 0), &mut grid).unwrap();
        assert_eq!(pip.facing, Direction::East);
        assert_eq!(grid.tile(GridPosition::new(0, 0)).unwrap().occupant_count(), 0);
        assert_eq!(
            grid.placement(&pip.occupant()).map(|(p, _)| p),
            Some(GridPosition::new(1, 0))
        );
    }

    #[test]
    fn hands_and_adjacency() {
        let mut pip = Character::new("Pip", GridPosition::new(2, 2)).facing(Direction::West);
        assert!(!pip.hands_full());
        pip.held = Some(ObjectId::new("gem"));
        assert!(pip.hands_full());
        assert!(pip.is_within_one(GridPosition::new(2, 3)));
        assert!(!pip.is_within_one(GridPosition::new(3, 3)));
        assert_eq!(pip.facing, Direction::West);
    }
}
