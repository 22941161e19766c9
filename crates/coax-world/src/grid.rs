//! Tile registry, walkability, and four-slot sub-tile occupancy.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{WorldError, WorldResult};
use crate::object::ObjectId;
use crate::position::GridPosition;

/// The terrain of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileType {
    /// Plain ground.
    Floor,
    /// Never walkable.
    Wall,
    /// Level exit; walkable once opened.
    Exit,
    /// Doorway; walkable while open.
    Door,
    /// Ground with a plate in it.
    PressurePlate,
    /// Ground with a pedestal on it.
    Pedestal,
}

impl TileType {
    /// Door and exit tiles begin closed.
    pub fn starts_open(self) -> bool {
        !matches!(self, Self::Door | Self::Exit)
    }
}

/// One of the four fixed positions inside a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubTile {
    /// Slot 0.
    #[default]
    FrontLeft,
    /// Slot 1.
    FrontRight,
    /// Slot 2.
    BackLeft,
    /// Slot 3.
    BackRight,
}

impl SubTile {
    /// Slot index 0..=3.
    pub fn index(self) -> usize {
        match self {
            Self::FrontLeft => 0,
            Self::FrontRight => 1,
            Self::BackLeft => 2,
            Self::BackRight => 3,
        }
    }

    /// Slot for an index, wrapping modulo 4.
    pub fn from_index(index: usize) -> Self {
        match index % 4 {
            0 => Self::FrontLeft,
            1 => Self::FrontRight,
            2 => Self::BackLeft,
            _ => Self::BackRight,
        }
    }

    /// Search order used when this slot is preferred but taken.
    pub fn priority(self) -> [SubTile; 4] {
        use SubTile::*;
        match self {
            FrontLeft => [FrontLeft, FrontRight, BackLeft, BackRight],
            FrontRight => [FrontRight, FrontLeft, BackRight, BackLeft],
            BackLeft => [BackLeft, BackRight, FrontLeft, FrontRight],
            BackRight => [BackRight, BackLeft, FrontRight, FrontLeft],
        }
    }
}

/// Something that can sit in a sub-tile slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Occupant {
    /// A character, by name.
    Character(String),
    /// A grid object.
    Object(ObjectId),
}

/// A single grid cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    /// Terrain.
    pub tile_type: TileType,
    /// Where this tile is.
    pub position: GridPosition,
    /// Open state for doors and exits; always true for other types.
    pub is_open: bool,
    slots: [Option<Occupant>; 4],
}

impl Tile {
    /// Create an empty tile in its initial open state.
    pub fn new(tile_type: TileType, position: GridPosition) -> Self {
        Self {
            tile_type,
            position,
            is_open: tile_type.starts_open(),
            slots: Default::default(),
        }
    }

    /// Pure function of type and open state.
    pub fn is_walkable(&self) -> bool {
        match self.tile_type {
            TileType::Floor | TileType::PressurePlate | TileType::Pedestal => true,
            TileType::Wall => false,
            TileType::Door | TileType::Exit => self.is_open,
        }
    }

    /// All four slots filled.
    pub fn is_occupied(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Number of filled slots.
    pub fn occupant_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Occupant of one slot.
    pub fn occupant(&self, slot: SubTile) -> Option<&Occupant> {
        self.slots[slot.index()].as_ref()
    }

    /// First free slot in `preferred`'s priority order, or `preferred` itself
    /// when every slot is taken.
    pub fn available_sub_tile(&self, preferred: SubTile) -> SubTile {
        preferred
            .priority()
            .into_iter()
            .find(|slot| self.slots[slot.index()].is_none())
            .unwrap_or(preferred)
    }
}

/// The room's tile registry.
#[derive(Debug, Clone)]
pub struct Grid {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
    placements: HashMap<Occupant, (GridPosition, SubTile)>,
}

impl Grid {
    /// Create a grid of floor tiles.
    pub fn new(width: i32, height: i32) -> WorldResult<Self> {
        if width <= 0 || height <= 0 {
            return Err(WorldError::InvalidGrid(format!(
                "dimensions must be positive, got {width}x{height}"
            )));
        }
        let area = width
            .checked_mul(height)
            .and_then(|area| usize::try_from(area).ok())
            .ok_or_else(|| WorldError::InvalidGrid(format!("{width}x{height} grid is too large")))?;
        let mut tiles = Vec::with_capacity(area);
        for y in 0..height {
            for x in 0..width {
                tiles.push(Tile::new(TileType::Floor, GridPosition::new(x, y)));
            }
        }
        Ok(Self {
            width,
            height,
            tiles,
            placements: HashMap::new(),
        })
    }

    /// Build a grid from rows of characters; row `i` is `y = i`.
    ///
    /// `.` floor, `#` wall, `E` exit, `D` door, `P` pressure plate, `S` pedestal.
    pub fn from_rows(rows: &[&str]) -> WorldResult<Self> {
        let height = rows.len() as i32;
        let width = rows.first().map_or(0, |r| r.chars().count()) as i32;
        let mut grid = Self::new(width, height)?;
        for (y, row) in rows.iter().enumerate() {
            if row.chars().count() as i32 != width {
                return Err(WorldError::InvalidGrid(format!(
                    "row {y} has {} columns, expected {width}",
                    row.chars().count()
                )));
            }
            for (x, c) in row.chars().enumerate() {
                let tile_type = match c {
                    '.' => TileType::Floor,
                    '#' => TileType::Wall,
                    'E' => TileType::Exit,
                    'D' => TileType::Door,
                    'P' => TileType::PressurePlate,
                    'S' => TileType::Pedestal,
                    other => {
                        return Err(WorldError::InvalidGrid(format!(
                            "unknown tile symbol '{other}'"
                        )));
                    }
                };
                grid.set_tile_type(GridPosition::new(x as i32, y as i32), tile_type)?;
            }
        }
        Ok(grid)
    }

    /// Number of columns.
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> i32 {
        self.height
    }

    /// True if `pos` lies in `[0,width) x [0,height)`.
    pub fn in_bounds(&self, pos: GridPosition) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    fn index(&self, pos: GridPosition) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| (pos.y * self.width + pos.x) as usize)
    }

    /// The tile at `pos`, if in bounds.
    pub fn tile(&self, pos: GridPosition) -> Option<&Tile> {
        self.index(pos).map(|i| &self.tiles[i])
    }

    fn tile_mut(&mut self, pos: GridPosition) -> WorldResult<&mut Tile> {
        let i = self.index(pos).ok_or(WorldError::OutOfBounds(pos))?;
        Ok(&mut self.tiles[i])
    }

    /// Every tile in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// Replace a tile's terrain, resetting its open state.
    pub fn set_tile_type(&mut self, pos: GridPosition, tile_type: TileType) -> WorldResult<()> {
        let tile = self.tile_mut(pos)?;
        tile.tile_type = tile_type;
        tile.is_open = tile_type.starts_open();
        Ok(())
    }

    /// Open or close a door or exit tile. Other tiles stay open.
    pub fn set_open(&mut self, pos: GridPosition, open: bool) -> WorldResult<()> {
        let tile = self.tile_mut(pos)?;
        if matches!(tile.tile_type, TileType::Door | TileType::Exit) {
            tile.is_open = open;
        }
        Ok(())
    }

    /// Walkable for a character. Out-of-bounds is never walkable.
    pub fn is_walkable(&self, pos: GridPosition) -> bool {
        self.tile(pos).is_some_and(Tile::is_walkable)
    }

    /// All four slots filled.
    pub fn is_occupied(&self, pos: GridPosition) -> bool {
        self.tile(pos).is_some_and(Tile::is_occupied)
    }

    /// Walkable orthogonal neighbors in N, E, S, W order.
    pub fn walkable_neighbors(&self, pos: GridPosition) -> Vec<GridPosition> {
        pos.neighbors()
            .into_iter()
            .filter(|n| self.is_walkable(*n))
            .collect()
    }

    /// The slot `preferred` would resolve to on the tile at `pos`.
    pub fn available_sub_tile(&self, pos: GridPosition, preferred: SubTile) -> WorldResult<SubTile> {
        self.tile(pos)
            .map(|t| t.available_sub_tile(preferred))
            .ok_or(WorldError::OutOfBounds(pos))
    }

    /// Where an occupant currently sits.
    pub fn placement(&self, occupant: &Occupant) -> Option<(GridPosition, SubTile)> {
        self.placements.get(occupant).copied()
    }

    /// Place an occupant on `pos`, leaving wherever it was before.
    ///
    /// When every slot is full the preferred slot is overwritten and its
    /// previous occupant is left unplaced.
    pub fn set_occupant(
        &mut self,
        occupant: Occupant,
        pos: GridPosition,
        preferred: SubTile,
    ) -> WorldResult<SubTile> {
        if !self.in_bounds(pos) {
            return Err(WorldError::OutOfBounds(pos));
        }
        self.clear_occupant(&occupant);
        let tile = self.tile_mut(pos)?;
        let slot = tile.available_sub_tile(preferred);
        let displaced = tile.slots[slot.index()].replace(occupant.clone());
        if let Some(displaced) = displaced {
            self.placements.remove(&displaced);
        }
        self.placements.insert(occupant, (pos, slot));
        Ok(slot)
    }

    /// Place an object, the item-flavored alias of [`Grid::set_occupant`].
    pub fn set_item(
        &mut self,
        id: &ObjectId,
        pos: GridPosition,
        preferred: SubTile,
    ) -> WorldResult<SubTile> {
        self.set_occupant(Occupant::Object(id.clone()), pos, preferred)
    }

    /// Remove an occupant from the grid. Returns where it was.
    pub fn clear_occupant(&mut self, occupant: &Occupant) -> Option<(GridPosition, SubTile)> {
        let (pos, slot) = self.placements.remove(occupant)?;
        if let Some(i) = self.index(pos) {
            self.tiles[i].slots[slot.index()] = None;
        }
        Some((pos, slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(id: &str) -> Occupant {
        Occupant::Object(ObjectId::new(id))
    }

    #[test]
    fn walkability_by_type() {
        let mut grid = Grid::from_rows(&[".#ED", "PS.."]).unwrap();
        assert!(grid.is_walkable(GridPosition::new(0, 0)));
        assert!(!grid.is_walkable(GridPosition::new(1, 0)));
        assert!(!grid.is_walkable(GridPosition::new(2, 0)));
        assert!(!grid.is_walkable(GridPosition::new(3, 0)));
        assert!(grid.is_walkable(GridPosition::new(0, 1)));
        assert!(grid.is_walkable(GridPosition::new(1, 1)));

        grid.set_open(GridPosition::new(3, 0), true).unwrap();
        assert!(grid.is_walkable(GridPosition::new(3, 0)));
    }

    #[test]
    fn out_of_bounds_is_not_walkable() {
        let grid = Grid::new(2, 2).unwrap();
        assert!(!grid.is_walkable(GridPosition::new(-1, 0)));
        assert!(!grid.is_walkable(GridPosition::new(2, 0)));
        assert!(grid.tile(GridPosition::new(0, 5)).is_none());
    }

    #[test]
    fn set_open_ignores_floor() {
        let mut grid = Grid::new(1, 1).unwrap();
        grid.set_open(GridPosition::new(0, 0), false).unwrap();
        assert!(grid.is_walkable(GridPosition::new(0, 0)));
    }

    #[test]
    fn rejects_ragged_rows() {
        assert!(Grid::from_rows(&["..", "."]).is_err());
        assert!(Grid::from_rows(&["x"]).is_err());
        assert!(Grid::new(0, 3).is_err());
    }

    #[test]
    fn rejects_oversized_dimensions() {
        assert!(matches!(Grid::new(i32::MAX, 2), Err(WorldError::InvalidGrid(_))));
        assert!(matches!(Grid::new(65_536, 65_536), Err(WorldError::InvalidGrid(_))));
    }

    #[test]
    fn walkable_neighbors_skip_walls() {
        let grid = Grid::from_rows(&["...", ".#.", "..."]).unwrap();
        let n = grid.walkable_neighbors(GridPosition::new(1, 0));
        assert_eq!(n, vec![GridPosition::new(2, 0), GridPosition::new(0, 0)]);
    }

    #[test]
    fn slot_priority_orders() {
        assert_eq!(SubTile::FrontLeft.priority().map(SubTile::index), [0, 1, 2, 3]);
        assert_eq!(SubTile::FrontRight.priority().map(SubTile::index), [1, 0, 3, 2]);
        assert_eq!(SubTile::BackLeft.priority().map(SubTile::index), [2, 3, 0, 1]);
        assert_eq!(SubTile::BackRight.priority().map(SubTile::index), [3, 2, 1, 0]);
    }

    #[test]
    fn preferred_slot_falls_back_in_priority_order() {
        let mut grid = Grid::new(1, 1).unwrap();
        let p = GridPosition::new(0, 0);
        assert_eq!(grid.set_occupant(obj("a"), p, SubTile::FrontRight).unwrap(), SubTile::FrontRight);
        assert_eq!(grid.set_occupant(obj("b"), p, SubTile::FrontRight).unwrap(), SubTile::FrontLeft);
        assert_eq!(grid.set_occupant(obj("c"), p, SubTile::FrontRight).unwrap(), SubTile::BackRight);
        assert_eq!(grid.set_occupant(obj("d"), p, SubTile::FrontRight).unwrap(), SubTile::BackLeft);
        assert!(grid.is_occupied(p));
    }

    #[test]
    fn occupied_only_when_all_four_filled() {
        let mut grid = Grid::new(1, 1).unwrap();
        let p = GridPosition::new(0, 0);
        for (i, id) in ["a", "b", "c"].iter().enumerate() {
            grid.set_occupant(obj(id), p, SubTile::from_index(i)).unwrap();
            assert!(!grid.is_occupied(p));
        }
        grid.set_occupant(Occupant::Character("Pip".into()), p, SubTile::FrontLeft)
            .unwrap();
        assert!(grid.is_occupied(p));
    }

    #[test]
    fn full_tile_overwrites_preferred_slot() {
        let mut grid = Grid::new(1, 1).unwrap();
        let p = GridPosition::new(0, 0);
        for id in ["a", "b", "c", "d"] {
            grid.set_occupant(obj(id), p, SubTile::FrontLeft).unwrap();
        }
        let slot = grid.set_occupant(obj("e"), p, SubTile::FrontLeft).unwrap();
        assert_eq!(slot, SubTile::FrontLeft);
        let tile = grid.tile(p).unwrap();
        assert_eq!(tile.occupant_count(), 4);
        assert_eq!(tile.occupant(SubTile::FrontLeft), Some(&obj("e")));
        assert!(grid.placement(&obj("a")).is_none());
    }

    #[test]
    fn moving_an_occupant_frees_its_old_slot() {
        let mut grid = Grid::new(2, 1).unwrap();
        let a = GridPosition::new(0, 0);
        let b = GridPosition::new(1, 0);
        grid.set_occupant(obj("box"), a, SubTile::FrontLeft).unwrap();
        grid.set_occupant(obj("box"), b, SubTile::FrontLeft).unwrap();
        assert_eq!(grid.tile(a).unwrap().occupant_count(), 0);
        assert_eq!(grid.placement(&obj("box")), Some((b, SubTile::FrontLeft)));
    }

    #[test]
    fn clear_occupant_returns_previous_placement() {
        let mut grid = Grid::new(1, 1).unwrap();
        let p = GridPosition::new(0, 0);
        grid.set_item(&ObjectId::new("gem"), p, SubTile::BackLeft).unwrap();
        assert_eq!(grid.clear_occupant(&obj("gem")), Some((p, SubTile::BackLeft)));
        assert_eq!(grid.clear_occupant(&obj("gem")), None);
        assert_eq!(grid.tile(p).unwrap().occupant_count(), 0);
    }
}
