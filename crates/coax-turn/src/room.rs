//! The live room a turn operates on.
//!
//! Bundles the grid, the objects in it, and the character being coaxed,
//! so pipeline stages receive one explicit context instead of reaching
//! for shared globals.

use coax_world::{
    Character, CharacterProfile, Direction, Grid, GridObject, ObjectId, ObjectKind, ObjectRegistry,
    TileType, WorldResult,
};

/// Grid, objects, character, and the level's objectives.
#[derive(Debug, Clone)]
pub struct Room {
    /// Tiles and occupancy.
    pub grid: Grid,
    /// Interactable objects.
    pub objects: ObjectRegistry,
    /// The character's live state.
    pub character: Character,
    /// The character's fixed configuration.
    pub profile: CharacterProfile,
    /// Goals shown to the character as hints.
    pub objectives: Vec<String>,
}

impl Room {
    /// Assemble a room and place the character on the grid.
    pub fn new(
        mut grid: Grid,
        objects: ObjectRegistry,
        character: Character,
        profile: CharacterProfile,
    ) -> WorldResult<Self> {
        character.place(&mut grid)?;
        let mut room = Self {
            grid,
            objects,
            character,
            profile,
            objectives: Vec::new(),
        };
        room.refresh_exits()?;
        Ok(room)
    }

    /// Set the level objectives.
    pub fn with_objectives<I, S>(mut self, objectives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.objectives = objectives.into_iter().map(Into::into).collect();
        self
    }

    /// The object in the character's hands.
    pub fn held_object(&self) -> Option<&GridObject> {
        self.character.held.as_ref().and_then(|id| self.objects.get(id))
    }

    /// Map a stated direction through the character's direction mode.
    pub fn effective_direction(&self, stated: Direction) -> Direction {
        self.profile
            .direction_mode
            .apply(stated, self.character.facing)
    }

    /// True once every pedestal holds the gem it accepts.
    pub fn pedestals_complete(&self) -> bool {
        self.objects.iter().all(|o| match &o.kind {
            ObjectKind::Pedestal { accepts, placed } => placed.as_ref() == Some(accepts),
            _ => true,
        })
    }

    /// Open exit tiles once the pedestals are complete.
    ///
    /// A room without pedestals has its exits open from the start.
    pub fn refresh_exits(&mut self) -> WorldResult<bool> {
        if !self.pedestals_complete() {
            return Ok(false);
        }
        let closed: Vec<_> = self
            .grid
            .tiles()
            .filter(|t| t.tile_type == TileType::Exit && !t.is_open)
            .map(|t| t.position)
            .collect();
        for pos in &closed {
            self.grid.set_open(*pos, true)?;
        }
        Ok(!closed.is_empty())
    }

    /// Re-evaluate pressure plates under the character and any boxes.
    pub fn settle_plates(&mut self) -> WorldResult<Vec<ObjectId>> {
        let weighted = [self.character.position];
        self.objects.update_pressure_plates(&weighted, &mut self.grid)
    }

    /// Keep a held object's position on its carrier.
    pub fn sync_held(&mut self) {
        let pos = self.character.position;
        let objects = &mut self.objects;
        if let Some(object) = self.character.held.as_ref().and_then(|id| objects.get_mut(id)) {
            object.position = pos;
        }
    }

    /// True if the character stands on an open exit.
    pub fn on_open_exit(&self) -> bool {
        self.grid
            .tile(self.character.position)
            .is_some_and(|t| t.tile_type == TileType::Exit && t.is_open)
    }
}
