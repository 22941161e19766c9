use crate::error::{WorldError, WorldResult};
use crate::grid::{Grid, Occupant, SubTile};
use crate::object::{GridObject, ObjectId, ObjectKind};
use crate::position::GridPosition;

/// Owns every interactable object in a room, in level-data order.
#[derive(Debug, Clone, Default)]
pub struct ObjectRegistry {
    objects: Vec<GridObject>,
}

impl ObjectRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an object and place it on the grid.
    pub fn insert(&mut self, object: GridObject, grid: &mut Grid) -> WorldResult<()> {
        if self.contains(&object.id) {
            return Err(WorldError::DuplicateObject(object.id));
        }
        if !object.carried {
            grid.set_item(&object.id, object.position, SubTile::BackLeft)?;
        }
        if let ObjectKind::Door { open, .. } = object.kind {
            grid.set_open(object.position, open)?;
        }
        self.objects.push(object);
        Ok(())
    }

    /// Remove an object entirely, e.g. a key used up on a door.
    pub fn remove(&mut self, id: &ObjectId, grid: &mut Grid) -> WorldResult<GridObject> {
        let index = self
            .objects
            .iter()
            .position(|o| &o.id == id)
            .ok_or_else(|| WorldError::ObjectNotFound(id.clone()))?;
        grid.clear_occupant(&Occupant::Object(id.clone()));
        Ok(self.objects.remove(index))
    }

    /// True if the ID is registered.
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.objects.iter().any(|o| &o.id == id)
    }

    /// Look up an object by exact ID.
    pub fn get(&self, id: &ObjectId) -> Option<&GridObject> {
        self.objects.iter().find(|o| &o.id == id)
    }

    /// Mutable lookup by exact ID.
    pub fn get_mut(&mut self, id: &ObjectId) -> Option<&mut GridObject> {
        self.objects.iter_mut().find(|o| &o.id == id)
    }

    /// Look up by ID ignoring ASCII case.
    pub fn find_by_id_ignore_case(&self, id: &str) -> Option<&GridObject> {
        let id = id.trim();
        self.objects.iter().find(|o| o.id.as_str().eq_ignore_ascii_case(id))
    }

    /// All objects in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &GridObject> {
        self.objects.iter()
    }

    /// Number of registered objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Uncarried objects resting on `pos`.
    pub fn objects_at(&self, pos: GridPosition) -> impl Iterator<Item = &GridObject> {
        self.objects
            .iter()
            .filter(move |o| !o.carried && o.position == pos)
    }

    /// Uncarried objects within `radius` (Manhattan) of `pos`.
    pub fn objects_within(&self, pos: GridPosition, radius: u32) -> Vec<&GridObject> {
        self.objects
            .iter()
            .filter(|o| !o.carried && o.position.manhattan(pos) <= radius)
            .collect()
    }

    /// A pushable box resting on `pos`.
    pub fn pushable_at(&self, pos: GridPosition) -> Option<&GridObject> {
        self.objects_at(pos).find(|o| o.capabilities().can_push)
    }

    /// True if an object on `pos` stops pushed objects.
    pub fn is_blocked_for_objects(&self, pos: GridPosition) -> bool {
        self.objects_at(pos).any(|o| o.capabilities().blocks_movement)
    }

    /// All doors in registration order.
    pub fn doors(&self) -> impl Iterator<Item = &GridObject> {
        self.objects.iter().filter(|o| o.is_door())
    }

    /// The door closest to `from`, earlier-registered first on ties.
    pub fn nearest_door(&self, from: GridPosition) -> Option<&GridObject> {
        self.doors().min_by_key(|o| o.position.manhattan(from))
    }

    /// The uncarried object matching `filter` closest to `from`.
    ///
    /// Ties go to the earlier-registered object.
    pub fn nearest<F>(&self, from: GridPosition, filter: F) -> Option<&GridObject>
    where
        F: Fn(&GridObject) -> bool,
    {
        self.objects
            .iter()
            .filter(|o| !o.carried && filter(o))
            .min_by_key(|o| o.position.manhattan(from))
    }

    /// Take an object off the grid into a character's hands.
    pub fn pick_up(&mut self, id: &ObjectId, grid: &mut Grid) -> WorldResult<()> {
        let object = self
            .get_mut(id)
            .ok_or_else(|| WorldError::ObjectNotFound(id.clone()))?;
        if !object.capabilities().can_pick_up {
            return Err(WorldError::WrongKind {
                id: id.clone(),
                expected: "portable item",
            });
        }
        object.carried = true;
        grid.clear_occupant(&Occupant::Object(id.clone()));
        Ok(())
    }

    /// Put a carried object down on `pos`.
    pub fn put_down(&mut self, id: &ObjectId, pos: GridPosition, grid: &mut Grid) -> WorldResult<SubTile> {
        let object = self
            .get_mut(id)
            .ok_or_else(|| WorldError::ObjectNotFound(id.clone()))?;
        object.carried = false;
        object.position = pos;
        grid.set_item(id, pos, SubTile::FrontRight)
    }

    /// Shove a box onto `to`, failing if the tile cannot take it.
    pub fn push_box(&mut self, id: &ObjectId, to: GridPosition, grid: &mut Grid) -> WorldResult<()> {
        if !grid.is_walkable(to) || self.is_blocked_for_objects(to) {
            return Err(WorldError::Blocked(to));
        }
        let object = self
            .get_mut(id)
            .ok_or_else(|| WorldError::ObjectNotFound(id.clone()))?;
        if !object.capabilities().can_push {
            return Err(WorldError::WrongKind {
                id: id.clone(),
                expected: "box",
            });
        }
        object.position = to;
        grid.set_item(id, to, SubTile::BackLeft)?;
        Ok(())
    }

    /// Set a door's open state and mirror it onto its tile.
    ///
    /// Locked doors never open this way.
    pub fn set_door_open(&mut self, id: &ObjectId, open: bool, grid: &mut Grid) -> WorldResult<bool> {
        let object = self
            .get_mut(id)
            .ok_or_else(|| WorldError::ObjectNotFound(id.clone()))?;
        let pos = object.position;
        match &mut object.kind {
            ObjectKind::Door { locked, open: state } => {
                if *locked && open {
                    return Ok(false);
                }
                *state = open;
            }
            _ => {
                return Err(WorldError::WrongKind {
                    id: id.clone(),
                    expected: "door",
                });
            }
        }
        grid.set_open(pos, open)?;
        Ok(true)
    }

    /// Unlock and open a door.
    pub fn unlock_door(&mut self, id: &ObjectId, grid: &mut Grid) -> WorldResult<()> {
        match self.get_mut(id).map(|o| &mut o.kind) {
            Some(ObjectKind::Door { locked, .. }) => *locked = false,
            Some(_) => {
                return Err(WorldError::WrongKind {
                    id: id.clone(),
                    expected: "door",
                });
            }
            None => return Err(WorldError::ObjectNotFound(id.clone())),
        }
        self.set_door_open(id, true, grid)?;
        Ok(())
    }

    /// Recompute every pressure plate against `weighted` tiles and drive the
    /// linked doors. Returns the IDs of plates whose state changed.
    pub fn update_pressure_plates(
        &mut self,
        weighted: &[GridPosition],
        grid: &mut Grid,
    ) -> WorldResult<Vec<ObjectId>> {
        let box_tiles: Vec<GridPosition> = self
            .objects
            .iter()
            .filter(|o| !o.carried && o.capabilities().can_push)
            .map(|o| o.position)
            .collect();

        let mut changed = Vec::new();
        let mut doors = Vec::new();
        for object in &mut self.objects {
            if let ObjectKind::PressurePlate { linked, pressed } = &mut object.kind {
                let now = weighted.contains(&object.position) || box_tiles.contains(&object.position);
                if now != *pressed {
                    *pressed = now;
                    changed.push(object.id.clone());
                    if let Some(door) = linked {
                        doors.push((door.clone(), now));
                    }
                }
            }
        }
        for (door, open) in doors {
            self.set_door_open(&door, open, grid)?;
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room() -> (Grid, ObjectRegistry) {
        let mut grid = Grid::from_rows(&["....", "..D.", "P..."]).unwrap();
        let mut reg = ObjectRegistry::new();
        reg.insert(
            GridObject::new("red_key", "Red Key", GridPosition::new(0, 0), ObjectKind::Key { opens: None }),
            &mut grid,
        )
        .unwrap();
        reg.insert(
            GridObject::new("crate", "Wooden Crate", GridPosition::new(1, 0), ObjectKind::Box { weight: 2 }),
            &mut grid,
        )
        .unwrap();
        reg.insert(
            GridObject::new(
                "door",
                "Oak Door",
                GridPosition::new(2, 1),
                ObjectKind::Door {
                    locked: false,
                    open: false,
                },
            ),
            &mut grid,
        )
        .unwrap();
        reg.insert(
            GridObject::new(
                "plate",
                "Plate",
                GridPosition::new(0, 2),
                ObjectKind::PressurePlate {
                    linked: Some(ObjectId::new("door")),
                    pressed: false,
                },
            ),
            &mut grid,
        )
        .unwrap();
        (grid, reg)
    }

    #[test]
    fn insert_places_on_grid_and_rejects_duplicates() {
        let (mut grid, mut reg) = room();
        assert_eq!(reg.len(), 4);
        assert_eq!(grid.tile(GridPosition::new(0, 0)).unwrap().occupant_count(), 1);
        let dup = GridObject::new("crate", "Another", GridPosition::new(3, 0), ObjectKind::Box { weight: 1 });
        assert!(matches!(reg.insert(dup, &mut grid), Err(WorldError::DuplicateObject(_))));
    }

    #[test]
    fn lookup_ignores_case() {
        let (_, reg) = room();
        assert_eq!(reg.find_by_id_ignore_case("RED_KEY").unwrap().display_name, "Red Key");
        assert!(reg.find_by_id_ignore_case("blue_key").is_none());
    }

    #[test]
    fn pick_up_and_put_down() {
        let (mut grid, mut reg) = room();
        let key = ObjectId::new("red_key");
        reg.pick_up(&key, &mut grid).unwrap();
        assert!(reg.get(&key).unwrap().carried);
        assert_eq!(reg.objects_at(GridPosition::new(0, 0)).count(), 0);
        assert_eq!(grid.tile(GridPosition::new(0, 0)).unwrap().occupant_count(), 0);

        reg.put_down(&key, GridPosition::new(3, 0), &mut grid).unwrap();
        assert_eq!(reg.objects_at(GridPosition::new(3, 0)).count(), 1);
    }

    #[test]
    fn nearest_door_picks_the_closer_one() {
        let (mut grid, mut reg) = room();
        assert!(reg.nearest_door(GridPosition::new(0, 0)).is_some_and(|d| d.id.as_str() == "door"));

        let back = GridObject::new(
            "back_door",
            "Back Door",
            GridPosition::new(0, 1),
            ObjectKind::Door {
                locked: true,
                open: false,
            },
        );
        reg.insert(back, &mut grid).unwrap();
        assert_eq!(reg.doors().count(), 2);
        assert_eq!(reg.nearest_door(GridPosition::new(0, 0)).unwrap().id.as_str(), "back_door");
        assert_eq!(reg.nearest_door(GridPosition::new(3, 1)).unwrap().id.as_str(), "door");
    }

    #[test]
    fn boxes_cannot_be_picked_up() {
        let (mut grid, mut reg) = room();
        assert!(reg.pick_up(&ObjectId::new("crate"), &mut grid).is_err());
    }

    #[test]
    fn push_box_into_closed_door_fails() {
        let (mut grid, mut reg) = room();
        let crate_id = ObjectId::new("crate");
        reg.push_box(&crate_id, GridPosition::new(1, 1), &mut grid).unwrap();
        let result = reg.push_box(&crate_id, GridPosition::new(2, 1), &mut grid);
        assert!(matches!(result, Err(WorldError::Blocked(_))));
        assert_eq!(reg.get(&crate_id).unwrap().position, GridPosition::new(1, 1));
    }

    #[test]
    fn locked_door_does_not_open_by_toggle() {
        let mut grid = Grid::from_rows(&["D"]).unwrap();
        let mut reg = ObjectRegistry::new();
        let id = ObjectId::new("vault");
        reg.insert(
            GridObject::new(
                "vault",
                "Vault",
                GridPosition::new(0, 0),
                ObjectKind::Door {
                    locked: true,
                    open: false,
                },
            ),
            &mut grid,
        )
        .unwrap();
        assert!(!reg.set_door_open(&id, true, &mut grid).unwrap());
        assert!(!grid.is_walkable(GridPosition::new(0, 0)));

        reg.unlock_door(&id, &mut grid).unwrap();
        assert!(grid.is_walkable(GridPosition::new(0, 0)));
    }

    #[test]
    fn pressure_plate_drives_linked_door() {
        let (mut grid, mut reg) = room();
        let door_tile = GridPosition::new(2, 1);
        let changed = reg
            .update_pressure_plates(&[GridPosition::new(0, 2)], &mut grid)
            .unwrap();
        assert_eq!(changed, vec![ObjectId::new("plate")]);
        assert!(grid.is_walkable(door_tile));

        let changed = reg.update_pressure_plates(&[], &mut grid).unwrap();
        assert_eq!(changed.len(), 1);
        assert!(!grid.is_walkable(door_tile));
    }

    #[test]
    fn nearest_prefers_closest_then_registration_order() {
        let (_, reg) = room();
        let found = reg.nearest(GridPosition::new(3, 0), |o| o.capabilities().can_push || o.capabilities().can_pick_up);
        assert_eq!(found.unwrap().id, ObjectId::new("crate"));
        assert!(reg.nearest(GridPosition::new(0, 0), |o| o.display_name == "nothing").is_none());
    }
}
