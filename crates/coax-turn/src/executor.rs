//! Carries out validated actions against the room.
//!
//! Execution is synchronous; the visible playback (walking animation and
//! the like) happens afterwards through an [`ActionPresenter`], which the
//! orchestrator awaits with a timeout.

use async_trait::async_trait;
use coax_world::{GridObject, GridPosition, ObjectId, ObjectKind, TileType, pathfinding};
use tracing::{debug, info};

use crate::action::{ActionType, CharacterAction};
use crate::error::TurnResult;
use crate::parser::{resolve_coordinates, resolve_target};
use crate::prompt::perceived_name;
use crate::room::Room;
use crate::validator::{approach_tile, default_recipient, key_fits};

/// What one action did to the room.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionReport {
    /// Kind of action carried out.
    pub action_type: ActionType,
    /// Tiles the character occupied, starting tile first.
    pub path: Vec<GridPosition>,
    /// Objects whose state changed.
    pub changed: Vec<ObjectId>,
    /// Something the character says about the outcome.
    pub message: Option<String>,
    /// Whether the intended effect happened.
    pub succeeded: bool,
    /// The character stepped onto an open exit.
    pub reached_exit: bool,
}

impl ActionReport {
    fn start(action_type: ActionType, at: GridPosition) -> Self {
        Self {
            action_type,
            path: vec![at],
            ..Self::default()
        }
    }

    fn fail(&mut self, line: impl Into<String>) {
        let line = line.into();
        debug!(action = %self.action_type, reason = %line, "action failed during execution");
        self.succeeded = false;
        self.message = Some(line);
    }

    fn changed(&mut self, id: &ObjectId) {
        if !self.changed.contains(id) {
            self.changed.push(id.clone());
        }
    }
}

/// Plays back an executed action; returns once the playback has finished.
#[async_trait]
pub trait ActionPresenter: Send + Sync {
    /// Show `report` to the player.
    async fn present(&self, action: &CharacterAction, report: &ActionReport);
}

/// A presenter with nothing to show.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediatePresenter;

#[async_trait]
impl ActionPresenter for ImmediatePresenter {
    async fn present(&self, _action: &CharacterAction, _report: &ActionReport) {}
}

/// Carry out one validated action.
pub fn execute(action: &CharacterAction, room: &mut Room) -> TurnResult<ActionReport> {
    let mut report = ActionReport::start(action.action_type, room.character.position);
    match action.action_type {
        ActionType::None | ActionType::Wait => report.succeeded = true,
        ActionType::Look => {
            report.message = Some(describe_surroundings(room));
            report.succeeded = true;
        }
        ActionType::Examine => execute_examine(action, room, &mut report),
        ActionType::Move => execute_move(action, room, &mut report)?,
        ActionType::MoveTo => execute_move_to(action, room, &mut report)?,
        ActionType::Turn => match action.direction {
            Some(stated) => {
                room.character.facing = room.effective_direction(stated);
                report.succeeded = true;
            }
            None => report.fail("Turn which way?"),
        },
        ActionType::PickUp => execute_pick_up(action, room, &mut report)?,
        ActionType::PutDown => execute_put_down(room, &mut report)?,
        ActionType::Use => execute_use(action, room, &mut report)?,
        ActionType::Push => execute_push(action, room, &mut report)?,
        ActionType::OpenClose => execute_open_close(action, room, &mut report)?,
    }

    for id in room.settle_plates()? {
        report.changed(&id);
    }
    room.refresh_exits()?;
    info!(
        action = %report.action_type,
        succeeded = report.succeeded,
        steps = report.path.len().saturating_sub(1),
        "action executed"
    );
    Ok(report)
}

fn execute_move(action: &CharacterAction, room: &mut Room, report: &mut ActionReport) -> TurnResult<()> {
    let Some(stated) = action.direction else {
        report.fail("Which way should I go?");
        return Ok(());
    };
    let heading = room.effective_direction(stated);
    let start = room.character.position;
    let mut path = vec![start];
    for k in 1..=action.steps.max(1) {
        let next = start.offset(heading, k as i32);
        if !room.grid.is_walkable(next) || room.grid.is_occupied(next) {
            break;
        }
        path.push(next);
    }
    if path.len() == 1 {
        room.character.facing = heading;
        report.fail(format!("I can't go {}.", stated.name()));
        return Ok(());
    }
    walk(room, &path, report)?;
    report.succeeded = true;
    Ok(())
}

fn execute_move_to(action: &CharacterAction, room: &mut Room, report: &mut ActionReport) -> TurnResult<()> {
    let goal = action.destination.or_else(|| {
        let target = action.target.as_deref()?;
        let pos = resolve_coordinates(room, target)
            .or_else(|| resolve_target(room, target).and_then(|id| room.objects.get(&id).map(|o| o.position)))?;
        approach_tile(room, pos)
    });
    let Some(goal) = goal else {
        report.fail("I can't find a way there.");
        return Ok(());
    };
    if walk_to(room, goal, report)? {
        report.succeeded = true;
    } else {
        report.fail("I couldn't find a way there.");
    }
    Ok(())
}

fn execute_examine(action: &CharacterAction, room: &Room, report: &mut ActionReport) {
    let described = action
        .target
        .as_deref()
        .and_then(|t| resolve_target(room, t))
        .and_then(|id| room.objects.get(&id))
        .map(|object| describe_object(room, object));
    match described {
        Some(text) => {
            report.message = Some(text);
            report.succeeded = true;
        }
        None if action.target.is_none() => {
            report.message = Some(describe_surroundings(room));
            report.succeeded = true;
        }
        None => report.fail("I can't find that."),
    }
}

fn execute_pick_up(action: &CharacterAction, room: &mut Room, report: &mut ActionReport) -> TurnResult<()> {
    let Some(object) = target_object(room, action.target.as_deref()) else {
        report.fail("I can't find that.");
        return Ok(());
    };
    if !object.capabilities().can_pick_up || object.carried {
        report.fail(format!("I can't pick up the {}.", perceived_name(room, &object)));
        return Ok(());
    }
    if !approach(room, object.position, report)? {
        report.fail("I can't get to it.");
        return Ok(());
    }
    if room.character.hands_full() {
        report.fail("My hands are full now.");
        return Ok(());
    }
    room.objects.pick_up(&object.id, &mut room.grid)?;
    room.character.held = Some(object.id.clone());
    room.sync_held();
    report.changed(&object.id);
    report.succeeded = true;
    Ok(())
}

fn execute_put_down(room: &mut Room, report: &mut ActionReport) -> TurnResult<()> {
    let Some(id) = room.character.held.take() else {
        report.fail("I'm not holding anything.");
        return Ok(());
    };
    room.objects.put_down(&id, room.character.position, &mut room.grid)?;
    report.changed(&id);
    report.succeeded = true;
    Ok(())
}

fn execute_use(action: &CharacterAction, room: &mut Room, report: &mut ActionReport) -> TurnResult<()> {
    let Some(item) = room.held_object().cloned() else {
        report.fail("I'm not holding anything to use.");
        return Ok(());
    };
    let recipient = target_object(room, action.use_on.as_deref())
        .or_else(|| default_recipient(room, &item).cloned());
    let Some(recipient) = recipient else {
        report.fail("I don't know what to use it on.");
        return Ok(());
    };
    if !approach(room, recipient.position, report)? {
        report.fail("I can't get close enough.");
        return Ok(());
    }
    if room.character.held.as_ref() != Some(&item.id) {
        report.fail("I'm not holding it anymore.");
        return Ok(());
    }

    match (&item.kind, &recipient.kind) {
        (ObjectKind::Key { .. }, ObjectKind::Door { locked, open }) => {
            if !key_fits(&item, &recipient.id) {
                report.fail(format!("The {} doesn't fit.", perceived_name(room, &item)));
            } else if *locked {
                room.objects.unlock_door(&recipient.id, &mut room.grid)?;
                room.objects.remove(&item.id, &mut room.grid)?;
                room.character.held = None;
                info!(door = %recipient.id, key = %item.id, "door unlocked");
                report.changed(&recipient.id);
                report.changed(&item.id);
                report.succeeded = true;
            } else if !*open {
                room.objects.set_door_open(&recipient.id, true, &mut room.grid)?;
                report.changed(&recipient.id);
                report.succeeded = true;
            } else {
                report.fail(format!("The {} is already open.", perceived_name(room, &recipient)));
            }
        }
        (ObjectKind::Gem { .. }, ObjectKind::Pedestal { accepts, placed }) => {
            if placed.is_some() {
                report.fail(format!("Something's already on the {}.", perceived_name(room, &recipient)));
            } else if accepts != &item.id {
                report.fail(format!(
                    "The {} doesn't belong on the {}.",
                    perceived_name(room, &item),
                    perceived_name(room, &recipient)
                ));
            } else {
                room.objects.put_down(&item.id, recipient.position, &mut room.grid)?;
                if let Some(ObjectKind::Pedestal { placed, .. }) =
                    room.objects.get_mut(&recipient.id).map(|o| &mut o.kind)
                {
                    *placed = Some(item.id.clone());
                }
                room.character.held = None;
                info!(pedestal = %recipient.id, gem = %item.id, "gem placed");
                report.changed(&recipient.id);
                report.changed(&item.id);
                report.succeeded = true;
            }
        }
        _ => report.fail("Nothing happens."),
    }
    Ok(())
}

fn execute_push(action: &CharacterAction, room: &mut Room, report: &mut ActionReport) -> TurnResult<()> {
    let here = room.character.position;
    let Some(pushed) = room.objects.pushable_at(here).map(|o| o.id.clone()) else {
        report.fail("There's nothing here to push.");
        return Ok(());
    };
    let heading = action
        .direction
        .map_or(room.character.facing, |d| room.effective_direction(d));
    let destination = here.offset(heading, 1);
    if !room.grid.is_walkable(destination)
        || room.grid.is_occupied(destination)
        || room.objects.is_blocked_for_objects(destination)
    {
        report.fail("It won't budge.");
        return Ok(());
    }
    room.objects.push_box(&pushed, destination, &mut room.grid)?;
    report.changed(&pushed);
    walk(room, &[here, destination], report)?;
    report.succeeded = true;
    Ok(())
}

fn execute_open_close(action: &CharacterAction, room: &mut Room, report: &mut ActionReport) -> TurnResult<()> {
    let door = target_object(room, action.target.as_deref()).or_else(|| {
        room.objects
            .nearest_door(room.character.position)
            .cloned()
    });
    let Some(door) = door else {
        report.fail("There's no door here.");
        return Ok(());
    };
    let ObjectKind::Door { open, .. } = door.kind else {
        report.fail("That doesn't open.");
        return Ok(());
    };
    if !approach(room, door.position, report)? {
        report.fail("I can't get to it.");
        return Ok(());
    }
    if open && room.character.position == door.position {
        report.fail("I can't close it while I'm standing in the doorway.");
        return Ok(());
    }
    if room.objects.set_door_open(&door.id, !open, &mut room.grid)? {
        report.changed(&door.id);
        report.succeeded = true;
    } else {
        report.fail(format!("The {} is locked.", perceived_name(room, &door)));
    }
    Ok(())
}

fn target_object(room: &Room, text: Option<&str>) -> Option<GridObject> {
    let id = resolve_target(room, text?)?;
    room.objects.get(&id).cloned()
}

/// Walk next to `target` unless already there. Returns whether the
/// character ended up within reach.
fn approach(room: &mut Room, target: GridPosition, report: &mut ActionReport) -> TurnResult<bool> {
    if room.character.is_within_one(target) {
        return Ok(true);
    }
    let Some(goal) = approach_tile(room, target) else {
        return Ok(false);
    };
    walk_to(room, goal, report)?;
    Ok(room.character.is_within_one(target))
}

/// Walk to `goal`, preferring a route around crowded tiles.
fn walk_to(room: &mut Room, goal: GridPosition, report: &mut ActionReport) -> TurnResult<bool> {
    let start = room.character.position;
    let mut path = pathfinding::find_path(&room.grid, start, goal, false);
    if path.is_empty() {
        path = pathfinding::find_path(&room.grid, start, goal, true);
    }
    if path.is_empty() {
        return Ok(false);
    }
    walk(room, &path, report)?;
    Ok(room.character.position == goal)
}

/// Step along `path` (which starts at the current tile), pressing plates on
/// the way and stopping on an open exit.
fn walk(room: &mut Room, path: &[GridPosition], report: &mut ActionReport) -> TurnResult<()> {
    for &step in path.iter().skip(1) {
        room.character.move_to(step, &mut room.grid)?;
        room.sync_held();
        report.path.push(step);
        for id in room.settle_plates()? {
            report.changed(&id);
        }
        if room.on_open_exit() {
            info!(position = %step, "exit reached");
            report.reached_exit = true;
            break;
        }
    }
    Ok(())
}

fn describe_surroundings(room: &Room) -> String {
    let here = room.character.position;
    let nearby: Vec<String> = room
        .objects
        .objects_within(here, 3)
        .into_iter()
        .map(|o| perceived_name(room, o))
        .collect();
    let exit_near = here
        .neighbors()
        .into_iter()
        .chain(std::iter::once(here))
        .any(|p| room.grid.tile(p).is_some_and(|t| t.tile_type == TileType::Exit));
    let mut line = match nearby.as_slice() {
        [] => "Nothing much around here.".to_string(),
        [one] => format!("I see the {one}."),
        [rest @ .., last] => format!("I see the {} and the {last}.", rest.join(", the ")),
    };
    if exit_near {
        line.push_str(" The exit is right here.");
    }
    line
}

fn describe_object(room: &Room, object: &GridObject) -> String {
    let name = perceived_name(room, object);
    match &object.kind {
        ObjectKind::Key { .. } => format!("The {name}. Looks like it opens something."),
        ObjectKind::Gem { .. } => format!("The {name}. It sparkles."),
        ObjectKind::Box { .. } => format!("The {name}. I could push it if I stood on it."),
        ObjectKind::Door { locked: true, .. } => format!("The {name} is locked."),
        ObjectKind::Door { open: true, .. } => format!("The {name} is open."),
        ObjectKind::Door { .. } => format!("The {name} is closed."),
        ObjectKind::Pedestal { placed: Some(gem), .. } => {
            let gem = room
                .objects
                .get(gem)
                .map_or_else(|| gem.to_string(), |g| perceived_name(room, g));
            format!("The {name} holds the {gem}.")
        }
        ObjectKind::Pedestal { placed: None, .. } => format!("The {name} is empty. Something could go here."),
        ObjectKind::PressurePlate { pressed: true, .. } => format!("The {name} is pressed down."),
        ObjectKind::PressurePlate { .. } => format!("The {name} is set into the floor."),
    }
}

#[cfg(test)]
mod tests {
    use coax_world::{Character, CharacterProfile, Direction, DirectionMode, Grid, ObjectRegistry};

    use super::*;

    /// ```text
    /// y=2  . S . E
    /// y=1  . . D .
    /// y=0  . . . P
    /// ```
    fn room(profile: CharacterProfile) -> Room {
        let mut grid = Grid::from_rows(&["...P", "..D.", ".S.E"]).unwrap();
        let mut objects = ObjectRegistry::new();
        let things = [
            GridObject::new("key", "Brass Key", GridPosition::new(2, 0), ObjectKind::Key { opens: None }),
            GridObject::new("ruby", "Ruby", GridPosition::new(0, 1), ObjectKind::Gem { color: "red".into() }),
            GridObject::new("crate", "Crate", GridPosition::new(1, 0), ObjectKind::Box { weight: 1 }),
            GridObject::new(
                "door",
                "Oak Door",
                GridPosition::new(2, 1),
                ObjectKind::Door {
                    locked: true,
                    open: false,
                },
            ),
            GridObject::new(
                "altar",
                "Altar",
                GridPosition::new(1, 2),
                ObjectKind::Pedestal {
                    accepts: ObjectId::new("ruby"),
                    placed: None,
                },
            ),
            GridObject::new(
                "plate",
                "Plate",
                GridPosition::new(3, 0),
                ObjectKind::PressurePlate {
                    linked: None,
                    pressed: false,
                },
            ),
        ];
        for thing in things {
            objects.insert(thing, &mut grid).unwrap();
        }
        Room::new(grid, objects, Character::new("Pip", GridPosition::new(0, 0)), profile).unwrap()
    }

    fn standard() -> Room {
        room(CharacterProfile::new("Pip"))
    }

    fn pick_up(room: &mut Room, target: &str) -> ActionReport {
        execute(&CharacterAction::new(ActionType::PickUp).with_target(target), room).unwrap()
    }

    #[test]
    fn move_walks_and_reports_path() {
        let mut room = standard();
        let action = CharacterAction::new(ActionType::Move)
            .with_direction(Direction::North)
            .with_steps(2);
        let report = execute(&action, &mut room).unwrap();
        assert!(report.succeeded);
        assert_eq!(
            report.path,
            vec![GridPosition::new(0, 0), GridPosition::new(0, 1), GridPosition::new(0, 2)]
        );
        assert_eq!(room.character.position, GridPosition::new(0, 2));
        assert_eq!(room.character.facing, Direction::North);
    }

    #[test]
    fn relative_move_follows_facing() {
        let mut room = room(CharacterProfile::new("Pip").with_direction_mode(DirectionMode::Relative));
        room.character.facing = Direction::East;
        let action = CharacterAction::new(ActionType::Move).with_direction(Direction::North);
        execute(&action, &mut room).unwrap();
        assert_eq!(room.character.position, GridPosition::new(1, 0));
    }

    #[test]
    fn pick_up_walks_over_first() {
        let mut room = standard();
        let report = pick_up(&mut room, "key");
        assert!(report.succeeded);
        assert_eq!(room.character.held, Some(ObjectId::new("key")));
        assert!(room.character.is_within_one(GridPosition::new(2, 0)));
        assert!(room.objects.get(&ObjectId::new("key")).unwrap().carried);
    }

    #[test]
    fn pick_up_with_full_hands_fails_after_arriving() {
        let mut room = standard();
        pick_up(&mut room, "ruby");
        let report = pick_up(&mut room, "key");
        assert!(!report.succeeded);
        assert_eq!(report.message.as_deref(), Some("My hands are full now."));
        assert_eq!(room.character.held, Some(ObjectId::new("ruby")));
    }

    #[test]
    fn key_unlocks_door_and_is_consumed() {
        let mut room = standard();
        pick_up(&mut room, "key");
        let action = CharacterAction::new(ActionType::Use).with_target("key").with_use_on("door");
        let report = execute(&action, &mut room).unwrap();
        assert!(report.succeeded);
        assert!(room.grid.is_walkable(GridPosition::new(2, 1)));
        assert!(room.character.held.is_none());
        assert!(!room.objects.contains(&ObjectId::new("key")));
        assert!(report.changed.contains(&ObjectId::new("door")));
    }

    #[test]
    fn use_without_recipient_finds_a_door() {
        let mut room = standard();
        pick_up(&mut room, "key");
        let report = execute(&CharacterAction::new(ActionType::Use), &mut room).unwrap();
        assert!(report.succeeded);
        assert!(!room.objects.get(&ObjectId::new("door")).unwrap().is_locked_door());
    }

    #[test]
    fn gem_on_pedestal_opens_exit() {
        let mut room = standard();
        let exit = GridPosition::new(3, 2);
        assert!(!room.grid.is_walkable(exit));

        pick_up(&mut room, "ruby");
        let action = CharacterAction::new(ActionType::Use).with_use_on("altar");
        let report = execute(&action, &mut room).unwrap();
        assert!(report.succeeded);
        assert!(room.character.held.is_none());
        assert!(room.grid.is_walkable(exit));
        let ruby = room.objects.get(&ObjectId::new("ruby")).unwrap();
        assert!(!ruby.carried);
        assert_eq!(ruby.position, GridPosition::new(1, 2));
    }

    #[test]
    fn wrong_item_leaves_state_alone() {
        let mut room = standard();
        pick_up(&mut room, "key");
        let report = execute(&CharacterAction::new(ActionType::Use).with_use_on("altar"), &mut room).unwrap();
        assert!(!report.succeeded);
        assert_eq!(report.message.as_deref(), Some("Nothing happens."));
        assert_eq!(room.character.held, Some(ObjectId::new("key")));
    }

    #[test]
    fn push_moves_box_and_character() {
        let mut room = standard();
        room.character.move_to(GridPosition::new(1, 0), &mut room.grid).unwrap();
        let action = CharacterAction::new(ActionType::Push).with_direction(Direction::East);
        let report = execute(&action, &mut room).unwrap();
        assert!(report.succeeded);
        assert_eq!(room.objects.get(&ObjectId::new("crate")).unwrap().position, GridPosition::new(2, 0));
        assert_eq!(room.character.position, GridPosition::new(2, 0));
    }

    #[test]
    fn box_on_plate_presses_it() {
        let mut room = standard();
        room.character.move_to(GridPosition::new(1, 0), &mut room.grid).unwrap();
        let east = CharacterAction::new(ActionType::Push).with_direction(Direction::East);
        execute(&east, &mut room).unwrap();
        let report = execute(&east, &mut room).unwrap();
        assert!(report.changed.contains(&ObjectId::new("plate")));
        assert!(matches!(
            room.objects.get(&ObjectId::new("plate")).unwrap().kind,
            ObjectKind::PressurePlate { pressed: true, .. }
        ));
    }

    #[test]
    fn open_close_never_unlocks() {
        let mut room = standard();
        let action = CharacterAction::new(ActionType::OpenClose).with_target("door");
        let report = execute(&action, &mut room).unwrap();
        assert!(!report.succeeded);
        assert!(!room.grid.is_walkable(GridPosition::new(2, 1)));
    }

    #[test]
    fn open_close_toggles_unlocked_door() {
        let mut room = standard();
        if let Some(ObjectKind::Door { locked, .. }) = room.objects.get_mut(&ObjectId::new("door")).map(|o| &mut o.kind) {
            *locked = false;
        }
        let action = CharacterAction::new(ActionType::OpenClose).with_target("door");
        assert!(execute(&action, &mut room).unwrap().succeeded);
        assert!(room.grid.is_walkable(GridPosition::new(2, 1)));
        assert!(execute(&action, &mut room).unwrap().succeeded);
        assert!(!room.grid.is_walkable(GridPosition::new(2, 1)));
    }

    #[test]
    fn walking_onto_open_exit_is_reported() {
        let mut room = standard();
        room.grid.set_open(GridPosition::new(3, 2), true).unwrap();
        let action = CharacterAction {
            destination: Some(GridPosition::new(3, 2)),
            ..CharacterAction::new(ActionType::MoveTo)
        };
        let report = execute(&action, &mut room).unwrap();
        assert!(report.reached_exit);
        assert_eq!(room.character.position, GridPosition::new(3, 2));
    }

    #[test]
    fn look_and_examine_describe_without_changes() {
        let mut room = standard();
        let look = execute(&CharacterAction::new(ActionType::Look), &mut room).unwrap();
        assert!(look.message.unwrap().contains("Crate"));
        let examine = execute(&CharacterAction::new(ActionType::Examine).with_target("door"), &mut room).unwrap();
        assert_eq!(examine.message.as_deref(), Some("The Oak Door is locked."));
        assert_eq!(room.character.position, GridPosition::new(0, 0));
    }
}
