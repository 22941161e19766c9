//! Checks actions against the live room.
//!
//! Every check either leaves the action alone, rewrites it into something
//! the executor can carry out directly (resolved object IDs, a truncated
//! step count, a locked door turned into a key use), or downgrades it to
//! `None` with a line explaining why.

use coax_world::{Comprehension, GridObject, GridPosition, ObjectId, ObjectKind, pathfinding};
use tracing::debug;

use crate::action::{ActionType, CharacterAction, Emotion};
use crate::parser::{resolve_coordinates, resolve_target};
use crate::prompt::perceived_name;
use crate::room::Room;

type Check = Result<(), String>;

/// Validate `action` in place.
pub fn validate(action: &mut CharacterAction, room: &Room) {
    if room.profile.comprehension == Comprehension::Simple && action.action_type == ActionType::MoveTo {
        refuse(
            action,
            "That's too complicated for me. Just tell me which way to walk: north, south, east or west.".into(),
        );
        return;
    }

    let verdict = match action.action_type {
        ActionType::None | ActionType::Look | ActionType::Wait => Ok(()),
        ActionType::Move => check_move(action, room),
        ActionType::MoveTo => check_move_to(action, room),
        ActionType::Turn => check_turn(action),
        ActionType::Examine => check_examine(action, room),
        ActionType::PickUp => check_pick_up(action, room),
        ActionType::PutDown => check_put_down(room),
        ActionType::Use => check_use(action, room),
        ActionType::Push => check_push(action, room),
        ActionType::OpenClose => check_open_close(action, room),
    };

    if let Err(line) = verdict {
        refuse(action, line);
    }
}

fn refuse(action: &mut CharacterAction, line: String) {
    debug!(action = %action.action_type, reason = %line, "action downgraded");
    action.refuse(line);
    action.emotion = Emotion::Confused;
}

fn check_move(action: &mut CharacterAction, room: &Room) -> Check {
    let stated = action.direction.ok_or("Which way should I go?")?;
    if let Some(lazy) = room.profile.unmotivated() {
        action.steps = action.steps.min(lazy.max_steps.max(1));
    }
    let heading = room.effective_direction(stated);
    let start = room.character.position;

    let mut clear = 0;
    for k in 1..=action.steps {
        let next = start.offset(heading, k as i32);
        if !room.grid.is_walkable(next) || room.grid.is_occupied(next) {
            break;
        }
        clear = k;
    }
    if clear == 0 {
        return Err(format!("I can't go {}. Something's in the way.", stated.name()));
    }
    if clear < action.steps {
        debug!(requested = action.steps, allowed = clear, "move truncated");
        action.steps = clear;
    }
    Ok(())
}

fn check_move_to(action: &mut CharacterAction, room: &Room) -> Check {
    let target = action.target.clone().ok_or("Where should I go?")?;
    let goal = match resolve_coordinates(room, &target) {
        Some(pos) if room.grid.in_bounds(pos) => pos,
        Some(_) => return Err("That's outside the room!".into()),
        None => {
            let object = resolve_object(room, &target)?;
            action.target = Some(object.id.to_string());
            object.position
        }
    };
    let destination = approach_tile(room, goal).ok_or("I can't find a way there.")?;
    action.destination = Some(destination);
    Ok(())
}

fn check_turn(action: &CharacterAction) -> Check {
    action.direction.map(|_| ()).ok_or_else(|| "Turn which way?".into())
}

fn check_examine(action: &mut CharacterAction, room: &Room) -> Check {
    if let Some(target) = action.target.clone() {
        let object = resolve_object(room, &target)?;
        action.target = Some(object.id.to_string());
    }
    Ok(())
}

fn check_pick_up(action: &mut CharacterAction, room: &Room) -> Check {
    let object = match action.target.clone() {
        Some(target) => resolve_object(room, &target)?,
        None => room
            .objects
            .nearest(room.character.position, |o| o.capabilities().can_pick_up)
            .ok_or("There's nothing here to pick up.")?,
    };
    let name = perceived_name(room, object);
    if room.character.held.as_ref() == Some(&object.id) {
        return Err(format!("I'm already holding the {name}."));
    }
    if !object.capabilities().can_pick_up {
        return Err(format!("I can't pick up the {name}."));
    }
    if room.character.hands_full() {
        return Err("My hands are full.".into());
    }
    check_reach(room, object.position)?;
    action.target = Some(object.id.to_string());
    Ok(())
}

fn check_put_down(room: &Room) -> Check {
    room.held_object()
        .map(|_| ())
        .ok_or_else(|| "I'm not holding anything.".into())
}

fn check_use(action: &mut CharacterAction, room: &Room) -> Check {
    let held = room.held_object().ok_or("I'm not holding anything to use.")?;
    let mut recipient_text = action.use_on.clone();

    if let Some(target) = action.target.clone() {
        match resolve_target(room, &target) {
            Some(id) if id == held.id => {}
            Some(_) | None if recipient_text.is_none() => recipient_text = Some(target),
            Some(_) => return Err(format!("I'm not holding that. I only have the {}.", perceived_name(room, held))),
            None => return Err(unknown(&target)),
        }
    }

    let recipient = match recipient_text {
        Some(text) => resolve_object(room, &text)?,
        None => default_recipient(room, held).ok_or("What should I use it on?")?,
    };
    if recipient.id == held.id || !recipient.capabilities().can_use_item_on {
        return Err(format!(
            "I can't use the {} on the {}.",
            perceived_name(room, held),
            perceived_name(room, recipient)
        ));
    }
    check_reach(room, recipient.position)?;

    action.target = Some(held.id.to_string());
    action.use_on = Some(recipient.id.to_string());
    Ok(())
}

fn check_push(action: &mut CharacterAction, room: &Room) -> Check {
    let here = room.character.position;
    let pushable = room
        .objects
        .pushable_at(here)
        .ok_or("There's nothing here to push. I have to stand on it first.")?;
    let named = action.target.as_deref().and_then(|t| resolve_target(room, t));
    if named.is_some_and(|id| id != pushable.id) {
        return Err("I'd have to be standing on that to push it.".into());
    }

    let heading = action
        .direction
        .map_or(room.character.facing, |d| room.effective_direction(d));
    let destination = here.offset(heading, 1);
    if !room.grid.is_walkable(destination)
        || room.grid.is_occupied(destination)
        || room.objects.is_blocked_for_objects(destination)
    {
        return Err(format!(
            "The {} won't budge. Something's blocking it.",
            perceived_name(room, pushable)
        ));
    }
    action.target = Some(pushable.id.to_string());
    Ok(())
}

fn check_open_close(action: &mut CharacterAction, room: &Room) -> Check {
    let door = match action.target.clone() {
        Some(target) => resolve_object(room, &target)?,
        None => room
            .objects
            .nearest_door(room.character.position)
            .ok_or("There's no door here.")?,
    };
    let name = perceived_name(room, door);
    if !door.capabilities().can_open_close {
        return Err(format!("I can't open or close the {name}."));
    }

    if door.is_locked_door() {
        let key = room
            .held_object()
            .filter(|k| key_fits(k, &door.id))
            .ok_or_else(|| format!("The {name} is locked. I'll need a key."))?;
        check_reach(room, door.position)?;
        debug!(door = %door.id, key = %key.id, "locked door rewritten to key use");
        action.action_type = ActionType::Use;
        action.target = Some(key.id.to_string());
        action.use_on = Some(door.id.to_string());
        return Ok(());
    }

    check_reach(room, door.position)?;
    action.target = Some(door.id.to_string());
    Ok(())
}

fn resolve_object<'a>(room: &'a Room, text: &str) -> Result<&'a GridObject, String> {
    resolve_target(room, text)
        .and_then(|id| room.objects.get(&id))
        .ok_or_else(|| unknown(text))
}

fn unknown(text: &str) -> String {
    format!("I don't see any {} around here.", text.trim())
}

fn check_reach(room: &Room, target: GridPosition) -> Check {
    if room.character.is_within_one(target) {
        return Ok(());
    }
    if room.profile.comprehension == Comprehension::Simple {
        return Err("That's too far away. Tell me which way to walk first.".into());
    }
    approach_tile(room, target)
        .map(|_| ())
        .ok_or_else(|| "I can't reach that from here.".into())
}

/// What the held item is most likely meant for when no recipient is named:
/// a door for a key, a pedestal for a gem.
pub(crate) fn default_recipient<'a>(room: &'a Room, held: &GridObject) -> Option<&'a GridObject> {
    let from = room.character.position;
    match held.kind {
        ObjectKind::Key { .. } => room
            .objects
            .nearest(from, |o| o.is_locked_door() && key_fits(held, &o.id))
            .or_else(|| room.objects.nearest(from, GridObject::is_door)),
        ObjectKind::Gem { .. } => room
            .objects
            .nearest(from, |o| matches!(o.kind, ObjectKind::Pedestal { placed: None, .. })),
        _ => None,
    }
}

/// True if `key` is a key that opens `door`. Keys without a named door open any.
pub(crate) fn key_fits(key: &GridObject, door: &ObjectId) -> bool {
    match &key.kind {
        ObjectKind::Key { opens } => opens.as_ref().is_none_or(|o| o == door),
        _ => false,
    }
}

/// The walkable tile to head for when going to `goal`: the goal itself if it
/// can be reached, otherwise its closest reachable walkable neighbor.
///
/// Occupancy is ignored so a crowded tile does not hide a route.
pub(crate) fn approach_tile(room: &Room, goal: GridPosition) -> Option<GridPosition> {
    let start = room.character.position;
    if room.grid.is_walkable(goal) && pathfinding::path_exists(&room.grid, start, goal, true) {
        return Some(goal);
    }
    room.grid
        .walkable_neighbors(goal)
        .into_iter()
        .filter_map(|n| {
            let distance = pathfinding::path_distance(&room.grid, start, n, true);
            (distance >= 0).then_some((distance, n))
        })
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, n)| n)
}
