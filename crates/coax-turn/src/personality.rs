//! Stateful per-character behavioral filters.
//!
//! Applied to the first action of a turn only, in a fixed order: stubborn,
//! distrustful, impatient. A filter that downgrades the action to `None`
//! leaves nothing for the later ones to act on.

use tracing::debug;

use crate::action::{ActionType, CharacterAction, Emotion};
use crate::room::Room;
use crate::state::TurnState;

const STUBBORN_LINE: &str = "Nope. I don't feel like doing that.";
const DISTRUST_LINE: &str = "Hmm. I think I'll go my own way.";
const TRUST_EARNED_LINE: &str = "...Fine. I suppose I can trust you now.";
const IMPATIENT_LINE: &str = "Not that again! Let's try something different.";

/// Run the profile's personality filters over `action`.
pub fn apply_personality(action: &mut CharacterAction, room: &Room, state: &mut TurnState) {
    apply_stubborn(action, room, state);
    apply_distrustful(action, room, state);
    apply_impatient(action, room, state);
}

fn apply_stubborn(action: &mut CharacterAction, room: &Room, state: &mut TurnState) {
    let Some(config) = room.profile.stubborn() else {
        return;
    };
    if matches!(action.action_type, ActionType::None | ActionType::Look) {
        return;
    }
    let attempts = state.stubborn_attempts.entry(action.action_type).or_insert(0);
    *attempts += 1;
    if *attempts <= config.refusal_count {
        debug!(action = %action.action_type, attempt = *attempts, "stubborn refusal");
        action.action_type = ActionType::None;
        action.dialogue = STUBBORN_LINE.to_string();
        action.emotion = Emotion::Annoyed;
    }
}

fn apply_distrustful(action: &mut CharacterAction, room: &Room, state: &mut TurnState) {
    let Some(config) = room.profile.distrustful() else {
        return;
    };
    if matches!(action.action_type, ActionType::None | ActionType::Look) {
        return;
    }
    if state.trust_counter >= config.trust_threshold {
        return;
    }

    let invertible = config.invert_before_trust
        && matches!(action.action_type, ActionType::Move | ActionType::MoveTo);
    if let Some(direction) = action.direction.filter(|_| invertible) {
        debug!(from = direction.name(), "distrustful inversion");
        action.direction = Some(direction.opposite());
        action.dialogue = DISTRUST_LINE.to_string();
    }

    state.trust_counter += 1;
    if state.trust_counter >= config.trust_threshold {
        action.append_dialogue(TRUST_EARNED_LINE);
    }
}

fn apply_impatient(action: &mut CharacterAction, room: &Room, state: &TurnState) {
    if !room.profile.is_impatient() || action.is_none() {
        return;
    }
    if state.last_action_type == Some(action.action_type) {
        debug!(action = %action.action_type, "impatient refusal");
        action.action_type = ActionType::None;
        action.dialogue = IMPATIENT_LINE.to_string();
        action.emotion = Emotion::Annoyed;
    }
}
