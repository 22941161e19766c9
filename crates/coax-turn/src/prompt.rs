//! Renders room, character, and hints into a model instruction.
//!
//! Everything the model learns about the room passes through the
//! character's perception: colorblind characters never see color words,
//! characters with their own vocabulary only see their own terms, and a
//! mirrored view flips the x axis. Help grows with the hint level.

use coax_world::{
    Comprehension, Direction, DirectionMode, GridObject, GridPosition, ObjectKind, PerceptionQuirk, PersonalityQuirk,
    TileType,
};

use crate::model::ModelRequest;
use crate::room::Room;
use crate::state::TurnState;

const SCHEMA: &str = r#"Reply with a single JSON object and nothing else:
{"dialogue": "what you say", "actions": [{"action": "move", "params": {"direction": "north", "steps": 1}}], "emotion": "neutral"}
Actions and their params:
- move: direction, steps
- move_to: target (a thing's name or "x,y")
- turn: direction
- look
- examine: target
- pick_up: target
- put_down
- use: target (what you hold), use_on (what to use it on)
- push: direction (you push a box you are standing on)
- open_close: target
- wait
- none (just talk)
Directions: north, south, east, west.
Emotions: confused, happy, annoyed, scared, neutral, proud, sad."#;

/// Builds model requests for one orchestrator.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    history_len: usize,
}

impl PromptBuilder {
    /// A builder rendering up to `history_len` past exchanges.
    pub fn new(history_len: usize) -> Self {
        Self { history_len }
    }

    /// The full request for a player message.
    pub fn request(&self, room: &Room, state: &TurnState, player_text: &str) -> ModelRequest {
        ModelRequest {
            system_prompt: self.system_prompt(room, state),
            user_message: player_text.trim().to_string(),
        }
    }

    /// The instruction describing who the character is and what it sees.
    pub fn system_prompt(&self, room: &Room, state: &TurnState) -> String {
        let profile = &room.profile;
        let hint = state.hint_escalation_level;
        let mut out = format!(
            "You are {}, a character in a small puzzle room. A player talks to you and you decide what to do. \
             Stay in character and keep dialogue short.\n\n",
            profile.name
        );
        out.push_str(SCHEMA);
        out.push_str("\n\n");

        out.push_str(comprehension_rule(profile.comprehension));
        out.push('\n');
        if let Some(rule) = direction_rule(profile.direction_mode) {
            out.push_str(rule);
            out.push('\n');
        }
        for quirk in &profile.personality {
            out.push_str(&personality_rule(quirk));
            out.push('\n');
        }

        out.push('\n');
        out.push_str(&describe_room(room));
        out.push_str(&describe_character(room));
        out.push_str(&describe_objects(room, hint >= 3));

        if hint >= 1 && !room.objectives.is_empty() {
            out.push_str("\nThe player seems stuck. Nudge them toward these goals:\n");
            for objective in &room.objectives {
                out.push_str(&format!("- {objective}\n"));
            }
        }
        if hint >= 2 {
            let quirks = explain_quirks(room);
            if !quirks.is_empty() {
                out.push_str("\nBe open about yourself. Tell the player plainly:\n");
                for line in quirks {
                    out.push_str(&format!("- {line}\n"));
                }
            }
        }
        if let Some(vocab) = profile.vocabulary().filter(|_| hint >= 3) {
            out.push_str("\nYour words for things (mention them if it helps):\n");
            for (real, own) in &vocab.mapping {
                out.push_str(&format!("- you call the {real} \"{own}\"\n"));
            }
        }

        let recall = profile
            .forgetful()
            .map_or(self.history_len, |f| f.memory_turns.min(self.history_len));
        let mut history = state.recent_history(recall).peekable();
        if history.peek().is_some() {
            out.push_str("\nRecent conversation:\n");
            for exchange in history {
                out.push_str(&format!("Player: {}\nYou: {}\n", exchange.player, exchange.reply));
            }
        }
        out
    }
}

fn comprehension_rule(comprehension: Comprehension) -> &'static str {
    match comprehension {
        Comprehension::Simple => {
            "You are a simple soul. Do exactly one action per turn. You do not understand move_to; \
             only walk with move in a compass direction."
        }
        Comprehension::Standard => "You can do up to 2 actions per turn.",
        Comprehension::Clever => "You are clever. You can do up to 5 actions per turn.",
    }
}

fn direction_rule(mode: DirectionMode) -> Option<&'static str> {
    match mode {
        DirectionMode::Absolute => None,
        DirectionMode::Relative => Some(
            "You think about directions from your own body: north is straight ahead, south is behind you, \
             east is your right and west is your left.",
        ),
        DirectionMode::InvertedLeftRight => Some("You tend to muddle east and west."),
        DirectionMode::InvertedNorthSouth => Some("You tend to muddle north and south."),
    }
}

fn personality_rule(quirk: &PersonalityQuirk) -> String {
    match quirk {
        PersonalityQuirk::Polite(_) => "You only help people who ask nicely.".to_string(),
        PersonalityQuirk::Stubborn(_) => "You are stubborn and dislike being asked to do something new.".to_string(),
        PersonalityQuirk::Unmotivated(c) => {
            format!("You are lazy. Never walk more than {} steps in a single move.", c.max_steps)
        }
        PersonalityQuirk::Impatient => "You get bored doing the same thing twice in a row.".to_string(),
        PersonalityQuirk::Distrustful(_) => "You do not trust the player yet.".to_string(),
        PersonalityQuirk::Forgetful(_) => "Your memory is short; older conversation slips away.".to_string(),
    }
}

fn explain_quirks(room: &Room) -> Vec<String> {
    let profile = &room.profile;
    let mut lines = Vec::new();
    match profile.comprehension {
        Comprehension::Simple => lines.push("you only understand one simple step at a time".to_string()),
        Comprehension::Standard => {}
        Comprehension::Clever => lines.push("you can follow long chains of instructions".to_string()),
    }
    match profile.direction_mode {
        DirectionMode::Absolute => {}
        DirectionMode::Relative => lines.push("you take directions relative to the way you face".to_string()),
        DirectionMode::InvertedLeftRight => lines.push("you swap east and west".to_string()),
        DirectionMode::InvertedNorthSouth => lines.push("you swap north and south".to_string()),
    }
    for quirk in &profile.perception {
        lines.push(match quirk {
            PerceptionQuirk::Colorblind(_) => "you cannot tell colors apart".to_string(),
            PerceptionQuirk::OwnVocabulary(_) => "you have your own names for some things".to_string(),
            PerceptionQuirk::MirroredView => "you see the room flipped left to right".to_string(),
            PerceptionQuirk::SizeDistortion(_) => "things look bigger or smaller to you than they are".to_string(),
        });
    }
    for quirk in &profile.personality {
        lines.push(match quirk {
            PersonalityQuirk::Polite(_) => "you need to hear 'please'".to_string(),
            PersonalityQuirk::Stubborn(c) => format!("you refuse a new kind of request {} time(s) first", c.refusal_count),
            PersonalityQuirk::Unmotivated(c) => format!("you never walk more than {} steps at once", c.max_steps),
            PersonalityQuirk::Impatient => "you won't do the same kind of thing twice in a row".to_string(),
            PersonalityQuirk::Distrustful(c) => format!(
                "you go the opposite way until you've been asked {} time(s)",
                c.trust_threshold
            ),
            PersonalityQuirk::Forgetful(c) => format!("you only remember the last {} exchanges", c.memory_turns),
        });
    }
    lines
}

fn seen(room: &Room, pos: GridPosition) -> GridPosition {
    if room.profile.is_mirrored() {
        GridPosition::new(room.grid.width() - 1 - pos.x, pos.y)
    } else {
        pos
    }
}

fn describe_room(room: &Room) -> String {
    let (w, h) = (room.grid.width(), room.grid.height());
    let mut out = format!(
        "The room is {w} tiles wide and {h} tiles deep. x counts from 0 at the west wall, \
         y counts from 0 at the south wall; north is y + 1.\n"
    );
    out.push_str("Map, north at the top (# wall, . floor, D closed door, / open door, E exit, x closed exit, P plate, S pedestal, @ you):\n");
    let me = seen(room, room.character.position);
    for y in (0..h).rev() {
        for x in 0..w {
            let shown = GridPosition::new(x, y);
            let actual = seen(room, shown);
            let symbol = if shown == me {
                '@'
            } else {
                match room.grid.tile(actual) {
                    Some(tile) => match tile.tile_type {
                        TileType::Floor => '.',
                        TileType::Wall => '#',
                        TileType::Door if tile.is_open => '/',
                        TileType::Door => 'D',
                        TileType::Exit if tile.is_open => 'E',
                        TileType::Exit => 'x',
                        TileType::PressurePlate => 'P',
                        TileType::Pedestal => 'S',
                    },
                    None => ' ',
                }
            };
            out.push(symbol);
        }
        out.push('\n');
    }
    out
}

fn describe_character(room: &Room) -> String {
    let me = seen(room, room.character.position);
    let facing = if room.profile.is_mirrored() {
        match room.character.facing {
            Direction::East => Direction::West,
            Direction::West => Direction::East,
            other => other,
        }
    } else {
        room.character.facing
    };
    let holding = room
        .held_object()
        .map_or_else(|| "nothing".to_string(), |o| format!("the {}", perceived_name(room, o)));
    format!(
        "\nYou are at {me}, facing {}. You are holding {holding}.\n",
        facing.name()
    )
}

fn describe_objects(room: &Room, exact: bool) -> String {
    let visible: Vec<&GridObject> = room.objects.iter().filter(|o| !o.carried).collect();
    if visible.is_empty() {
        return "You see nothing of interest.\n".to_string();
    }
    let me = seen(room, room.character.position);
    let mut out = "Things in the room:\n".to_string();
    for object in visible {
        let at = seen(room, object.position);
        let place = if exact {
            format!("at {at} (id: {})", object.id)
        } else {
            relative_place(me, at)
        };
        out.push_str(&format!("- {} {place}{}\n", perceived_name(room, object), state_note(room, object)));
    }
    out
}

fn relative_place(me: GridPosition, at: GridPosition) -> String {
    let dx = at.x - me.x;
    let dy = at.y - me.y;
    if dx == 0 && dy == 0 {
        return "right where you stand".to_string();
    }
    let mut parts = Vec::new();
    if dy != 0 {
        let dir = if dy > 0 { "north" } else { "south" };
        parts.push(format!("{} {dir}", tiles(dy.abs())));
    }
    if dx != 0 {
        let dir = if dx > 0 { "east" } else { "west" };
        parts.push(format!("{} {dir}", tiles(dx.abs())));
    }
    format!("{} of you", parts.join(" and "))
}

fn tiles(n: i32) -> String {
    if n == 1 { "1 tile".to_string() } else { format!("{n} tiles") }
}

fn state_note(room: &Room, object: &GridObject) -> String {
    match &object.kind {
        ObjectKind::Door { locked: true, .. } => " (locked)".to_string(),
        ObjectKind::Door { open: true, .. } => " (open)".to_string(),
        ObjectKind::Door { .. } => " (closed)".to_string(),
        ObjectKind::Pedestal { placed: Some(gem), .. } => {
            let name = room
                .objects
                .get(gem)
                .map_or_else(|| gem.to_string(), |g| perceived_name(room, g));
            format!(" (holding the {name})")
        }
        ObjectKind::Pedestal { placed: None, .. } => " (empty)".to_string(),
        ObjectKind::PressurePlate { pressed: true, .. } => " (pressed)".to_string(),
        _ => String::new(),
    }
}

/// The name an object has in the character's eyes.
pub fn perceived_name(room: &Room, object: &GridObject) -> String {
    let profile = &room.profile;
    if let Some(own) = profile.vocabulary().and_then(|v| {
        v.own_term(&object.display_name)
            .or_else(|| v.own_term(&object.id.as_str().replace('_', " ")))
    }) {
        return own.to_string();
    }

    let mut name = object.display_name.clone();
    if let Some(colorblind) = profile.colorblind() {
        let kept: Vec<&str> = name
            .split_whitespace()
            .filter(|w| !colorblind.color_words.iter().any(|c| c.eq_ignore_ascii_case(w)))
            .collect();
        name = if kept.is_empty() {
            object.kind.label().to_string()
        } else {
            kept.join(" ")
        };
    }
    if let (Some(distortion), ObjectKind::Box { .. }) = (profile.size_distortion(), &object.kind) {
        if distortion.scale > 1.0 {
            name = format!("huge {name}");
        } else if distortion.scale < 1.0 {
            name = format!("tiny {name}");
        }
    }
    name
}
