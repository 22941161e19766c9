//! Object name resolution with fuzzy matching.
//!
//! Shared by the validator and the executor so both settle on the same
//! object for the same text.

use coax_world::{GridObject, GridPosition, ObjectId};
use strsim::jaro_winkler;

use crate::room::Room;

/// Minimum similarity score for fuzzy matching (0.0-1.0).
const FUZZY_THRESHOLD: f64 = 0.8;

const ARTICLES: &[&str] = &["the", "a", "an", "that", "this", "my"];

/// Resolve target text to an object: exact ID, then display name, then the
/// character's private vocabulary.
pub fn resolve_target(room: &Room, input: &str) -> Option<ObjectId> {
    let cleaned = clean(input);
    if cleaned.is_empty() {
        return None;
    }
    if let Some(id) = resolve_name(room, &cleaned) {
        return Some(id);
    }
    let real = room.profile.vocabulary()?.real_name(&cleaned)?;
    resolve_name(room, &clean(real))
}

fn resolve_name(room: &Room, cleaned: &str) -> Option<ObjectId> {
    // IDs often use underscores where names use spaces.
    let as_id = cleaned.replace(' ', "_");
    if let Some(object) = room
        .objects
        .find_by_id_ignore_case(cleaned)
        .or_else(|| room.objects.find_by_id_ignore_case(&as_id))
    {
        return Some(object.id.clone());
    }

    let substring = room
        .objects
        .iter()
        .filter(|o| {
            let name = o.display_name.to_lowercase();
            name.contains(cleaned) || cleaned.contains(&name)
        })
        .min_by_key(|o| distance(room, o));
    if let Some(object) = substring {
        return Some(object.id.clone());
    }

    fuzzy_match(room, cleaned, FUZZY_THRESHOLD)
        .into_iter()
        .next()
        .map(|(id, _)| id)
}

/// Objects whose display name is similar to `input`, best first.
///
/// Equal scores are ordered by distance from the character.
pub fn fuzzy_match(room: &Room, input: &str, threshold: f64) -> Vec<(ObjectId, f64)> {
    let input_lower = input.to_lowercase();
    let mut matches: Vec<(ObjectId, f64, u32)> = room
        .objects
        .iter()
        .filter_map(|object| {
            let score = jaro_winkler(&input_lower, &object.display_name.to_lowercase());
            if score >= threshold {
                Some((object.id.clone(), score, distance(room, object)))
            } else {
                None
            }
        })
        .collect();

    matches.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.2.cmp(&b.2))
    });
    matches.into_iter().map(|(id, score, _)| (id, score)).collect()
}

/// Parse coordinate text as the character sees it, undoing a mirrored view.
pub fn resolve_coordinates(room: &Room, input: &str) -> Option<GridPosition> {
    let seen = GridPosition::parse(input)?;
    if room.profile.is_mirrored() {
        Some(GridPosition::new(room.grid.width() - 1 - seen.x, seen.y))
    } else {
        Some(seen)
    }
}

fn distance(room: &Room, object: &GridObject) -> u32 {
    if room.character.held.as_ref() == Some(&object.id) {
        0
    } else {
        object.position.manhattan(room.character.position)
    }
}

fn clean(input: &str) -> String {
    input
        .split_whitespace()
        .map(str::to_lowercase)
        .filter(|w| !ARTICLES.contains(&w.as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use coax_world::{
        Character, CharacterProfile, Grid, ObjectKind, ObjectRegistry, PerceptionQuirk, VocabularyConfig,
    };

    use super::*;

    fn room(profile: CharacterProfile) -> Room {
        let mut grid = Grid::from_rows(&["......", "......"]).unwrap();
        let mut objects = ObjectRegistry::new();
        for (id, name, x) in [
            ("far_key", "Brass Key", 5),
            ("near_key", "Brass Key", 1),
            ("ruby", "Ruby", 3),
            ("crate", "Wooden Crate", 4),
        ] {
            let kind = match id {
                "ruby" => ObjectKind::Gem { color: "red".into() },
                "crate" => ObjectKind::Box { weight: 1 },
                _ => ObjectKind::Key { opens: None },
            };
            objects
                .insert(GridObject::new(id, name, GridPosition::new(x, 0), kind), &mut grid)
                .unwrap();
        }
        Room::new(grid, objects, Character::new("Pip", GridPosition::new(0, 0)), profile).unwrap()
    }

    #[test]
    fn exact_id_wins() {
        let room = room(CharacterProfile::new("Pip"));
        assert_eq!(resolve_target(&room, "FAR_KEY"), Some(ObjectId::new("far_key")));
        assert_eq!(resolve_target(&room, "far key"), Some(ObjectId::new("far_key")));
    }

    #[test]
    fn substring_prefers_nearest() {
        let room = room(CharacterProfile::new("Pip"));
        assert_eq!(resolve_target(&room, "the key"), Some(ObjectId::new("near_key")));
        assert_eq!(resolve_target(&room, "crate"), Some(ObjectId::new("crate")));
        assert_eq!(resolve_target(&room, "the huge wooden crate"), Some(ObjectId::new("crate")));
    }

    #[test]
    fn fuzzy_catches_typos() {
        let room = room(CharacterProfile::new("Pip"));
        assert_eq!(resolve_target(&room, "rubby"), Some(ObjectId::new("ruby")));
        assert_eq!(resolve_target(&room, "lantern"), None);
        assert_eq!(resolve_target(&room, "  "), None);
    }

    #[test]
    fn reverse_vocabulary_lookup() {
        let profile = CharacterProfile::new("Pip").with_perception(PerceptionQuirk::OwnVocabulary(
            VocabularyConfig::default().with_term("ruby", "sparkle"),
        ));
        let room = room(profile);
        assert_eq!(resolve_target(&room, "the sparkle"), Some(ObjectId::new("ruby")));
    }

    #[test]
    fn mirrored_coordinates_flip_x() {
        let mut room = room(CharacterProfile::new("Pip"));
        assert_eq!(resolve_coordinates(&room, "1,1"), Some(GridPosition::new(1, 1)));
        room.profile = room.profile.clone().with_perception(PerceptionQuirk::MirroredView);
        assert_eq!(resolve_coordinates(&room, "(1, 1)"), Some(GridPosition::new(4, 1)));
        assert_eq!(resolve_coordinates(&room, "door"), None);
    }
}
