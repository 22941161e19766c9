//! Per-level character configuration.
//!
//! A profile is fixed for the length of a level. Mutable counters driven by
//! quirks live in the turn pipeline's state, not here.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::direction::DirectionMode;

/// How much a character can take in per turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comprehension {
    /// One action per turn, no walking to named targets.
    Simple,
    /// Two actions per turn.
    #[default]
    Standard,
    /// Five actions per turn.
    Clever,
}

impl Comprehension {
    /// Maximum chained actions per turn.
    pub fn max_actions(self) -> usize {
        match self {
            Self::Simple => 1,
            Self::Standard => 2,
            Self::Clever => 5,
        }
    }
}

/// Colors the character cannot tell apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorblindConfig {
    /// Color words hidden from the character's view.
    #[serde(default = "default_color_words")]
    pub color_words: Vec<String>,
}

fn default_color_words() -> Vec<String> {
    ["red", "green", "blue", "yellow", "purple", "orange"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for ColorblindConfig {
    fn default() -> Self {
        Self {
            color_words: default_color_words(),
        }
    }
}

/// The character's private names for things.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyConfig {
    /// Real name (lowercase) to the character's own term.
    pub mapping: BTreeMap<String, String>,
}

impl VocabularyConfig {
    /// Add a real-name to own-term pair.
    pub fn with_term(mut self, real: impl Into<String>, own: impl Into<String>) -> Self {
        self.mapping.insert(real.into().to_lowercase(), own.into());
        self
    }

    /// The character's term for a real name.
    pub fn own_term(&self, real: &str) -> Option<&str> {
        let real = real.trim();
        self.mapping
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(real))
            .map(|(_, term)| term.as_str())
    }

    /// The real name behind one of the character's terms.
    pub fn real_name(&self, own: &str) -> Option<&str> {
        let own = own.trim();
        self.mapping
            .iter()
            .find(|(_, term)| term.eq_ignore_ascii_case(own))
            .map(|(real, _)| real.as_str())
    }

    /// Real names that appear as whole words in `text`, with their own terms.
    pub fn real_names_in<'a>(&'a self, text: &str) -> Vec<(&'a str, &'a str)> {
        let words: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect();
        self.mapping
            .iter()
            .filter(|(real, _)| contains_phrase(&words, real))
            .map(|(real, own)| (real.as_str(), own.as_str()))
            .collect()
    }
}

fn contains_phrase(words: &[String], phrase: &str) -> bool {
    let needle: Vec<String> = phrase.split_whitespace().map(str::to_lowercase).collect();
    if needle.is_empty() || needle.len() > words.len() {
        return false;
    }
    words
        .windows(needle.len())
        .any(|w| w.iter().zip(&needle).all(|(a, b)| a == b))
}

/// Objects appear larger or smaller than they are.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeDistortionConfig {
    /// Apparent size multiplier; above 1 looks huge, below 1 looks tiny.
    pub scale: f32,
}

/// How a character perceives the room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "quirk", rename_all = "snake_case")]
pub enum PerceptionQuirk {
    /// Cannot see colors.
    Colorblind(ColorblindConfig),
    /// Uses private names for objects.
    OwnVocabulary(VocabularyConfig),
    /// Sees the room left-right mirrored.
    MirroredView,
    /// Misjudges object sizes.
    SizeDistortion(SizeDistortionConfig),
}

/// Words that count as asking nicely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoliteConfig {
    /// Accepted keywords; empty means the built-in list.
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Refuses each new kind of request a few times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StubbornConfig {
    /// Attempts refused per action type.
    pub refusal_count: u32,
}

/// Does the bare minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmotivatedConfig {
    /// Most tiles walked in one move.
    pub max_steps: u32,
}

/// Does the opposite until trust is earned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistrustfulConfig {
    /// Actions needed before the character trusts the player.
    pub trust_threshold: u32,
    /// Whether movement is inverted while trust is low.
    #[serde(default = "default_true")]
    pub invert_before_trust: bool,
}

fn default_true() -> bool {
    true
}

/// Remembers only recent conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForgetfulConfig {
    /// Past exchanges the character recalls.
    pub memory_turns: usize,
}

/// How a character behaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "quirk", rename_all = "snake_case")]
pub enum PersonalityQuirk {
    /// Ignores requests without a polite word.
    Polite(PoliteConfig),
    /// Refuses new kinds of requests at first.
    Stubborn(StubbornConfig),
    /// Walks only a few tiles at a time.
    Unmotivated(UnmotivatedConfig),
    /// Will not do the same thing twice in a row.
    Impatient,
    /// Inverts movement until trust is earned.
    Distrustful(DistrustfulConfig),
    /// Forgets older conversation.
    Forgetful(ForgetfulConfig),
}

/// Immutable per-level description of the character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterProfile {
    /// Character name.
    pub name: String,
    /// Actions per turn and targeting ability.
    #[serde(default)]
    pub comprehension: Comprehension,
    /// How directions are interpreted.
    #[serde(default)]
    pub direction_mode: DirectionMode,
    /// Perception quirks.
    #[serde(default)]
    pub perception: Vec<PerceptionQuirk>,
    /// Personality quirks, at most one of each kind.
    #[serde(default)]
    pub personality: Vec<PersonalityQuirk>,
}

impl CharacterProfile {
    /// A standard, quirk-free profile.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comprehension: Comprehension::Standard,
            direction_mode: DirectionMode::Absolute,
            perception: Vec::new(),
            personality: Vec::new(),
        }
    }

    /// Set comprehension.
    pub fn with_comprehension(mut self, comprehension: Comprehension) -> Self {
        self.comprehension = comprehension;
        self
    }

    /// Set direction mode.
    pub fn with_direction_mode(mut self, mode: DirectionMode) -> Self {
        self.direction_mode = mode;
        self
    }

    /// Add a perception quirk.
    pub fn with_perception(mut self, quirk: PerceptionQuirk) -> Self {
        self.perception.push(quirk);
        self
    }

    /// Add a personality quirk, replacing any of the same kind.
    pub fn with_personality(mut self, quirk: PersonalityQuirk) -> Self {
        let kind = std::mem::discriminant(&quirk);
        self.personality.retain(|q| std::mem::discriminant(q) != kind);
        self.personality.push(quirk);
        self
    }

    /// Polite quirk config.
    pub fn polite(&self) -> Option<&PoliteConfig> {
        self.personality.iter().find_map(|q| match q {
            PersonalityQuirk::Polite(c) => Some(c),
            _ => None,
        })
    }

    /// Stubborn quirk config.
    pub fn stubborn(&self) -> Option<StubbornConfig> {
        self.personality.iter().find_map(|q| match q {
            PersonalityQuirk::Stubborn(c) => Some(*c),
            _ => None,
        })
    }

    /// Unmotivated quirk config.
    pub fn unmotivated(&self) -> Option<UnmotivatedConfig> {
        self.personality.iter().find_map(|q| match q {
            PersonalityQuirk::Unmotivated(c) => Some(*c),
            _ => None,
        })
    }

    /// True if the character is impatient.
    pub fn is_impatient(&self) -> bool {
        self.personality
            .iter()
            .any(|q| matches!(q, PersonalityQuirk::Impatient))
    }

    /// Distrustful quirk config.
    pub fn distrustful(&self) -> Option<DistrustfulConfig> {
        self.personality.iter().find_map(|q| match q {
            PersonalityQuirk::Distrustful(c) => Some(*c),
            _ => None,
        })
    }

    /// Forgetful quirk config.
    pub fn forgetful(&self) -> Option<ForgetfulConfig> {
        self.personality.iter().find_map(|q| match q {
            PersonalityQuirk::Forgetful(c) => Some(*c),
            _ => None,
        })
    }

    /// Vocabulary mapping, if the character has one.
    pub fn vocabulary(&self) -> Option<&VocabularyConfig> {
        self.perception.iter().find_map(|q| match q {
            PerceptionQuirk::OwnVocabulary(c) => Some(c),
            _ => None,
        })
    }

    /// Colorblind config.
    pub fn colorblind(&self) -> Option<&ColorblindConfig> {
        self.perception.iter().find_map(|q| match q {
            PerceptionQuirk::Colorblind(c) => Some(c),
            _ => None,
        })
    }

    /// True if the character sees the room mirrored.
    pub fn is_mirrored(&self) -> bool {
        self.perception
            .iter()
            .any(|q| matches!(q, PerceptionQuirk::MirroredView))
    }

    /// Size distortion config.
    pub fn size_distortion(&self) -> Option<SizeDistortionConfig> {
        self.perception.iter().find_map(|q| match q {
            PerceptionQuirk::SizeDistortion(c) => Some(*c),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comprehension_limits() {
        assert_eq!(Comprehension::Simple.max_actions(), 1);
        assert_eq!(Comprehension::Standard.max_actions(), 2);
        assert_eq!(Comprehension::Clever.max_actions(), 5);
    }

    #[test]
    fn vocabulary_lookups() {
        let vocab = VocabularyConfig::default()
            .with_term("Ruby", "sparkle")
            .with_term("wooden crate", "big square");
        assert_eq!(vocab.own_term("ruby"), Some("sparkle"));
        assert_eq!(vocab.real_name("Sparkle"), Some("ruby"));
        assert_eq!(vocab.real_name("ruby"), None);
    }

    #[test]
    fn vocabulary_finds_whole_word_mentions() {
        let vocab = VocabularyConfig::default()
            .with_term("Ruby", "sparkle")
            .with_term("wooden crate", "big square");
        assert_eq!(vocab.real_names_in("Grab the Ruby, please!"), vec![("ruby", "sparkle")]);
        assert!(vocab.real_names_in("rubycon is not a word here").is_empty());
        assert_eq!(
            vocab.real_names_in("push the wooden crate"),
            vec![("wooden crate", "big square")]
        );
    }

    #[test]
    fn one_quirk_per_kind() {
        let profile = CharacterProfile::new("Mo")
            .with_personality(PersonalityQuirk::Stubborn(StubbornConfig { refusal_count: 1 }))
            .with_personality(PersonalityQuirk::Stubborn(StubbornConfig { refusal_count: 3 }))
            .with_personality(PersonalityQuirk::Impatient);
        assert_eq!(profile.personality.len(), 2);
        assert_eq!(profile.stubborn().unwrap().refusal_count, 3);
        assert!(profile.is_impatient());
        assert!(profile.distrustful().is_none());
    }

    #[test]
    fn deserialize_profile() {
        let json = r#"{
            "name": "Bramble",
            "comprehension": "simple",
            "direction_mode": "relative",
            "perception": [{"quirk": "mirrored_view"}],
            "personality": [{"quirk": "distrustful", "trust_threshold": 2}]
        }"#;
        let profile: CharacterProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.comprehension, Comprehension::Simple);
        assert_eq!(profile.direction_mode, DirectionMode::Relative);
        assert!(profile.is_mirrored());
        let distrust = profile.distrustful().unwrap();
        assert_eq!(distrust.trust_threshold, 2);
        assert!(distrust.invert_before_trust);
    }
}
