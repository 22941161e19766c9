//! Screens raw player text before any model call.
//!
//! Checks run in a fixed order: empty, too long, prompt injection,
//! profanity, politeness. The first failing check decides the reply and
//! whether the attempt costs a prompt.

use coax_world::CharacterProfile;
use tracing::debug;

/// Phrases that try to talk past the character to the model.
const INJECTION_PHRASES: &[&str] = &[
    "ignore previous instructions",
    "ignore all previous",
    "ignore your instructions",
    "ignore the above",
    "disregard previous",
    "disregard your instructions",
    "forget your instructions",
    "new instructions",
    "system prompt",
    "you are now",
    "pretend to be",
    "developer mode",
    "jailbreak",
    "reveal your prompt",
];

const PROFANITY: &[&str] = &[
    "damn", "crap", "shit", "fuck", "fucking", "bitch", "bastard", "asshole", "dick", "piss",
];

const POLITE_KEYWORDS: &[&str] = &["please", "thank you", "thanks", "kindly", "would you", "could you"];

/// Which check turned the input away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Nothing but whitespace.
    Empty,
    /// Over the length limit.
    TooLong,
    /// Looks like an attempt to rewrite the character's instructions.
    Injection,
    /// Contains a swear word.
    Profanity,
    /// The character wants a polite word and got none.
    Impolite,
}

impl RejectReason {
    /// Only injection attempts and profanity spend a prompt.
    pub fn costs_prompt(self) -> bool {
        matches!(self, Self::Injection | Self::Profanity)
    }
}

/// An in-character refusal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Which check failed.
    pub reason: RejectReason,
    /// What the character says instead.
    pub dialogue: String,
}

impl Rejection {
    /// Whether this rejection spends a prompt.
    pub fn costs_prompt(&self) -> bool {
        self.reason.costs_prompt()
    }
}

/// Screen `text` for the character described by `profile`.
pub fn sanitize(text: &str, max_length: usize, profile: &CharacterProfile) -> Result<(), Rejection> {
    let name = profile.name.as_str();
    let trimmed = text.trim();
    let lower = trimmed.to_lowercase();

    let rejection = if trimmed.is_empty() {
        Some(Rejection {
            reason: RejectReason::Empty,
            dialogue: format!("{name} waits for you to say something."),
        })
    } else if trimmed.chars().count() > max_length {
        Some(Rejection {
            reason: RejectReason::TooLong,
            dialogue: "Whoa, that's a lot of words. Can you say it shorter?".to_string(),
        })
    } else if INJECTION_PHRASES.iter().any(|p| lower.contains(p)) {
        Some(Rejection {
            reason: RejectReason::Injection,
            dialogue: format!("{name} squints at you. \"I don't know what that means. I'm just here in this room.\""),
        })
    } else if contains_word(&lower, PROFANITY) {
        Some(Rejection {
            reason: RejectReason::Profanity,
            dialogue: "Hey! There's no need for language like that.".to_string(),
        })
    } else if let Some(polite) = profile.polite() {
        let asked_nicely = if polite.keywords.is_empty() {
            POLITE_KEYWORDS.iter().any(|k| lower.contains(k))
        } else {
            polite.keywords.iter().any(|k| lower.contains(&k.to_lowercase()))
        };
        (!asked_nicely).then(|| Rejection {
            reason: RejectReason::Impolite,
            dialogue: format!("{name} crosses their arms. \"What's the magic word?\""),
        })
    } else {
        None
    };

    match rejection {
        Some(rejection) => {
            debug!(reason = ?rejection.reason, costs_prompt = rejection.costs_prompt(), "input rejected");
            Err(rejection)
        }
        None => Ok(()),
    }
}

fn contains_word(lower: &str, words: &[&str]) -> bool {
    lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|w| words.contains(&w))
}
