//! Mutable per-level turn counters.

use std::collections::{HashMap, VecDeque};

use crate::action::ActionType;

/// One remembered exchange between player and character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    /// What the player said.
    pub player: String,
    /// What the character answered.
    pub reply: String,
}

/// Counters owned by the orchestrator, reset when a level (re)starts.
#[derive(Debug, Clone, Default)]
pub struct TurnState {
    /// Monotonic within a level.
    pub hint_escalation_level: u32,
    /// Distrustful quirk progress.
    pub trust_counter: u32,
    /// Stubborn quirk attempts per action type.
    pub stubborn_attempts: HashMap<ActionType, u32>,
    /// First action type of the previous turn.
    pub last_action_type: Option<ActionType>,
    history: VecDeque<Exchange>,
}

const HISTORY_CAP: usize = 32;

impl TurnState {
    /// Fresh counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear everything for a new or restarted level.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Raise the hint level by one and return the new level.
    pub fn escalate_hint(&mut self) -> u32 {
        self.hint_escalation_level = self.hint_escalation_level.saturating_add(1);
        self.hint_escalation_level
    }

    /// Remember an exchange, dropping the oldest past a fixed cap.
    pub fn record_exchange(&mut self, player: impl Into<String>, reply: impl Into<String>) {
        if self.history.len() == HISTORY_CAP {
            self.history.pop_front();
        }
        self.history.push_back(Exchange {
            player: player.into(),
            reply: reply.into(),
        });
    }

    /// The most recent `n` exchanges, oldest first.
    pub fn recent_history(&self, n: usize) -> impl Iterator<Item = &Exchange> {
        let skip = self.history.len().saturating_sub(n);
        self.history.iter().skip(skip)
    }
}
