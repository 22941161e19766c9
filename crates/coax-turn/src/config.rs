//! Configuration for the turn pipeline.

use std::time::Duration;

/// Tunables for one orchestrator.
#[derive(Debug, Clone)]
pub struct TurnConfig {
    /// Longest accepted player message, in characters.
    pub max_input_length: usize,
    /// Model call attempts before giving up on rate limits.
    pub max_model_attempts: u32,
    /// Backoff unit; attempt `n` waits `n` times this after a rate limit.
    pub retry_backoff_step: Duration,
    /// Upper bound on a single model call.
    pub model_timeout: Duration,
    /// How long to wait for an action's animation to finish.
    pub action_timeout: Duration,
    /// Pause between chained actions.
    pub action_pacing: Duration,
    /// Characters of raw model text shown when parsing fails.
    pub fallback_dialogue_len: usize,
    /// Past exchanges included in the prompt.
    pub history_len: usize,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            max_input_length: 200,
            max_model_attempts: 3,
            retry_backoff_step: Duration::from_secs(2),
            model_timeout: Duration::from_secs(30),
            action_timeout: Duration::from_secs(15),
            action_pacing: Duration::ZERO,
            fallback_dialogue_len: 150,
            history_len: 6,
        }
    }
}

impl TurnConfig {
    /// Set the input length limit.
    pub fn with_max_input_length(mut self, len: usize) -> Self {
        self.max_input_length = len;
        self
    }

    /// Set the number of model attempts (at least one).
    pub fn with_max_model_attempts(mut self, attempts: u32) -> Self {
        self.max_model_attempts = attempts.max(1);
        self
    }

    /// Set the retry backoff unit.
    pub fn with_retry_backoff_step(mut self, step: Duration) -> Self {
        self.retry_backoff_step = step;
        self
    }

    /// Set the per-call model timeout.
    pub fn with_model_timeout(mut self, timeout: Duration) -> Self {
        self.model_timeout = timeout;
        self
    }

    /// Set the per-action completion timeout.
    pub fn with_action_timeout(mut self, timeout: Duration) -> Self {
        self.action_timeout = timeout;
        self
    }

    /// Set the pause between chained actions.
    pub fn with_action_pacing(mut self, pacing: Duration) -> Self {
        self.action_pacing = pacing;
        self
    }

    /// Set how many past exchanges the prompt carries.
    pub fn with_history_len(mut self, len: usize) -> Self {
        self.history_len = len;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_values() {
        let config = TurnConfig::default();
        assert_eq!(config.max_input_length, 200);
        assert_eq!(config.max_model_attempts, 3);
        assert_eq!(config.retry_backoff_step, Duration::from_secs(2));
        assert_eq!(config.action_timeout, Duration::from_secs(15));
        assert_eq!(config.action_pacing, Duration::ZERO);
    }

    #[test]
    fn config_builder_chain() {
        let config = TurnConfig::default()
            .with_max_input_length(80)
            .with_max_model_attempts(0)
            .with_action_pacing(Duration::from_millis(250))
            .with_history_len(2);
        assert_eq!(config.max_input_length, 80);
        assert_eq!(config.max_model_attempts, 1);
        assert_eq!(config.action_pacing, Duration::from_millis(250));
        assert_eq!(config.history_len, 2);
    }
}
