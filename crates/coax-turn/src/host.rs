//! Contract with the game-state collaborator that owns the turn budget.

/// The level around a character: play state and prompt budget.
///
/// Methods take `&self` so the host can be shared with a UI thread; hosts use
/// interior mutability for their counters.
pub trait LevelHost: Send + Sync {
    /// True while the level accepts turns.
    fn is_playing(&self) -> bool;

    /// Spend one prompt. Returns false if none were left.
    fn consume_prompt_unit(&self) -> bool;

    /// Give back a prompt spent on a turn that failed in transport.
    fn refund_prompt_unit(&self);

    /// Prompts left in the budget.
    fn prompts_remaining(&self) -> u32;

    /// The character stepped onto an open exit.
    fn exit_reached(&self) {}

    /// Announce failure and restart the level.
    fn fail_level(&self, reason: &str);
}
