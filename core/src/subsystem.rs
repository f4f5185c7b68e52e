//! Subsystem trait.
//!
//! RULE: Every per-tick computation implements TickSystem.
//! The engine runs the registered systems in order on every frame and
//! after every player action. Execution order is fixed and documented
//! in engine.rs.

use crate::{
    catalog::Catalog,
    config::GameConfig,
    error::GameResult,
    event::GameEvent,
    state::GameState,
    types::Timestamp,
};

/// Read-only inputs shared by every system during one transition.
#[derive(Debug, Clone, Copy)]
pub struct TickContext<'a> {
    pub catalog: &'a Catalog,
    pub config:  &'a GameConfig,
    pub now:     Timestamp,
    pub frame:   u64,
}

/// A system's proposed next state and the events describing the change.
#[derive(Debug, Clone)]
pub struct SystemOutput {
    pub state:  GameState,
    pub events: Vec<GameEvent>,
}

/// The contract every subsystem must fulfill.
pub trait TickSystem: Send {
    /// Unique stable name, used in logs and failure events.
    fn name(&self) -> &'static str;

    /// Compute the next state from `state`.
    ///
    /// Must not mutate anything outside the returned value. On `Err` the
    /// engine discards the output and keeps `state` for this system.
    fn update(&self, state: &GameState, ctx: &TickContext<'_>) -> GameResult<SystemOutput>;
}
