//! The game engine: owns the committed state and every transition.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Time advance   (frames only: production, elapsed time, engagement)
//!      or the reducer (actions)
//!   2. Production subsystem  (aggregation, overload)
//!   3. Unlock subsystem      (gate fixed point)
//!   4. Achievement subsystem
//!   5. Commit, then notify subscribers
//!
//! RULES:
//!   - Each step works on the previous step's output, never on the
//!     committed state.
//!   - A failing subsystem is skipped for this transition: its input
//!     passes through unchanged and a `SubsystemFailed` event is emitted.
//!   - The committed state is replaced whole, never edited.
//!   - All randomness flows through the injected RandomSource.

use crate::{
    achievement_subsystem::AchievementSubsystem,
    catalog::{self, Catalog},
    command::Action,
    config::GameConfig,
    event::GameEvent,
    production_subsystem::{engagement_target, ProductionSubsystem},
    reducer::{self, ReduceContext},
    rng::RandomSource,
    state::GameState,
    subsystem::{TickContext, TickSystem},
    types::Timestamp,
    unlock_subsystem::UnlockSubsystem,
};
use std::sync::Arc;

/// Called after every commit with the new state and the transition's events.
pub type Listener = Box<dyn FnMut(&GameState, &[GameEvent]) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct GameEngine {
    state:      Arc<GameState>,
    catalog:    Catalog,
    config:     GameConfig,
    rng:        Box<dyn RandomSource + Send>,
    systems:    Vec<Box<dyn TickSystem>>,
    listeners:  Vec<(SubscriptionId, Listener)>,
    next_sub:   u64,
    frame:      u64,
}

impl GameEngine {
    pub fn new(
        state: GameState,
        catalog: Catalog,
        config: GameConfig,
        rng: Box<dyn RandomSource + Send>,
    ) -> Self {
        Self {
            state: Arc::new(state),
            catalog,
            config,
            rng,
            systems: Vec::new(),
            listeners: Vec::new(),
            next_sub: 1,
            frame: 0,
        }
    }

    /// Build a fully wired engine with the built-in catalog and all
    /// subsystems registered. Call this instead of new() + register().
    pub fn build(state: GameState, config: GameConfig, rng: Box<dyn RandomSource + Send>) -> Self {
        let mut engine = GameEngine::new(state, *catalog::builtin(), config, rng);
        engine.register(Box::new(ProductionSubsystem));
        engine.register(Box::new(UnlockSubsystem));
        engine.register(Box::new(AchievementSubsystem));
        engine
    }

    /// Register a subsystem. Call in the documented execution order.
    pub fn register(&mut self, system: Box<dyn TickSystem>) {
        self.systems.push(system);
    }

    /// Read-only snapshot of the committed state.
    pub fn state(&self) -> Arc<GameState> {
        Arc::clone(&self.state)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn subscribe(&mut self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_sub);
        self.next_sub += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    /// Apply a player action, then run post-processing and commit.
    pub fn dispatch(&mut self, action: &Action, now: Timestamp) -> Vec<GameEvent> {
        let reduced = {
            let mut ctx = ReduceContext {
                catalog: &self.catalog,
                config:  &self.config,
                now,
                rng:     &mut *self.rng,
            };
            reducer::reduce(&self.state, action, &mut ctx)
        };
        let mut events = reduced.events;
        let settled = self.settle(reduced.state, now, &mut events);
        self.commit(settled, &events);
        events
    }

    /// Advance one frame by `delta_secs` and commit.
    pub fn tick(&mut self, delta_secs: f64, now: Timestamp) -> Vec<GameEvent> {
        self.frame += 1;
        let mut next = (*self.state).clone();
        advance(&mut next, delta_secs, &self.config);

        let mut events = Vec::new();
        let settled = self.settle(next, now, &mut events);
        events.push(GameEvent::FrameCompleted {
            frame: self.frame,
            delta_secs: sanitize_delta(delta_secs),
            production_rate: settled.production_rate,
        });
        self.commit(settled, &events);
        events
    }

    /// Replace the committed state wholesale (mount, import), running
    /// post-processing first so derived fields are current.
    pub fn load(&mut self, state: GameState, now: Timestamp, mut events: Vec<GameEvent>) -> Vec<GameEvent> {
        let settled = self.settle(state, now, &mut events);
        self.commit(settled, &events);
        events
    }

    /// Apply a bookkeeping change that must not go through the reducer
    /// (autosave timestamps). No post-processing, no regeneration.
    pub fn amend(&mut self, events: Vec<GameEvent>, f: impl FnOnce(&mut GameState)) -> Vec<GameEvent> {
        let mut next = (*self.state).clone();
        f(&mut next);
        self.commit(next, &events);
        events
    }

    /// Run every registered subsystem in order with failure isolation.
    fn settle(&self, state: GameState, now: Timestamp, events: &mut Vec<GameEvent>) -> GameState {
        let ctx = TickContext {
            catalog: &self.catalog,
            config:  &self.config,
            now,
            frame:   self.frame,
        };
        let mut current = state;
        for system in &self.systems {
            match system.update(&current, &ctx) {
                Ok(output) => {
                    current = output.state;
                    events.extend(output.events);
                }
                Err(e) => {
                    log::warn!(
                        "frame={} {} failed, keeping previous values: {e}",
                        self.frame,
                        system.name()
                    );
                    events.push(GameEvent::SubsystemFailed {
                        subsystem: system.name().to_string(),
                        reason:    e.to_string(),
                    });
                }
            }
        }
        current
    }

    fn commit(&mut self, next: GameState, events: &[GameEvent]) {
        if log::log_enabled!(log::Level::Debug) {
            let notable: Vec<&str> = events
                .iter()
                .filter(|e| !matches!(e, GameEvent::FrameCompleted { .. }))
                .map(GameEvent::event_type)
                .collect();
            if !notable.is_empty() {
                log::debug!("frame={} committed: {}", self.frame, notable.join(", "));
            }
        }
        self.state = Arc::new(next);
        for (_, listener) in self.listeners.iter_mut() {
            listener(&*self.state, events);
        }
    }
}

/// Negative, NaN and infinite deltas count as zero elapsed time.
fn sanitize_delta(delta_secs: f64) -> f64 {
    if delta_secs.is_finite() && delta_secs > 0.0 { delta_secs } else { 0.0 }
}

/// Production, elapsed time and engagement drift for one frame.
/// Uses the production rate committed by the previous frame.
pub fn advance(state: &mut GameState, delta_secs: f64, config: &GameConfig) {
    let delta = sanitize_delta(delta_secs);
    if delta == 0.0 {
        return;
    }
    state.earn(state.production_rate * delta);
    state.elapsed_time += delta;

    let target = engagement_target(state);
    let step = (config.engagement_rate * delta).clamp(0.0, 1.0);
    let engagement = state.engagement + (target - state.engagement) * step;
    if engagement.is_finite() {
        state.engagement = engagement.clamp(0.0, 100.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{GameError, GameResult},
        rng::PcgSource,
        subsystem::SystemOutput,
    };
    use std::sync::Mutex;

    fn engine() -> GameEngine {
        GameEngine::build(GameState::default(), GameConfig::default(), Box::new(PcgSource::new(1)))
    }

    #[test]
    fn tick_earns_from_previous_rate() {
        let mut e = engine();
        e.dispatch(&Action::AddBeats { amount: 10.0 }, 0);
        e.dispatch(&Action::PurchaseCatalogEntry { id: "bd".into() }, 0);
        assert!((e.state().production_rate - 0.2).abs() < 1e-9);
        e.tick(10.0, 10_000);
        assert!((e.state().beats - 2.0).abs() < 1e-9);
        assert_eq!(e.state().elapsed_time, 10.0);
    }

    #[test]
    fn bad_deltas_do_nothing() {
        let mut e = engine();
        e.dispatch(&Action::AddBeats { amount: 10.0 }, 0);
        e.dispatch(&Action::PurchaseCatalogEntry { id: "bd".into() }, 0);
        for delta in [-5.0, f64::NAN, f64::INFINITY, 0.0] {
            e.tick(delta, 0);
        }
        assert_eq!(e.state().beats, 0.0);
        assert_eq!(e.state().elapsed_time, 0.0);
    }

    #[test]
    fn state_is_replaced_not_mutated() {
        let mut e = engine();
        let before = e.state();
        e.dispatch(&Action::AddBeats { amount: 1.0 }, 0);
        assert_eq!(before.beats, 0.0);
        assert!(!Arc::ptr_eq(&before, &e.state()));
    }

    #[test]
    fn subscribers_see_every_commit_until_unsubscribed() {
        let mut e = engine();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let id = e.subscribe(Box::new(move |state, events| {
            sink.lock().unwrap().push((state.beats, events.len()));
        }));
        e.dispatch(&Action::AddBeats { amount: 2.0 }, 0);
        e.tick(1.0, 1_000);
        assert!(e.unsubscribe(id));
        e.tick(1.0, 2_000);
        assert!(!e.unsubscribe(id));
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].0, 2.0);
    }

    struct Broken;

    impl TickSystem for Broken {
        fn name(&self) -> &'static str { "broken" }
        fn update(&self, _: &GameState, _: &TickContext<'_>) -> GameResult<SystemOutput> {
            Err(GameError::NonFinite { what: "test" })
        }
    }

    #[test]
    fn failing_subsystem_does_not_stop_the_loop() {
        let mut e = engine();
        e.register(Box::new(Broken));
        e.dispatch(&Action::AddBeats { amount: 1.0 }, 0);
        let events = e.tick(1.0, 1_000);
        assert!(events.iter().any(|ev| matches!(ev, GameEvent::SubsystemFailed { subsystem, .. } if subsystem == "broken")));
        // Systems before the failing one still ran.
        assert!(e.state().is_achievement_unlocked("first-beat"));
        assert_eq!(e.frame(), 1);
    }

    #[test]
    fn engagement_drifts_toward_target() {
        let mut state = GameState::default();
        state.complexity = 1.0;
        let config = GameConfig::default();
        advance(&mut state, 1.0, &config);
        assert!((state.engagement - 2.0).abs() < 1e-9);
        for _ in 0..1_000 {
            advance(&mut state, 1.0, &config);
        }
        assert!((state.engagement - 40.0).abs() < 1e-6);
    }
}
