//! Game loop driver.
//!
//! Lifecycle: `Uninitialized → Running` on `mount()`, `Running → Stopped`
//! on `stop()`. Frames and actions are ignored outside `Running`.
//!
//! Per frame:
//!   1. delta from the frame clock (first frame and backwards time are 0)
//!   2. engine tick (advance, aggregate, gates, achievements, commit)
//!   3. autosave check: when the interval has elapsed, stamp the state,
//!      serialize it and queue it for the background writer

use crate::{
    autosave::AutoSaver,
    clock::{FrameClock, TimeSource},
    command::Action,
    config::GameConfig,
    engine::{GameEngine, Listener, SubscriptionId},
    error::GameResult,
    event::GameEvent,
    migration,
    persistence::PersistenceProvider,
    rng::RandomSource,
    snapshot::SaveSnapshot,
    state::GameState,
    types::Timestamp,
};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    Uninitialized,
    Running,
    Stopped,
}

pub struct GameLoop {
    phase:       LoopPhase,
    engine:      GameEngine,
    clock:       Arc<dyn TimeSource>,
    frames:      FrameClock,
    persistence: Arc<dyn PersistenceProvider>,
    autosave:    Option<AutoSaver>,
}

impl GameLoop {
    pub fn new(
        config: GameConfig,
        clock: Arc<dyn TimeSource>,
        persistence: Arc<dyn PersistenceProvider>,
        rng: Box<dyn RandomSource + Send>,
    ) -> Self {
        let state = GameState::new(crate::catalog::builtin(), &config);
        Self {
            phase: LoopPhase::Uninitialized,
            engine: GameEngine::build(state, config, rng),
            clock,
            frames: FrameClock::new(),
            persistence,
            autosave: None,
        }
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    pub fn state(&self) -> Arc<GameState> {
        self.engine.state()
    }

    pub fn engine(&self) -> &GameEngine {
        &self.engine
    }

    pub fn subscribe(&mut self, listener: Listener) -> SubscriptionId {
        self.engine.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.engine.unsubscribe(id)
    }

    /// Load the saved game (or start fresh), credit offline time and
    /// start the autosave worker. Calling it again is a no-op.
    pub fn mount(&mut self) -> GameResult<Vec<GameEvent>> {
        if self.phase != LoopPhase::Uninitialized {
            log::debug!("loop: mount ignored in {:?}", self.phase);
            return Ok(Vec::new());
        }
        let now = self.clock.now_ms();
        let config = self.engine.config().clone();
        let catalog = *self.engine.catalog();

        let mut events = Vec::new();
        let mut state = match self.persistence.load() {
            Ok(Some(payload)) => {
                let migrated = migration::migrate(&payload, &catalog, &config, now);
                log::info!(
                    "loop: loaded save (version {}, {} warnings)",
                    migrated.from_version.as_deref().unwrap_or("legacy"),
                    migrated.warnings.len()
                );
                if let Some(report) = migrated.offline {
                    events.push(GameEvent::OfflineProgress { seconds: report.seconds, beats: report.beats });
                }
                migrated.state
            }
            Ok(None) => {
                log::info!("loop: no save found, starting fresh");
                GameState::new(&catalog, &config)
            }
            Err(e) => {
                log::warn!("loop: save could not be read, starting fresh: {e}");
                GameState::new(&catalog, &config)
            }
        };
        // The autosave interval counts from mount, not from the old save.
        state.save_meta.last_auto_save_timestamp = now;

        self.autosave = Some(AutoSaver::spawn(Arc::clone(&self.persistence))?);
        let events = self.engine.load(state, now, events);
        self.frames.reset();
        self.phase = LoopPhase::Running;
        Ok(events)
    }

    /// Run one frame at the clock's current time.
    pub fn frame(&mut self) -> Vec<GameEvent> {
        if self.phase != LoopPhase::Running {
            return Vec::new();
        }
        let now = self.clock.now_ms();
        let delta = self.frames.delta_secs(now);
        let mut events = self.engine.tick(delta, now);
        events.extend(self.autosave_check(now));
        events
    }

    /// Apply a player action at the clock's current time.
    pub fn dispatch(&mut self, action: &Action) -> Vec<GameEvent> {
        if self.phase != LoopPhase::Running {
            log::debug!("loop: {action:?} ignored in {:?}", self.phase);
            return Vec::new();
        }
        let now = self.clock.now_ms();
        self.engine.dispatch(action, now)
    }

    /// Serialize and write the current state synchronously.
    pub fn save_now(&mut self) -> GameResult<()> {
        let now = self.clock.now_ms();
        self.engine.amend(Vec::new(), |s| s.save_meta.last_auto_save_timestamp = now);
        let state = self.engine.state();
        let payload = SaveSnapshot::capture(&state, now).to_json()?;
        self.persistence.save(&payload)
    }

    /// Drop any further frames, write a final save if autosave is on,
    /// then flush and join the writer.
    pub fn stop(&mut self) {
        if self.phase != LoopPhase::Running {
            self.phase = LoopPhase::Stopped;
            return;
        }
        if self.engine.state().save_meta.auto_save_enabled {
            let now = self.clock.now_ms();
            self.queue_save(now);
        }
        if let Some(saver) = self.autosave.take() {
            saver.shutdown();
        }
        self.phase = LoopPhase::Stopped;
        log::info!("loop: stopped after {} frames", self.engine.frame());
    }

    fn autosave_check(&mut self, now: Timestamp) -> Vec<GameEvent> {
        let meta = self.engine.state().save_meta.clone();
        if !meta.auto_save_enabled {
            return Vec::new();
        }
        let interval_ms = i64::from(meta.auto_save_interval_minutes.max(1)) * 60_000;
        if now - meta.last_auto_save_timestamp < interval_ms {
            return Vec::new();
        }
        self.queue_save(now)
    }

    fn queue_save(&mut self, now: Timestamp) -> Vec<GameEvent> {
        let events = self.engine.amend(
            vec![GameEvent::AutoSaveScheduled { timestamp: now }],
            |s| s.save_meta.last_auto_save_timestamp = now,
        );
        let state = self.engine.state();
        match SaveSnapshot::capture(&state, now).to_json() {
            Ok(payload) => {
                let queued = self.autosave.as_ref().map(|s| s.submit(payload)).unwrap_or(false);
                if !queued {
                    log::warn!("loop: autosave worker unavailable, save skipped");
                }
            }
            Err(e) => log::warn!("loop: snapshot serialization failed: {e}"),
        }
        events
    }
}

impl Drop for GameLoop {
    fn drop(&mut self) {
        if let Some(saver) = self.autosave.take() {
            saver.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::ManualClock, persistence::MemoryPersistence, rng::PcgSource};

    fn game(store: &MemoryPersistence, clock: &ManualClock) -> GameLoop {
        GameLoop::new(
            GameConfig::default(),
            Arc::new(clock.clone()),
            Arc::new(store.clone()),
            Box::new(PcgSource::new(3)),
        )
    }

    #[test]
    fn frames_are_ignored_until_mounted() {
        let store = MemoryPersistence::new();
        let clock = ManualClock::new(0);
        let mut g = game(&store, &clock);
        assert_eq!(g.phase(), LoopPhase::Uninitialized);
        assert!(g.frame().is_empty());
        g.mount().unwrap();
        assert_eq!(g.phase(), LoopPhase::Running);
        clock.advance(16);
        assert!(!g.frame().is_empty());
    }

    #[test]
    fn first_frame_after_mount_has_zero_delta() {
        let store = MemoryPersistence::new();
        let clock = ManualClock::new(1_000);
        let mut g = game(&store, &clock);
        g.mount().unwrap();
        clock.advance(5_000);
        let events = g.frame();
        assert!(events.iter().any(|e| matches!(e, GameEvent::FrameCompleted { delta_secs, .. } if *delta_secs == 0.0)));
    }

    #[test]
    fn stop_is_final() {
        let store = MemoryPersistence::new();
        let clock = ManualClock::new(0);
        let mut g = game(&store, &clock);
        g.mount().unwrap();
        g.dispatch(&Action::AddBeats { amount: 5.0 });
        g.stop();
        assert_eq!(g.phase(), LoopPhase::Stopped);
        // Final save was flushed before stop returned.
        assert_eq!(store.write_count(), 1);
        clock.advance(10_000);
        assert!(g.frame().is_empty());
        assert!(g.dispatch(&Action::AddBeats { amount: 5.0 }).is_empty());
        assert_eq!(g.state().beats, 5.0);
    }
}
