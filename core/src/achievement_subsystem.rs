//! Achievement subsystem.
//!
//! Evaluates every definition's predicate against the state after
//! aggregation and unlock resolution. Achievements only ever go from
//! locked to unlocked. Hidden ones keep their `hidden` flag once earned
//! so the UI can decide how to reveal them.

use crate::{
    catalog::{AchievementDef, Catalog},
    error::GameResult,
    event::GameEvent,
    state::{AchievementState, GameState},
    subsystem::{SystemOutput, TickContext, TickSystem},
};

/// Evaluate all definitions. Returns the next state and the definitions
/// that flipped during this call, in catalog order.
pub fn evaluate(state: &GameState, catalog: &Catalog) -> (GameState, Vec<&'static AchievementDef>) {
    let mut next = state.clone();
    let mut newly = Vec::new();

    for def in catalog.achievements {
        let slot = next
            .achievements
            .entry(def.id.to_string())
            .or_insert_with(|| AchievementState { unlocked: false, hidden: def.hidden });
        if slot.unlocked {
            continue;
        }
        // Predicates see the input state, not the partially updated copy.
        if (def.condition)(state) {
            slot.unlocked = true;
            newly.push(def);
        }
    }

    (next, newly)
}

pub struct AchievementSubsystem;

impl TickSystem for AchievementSubsystem {
    fn name(&self) -> &'static str { "achievements" }

    fn update(&self, state: &GameState, ctx: &TickContext<'_>) -> GameResult<SystemOutput> {
        let (mut next, newly) = evaluate(state, ctx.catalog);
        let mut events = Vec::with_capacity(newly.len());
        for def in newly {
            log::info!("frame={} achievements: unlocked {}", ctx.frame, def.id);
            next.push_news(
                format!("Achievement unlocked: {}", def.name),
                ctx.now,
                ctx.config.news_log_limit,
            );
            events.push(GameEvent::AchievementUnlocked {
                id:     def.id.to_string(),
                name:   def.name.to_string(),
                hidden: def.hidden,
            });
        }
        Ok(SystemOutput { state: next, events })
    }
}
