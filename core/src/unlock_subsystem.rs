//! Unlock subsystem: declarative gate resolution.
//!
//! Every unlockable (catalog entry, hardware category, phase, feature,
//! sample bank) carries a prerequisite list. This system flips each
//! target whose list is satisfied, then re-evaluates: an unlock earlier
//! in a pass may satisfy a gate later in the table, or one already
//! checked. It stops at the first pass that changes nothing.
//!
//! RULES:
//!   - Unlocks are monotonic. Nothing here ever re-locks a target.
//!   - One news entry per unlock.
//!   - More than `max_gate_passes` passes is a `GateDidNotSettle` error.

use crate::{
    catalog::{Catalog, EntryKind, Prerequisite},
    error::{GameError, GameResult},
    event::GameEvent,
    state::GameState,
    subsystem::{SystemOutput, TickContext, TickSystem},
};

/// True when a single condition holds for `state`.
pub fn prerequisite_met(prereq: &Prerequisite, state: &GameState) -> bool {
    match *prereq {
        Prerequisite::LifetimeBeats(n) => state.lifetime_beats >= n,
        Prerequisite::Beats(n) => state.beats >= n,
        Prerequisite::Owned { id, count } => state.owned(id) >= count,
        Prerequisite::EntryUnlocked(id) => state.is_entry_unlocked(id),
        Prerequisite::PhaseReached(id) => state.has_phase(id),
        Prerequisite::CapacityTotal { kind, at_least } => state.pool(kind).capacity_total >= at_least,
        Prerequisite::ProductionRate(n) => state.production_rate >= n,
        Prerequisite::FeaturePurchased(id) => state.is_feature_purchased(id),
    }
}

/// True when every condition holds. An empty list is always satisfied.
pub fn can_unlock(prereqs: &[Prerequisite], state: &GameState) -> bool {
    prereqs.iter().all(|p| prerequisite_met(p, state))
}

/// Resolve all gates to a fixed point.
pub fn resolve(
    state: &GameState,
    catalog: &Catalog,
    ctx: &TickContext<'_>,
) -> GameResult<SystemOutput> {
    let mut next = state.clone();
    let mut events = Vec::new();
    let limit = ctx.config.max_gate_passes.max(1);

    for pass in 1..=limit {
        let changed = single_pass(&mut next, catalog, ctx, &mut events);
        if !changed {
            if pass > 2 {
                log::debug!("frame={} unlock: settled after {pass} passes", ctx.frame);
            }
            return Ok(SystemOutput { state: next, events });
        }
    }

    Err(GameError::GateDidNotSettle { passes: limit })
}

/// One sweep over every gate table. Returns whether anything flipped.
fn single_pass(
    state: &mut GameState,
    catalog: &Catalog,
    ctx: &TickContext<'_>,
    events: &mut Vec<GameEvent>,
) -> bool {
    let limit = ctx.config.news_log_limit;
    let mut changed = false;

    for entry in catalog.entries {
        if state.is_entry_unlocked(entry.id) || !can_unlock(entry.prerequisites, state) {
            continue;
        }
        state.instance_mut(entry.id).unlocked = true;
        let message = match entry.kind {
            EntryKind::Hardware(_) => format!("New hardware available: {}", entry.display_name),
            EntryKind::Effect => format!("New effect available: {}", entry.display_name),
            EntryKind::Sound => format!("New sound available: {}", entry.display_name),
        };
        state.push_news(message, ctx.now, limit);
        events.push(GameEvent::EntryUnlocked { id: entry.id.to_string() });
        changed = true;
    }

    for gate in catalog.kind_gates {
        if state.unlocked_catalog_kinds.contains(&gate.kind) || !can_unlock(gate.prerequisites, state) {
            continue;
        }
        state.unlocked_catalog_kinds.insert(gate.kind);
        state.push_news(format!("Hardware category unlocked: {}", gate.kind), ctx.now, limit);
        events.push(GameEvent::ResourceKindUnlocked { kind: gate.kind });
        changed = true;
    }

    for phase in catalog.phases {
        if state.has_phase(phase.id) || !can_unlock(phase.prerequisites, state) {
            continue;
        }
        state.phases.insert(phase.id.to_string());
        log::info!("frame={} unlock: phase {} reached", ctx.frame, phase.id);
        state.push_news(format!("Career milestone: {}", phase.name), ctx.now, limit);
        events.push(GameEvent::PhaseReached { id: phase.id.to_string() });
        changed = true;
    }

    for feature in catalog.features {
        if state.is_feature_unlocked(feature.id) || !can_unlock(feature.prerequisites, state) {
            continue;
        }
        state.features.entry(feature.id.to_string()).or_default().unlocked = true;
        state.push_news(format!("New feature available: {}", feature.name), ctx.now, limit);
        events.push(GameEvent::FeatureUnlocked { id: feature.id.to_string() });
        changed = true;
    }

    for bank in catalog.sample_banks {
        if state.is_bank_unlocked(bank.id) || !can_unlock(bank.prerequisites, state) {
            continue;
        }
        state.sample_banks.entry(bank.id.to_string()).or_default().unlocked = true;
        state.push_news(format!("Sample bank available: {}", bank.name), ctx.now, limit);
        events.push(GameEvent::SampleBankUnlocked { id: bank.id.to_string() });
        changed = true;
    }

    changed
}

pub struct UnlockSubsystem;

impl TickSystem for UnlockSubsystem {
    fn name(&self) -> &'static str { "unlock" }

    fn update(&self, state: &GameState, ctx: &TickContext<'_>) -> GameResult<SystemOutput> {
        resolve(state, ctx.catalog, ctx)
    }
}
