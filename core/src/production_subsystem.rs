//! Production subsystem: resource aggregation.
//!
//! Recomputes the production rate and every pool's usage from scratch
//! each time it runs. Nothing is carried over incrementally, so usage can
//! never drift from what the owned entries declare.
//!
//! Consumers: owned catalog entries (× owned count), enabled features and
//! purchased sample banks. Hardware adds capacity on top of the base
//! capacity from config.
//!
//! Overloaded pools each multiply the rate by `overload_penalty`,
//! compounding. Overload news is edge-triggered unless config asks for
//! `every_tick`.

use crate::{
    catalog::{Catalog, EntryKind},
    config::{GameConfig, OverloadNotice},
    cost::{effective_production, engagement_multiplier, tempo_multiplier},
    error::{GameError, GameResult},
    event::GameEvent,
    state::{GameState, ResourcePool},
    subsystem::{SystemOutput, TickContext, TickSystem},
    types::ResourceKind,
};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    /// Rate before overload penalties.
    pub unconstrained_rate: f64,
    pub production_rate:    f64,
    pub pools:              BTreeMap<ResourceKind, ResourcePool>,
    pub overloaded:         BTreeSet<ResourceKind>,
}

/// Sum production and consumption over everything the player owns.
pub fn aggregate(state: &GameState, catalog: &Catalog, config: &GameConfig) -> GameResult<Aggregate> {
    // Owned units the catalog cannot price mean the state is inconsistent.
    if let Some(id) = state
        .catalog_instances
        .iter()
        .find(|(id, inst)| inst.owned_count > 0 && catalog.entry(id).is_none())
        .map(|(id, _)| id)
    {
        return Err(GameError::UnknownEntry { id: id.clone() });
    }

    let mut pools: BTreeMap<ResourceKind, ResourcePool> = ResourceKind::ALL
        .iter()
        .map(|k| {
            let pool = ResourcePool {
                capacity_total: config.base_capacity_of(*k),
                capacity_used:  0.0,
            };
            (*k, pool)
        })
        .collect();

    let mut raw = 0.0;
    for entry in catalog.entries {
        let owned = state.owned(entry.id);
        if owned == 0 {
            continue;
        }
        raw += effective_production(entry, owned);
        consume(&mut pools, entry.consumption, owned as f64);
        if let EntryKind::Hardware(kind) = entry.kind {
            pools.entry(kind).or_default().capacity_total += entry.capacity * owned as f64;
        }
    }

    for feature in catalog.features {
        if state.is_feature_enabled(feature.id) {
            consume(&mut pools, feature.consumption, 1.0);
        }
    }

    let mut bank_bonus = 0.0;
    for bank in catalog.sample_banks {
        if state.is_bank_purchased(bank.id) {
            consume(&mut pools, bank.consumption, 1.0);
            bank_bonus += bank.production_bonus;
        }
    }

    let unconstrained_rate = raw
        * engagement_multiplier(state.engagement)
        * tempo_multiplier(state.bpm_upgrades.bpm, config.base_bpm)
        * (1.0 + bank_bonus);

    let overloaded: BTreeSet<ResourceKind> = pools
        .iter()
        .filter(|(_, pool)| pool.is_overloaded())
        .map(|(kind, _)| *kind)
        .collect();

    let production_rate = overloaded
        .iter()
        .fold(unconstrained_rate, |rate, _| rate * config.overload_penalty);

    if !production_rate.is_finite() {
        return Err(GameError::NonFinite { what: "production_rate" });
    }

    Ok(Aggregate {
        unconstrained_rate,
        production_rate: production_rate.max(0.0),
        pools,
        overloaded,
    })
}

fn consume(
    pools: &mut BTreeMap<ResourceKind, ResourcePool>,
    consumption: &[(ResourceKind, f64)],
    units: f64,
) {
    for (kind, amount) in consumption {
        pools.entry(*kind).or_default().capacity_used += amount * units;
    }
}

/// Where engagement drifts to, given the current state. In [0, 100].
pub fn engagement_target(state: &GameState) -> f64 {
    let lines = state.unlocked_lines.saturating_sub(1) as f64;
    let target = state.complexity.clamp(0.0, 1.0) * 40.0
        + state.phases.len().saturating_sub(1) as f64 * 5.0
        + lines * 3.0
        + state.unlocked_achievement_count() as f64 * 2.0;
    target.clamp(0.0, 100.0)
}

pub struct ProductionSubsystem;

impl TickSystem for ProductionSubsystem {
    fn name(&self) -> &'static str { "production" }

    fn update(&self, state: &GameState, ctx: &TickContext<'_>) -> GameResult<SystemOutput> {
        let agg = aggregate(state, ctx.catalog, ctx.config)?;
        let mut next = state.clone();
        let mut events = Vec::new();

        let newly_over: Vec<ResourceKind> =
            agg.overloaded.difference(&state.overloaded_kinds).copied().collect();
        let cleared: Vec<ResourceKind> =
            state.overloaded_kinds.difference(&agg.overloaded).copied().collect();

        let announce: Vec<ResourceKind> = match ctx.config.overload_notice {
            OverloadNotice::OnTransition => newly_over,
            OverloadNotice::EveryTick => agg.overloaded.iter().copied().collect(),
        };

        for kind in announce {
            let pool = &agg.pools[&kind];
            log::warn!(
                "frame={} production: {kind} overloaded ({:.1}/{:.1})",
                ctx.frame,
                pool.capacity_used,
                pool.capacity_total
            );
            next.push_news(
                format!("{} overloaded! Production halved until you add capacity.", capitalize(kind.label())),
                ctx.now,
                ctx.config.news_log_limit,
            );
            events.push(GameEvent::ResourceOverloaded {
                kind,
                used:  pool.capacity_used,
                total: pool.capacity_total,
            });
        }

        for kind in cleared {
            log::info!("frame={} production: {kind} back within capacity", ctx.frame);
            next.push_news(
                format!("{} back within capacity.", capitalize(kind.label())),
                ctx.now,
                ctx.config.news_log_limit,
            );
            events.push(GameEvent::OverloadCleared { kind });
        }

        next.production_rate = agg.production_rate;
        next.resource_pools = agg.pools;
        next.overloaded_kinds = agg.overloaded;

        Ok(SystemOutput { state: next, events })
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
