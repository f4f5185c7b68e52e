//! Player-action reducer.
//!
//! `reduce(state, action, ctx)` returns the next state and the events
//! describing the change. It never fails: an action that cannot be
//! applied leaves the state as it was, apart from one news entry giving
//! the reason and a `PurchaseRejected` event.
//!
//! Aggregation, gate resolution and achievements are not run here; the
//! engine applies the same post-processing to actions as to frames.

use crate::{
    catalog::{Catalog, EntryKind},
    command::Action,
    config::GameConfig,
    cost::{line_cost, purchase_cost, tempo_ceiling, MAX_CODE_LINES},
    event::GameEvent,
    pattern::generator::{self, GenerationInput},
    rng::RandomSource,
    state::GameState,
    types::{ResourceKind, Timestamp},
};
use thiserror::Error;

pub struct ReduceContext<'a> {
    pub catalog: &'a Catalog,
    pub config:  &'a GameConfig,
    pub now:     Timestamp,
    pub rng:     &'a mut dyn RandomSource,
}

#[derive(Debug, Clone)]
pub struct Reduced {
    pub state:  GameState,
    pub events: Vec<GameEvent>,
}

/// Why an action was refused. The text goes straight into the news log.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("unknown item '{0}'")]
    Unknown(String),

    #[error("{0} is still locked")]
    Locked(String),

    #[error("{name} costs {cost:.0} beats, you have {have:.0}")]
    TooExpensive { name: String, cost: f64, have: f64 },

    #[error("not enough {kind} capacity for {name}")]
    NoCapacity { kind: ResourceKind, name: String },

    #[error("{0} hardware is not available yet")]
    KindLocked(ResourceKind),

    #[error("{0} is not hardware")]
    NotHardware(String),

    #[error("{0} is hardware, buy it from the hardware shop")]
    IsHardware(String),

    #[error("{0} is already owned")]
    AlreadyOwned(String),

    #[error("{0} has not been purchased")]
    NotPurchased(String),

    #[error("line {requested} cannot be unlocked next (next is line {next})")]
    WrongLine { requested: u32, next: u32 },

    #[error("tempo is already at the top tier")]
    TopTempoTier,

    #[error("every pattern line is already unlocked")]
    AllLinesUnlocked,

    #[error("invalid {0}")]
    InvalidValue(&'static str),
}

type Applied = Result<(GameState, Vec<GameEvent>), (String, Rejection)>;

/// Apply one player action.
pub fn reduce(state: &GameState, action: &Action, ctx: &mut ReduceContext<'_>) -> Reduced {
    match apply(state, action, ctx) {
        Ok((mut next, mut events)) => {
            if action.regenerates_pattern() {
                events.push(regenerate(&mut next, ctx));
            }
            Reduced { state: next, events }
        }
        Err((id, rejection)) => {
            log::debug!("reducer: rejected {action:?}: {rejection}");
            let mut next = state.clone();
            next.push_news(format!("Rejected: {rejection}"), ctx.now, ctx.config.news_log_limit);
            let event = GameEvent::PurchaseRejected { id, reason: rejection.to_string() };
            Reduced { state: next, events: vec![event] }
        }
    }
}

fn apply(state: &GameState, action: &Action, ctx: &mut ReduceContext<'_>) -> Applied {
    let catalog = ctx.catalog;
    let config = ctx.config;
    let limit = config.news_log_limit;
    let mut next = state.clone();
    let mut events = Vec::new();

    match action {
        Action::AddBeats { amount } => {
            let earned = amount * config.tap_value;
            if !earned.is_finite() || earned <= 0.0 {
                return Err(("beats".into(), Rejection::InvalidValue("beat amount")));
            }
            next.earn(earned);
            events.push(GameEvent::BeatsAdded { amount: earned });
        }

        Action::PurchaseCatalogEntry { id } => {
            let entry = catalog.entry(id).ok_or_else(|| (id.clone(), Rejection::Unknown(id.clone())))?;
            let reject = |r| (id.clone(), r);
            if matches!(entry.kind, EntryKind::Hardware(_)) {
                return Err(reject(Rejection::IsHardware(entry.display_name.into())));
            }
            if !state.is_entry_unlocked(id) {
                return Err(reject(Rejection::Locked(entry.display_name.into())));
            }
            let owned = state.owned(id);
            let cost = purchase_cost(entry, owned);
            afford(state, entry.display_name, cost).map_err(reject)?;
            check_capacity(state, entry.consumption, entry.display_name).map_err(reject)?;

            next.beats -= cost;
            next.instance_mut(id).owned_count = owned + 1;
            next.push_news(format!("Bought {} #{}", entry.display_name, owned + 1), ctx.now, limit);
            events.push(GameEvent::Purchased { id: id.clone(), cost, owned: owned + 1 });
        }

        Action::PurchaseHardware { id } => {
            let entry = catalog.entry(id).ok_or_else(|| (id.clone(), Rejection::Unknown(id.clone())))?;
            let reject = |r| (id.clone(), r);
            let EntryKind::Hardware(kind) = entry.kind else {
                return Err(reject(Rejection::NotHardware(entry.display_name.into())));
            };
            if !state.unlocked_catalog_kinds.contains(&kind) {
                return Err(reject(Rejection::KindLocked(kind)));
            }
            if !state.is_entry_unlocked(id) {
                return Err(reject(Rejection::Locked(entry.display_name.into())));
            }
            let owned = state.owned(id);
            let cost = purchase_cost(entry, owned);
            afford(state, entry.display_name, cost).map_err(reject)?;

            next.beats -= cost;
            next.instance_mut(id).owned_count = owned + 1;
            next.push_news(
                format!("Installed {} (+{} {kind})", entry.display_name, entry.capacity),
                ctx.now,
                limit,
            );
            events.push(GameEvent::Purchased { id: id.clone(), cost, owned: owned + 1 });
        }

        Action::PurchaseFeature { id } => {
            let feature = catalog.feature(id).ok_or_else(|| (id.clone(), Rejection::Unknown(id.clone())))?;
            let reject = |r| (id.clone(), r);
            if !state.is_feature_unlocked(id) {
                return Err(reject(Rejection::Locked(feature.name.into())));
            }
            if state.is_feature_purchased(id) {
                return Err(reject(Rejection::AlreadyOwned(feature.name.into())));
            }
            afford(state, feature.name, feature.cost).map_err(reject)?;
            check_capacity(state, feature.consumption, feature.name).map_err(reject)?;

            next.beats -= feature.cost;
            let slot = next.features.entry(id.clone()).or_default();
            slot.purchased = true;
            slot.enabled = true;
            next.push_news(format!("Learned {}", feature.name), ctx.now, limit);
            events.push(GameEvent::Purchased { id: id.clone(), cost: feature.cost, owned: 1 });
        }

        Action::PurchaseSampleBank { id } => {
            let bank = catalog.sample_bank(id).ok_or_else(|| (id.clone(), Rejection::Unknown(id.clone())))?;
            let reject = |r| (id.clone(), r);
            if !state.is_bank_unlocked(id) {
                return Err(reject(Rejection::Locked(bank.name.into())));
            }
            if state.is_bank_purchased(id) {
                return Err(reject(Rejection::AlreadyOwned(bank.name.into())));
            }
            afford(state, bank.name, bank.cost).map_err(reject)?;
            check_capacity(state, bank.consumption, bank.name).map_err(reject)?;

            next.beats -= bank.cost;
            next.sample_banks.entry(id.clone()).or_default().purchased = true;
            next.push_news(
                format!("Loaded {}: {}", bank.name, bank.samples.join(", ")),
                ctx.now,
                limit,
            );
            events.push(GameEvent::Purchased { id: id.clone(), cost: bank.cost, owned: 1 });
        }

        Action::PurchaseBpmUpgrade => {
            let id = "bpm-upgrade".to_string();
            let tier = state
                .bpm_upgrades
                .level
                .checked_add(1)
                .and_then(|level| catalog.bpm_tier(level))
                .ok_or_else(|| (id.clone(), Rejection::TopTempoTier))?;
            let level = tier.level;
            afford(state, "Tempo upgrade", tier.cost).map_err(|r| (id.clone(), r))?;

            next.beats -= tier.cost;
            next.bpm_upgrades.level = level;
            next.push_news(
                format!("Tempo ceiling raised to {} BPM", tier.max_bpm),
                ctx.now,
                limit,
            );
            events.push(GameEvent::Purchased { id, cost: tier.cost, owned: level });
        }

        Action::UnlockLine { line } => {
            let id = format!("line-{line}");
            if state.unlocked_lines >= MAX_CODE_LINES {
                return Err((id, Rejection::AllLinesUnlocked));
            }
            let expected = state.unlocked_lines + 1;
            if *line != expected {
                return Err((id, Rejection::WrongLine { requested: *line, next: expected }));
            }
            let cost = line_cost(*line);
            afford(state, &format!("Line {line}"), cost).map_err(|r| (id.clone(), r))?;

            next.beats -= cost;
            next.unlocked_lines = *line;
            next.push_news(format!("Pattern line {line} unlocked"), ctx.now, limit);
            events.push(GameEvent::LineUnlocked { line: *line });
        }

        Action::SetComplexity { value } => {
            if value.is_nan() {
                return Err(("complexity".into(), Rejection::InvalidValue("complexity")));
            }
            next.complexity = value.clamp(0.0, 1.0);
            events.push(GameEvent::ComplexityChanged { complexity: next.complexity });
        }

        Action::ToggleFeature { id } => {
            let feature = catalog.feature(id).ok_or_else(|| (id.clone(), Rejection::Unknown(id.clone())))?;
            if !state.is_feature_purchased(id) {
                return Err((id.clone(), Rejection::NotPurchased(feature.name.into())));
            }
            // Re-enabling skips the capacity check; overload is the cost.
            let slot = next.features.entry(id.clone()).or_default();
            slot.enabled = !slot.enabled;
            let enabled = slot.enabled;
            events.push(GameEvent::FeatureToggled { id: id.clone(), enabled });
        }

        Action::SetTempo { bpm } => {
            if !bpm.is_finite() {
                return Err(("tempo".into(), Rejection::InvalidValue("tempo")));
            }
            let ceiling = tempo_ceiling(catalog, config, state.bpm_upgrades.level);
            next.bpm_upgrades.bpm = bpm.clamp(config.min_bpm, ceiling);
            events.push(GameEvent::TempoChanged { bpm: next.bpm_upgrades.bpm });
        }

        Action::RegeneratePattern => {}

        Action::SetAutoSave { enabled, interval_minutes } => {
            next.save_meta.auto_save_enabled = *enabled;
            next.save_meta.auto_save_interval_minutes = (*interval_minutes).max(1);
        }

        Action::DismissNews { id } => {
            next.news_log.retain(|n| n.id != *id);
        }

        Action::ResetState { keep_achievements } => {
            let mut fresh = GameState::new(catalog, config);
            if *keep_achievements {
                fresh.achievements = state.achievements.clone();
            }
            fresh.save_meta = state.save_meta.clone();
            fresh.next_news_id = state.next_news_id;
            log::info!("reducer: state reset (keep_achievements={keep_achievements})");
            fresh.push_news("Started a fresh set", ctx.now, limit);
            next = fresh;
            events.push(GameEvent::StateReset { kept_achievements: *keep_achievements });
        }
    }

    Ok((next, events))
}

fn afford(state: &GameState, name: &str, cost: f64) -> Result<(), Rejection> {
    if state.beats >= cost {
        Ok(())
    } else {
        Err(Rejection::TooExpensive { name: name.to_string(), cost, have: state.beats })
    }
}

/// Each consumed kind needs enough headroom in the last aggregated pools.
fn check_capacity(
    state: &GameState,
    consumption: &[(ResourceKind, f64)],
    name: &str,
) -> Result<(), Rejection> {
    match consumption.iter().find(|(kind, amount)| state.pool(*kind).headroom() < *amount) {
        Some((kind, _)) => Err(Rejection::NoCapacity { kind: *kind, name: name.to_string() }),
        None => Ok(()),
    }
}

fn regenerate(state: &mut GameState, ctx: &mut ReduceContext<'_>) -> GameEvent {
    let input = GenerationInput::from_state(state, ctx.catalog);
    let generated = generator::generate(&input, ctx.rng);
    state.pattern_seed += 1;
    state.pattern_code = generated.code;
    GameEvent::PatternRegenerated { seed: state.pattern_seed }
}
