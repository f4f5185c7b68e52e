//! End-to-end gameplay scenarios through the engine's public API.

use beat_idle_core::{
    engine::GameEngine,
    event::GameEvent,
    rng::PcgSource,
    types::ResourceKind,
    Action, GameConfig, GameState,
};

fn engine_with(state: GameState) -> GameEngine {
    GameEngine::build(state, GameConfig::default(), Box::new(PcgSource::new(11)))
}

fn engine() -> GameEngine {
    engine_with(GameState::default())
}

#[test]
fn ten_beats_buy_the_first_kick() {
    let mut e = engine();
    e.dispatch(&Action::AddBeats { amount: 10.0 }, 0);
    let events = e.dispatch(&Action::PurchaseCatalogEntry { id: "bd".into() }, 0);

    let state = e.state();
    assert_eq!(state.beats, 0.0);
    assert_eq!(state.owned("bd"), 1);
    assert_eq!(state.lifetime_beats, 10.0);
    assert!(events.iter().any(|ev| matches!(ev, GameEvent::Purchased { id, owned: 1, .. } if id == "bd")));
    assert!(state.is_achievement_unlocked("hello-world"));
}

#[test]
fn two_overloaded_pools_quarter_production() {
    let mut state = GameState::default();
    // 9 kicks: memory 9/8, storage 4.5/4.
    state.instance_mut("bd").owned_count = 9;
    let mut e = engine_with(state);
    let events = e.load((*e.state()).clone(), 0, Vec::new());

    let state = e.state();
    assert!((state.production_rate - 9.0 * 0.2 * 0.25).abs() < 1e-9);
    assert_eq!(
        state.overloaded_kinds.iter().copied().collect::<Vec<_>>(),
        vec![ResourceKind::Memory, ResourceKind::Storage]
    );
    let overloads = events.iter().filter(|ev| matches!(ev, GameEvent::ResourceOverloaded { .. })).count();
    assert_eq!(overloads, 2);
    assert!(state.is_achievement_unlocked("overclocked"));

    // Steady state: no repeated overload news.
    let news_before = state.news_log.len();
    e.tick(0.5, 500);
    e.tick(0.5, 1_000);
    assert_eq!(e.state().news_log.len(), news_before);
}

#[test]
fn news_log_never_exceeds_its_limit() {
    let mut e = engine();
    for _ in 0..10 {
        e.dispatch(&Action::AddBeats { amount: 1.0 }, 0);
    }
    assert!(e.state().news_log.len() <= 10);

    // Rejections each add one entry; the oldest are evicted.
    for _ in 0..25 {
        e.dispatch(&Action::PurchaseCatalogEntry { id: "piano".into() }, 0);
    }
    let state = e.state();
    assert_eq!(state.news_log.len(), 10);
    let ids: Vec<u64> = state.news_log.iter().map(|n| n.id).collect();
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn toggling_features_can_overload_compute() {
    let mut state = GameState::default();
    state.instance_mut("hh").owned_count = 6; // compute 3/6
    for id in ["sequencer", "layering", "subdivision", "euclid"] {
        let f = state.features.get_mut(id).unwrap();
        f.unlocked = true;
        f.purchased = true;
        f.enabled = false;
    }
    let mut e = engine_with(state);

    let mut overloaded = false;
    for id in ["sequencer", "layering", "subdivision", "euclid"] {
        let events = e.dispatch(&Action::ToggleFeature { id: id.into() }, 0);
        overloaded |= events.iter().any(|ev| {
            matches!(ev, GameEvent::ResourceOverloaded { kind: ResourceKind::Compute, .. })
        });
    }
    assert!(overloaded);
    assert!(e.state().overloaded_kinds.contains(&ResourceKind::Compute));

    // Turning one off again clears it.
    let events = e.dispatch(&Action::ToggleFeature { id: "euclid".into() }, 0);
    assert!(events.contains(&GameEvent::OverloadCleared { kind: ResourceKind::Compute }));
}

#[test]
fn kicks_and_time_reach_the_open_mic() {
    let mut e = engine();
    e.dispatch(&Action::AddBeats { amount: 300.0 }, 0);
    for _ in 0..5 {
        e.dispatch(&Action::PurchaseCatalogEntry { id: "bd".into() }, 0);
    }
    let state = e.state();
    assert!(state.has_phase("open-mic"));
    assert!(state.is_entry_unlocked("hh"));
    assert!(state.unlocked_catalog_kinds.contains(&ResourceKind::Storage));
    assert!(state.news_log.iter().any(|n| n.message == "Career milestone: Open Mic"));
}

#[test]
fn purchases_regenerate_the_pattern() {
    let mut e = engine();
    e.dispatch(&Action::AddBeats { amount: 100.0 }, 0);
    e.dispatch(&Action::PurchaseCatalogEntry { id: "bd".into() }, 0);
    e.dispatch(&Action::PurchaseFeature { id: "sequencer".into() }, 0);

    let state = e.state();
    assert!(state.is_feature_enabled("sequencer"));
    assert_eq!(state.pattern_seed, 2);
    let mut lines = state.pattern_code.lines();
    assert_eq!(lines.next(), Some("setcps(120/60/4)"));
    let body = lines.next().unwrap();
    assert!(body.starts_with("s(\"bd"), "{body}");
    // Four steps, each a kick or a rest.
    let inner = body.trim_start_matches("s(\"").trim_end_matches("\")");
    assert_eq!(inner.split(' ').count(), 4);
    assert!(inner.split(' ').all(|t| t == "bd" || t == "~"));
}

#[test]
fn tempo_upgrades_raise_the_ceiling() {
    let mut e = engine();
    e.dispatch(&Action::SetTempo { bpm: 200.0 }, 0);
    assert_eq!(e.state().bpm_upgrades.bpm, 130.0);

    e.dispatch(&Action::AddBeats { amount: 300.0 }, 0);
    e.dispatch(&Action::PurchaseBpmUpgrade, 0);
    e.dispatch(&Action::SetTempo { bpm: 200.0 }, 0);
    let state = e.state();
    assert_eq!(state.bpm_upgrades.level, 1);
    assert_eq!(state.bpm_upgrades.bpm, 145.0);
    assert!(state.pattern_code.starts_with("setcps(145/60/4)"));
}

#[test]
fn reset_keeps_achievements_when_asked() {
    let mut e = engine();
    e.dispatch(&Action::AddBeats { amount: 50.0 }, 0);
    e.dispatch(&Action::PurchaseCatalogEntry { id: "bd".into() }, 0);
    assert!(e.state().is_achievement_unlocked("first-beat"));

    e.dispatch(&Action::ResetState { keep_achievements: true }, 0);
    let state = e.state();
    assert_eq!(state.beats, 0.0);
    assert_eq!(state.owned("bd"), 0);
    assert!(state.is_achievement_unlocked("first-beat"));
    assert!(state.is_achievement_unlocked("hello-world"));

    e.dispatch(&Action::ResetState { keep_achievements: false }, 0);
    assert_eq!(e.state().unlocked_achievement_count(), 0);
}

#[test]
fn sample_banks_add_bonus_and_vocabulary() {
    let mut state = GameState::default();
    state.instance_mut("bd").owned_count = 5;
    state.instance_mut("ssd").owned_count = 1; // storage 4 + 8
    state.phases.insert("open-mic".into());
    state.beats = 1_000.0;
    let mut e = engine_with(state);
    e.load((*e.state()).clone(), 0, Vec::new());
    let before = e.state().production_rate;

    e.dispatch(&Action::PurchaseSampleBank { id: "percussion".into() }, 0);
    let state = e.state();
    assert!(state.is_bank_purchased("percussion"));
    assert!((state.production_rate - before * 1.05).abs() < 1e-9);
    assert_eq!(state.pool(ResourceKind::Storage).capacity_used, 2.5 + 2.0);
}
