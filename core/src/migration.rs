//! Save migration and offline backfill.
//!
//! Loading never fails. The payload is read as loose JSON and rebuilt
//! on top of a fresh default state one top-level field at a time. A
//! field that does not fit its current type keeps the default and the
//! rest still load. Map fields go one step further and accept or reject
//! each entry on its own, so one bad module does not cost the player
//! every other module.
//!
//! Older layouts are rewritten before the field pass:
//!   - `modules: {id: {count, unlocked}}`  → `catalogInstances`
//!   - scalar `bpm`                         → `bpmUpgrades`
//!   - `totalBeats`                         → `lifetimeBeats`
//!
//! Offline progress: the time since `lastSavedTimestamp`, capped at
//! `offline_cap_secs`, is credited at the freshly aggregated rate.

use crate::{
    catalog::Catalog,
    config::GameConfig,
    cost::{tempo_ceiling, MAX_CODE_LINES},
    production_subsystem::aggregate,
    state::GameState,
    types::Timestamp,
};
use serde_json::{Map, Value};

/// Top-level fields whose values are id-keyed maps.
const MAP_FIELDS: [&str; 5] = [
    "catalogInstances",
    "resourcePools",
    "achievements",
    "features",
    "sampleBanks",
];

#[derive(Debug, Clone, PartialEq)]
pub struct OfflineReport {
    pub seconds: f64,
    pub beats:   f64,
}

#[derive(Debug, Clone)]
pub struct Migrated {
    pub state:        GameState,
    /// `None` for unreadable payloads and saves without a version key.
    pub from_version: Option<String>,
    pub offline:      Option<OfflineReport>,
    /// One line per field or entry that fell back to its default.
    pub warnings:     Vec<String>,
}

/// Rebuild a state from a saved payload and credit offline time.
pub fn migrate(payload: &str, catalog: &Catalog, config: &GameConfig, now: Timestamp) -> Migrated {
    let defaults = GameState::new(catalog, config);

    let saved = match serde_json::from_str::<Value>(payload) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            log::warn!("migration: save is not an object ({}), starting fresh", type_name(&other));
            return fresh(defaults, "save is not a JSON object".into());
        }
        Err(e) => {
            log::warn!("migration: unreadable save, starting fresh: {e}");
            return fresh(defaults, format!("unreadable save: {e}"));
        }
    };

    let from_version = saved.get("version").and_then(Value::as_str).map(str::to_string);
    let last_saved = saved.get("lastSavedTimestamp").and_then(Value::as_i64);

    let saved = upgrade_legacy(saved);
    let (mut state, mut warnings) = merge_fields(&defaults, &saved);
    prune_unknown_ids(&mut state, catalog, &mut warnings);
    sanitize(&mut state, catalog, config);

    for w in &warnings {
        log::warn!("migration: {w}");
    }

    let offline = last_saved.and_then(|then| backfill(&mut state, catalog, config, then, now));

    Migrated { state, from_version, offline, warnings }
}

fn fresh(state: GameState, warning: String) -> Migrated {
    Migrated { state, from_version: None, offline: None, warnings: vec![warning] }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Rewrite pre-3.0 keys into their current shape. Existing current-shape
/// keys always win over legacy ones.
fn upgrade_legacy(mut saved: Map<String, Value>) -> Map<String, Value> {
    if let Some(Value::Object(modules)) = saved.remove("modules") {
        if !saved.contains_key("catalogInstances") {
            let instances: Map<String, Value> = modules
                .into_iter()
                .map(|(id, m)| {
                    let count = m.get("count").cloned().unwrap_or(Value::from(0));
                    let unlocked = m.get("unlocked").cloned().unwrap_or(Value::Bool(false));
                    let instance = serde_json::json!({ "ownedCount": count, "unlocked": unlocked });
                    (id, instance)
                })
                .collect();
            saved.insert("catalogInstances".into(), Value::Object(instances));
        }
    }

    if let Some(bpm) = saved.remove("bpm") {
        if !saved.contains_key("bpmUpgrades") && bpm.is_number() {
            saved.insert("bpmUpgrades".into(), serde_json::json!({ "level": 0, "bpm": bpm }));
        }
    }

    if let Some(total) = saved.remove("totalBeats") {
        if !saved.contains_key("lifetimeBeats") {
            saved.insert("lifetimeBeats".into(), total);
        }
    }

    saved
}

/// Overlay saved fields on the defaults, keeping each one only if the
/// whole state still deserializes with it in place.
fn merge_fields(defaults: &GameState, saved: &Map<String, Value>) -> (GameState, Vec<String>) {
    let mut warnings = Vec::new();
    let mut base = match serde_json::to_value(defaults) {
        Ok(Value::Object(map)) => map,
        _ => return (defaults.clone(), vec!["default state did not serialize".into()]),
    };

    let keys: Vec<String> = base.keys().cloned().collect();
    for key in keys {
        let Some(value) = saved.get(&key) else { continue };

        if MAP_FIELDS.contains(&key.as_str()) {
            merge_map_entries(&mut base, &key, value, &mut warnings);
            continue;
        }

        let mut candidate = base.clone();
        candidate.insert(key.clone(), value.clone());
        if fits(&candidate) {
            base = candidate;
        } else {
            warnings.push(format!("field '{key}' reset to default"));
        }
    }

    match serde_json::from_value::<GameState>(Value::Object(base)) {
        Ok(state) => (state, warnings),
        Err(e) => {
            warnings.push(format!("merged state rejected ({e}), using defaults"));
            (defaults.clone(), warnings)
        }
    }
}

fn merge_map_entries(
    base: &mut Map<String, Value>,
    key: &str,
    value: &Value,
    warnings: &mut Vec<String>,
) {
    let Value::Object(entries) = value else {
        warnings.push(format!("field '{key}' is not a map, reset to default"));
        return;
    };
    for (id, entry) in entries {
        let mut candidate = base.clone();
        let Some(Value::Object(map)) = candidate.get_mut(key) else { return };
        // Partial entries inherit the default entry's missing keys.
        let merged = match (map.get(id), entry) {
            (Some(Value::Object(default_entry)), Value::Object(saved_entry)) => {
                let mut merged = default_entry.clone();
                for (k, v) in saved_entry {
                    merged.insert(k.clone(), v.clone());
                }
                Value::Object(merged)
            }
            _ => entry.clone(),
        };
        map.insert(id.clone(), merged);
        if fits(&candidate) {
            *base = candidate;
        } else {
            warnings.push(format!("{key}['{id}'] reset to default"));
        }
    }
}

fn fits(candidate: &Map<String, Value>) -> bool {
    serde_json::from_value::<GameState>(Value::Object(candidate.clone())).is_ok()
}

/// Drop per-save rows for ids the catalog no longer defines.
fn prune_unknown_ids(state: &mut GameState, catalog: &Catalog, warnings: &mut Vec<String>) {
    let before = state.catalog_instances.len();
    state.catalog_instances.retain(|id, _| catalog.entry(id).is_some());
    let before_f = state.features.len();
    state.features.retain(|id, _| catalog.feature(id).is_some());
    let before_b = state.sample_banks.len();
    state.sample_banks.retain(|id, _| catalog.sample_bank(id).is_some());
    let before_a = state.achievements.len();
    state.achievements.retain(|id, _| catalog.achievement(id).is_some());
    state.phases.retain(|id| catalog.phase(id).is_some());

    let dropped = (before - state.catalog_instances.len())
        + (before_f - state.features.len())
        + (before_b - state.sample_banks.len())
        + (before_a - state.achievements.len());
    if dropped > 0 {
        warnings.push(format!("dropped {dropped} entries unknown to this version"));
    }
}

/// Clamp values serde accepts but the game does not.
fn sanitize(state: &mut GameState, catalog: &Catalog, config: &GameConfig) {
    state.beats = state.beats.max(0.0);
    state.lifetime_beats = state.lifetime_beats.max(state.beats);
    state.elapsed_time = state.elapsed_time.max(0.0);
    state.complexity = state.complexity.clamp(0.0, 1.0);
    state.engagement = state.engagement.clamp(0.0, 100.0);
    state.unlocked_lines = state.unlocked_lines.clamp(1, MAX_CODE_LINES);
    state.bpm_upgrades.level = state.bpm_upgrades.level.min(catalog.max_bpm_level());
    let ceiling = tempo_ceiling(catalog, config, state.bpm_upgrades.level);
    state.bpm_upgrades.bpm = state.bpm_upgrades.bpm.clamp(config.min_bpm, ceiling);
    state.save_meta.auto_save_interval_minutes = state.save_meta.auto_save_interval_minutes.max(1);
    while state.news_log.len() > config.news_log_limit.max(1) {
        state.news_log.pop_front();
    }
    // The counter must stay strictly above every live id.
    state.news_log.retain(|n| n.id < u64::MAX);
    let max_news_id = state.news_log.iter().map(|n| n.id).max().unwrap_or(0);
    state.next_news_id = state.next_news_id.max(max_news_id + 1);
}

/// Credit production for the time the game was closed.
fn backfill(
    state: &mut GameState,
    catalog: &Catalog,
    config: &GameConfig,
    last_saved: Timestamp,
    now: Timestamp,
) -> Option<OfflineReport> {
    if now <= last_saved {
        return None;
    }
    let seconds = ((now - last_saved) as f64 / 1000.0).min(config.offline_cap_secs.max(0.0));
    let rate = match aggregate(state, catalog, config) {
        Ok(agg) => agg.production_rate,
        Err(e) => {
            log::warn!("migration: offline rate unavailable, skipping backfill: {e}");
            return None;
        }
    };
    let beats = rate * seconds * config.offline_efficiency.max(0.0);
    if !(beats.is_finite() && beats > 0.0) {
        return None;
    }
    state.earn(beats);
    state.push_news(
        format!("While you were away: +{beats:.0} beats ({})", describe_duration(seconds)),
        now,
        config.news_log_limit,
    );
    log::info!("migration: offline backfill {seconds:.0}s → {beats:.1} beats");
    Some(OfflineReport { seconds, beats })
}

fn describe_duration(seconds: f64) -> String {
    let total = seconds as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}h {m}m")
    } else if m > 0 {
        format!("{m}m {s}s")
    } else {
        format!("{s}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog::builtin, snapshot::SaveSnapshot, state::BpmUpgrades};

    fn run(payload: &str, now: Timestamp) -> Migrated {
        migrate(payload, builtin(), &GameConfig::default(), now)
    }

    #[test]
    fn current_snapshot_loads_unchanged() {
        let mut state = GameState::default();
        state.beats = 42.0;
        state.lifetime_beats = 42.0;
        state.instance_mut("bd").owned_count = 3;
        let json = SaveSnapshot::capture(&state, 5_000).to_json().unwrap();
        let out = run(&json, 5_000);
        assert!(out.warnings.is_empty(), "{:?}", out.warnings);
        assert_eq!(out.state, state);
        assert_eq!(out.from_version.as_deref(), Some("3.0.0"));
        assert_eq!(out.offline, None);
    }

    #[test]
    fn garbage_starts_fresh() {
        let out = run("{ not json", 0);
        assert_eq!(out.state, GameState::default());
        assert_eq!(out.warnings.len(), 1);
        let out = run("[1, 2]", 0);
        assert_eq!(out.state, GameState::default());
    }

    #[test]
    fn bad_field_falls_back_alone() {
        let out = run(r#"{"beats": "lots", "complexity": 0.5, "unlockedLines": 3}"#, 0);
        assert_eq!(out.state.beats, 0.0);
        assert_eq!(out.state.complexity, 0.5);
        assert_eq!(out.state.unlocked_lines, 3);
        assert_eq!(out.warnings, vec!["field 'beats' reset to default".to_string()]);
    }

    #[test]
    fn bad_map_entry_falls_back_alone() {
        let out = run(
            r#"{"catalogInstances": {"bd": {"ownedCount": 4}, "hh": {"ownedCount": -2, "unlocked": true}}}"#,
            0,
        );
        assert_eq!(out.state.owned("bd"), 4);
        assert!(out.state.is_entry_unlocked("bd"));
        assert_eq!(out.state.owned("hh"), 0);
        assert!(!out.state.is_entry_unlocked("hh"));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn missing_bpm_upgrades_get_default() {
        let out = run(r#"{"beats": 12}"#, 0);
        assert_eq!(out.state.bpm_upgrades, BpmUpgrades::default());
        assert_eq!(out.state.beats, 12.0);
    }

    #[test]
    fn legacy_layout_is_upgraded() {
        let out = run(
            r#"{"modules": {"bd": {"count": 2, "unlocked": true}}, "bpm": 128, "totalBeats": 900, "beats": 10}"#,
            0,
        );
        assert_eq!(out.state.owned("bd"), 2);
        assert_eq!(out.state.bpm_upgrades.bpm, 128.0);
        assert_eq!(out.state.bpm_upgrades.level, 0);
        assert_eq!(out.state.lifetime_beats, 900.0);
        assert_eq!(out.from_version, None);
    }

    #[test]
    fn news_ids_at_the_limit_are_dropped() {
        let out = run(
            r#"{"newsLog": [
                {"id": 18446744073709551615, "message": "late", "timestamp": 0},
                {"id": 4, "message": "kept", "timestamp": 0}
            ], "nextNewsId": 2}"#,
            0,
        );
        let ids: Vec<u64> = out.state.news_log.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![4]);
        assert_eq!(out.state.next_news_id, 5);
    }

    #[test]
    fn saturated_news_counter_still_accepts_news() {
        let mut out = run(r#"{"nextNewsId": 18446744073709551615}"#, 0);
        assert_eq!(out.state.next_news_id, u64::MAX);
        out.state.push_news("still here", 0, 10);
        assert_eq!(out.state.news_log.back().unwrap().message, "still here");
    }

    #[test]
    fn line_count_and_tempo_tier_are_bounded() {
        let out = run(r#"{"unlockedLines": 4294967295, "bpmUpgrades": {"level": 4294967295, "bpm": 150}}"#, 0);
        assert_eq!(out.state.unlocked_lines, MAX_CODE_LINES);
        assert_eq!(out.state.bpm_upgrades.level, builtin().max_bpm_level());
        assert_eq!(out.state.bpm_upgrades.bpm, 150.0);

        let none = run(r#"{"unlockedLines": 0}"#, 0);
        assert_eq!(none.state.unlocked_lines, 1);
    }

    #[test]
    fn tempo_is_held_to_the_saved_tier() {
        let out = run(
            r#"{"catalogInstances": {"bd": {"ownedCount": 20}}, "bpmUpgrades": {"level": 0, "bpm": 1e308}}"#,
            0,
        );
        assert_eq!(out.state.bpm_upgrades.bpm, 130.0);
        let agg = aggregate(&out.state, builtin(), &GameConfig::default()).unwrap();
        assert!((agg.unconstrained_rate - 20.0 * 0.2 * 130.0 / 120.0).abs() < 1e-9);

        let slow = run(r#"{"bpmUpgrades": {"level": 1, "bpm": 1}}"#, 0);
        assert_eq!(slow.state.bpm_upgrades.bpm, 60.0);
    }

    #[test]
    fn offline_time_is_capped() {
        let mut state = GameState::default();
        state.instance_mut("bd").owned_count = 5; // 1 beat/s
        let json = SaveSnapshot::capture(&state, 0).to_json().unwrap();

        let hour = run(&json, 3_600_000);
        let report = hour.offline.unwrap();
        assert_eq!(report.seconds, 3_600.0);
        assert!((report.beats - 3_600.0).abs() < 1e-6);
        assert!((hour.state.beats - 3_600.0).abs() < 1e-6);

        let week = run(&json, 7 * 24 * 3_600_000);
        assert_eq!(week.offline.unwrap().seconds, 8.0 * 3_600.0);
    }

    #[test]
    fn clock_going_backwards_gives_no_backfill() {
        let mut state = GameState::default();
        state.instance_mut("bd").owned_count = 5;
        let json = SaveSnapshot::capture(&state, 10_000).to_json().unwrap();
        assert_eq!(run(&json, 5_000).offline, None);
    }
}
