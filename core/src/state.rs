//! The root game-state aggregate.
//!
//! RULE: A GameState is never edited in place once committed. Every
//! transition (frame or player action) clones the previous state, works
//! on the clone, and the engine swaps the whole value in one step.
//!
//! The persisted shape uses camelCase keys.

use crate::{
    catalog::Catalog,
    config::GameConfig,
    pattern::generator::{self, GenerationInput},
    types::{EntryId, ResourceKind, Timestamp},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogInstance {
    pub owned_count: u32,
    /// Monotonic: never goes back to false.
    pub unlocked:    bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcePool {
    pub capacity_total: f64,
    pub capacity_used:  f64,
}

impl ResourcePool {
    /// A pool with nothing in it and nothing used is not overloaded.
    pub fn is_overloaded(&self) -> bool {
        self.capacity_used > self.capacity_total
    }

    pub fn headroom(&self) -> f64 {
        self.capacity_total - self.capacity_used
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementState {
    pub unlocked: bool,
    pub hidden:   bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureState {
    pub unlocked:  bool,
    pub purchased: bool,
    pub enabled:   bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleBankState {
    pub unlocked:  bool,
    pub purchased: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BpmUpgrades {
    pub level: u32,
    pub bpm:   f64,
}

impl Default for BpmUpgrades {
    fn default() -> Self {
        Self { level: 0, bpm: 120.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsEntry {
    pub id:        u64,
    pub message:   String,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveMeta {
    pub auto_save_enabled:          bool,
    pub auto_save_interval_minutes: u32,
    pub last_auto_save_timestamp:   Timestamp,
}

impl Default for SaveMeta {
    fn default() -> Self {
        Self {
            auto_save_enabled:          true,
            auto_save_interval_minutes: 1,
            last_auto_save_timestamp:   0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub beats:                  f64,
    pub lifetime_beats:         f64,
    /// Derived every tick; the persisted value is only a hint.
    pub production_rate:        f64,
    pub elapsed_time:           f64,
    pub catalog_instances:      BTreeMap<EntryId, CatalogInstance>,
    pub resource_pools:         BTreeMap<ResourceKind, ResourcePool>,
    pub unlocked_catalog_kinds: BTreeSet<ResourceKind>,
    /// Pools that were over capacity at the last aggregation.
    pub overloaded_kinds:       BTreeSet<ResourceKind>,
    pub achievements:           BTreeMap<EntryId, AchievementState>,
    pub phases:                 BTreeSet<EntryId>,
    pub features:               BTreeMap<EntryId, FeatureState>,
    pub sample_banks:           BTreeMap<EntryId, SampleBankState>,
    pub bpm_upgrades:           BpmUpgrades,
    pub complexity:             f64,
    pub engagement:             f64,
    pub unlocked_lines:         u32,
    pub pattern_code:           String,
    pub pattern_seed:           u64,
    pub news_log:               VecDeque<NewsEntry>,
    pub next_news_id:           u64,
    pub save_meta:              SaveMeta,
}

impl Default for GameState {
    fn default() -> Self {
        GameState::new(crate::catalog::builtin(), &GameConfig::default())
    }
}

impl GameState {
    /// Fresh state for a new game. Anything without prerequisites starts
    /// unlocked; free sample banks start owned.
    pub fn new(catalog: &Catalog, config: &GameConfig) -> Self {
        let catalog_instances = catalog
            .entries
            .iter()
            .map(|e| {
                let instance = CatalogInstance {
                    owned_count: 0,
                    unlocked:    e.prerequisites.is_empty(),
                };
                (e.id.to_string(), instance)
            })
            .collect();

        let resource_pools = ResourceKind::ALL
            .iter()
            .map(|k| {
                let pool = ResourcePool {
                    capacity_total: config.base_capacity_of(*k),
                    capacity_used:  0.0,
                };
                (*k, pool)
            })
            .collect();

        let unlocked_catalog_kinds = catalog
            .kind_gates
            .iter()
            .filter(|g| g.prerequisites.is_empty())
            .map(|g| g.kind)
            .collect();

        let achievements = catalog
            .achievements
            .iter()
            .map(|a| {
                let state = AchievementState { unlocked: false, hidden: a.hidden };
                (a.id.to_string(), state)
            })
            .collect();

        let phases = catalog
            .phases
            .iter()
            .filter(|p| p.prerequisites.is_empty())
            .map(|p| p.id.to_string())
            .collect();

        let features = catalog
            .features
            .iter()
            .map(|f| {
                let state = FeatureState {
                    unlocked: f.prerequisites.is_empty(),
                    ..FeatureState::default()
                };
                (f.id.to_string(), state)
            })
            .collect();

        let sample_banks = catalog
            .sample_banks
            .iter()
            .map(|b| {
                let free = b.prerequisites.is_empty() && b.cost == 0.0;
                let state = SampleBankState {
                    unlocked:  b.prerequisites.is_empty(),
                    purchased: free,
                };
                (b.id.to_string(), state)
            })
            .collect();

        let mut state = Self {
            beats:                  0.0,
            lifetime_beats:         0.0,
            production_rate:        0.0,
            elapsed_time:           0.0,
            catalog_instances,
            resource_pools,
            unlocked_catalog_kinds,
            overloaded_kinds:       BTreeSet::new(),
            achievements,
            phases,
            features,
            sample_banks,
            bpm_upgrades:           BpmUpgrades { level: 0, bpm: config.base_bpm },
            complexity:             0.0,
            engagement:             0.0,
            unlocked_lines:         1,
            pattern_code:           String::new(),
            pattern_seed:           0,
            news_log:               VecDeque::new(),
            next_news_id:           1,
            save_meta:              SaveMeta {
                auto_save_interval_minutes: config.autosave_interval_minutes,
                ..SaveMeta::default()
            },
        };
        let input = GenerationInput::from_state(&state, catalog);
        state.pattern_code = generator::minimal_pattern(&input);
        state
    }

    // ── Queries ─────────────────────────────────────

    pub fn owned(&self, id: &str) -> u32 {
        self.catalog_instances.get(id).map(|i| i.owned_count).unwrap_or(0)
    }

    pub fn is_entry_unlocked(&self, id: &str) -> bool {
        self.catalog_instances.get(id).map(|i| i.unlocked).unwrap_or(false)
    }

    pub fn has_phase(&self, id: &str) -> bool {
        self.phases.contains(id)
    }

    pub fn is_feature_unlocked(&self, id: &str) -> bool {
        self.features.get(id).map(|f| f.unlocked).unwrap_or(false)
    }

    pub fn is_feature_purchased(&self, id: &str) -> bool {
        self.features.get(id).map(|f| f.purchased).unwrap_or(false)
    }

    pub fn is_feature_enabled(&self, id: &str) -> bool {
        self.features.get(id).map(|f| f.purchased && f.enabled).unwrap_or(false)
    }

    pub fn is_bank_unlocked(&self, id: &str) -> bool {
        self.sample_banks.get(id).map(|b| b.unlocked).unwrap_or(false)
    }

    pub fn is_bank_purchased(&self, id: &str) -> bool {
        self.sample_banks.get(id).map(|b| b.purchased).unwrap_or(false)
    }

    pub fn is_achievement_unlocked(&self, id: &str) -> bool {
        self.achievements.get(id).map(|a| a.unlocked).unwrap_or(false)
    }

    pub fn unlocked_achievement_count(&self) -> usize {
        self.achievements.values().filter(|a| a.unlocked).count()
    }

    pub fn pool(&self, kind: ResourceKind) -> ResourcePool {
        self.resource_pools.get(&kind).cloned().unwrap_or_default()
    }

    // ── Mutation helpers (used on the working copy only) ──

    /// Append a news entry, evicting the oldest past `limit`.
    pub fn push_news(&mut self, message: impl Into<String>, timestamp: Timestamp, limit: usize) {
        let entry = NewsEntry {
            id: self.next_news_id,
            message: message.into(),
            timestamp,
        };
        self.next_news_id = self.next_news_id.saturating_add(1);
        self.news_log.push_back(entry);
        while self.news_log.len() > limit.max(1) {
            self.news_log.pop_front();
        }
    }

    /// Credit beats earned by taps, production or offline backfill.
    /// Negative and non-finite amounts are ignored.
    pub fn earn(&mut self, amount: f64) {
        if amount.is_finite() && amount > 0.0 {
            self.beats += amount;
            self.lifetime_beats += amount;
        }
    }

    pub fn instance_mut(&mut self, id: &str) -> &mut CatalogInstance {
        self.catalog_instances.entry(id.to_string()).or_default()
    }
}
