//! Static catalog: every purchasable and unlockable definition.
//!
//! RULE: Nothing here is ever mutated. Per-save mutable data lives in
//! `GameState` keyed by the ids defined in these tables.
//!
//! Unlock requirements are declarative: each definition carries its own
//! prerequisite list, and the unlock subsystem resolves them generically.
//! Adding an entry never requires touching the evaluator.

mod achievements;
mod modules;
mod progression;

pub use achievements::ACHIEVEMENTS;
pub use modules::ENTRIES;
pub use progression::{BPM_TIERS, FEATURES, KIND_GATES, PHASES, SAMPLE_BANKS};

use crate::{state::GameState, types::ResourceKind};

/// What an entry does once owned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Produces beats and adds its sample to the pattern vocabulary.
    Sound,
    /// Produces nothing; adds its effect method to the pattern vocabulary.
    Effect,
    /// Produces nothing; adds capacity to one resource pool.
    Hardware(ResourceKind),
}

/// Price curve of an entry as a function of the owned count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CostCurve {
    /// `base × (owned + 1)`
    Linear,
    /// `base × growth^owned`, growth > 1.
    Exponential { growth: f64 },
}

/// A single declarative unlock condition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Prerequisite {
    LifetimeBeats(f64),
    Beats(f64),
    Owned { id: &'static str, count: u32 },
    EntryUnlocked(&'static str),
    PhaseReached(&'static str),
    CapacityTotal { kind: ResourceKind, at_least: f64 },
    ProductionRate(f64),
    FeaturePurchased(&'static str),
}

#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub id:              &'static str,
    pub display_name:    &'static str,
    pub kind:            EntryKind,
    pub base_cost:       f64,
    pub cost_curve:      CostCurve,
    pub unit_production: f64,
    pub consumption:     &'static [(ResourceKind, f64)],
    /// Capacity added per owned unit (hardware only).
    pub capacity:        f64,
    /// Sample name (Sound) or effect method (Effect) this entry contributes.
    pub vocabulary:      Option<&'static str>,
    /// Default argument when the entry is rendered as an effect.
    pub effect_amount:   f64,
    pub prerequisites:   &'static [Prerequisite],
}

#[derive(Debug, Clone)]
pub struct PhaseDef {
    pub id:            &'static str,
    pub name:          &'static str,
    pub prerequisites: &'static [Prerequisite],
}

#[derive(Debug, Clone)]
pub struct FeatureDef {
    pub id:            &'static str,
    pub name:          &'static str,
    pub cost:          f64,
    pub consumption:   &'static [(ResourceKind, f64)],
    pub prerequisites: &'static [Prerequisite],
}

#[derive(Debug, Clone)]
pub struct SampleBankDef {
    pub id:               &'static str,
    pub name:             &'static str,
    pub samples:          &'static [&'static str],
    pub cost:             f64,
    pub production_bonus: f64,
    pub consumption:      &'static [(ResourceKind, f64)],
    pub prerequisites:    &'static [Prerequisite],
}

#[derive(Debug, Clone, Copy)]
pub struct BpmTier {
    pub level:   u32,
    pub max_bpm: f64,
    pub cost:    f64,
}

/// Unlock rule for a hardware purchase category.
#[derive(Debug, Clone)]
pub struct KindGate {
    pub kind:          ResourceKind,
    pub prerequisites: &'static [Prerequisite],
}

pub struct AchievementDef {
    pub id:          &'static str,
    pub name:        &'static str,
    pub description: &'static str,
    pub hidden:      bool,
    /// Pure predicate over the committed state. Never mutates, never does I/O.
    pub condition:   fn(&GameState) -> bool,
}

impl std::fmt::Debug for AchievementDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AchievementDef")
            .field("id", &self.id)
            .field("hidden", &self.hidden)
            .finish()
    }
}

/// Borrowed view over the static tables. Tests may build their own.
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    pub entries:      &'static [CatalogEntry],
    pub phases:       &'static [PhaseDef],
    pub features:     &'static [FeatureDef],
    pub sample_banks: &'static [SampleBankDef],
    pub bpm_tiers:    &'static [BpmTier],
    pub kind_gates:   &'static [KindGate],
    pub achievements: &'static [AchievementDef],
}

static BUILTIN: Catalog = Catalog {
    entries:      ENTRIES,
    phases:       PHASES,
    features:     FEATURES,
    sample_banks: SAMPLE_BANKS,
    bpm_tiers:    BPM_TIERS,
    kind_gates:   KIND_GATES,
    achievements: ACHIEVEMENTS,
};

/// The shipped catalog.
pub fn builtin() -> &'static Catalog {
    &BUILTIN
}

impl Catalog {
    pub fn entry(&self, id: &str) -> Option<&'static CatalogEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn phase(&self, id: &str) -> Option<&'static PhaseDef> {
        self.phases.iter().find(|p| p.id == id)
    }

    pub fn feature(&self, id: &str) -> Option<&'static FeatureDef> {
        self.features.iter().find(|f| f.id == id)
    }

    pub fn sample_bank(&self, id: &str) -> Option<&'static SampleBankDef> {
        self.sample_banks.iter().find(|b| b.id == id)
    }

    pub fn achievement(&self, id: &str) -> Option<&'static AchievementDef> {
        self.achievements.iter().find(|a| a.id == id)
    }

    pub fn bpm_tier(&self, level: u32) -> Option<&'static BpmTier> {
        self.bpm_tiers.iter().find(|t| t.level == level)
    }

    pub fn max_bpm_level(&self) -> u32 {
        self.bpm_tiers.iter().map(|t| t.level).max().unwrap_or(0)
    }

    pub fn sound_entries(&self) -> impl Iterator<Item = &'static CatalogEntry> {
        self.entries.iter().filter(|e| e.kind == EntryKind::Sound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_unique_per_table() {
        let catalog = builtin();
        let entries: HashSet<_> = catalog.entries.iter().map(|e| e.id).collect();
        assert_eq!(entries.len(), catalog.entries.len());
        let features: HashSet<_> = catalog.features.iter().map(|f| f.id).collect();
        assert_eq!(features.len(), catalog.features.len());
        let achievements: HashSet<_> = catalog.achievements.iter().map(|a| a.id).collect();
        assert_eq!(achievements.len(), catalog.achievements.len());
    }

    #[test]
    fn prerequisites_reference_known_ids() {
        let catalog = builtin();
        let all_prereqs = catalog
            .entries
            .iter()
            .flat_map(|e| e.prerequisites)
            .chain(catalog.phases.iter().flat_map(|p| p.prerequisites))
            .chain(catalog.features.iter().flat_map(|f| f.prerequisites))
            .chain(catalog.sample_banks.iter().flat_map(|b| b.prerequisites))
            .chain(catalog.kind_gates.iter().flat_map(|g| g.prerequisites));

        for prereq in all_prereqs {
            match prereq {
                Prerequisite::Owned { id, .. } | Prerequisite::EntryUnlocked(id) => {
                    assert!(catalog.entry(id).is_some(), "unknown entry {id}");
                }
                Prerequisite::PhaseReached(id) => {
                    assert!(catalog.phase(id).is_some(), "unknown phase {id}");
                }
                Prerequisite::FeaturePurchased(id) => {
                    assert!(catalog.feature(id).is_some(), "unknown feature {id}");
                }
                _ => {}
            }
        }
    }

    #[test]
    fn bpm_tiers_are_contiguous_and_rising() {
        let catalog = builtin();
        for (i, tier) in catalog.bpm_tiers.iter().enumerate() {
            assert_eq!(tier.level as usize, i);
            if i > 0 {
                assert!(tier.max_bpm > catalog.bpm_tiers[i - 1].max_bpm);
            }
        }
    }

    #[test]
    fn vocabulary_matches_kind() {
        for entry in builtin().entries {
            match entry.kind {
                EntryKind::Sound | EntryKind::Effect => assert!(entry.vocabulary.is_some()),
                EntryKind::Hardware(_) => {
                    assert!(entry.vocabulary.is_none());
                    assert!(entry.capacity > 0.0);
                }
            }
        }
    }
}
