//! Transition events.
//!
//! Subsystems and the reducer report what changed through events; the
//! engine hands them to subscribers after the state is committed.
//! Variants are appended, never removed or reordered.

use crate::types::{EntryId, ResourceKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    // ── Loop events ────────────────────────────────
    FrameCompleted {
        frame: u64,
        delta_secs: f64,
        production_rate: f64,
    },
    SubsystemFailed {
        subsystem: String,
        reason: String,
    },

    // ── Aggregation ────────────────────────────────
    ResourceOverloaded {
        kind: ResourceKind,
        used: f64,
        total: f64,
    },
    OverloadCleared {
        kind: ResourceKind,
    },

    // ── Unlocks ────────────────────────────────────
    EntryUnlocked {
        id: EntryId,
    },
    ResourceKindUnlocked {
        kind: ResourceKind,
    },
    PhaseReached {
        id: EntryId,
    },
    FeatureUnlocked {
        id: EntryId,
    },
    SampleBankUnlocked {
        id: EntryId,
    },
    AchievementUnlocked {
        id: EntryId,
        name: String,
        hidden: bool,
    },

    // ── Player actions ─────────────────────────────
    BeatsAdded {
        amount: f64,
    },
    Purchased {
        id: EntryId,
        cost: f64,
        owned: u32,
    },
    PurchaseRejected {
        id: EntryId,
        reason: String,
    },
    FeatureToggled {
        id: EntryId,
        enabled: bool,
    },
    TempoChanged {
        bpm: f64,
    },
    ComplexityChanged {
        complexity: f64,
    },
    LineUnlocked {
        line: u32,
    },
    PatternRegenerated {
        seed: u64,
    },
    StateReset {
        kept_achievements: bool,
    },

    // ── Persistence ────────────────────────────────
    OfflineProgress {
        seconds: f64,
        beats: f64,
    },
    AutoSaveScheduled {
        timestamp: i64,
    },
}

impl GameEvent {
    /// Stable type name, matching the serialized tag.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::FrameCompleted { .. }       => "frame_completed",
            Self::SubsystemFailed { .. }      => "subsystem_failed",
            Self::ResourceOverloaded { .. }   => "resource_overloaded",
            Self::OverloadCleared { .. }      => "overload_cleared",
            Self::EntryUnlocked { .. }        => "entry_unlocked",
            Self::ResourceKindUnlocked { .. } => "resource_kind_unlocked",
            Self::PhaseReached { .. }         => "phase_reached",
            Self::FeatureUnlocked { .. }      => "feature_unlocked",
            Self::SampleBankUnlocked { .. }   => "sample_bank_unlocked",
            Self::AchievementUnlocked { .. }  => "achievement_unlocked",
            Self::BeatsAdded { .. }           => "beats_added",
            Self::Purchased { .. }            => "purchased",
            Self::PurchaseRejected { .. }     => "purchase_rejected",
            Self::FeatureToggled { .. }       => "feature_toggled",
            Self::TempoChanged { .. }         => "tempo_changed",
            Self::ComplexityChanged { .. }    => "complexity_changed",
            Self::LineUnlocked { .. }         => "line_unlocked",
            Self::PatternRegenerated { .. }   => "pattern_regenerated",
            Self::StateReset { .. }           => "state_reset",
            Self::OfflineProgress { .. }      => "offline_progress",
            Self::AutoSaveScheduled { .. }    => "auto_save_scheduled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_matches_serialized_tag() {
        let events = [
            GameEvent::FrameCompleted { frame: 1, delta_secs: 0.5, production_rate: 0.2 },
            GameEvent::ResourceOverloaded { kind: ResourceKind::Memory, used: 9.0, total: 8.0 },
            GameEvent::AchievementUnlocked { id: "first-beat".into(), name: "First Beat".into(), hidden: false },
            GameEvent::PurchaseRejected { id: "bd".into(), reason: "locked".into() },
            GameEvent::OfflineProgress { seconds: 60.0, beats: 12.0 },
            GameEvent::AutoSaveScheduled { timestamp: 60_000 },
        ];
        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["type"], event.event_type());
        }
    }
}
