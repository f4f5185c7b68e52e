use serde::{Deserialize, Serialize};

/// Every player-issued action.
/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    // ── Currency ──────────────────────────────────
    AddBeats { amount: f64 },

    // ── Purchases ─────────────────────────────────
    PurchaseCatalogEntry { id: String },
    PurchaseHardware { id: String },
    PurchaseFeature { id: String },
    PurchaseSampleBank { id: String },
    PurchaseBpmUpgrade,
    UnlockLine { line: u32 },

    // ── Controls ──────────────────────────────────
    SetComplexity { value: f64 },
    ToggleFeature { id: String },
    SetTempo { bpm: f64 },
    RegeneratePattern,
    SetAutoSave { enabled: bool, interval_minutes: u32 },
    DismissNews { id: u64 },

    // ── Lifecycle ─────────────────────────────────
    ResetState { keep_achievements: bool },
}

impl Action {
    /// Whether a successful application should regenerate the pattern.
    pub fn regenerates_pattern(&self) -> bool {
        matches!(
            self,
            Self::PurchaseCatalogEntry { .. }
                | Self::PurchaseFeature { .. }
                | Self::PurchaseSampleBank { .. }
                | Self::UnlockLine { .. }
                | Self::SetComplexity { .. }
                | Self::ToggleFeature { .. }
                | Self::SetTempo { .. }
                | Self::RegeneratePattern
                | Self::ResetState { .. }
        )
    }
}
