//! Cost and effect functions.
//!
//! Everything here is a pure function of static definitions and counts,
//! so prices can be asserted at any owned count without simulating
//! purchases.

use crate::{
    catalog::{Catalog, CatalogEntry, CostCurve, EntryKind},
    config::GameConfig,
};

/// Highest pattern code line that can be unlocked.
pub const MAX_CODE_LINES: u32 = 32;

/// Price of the next unit of `entry` when `owned` are already owned.
pub fn purchase_cost(entry: &CatalogEntry, owned: u32) -> f64 {
    match entry.cost_curve {
        CostCurve::Linear => entry.base_cost * (owned as f64 + 1.0),
        CostCurve::Exponential { growth } => entry.base_cost * growth.powf(owned as f64),
    }
}

/// Beats per second produced by `owned` units, before multipliers.
/// Effects and hardware never produce.
pub fn effective_production(entry: &CatalogEntry, owned: u32) -> f64 {
    match entry.kind {
        EntryKind::Sound => entry.unit_production * owned as f64,
        EntryKind::Effect | EntryKind::Hardware(_) => 0.0,
    }
}

/// Price of pattern code line `line` (1-based). Line 1 is free.
pub fn line_cost(line: u32) -> f64 {
    if line <= 1 {
        return 0.0;
    }
    25.0 * 3f64.powi(line as i32 - 2)
}

/// Fastest tempo allowed at BPM tier `level`. Never below `min_bpm`.
pub fn tempo_ceiling(catalog: &Catalog, config: &GameConfig, level: u32) -> f64 {
    catalog
        .bpm_tier(level)
        .map(|t| t.max_bpm)
        .unwrap_or(config.base_bpm)
        .max(config.min_bpm)
}

/// Production multiplier from the engagement metric.
pub fn engagement_multiplier(engagement: f64) -> f64 {
    1.0 + engagement.max(0.0) / 100.0
}

/// Production multiplier from the current tempo.
pub fn tempo_multiplier(bpm: f64, base_bpm: f64) -> f64 {
    if base_bpm <= 0.0 {
        return 1.0;
    }
    (bpm / base_bpm).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin;

    #[test]
    fn tempo_ceiling_follows_tiers() {
        let config = GameConfig::default();
        assert_eq!(tempo_ceiling(builtin(), &config, 0), 130.0);
        assert_eq!(tempo_ceiling(builtin(), &config, 1), 145.0);
        // Unknown tiers fall back to the base tempo.
        assert_eq!(tempo_ceiling(builtin(), &config, u32::MAX), 120.0);
    }

    #[test]
    fn kick_costs_ten_at_zero() {
        let bd = builtin().entry("bd").unwrap();
        assert_eq!(purchase_cost(bd, 0), 10.0);
        assert_eq!(purchase_cost(bd, 1), 20.0);
        assert_eq!(purchase_cost(bd, 9), 100.0);
    }

    #[test]
    fn hardware_grows_geometrically() {
        let ram = builtin().entry("ram").unwrap();
        let c0 = purchase_cost(ram, 0);
        let c1 = purchase_cost(ram, 1);
        let c2 = purchase_cost(ram, 2);
        assert!((c1 / c0 - 1.6).abs() < 1e-9);
        assert!((c2 / c1 - 1.6).abs() < 1e-9);
    }

    #[test]
    fn costs_strictly_increase_for_every_entry() {
        for entry in builtin().entries {
            for n in 0..50 {
                assert!(
                    purchase_cost(entry, n + 1) > purchase_cost(entry, n),
                    "{} not increasing at {n}",
                    entry.id
                );
            }
        }
    }

    #[test]
    fn effects_and_hardware_produce_nothing() {
        let catalog = builtin();
        assert_eq!(effective_production(catalog.entry("room").unwrap(), 5), 0.0);
        assert_eq!(effective_production(catalog.entry("ram").unwrap(), 5), 0.0);
        assert_eq!(effective_production(catalog.entry("hh").unwrap(), 5), 4.0);
    }

    #[test]
    fn line_costs() {
        assert_eq!(line_cost(1), 0.0);
        assert_eq!(line_cost(2), 25.0);
        assert_eq!(line_cost(3), 75.0);
        assert_eq!(line_cost(4), 225.0);
    }
}
