//! Tuning configuration.
//!
//! Every key has a default, so a tuning file only needs the values it
//! changes. In tests, use `GameConfig::default()`.

use crate::types::ResourceKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How overload warnings reach the news log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverloadNotice {
    /// One entry when a pool goes over capacity, one when it recovers.
    OnTransition,
    /// One entry per overloaded pool on every tick.
    EveryTick,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub news_log_limit:            usize,
    pub overload_penalty:          f64,
    pub overload_notice:           OverloadNotice,
    pub max_gate_passes:           u32,
    pub offline_cap_secs:          f64,
    pub offline_efficiency:        f64,
    pub base_capacity:             BTreeMap<ResourceKind, f64>,
    /// Fraction of the gap to the engagement target closed per second.
    pub engagement_rate:           f64,
    pub autosave_interval_minutes: u32,
    pub tap_value:                 f64,
    pub min_bpm:                   f64,
    pub base_bpm:                  f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        let base_capacity = BTreeMap::from([
            (ResourceKind::Memory,           8.0),
            (ResourceKind::Compute,          6.0),
            (ResourceKind::SignalProcessing, 0.0),
            (ResourceKind::Storage,          4.0),
        ]);
        Self {
            news_log_limit:            10,
            overload_penalty:          0.5,
            overload_notice:           OverloadNotice::OnTransition,
            max_gate_passes:           16,
            offline_cap_secs:          8.0 * 3600.0,
            offline_efficiency:        1.0,
            base_capacity,
            engagement_rate:           0.05,
            autosave_interval_minutes: 1,
            tap_value:                 1.0,
            min_bpm:                   60.0,
            base_bpm:                  120.0,
        }
    }
}

impl GameConfig {
    /// Load a JSON tuning file. Missing keys keep their defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: GameConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.news_log_limit == 0 {
            anyhow::bail!("news_log_limit must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.overload_penalty) {
            anyhow::bail!("overload_penalty must be within [0, 1], got {}", self.overload_penalty);
        }
        if self.max_gate_passes == 0 {
            anyhow::bail!("max_gate_passes must be at least 1");
        }
        if self.base_capacity.values().any(|c| !c.is_finite() || *c < 0.0) {
            anyhow::bail!("base_capacity values must be finite and non-negative");
        }
        if !(self.min_bpm > 0.0 && self.base_bpm >= self.min_bpm) {
            anyhow::bail!("bpm bounds must satisfy 0 < min_bpm <= base_bpm");
        }
        Ok(())
    }

    pub fn base_capacity_of(&self, kind: ResourceKind) -> f64 {
        self.base_capacity.get(&kind).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: GameConfig =
            serde_json::from_str(r#"{ "news_log_limit": 5, "overload_notice": "every_tick" }"#)
                .unwrap();
        assert_eq!(config.news_log_limit, 5);
        assert_eq!(config.overload_notice, OverloadNotice::EveryTick);
        assert_eq!(config.overload_penalty, 0.5);
        assert_eq!(config.base_capacity_of(ResourceKind::Memory), 8.0);
    }

    #[test]
    fn invalid_penalty_rejected() {
        let config = GameConfig { overload_penalty: 1.5, ..GameConfig::default() };
        assert!(config.validate().is_err());
    }
}
