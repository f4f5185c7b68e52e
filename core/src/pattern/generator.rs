//! Pattern code generation.
//!
//! Builds a tree from the player's unlocked vocabulary and renders it.
//! All randomness comes from the injected `RandomSource`; the same
//! input and the same random stream always produce the same code.
//!
//! Containment: every sample in the output comes from
//! `GenerationInput::samples` and every effect from
//! `GenerationInput::effects`.

use super::{
    ast::{NodeIdAllocator, Tree},
    render,
};
use crate::{
    catalog::{Catalog, EntryKind},
    rng::RandomSource,
    state::GameState,
};
use std::collections::BTreeSet;

pub const FEATURE_SEQUENCER:   &str = "sequencer";
pub const FEATURE_LAYERING:    &str = "layering";
pub const FEATURE_SUBDIVISION: &str = "subdivision";
pub const FEATURE_EUCLID:      &str = "euclid";
pub const FEATURE_EFFECTS:     &str = "effects";

const GENERATOR_FEATURES: [&str; 5] = [
    FEATURE_SEQUENCER,
    FEATURE_LAYERING,
    FEATURE_SUBDIVISION,
    FEATURE_EUCLID,
    FEATURE_EFFECTS,
];

pub const MAX_LAYERS: u32 = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct WeightedSample {
    pub name:   String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EffectChoice {
    pub method: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationInput {
    pub samples:    Vec<WeightedSample>,
    pub effects:    Vec<EffectChoice>,
    pub features:   BTreeSet<String>,
    pub complexity: f64,
    pub bpm:        f64,
    pub max_layers: u32,
}

impl GenerationInput {
    /// Collect the unlocked vocabulary from a state.
    ///
    /// Samples: owned sound modules (weight = owned + 1) followed by
    /// purchased bank samples (weight 1), deduplicated in catalog order.
    /// Effects: owned effect modules.
    pub fn from_state(state: &GameState, catalog: &Catalog) -> Self {
        let mut samples: Vec<WeightedSample> = Vec::new();
        for entry in catalog.sound_entries() {
            let owned = state.owned(entry.id);
            if owned == 0 {
                continue;
            }
            if let Some(name) = entry.vocabulary {
                samples.push(WeightedSample { name: name.to_string(), weight: owned as f64 + 1.0 });
            }
        }
        for bank in catalog.sample_banks {
            if !state.is_bank_purchased(bank.id) {
                continue;
            }
            for name in bank.samples {
                if !samples.iter().any(|s| s.name == *name) {
                    samples.push(WeightedSample { name: name.to_string(), weight: 1.0 });
                }
            }
        }

        let effects = catalog
            .entries
            .iter()
            .filter(|e| e.kind == EntryKind::Effect && state.owned(e.id) > 0)
            .filter_map(|e| {
                e.vocabulary.map(|m| EffectChoice { method: m.to_string(), amount: e.effect_amount })
            })
            .collect();

        let features = GENERATOR_FEATURES
            .iter()
            .filter(|f| state.is_feature_enabled(f))
            .map(|f| f.to_string())
            .collect();

        Self {
            samples,
            effects,
            features,
            complexity: state.complexity,
            bpm:        state.bpm_upgrades.bpm,
            max_layers: state.unlocked_lines,
        }
    }

    pub fn has_feature(&self, id: &str) -> bool {
        self.features.contains(id)
    }

    /// Layers requested by complexity, capped by unlocked lines and the
    /// layering feature.
    pub fn layer_count(&self) -> u32 {
        if !self.has_feature(FEATURE_LAYERING) {
            return 1;
        }
        let by_complexity = 1 + (self.complexity.clamp(0.0, 1.0) * 3.0).floor() as u32;
        by_complexity.min(MAX_LAYERS).min(self.max_layers.max(1))
    }
}

#[derive(Debug, Clone)]
pub struct GeneratedPattern {
    pub tree:      Tree,
    pub code:      String,
    pub allocator: NodeIdAllocator,
}

/// The fallback program: the first unlocked sample on its own, or
/// `silence` when nothing is unlocked. Uses no randomness.
pub fn minimal_pattern(input: &GenerationInput) -> String {
    let mut alloc = NodeIdAllocator::new();
    let tree = minimal_tree(input, &mut alloc);
    render::render_program(&tree, input.bpm)
}

fn minimal_tree(input: &GenerationInput, alloc: &mut NodeIdAllocator) -> Tree {
    match input.samples.first() {
        Some(first) => alloc.sound(first.name.clone()),
        None => alloc.rest(),
    }
}

/// Generate a program from `input`, drawing choices from `rng`.
pub fn generate(input: &GenerationInput, rng: &mut dyn RandomSource) -> GeneratedPattern {
    let mut alloc = NodeIdAllocator::new();
    let advanced = GENERATOR_FEATURES.iter().any(|f| input.has_feature(f));

    if input.samples.is_empty() || !advanced {
        let tree = minimal_tree(input, &mut alloc);
        let code = render::render_program(&tree, input.bpm);
        return GeneratedPattern { tree, code, allocator: alloc };
    }

    let complexity = input.complexity.clamp(0.0, 1.0);
    let weights: Vec<f64> = input.samples.iter().map(|s| s.weight).collect();

    let layers: Vec<Tree> = (0..input.layer_count())
        .map(|_| build_layer(input, &weights, complexity, rng, &mut alloc))
        .collect();

    let tree = if layers.len() == 1 {
        layers.into_iter().next().unwrap_or_else(|| alloc.rest())
    } else {
        alloc.stack(layers)
    };
    let code = render::render_program(&tree, input.bpm);
    GeneratedPattern { tree, code, allocator: alloc }
}

fn build_layer(
    input: &GenerationInput,
    weights: &[f64],
    complexity: f64,
    rng: &mut dyn RandomSource,
    alloc: &mut NodeIdAllocator,
) -> Tree {
    let index = rng.pick_weighted(weights).unwrap_or(0);
    let sample = input.samples[index].name.clone();

    let mut layer = if input.has_feature(FEATURE_SEQUENCER) {
        let steps = if complexity > 0.5 { 8 } else { 4 };
        let hit_chance = 0.35 + 0.5 * complexity;
        let split_chance = if input.has_feature(FEATURE_SUBDIVISION) { 0.3 * complexity } else { 0.0 };
        let mut children = Vec::with_capacity(steps);
        for step in 0..steps {
            // The downbeat always sounds so a layer is never empty.
            if step == 0 || rng.chance(hit_chance) {
                if rng.chance(split_chance) {
                    let a = alloc.sound(sample.clone());
                    let b = alloc.sound(sample.clone());
                    children.push(alloc.sequence(vec![a, b]));
                } else {
                    children.push(alloc.sound(sample.clone()));
                }
            } else {
                children.push(alloc.rest());
            }
        }
        alloc.sequence(children)
    } else {
        alloc.sound(sample.clone())
    };

    if input.has_feature(FEATURE_EUCLID) && rng.chance(0.5 * complexity.max(0.2)) {
        let pulses = 3 + rng.next_below(3) as u32;
        let rotation = rng.next_below(4) as u32;
        let hit = alloc.sound(sample);
        layer = alloc.euclidean(hit, pulses, 8, rotation);
    }

    if input.has_feature(FEATURE_EFFECTS)
        && !input.effects.is_empty()
        && rng.chance(0.3 + 0.5 * complexity)
    {
        let choice = &input.effects[rng.next_below(input.effects.len())];
        layer = alloc.effect(layer, choice.method.clone(), choice.amount);
    }

    layer
}
