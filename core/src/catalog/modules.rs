//! Modules (sounds and effects) and hardware.

use super::{CatalogEntry, CostCurve, EntryKind, Prerequisite};
use crate::types::ResourceKind::{Compute, Memory, SignalProcessing, Storage};

const HARDWARE_GROWTH: CostCurve = CostCurve::Exponential { growth: 1.6 };

pub static ENTRIES: &[CatalogEntry] = &[
    // ── Sounds ──────────────────────────────────────
    CatalogEntry {
        id:              "bd",
        display_name:    "Kick Drum",
        kind:            EntryKind::Sound,
        base_cost:       10.0,
        cost_curve:      CostCurve::Linear,
        unit_production: 0.2,
        consumption:     &[(Memory, 1.0), (Storage, 0.5)],
        capacity:        0.0,
        vocabulary:      Some("bd"),
        effect_amount:   0.0,
        prerequisites:   &[],
    },
    CatalogEntry {
        id:              "hh",
        display_name:    "Hi-Hat",
        kind:            EntryKind::Sound,
        base_cost:       40.0,
        cost_curve:      CostCurve::Linear,
        unit_production: 0.8,
        consumption:     &[(Memory, 1.0), (Compute, 0.5)],
        capacity:        0.0,
        vocabulary:      Some("hh"),
        effect_amount:   0.0,
        prerequisites:   &[Prerequisite::Owned { id: "bd", count: 2 }],
    },
    CatalogEntry {
        id:              "sd",
        display_name:    "Snare",
        kind:            EntryKind::Sound,
        base_cost:       150.0,
        cost_curve:      CostCurve::Linear,
        unit_production: 3.0,
        consumption:     &[(Memory, 2.0), (Compute, 1.0), (Storage, 1.0)],
        capacity:        0.0,
        vocabulary:      Some("sd"),
        effect_amount:   0.0,
        prerequisites:   &[Prerequisite::Owned { id: "hh", count: 2 }],
    },
    CatalogEntry {
        id:              "cp",
        display_name:    "Clap",
        kind:            EntryKind::Sound,
        base_cost:       600.0,
        cost_curve:      CostCurve::Linear,
        unit_production: 10.0,
        consumption:     &[(Memory, 2.0), (Compute, 1.0), (Storage, 1.0)],
        capacity:        0.0,
        vocabulary:      Some("cp"),
        effect_amount:   0.0,
        prerequisites:   &[
            Prerequisite::Owned { id: "sd", count: 2 },
            Prerequisite::PhaseReached("open-mic"),
        ],
    },
    CatalogEntry {
        id:              "arpy",
        display_name:    "Arp Synth",
        kind:            EntryKind::Sound,
        base_cost:       2_500.0,
        cost_curve:      CostCurve::Linear,
        unit_production: 40.0,
        consumption:     &[(Memory, 4.0), (Compute, 3.0)],
        capacity:        0.0,
        vocabulary:      Some("arpy"),
        effect_amount:   0.0,
        prerequisites:   &[Prerequisite::Owned { id: "cp", count: 1 }],
    },
    CatalogEntry {
        id:              "sawtooth",
        display_name:    "Saw Bass",
        kind:            EntryKind::Sound,
        base_cost:       10_000.0,
        cost_curve:      CostCurve::Linear,
        unit_production: 150.0,
        consumption:     &[(Memory, 4.0), (Compute, 4.0), (SignalProcessing, 1.0)],
        capacity:        0.0,
        vocabulary:      Some("sawtooth"),
        effect_amount:   0.0,
        prerequisites:   &[Prerequisite::PhaseReached("club")],
    },
    CatalogEntry {
        id:              "piano",
        display_name:    "Grand Piano",
        kind:            EntryKind::Sound,
        base_cost:       40_000.0,
        cost_curve:      CostCurve::Linear,
        unit_production: 600.0,
        consumption:     &[(Memory, 8.0), (Compute, 4.0), (Storage, 4.0)],
        capacity:        0.0,
        vocabulary:      Some("piano"),
        effect_amount:   0.0,
        prerequisites:   &[Prerequisite::PhaseReached("festival")],
    },
    // ── Effects ─────────────────────────────────────
    CatalogEntry {
        id:              "room",
        display_name:    "Reverb",
        kind:            EntryKind::Effect,
        base_cost:       300.0,
        cost_curve:      CostCurve::Linear,
        unit_production: 0.0,
        consumption:     &[(SignalProcessing, 2.0), (Memory, 1.0)],
        capacity:        0.0,
        vocabulary:      Some("room"),
        effect_amount:   0.4,
        prerequisites:   &[Prerequisite::Owned { id: "hh", count: 3 }],
    },
    CatalogEntry {
        id:              "delay",
        display_name:    "Delay",
        kind:            EntryKind::Effect,
        base_cost:       1_200.0,
        cost_curve:      CostCurve::Linear,
        unit_production: 0.0,
        consumption:     &[(SignalProcessing, 3.0), (Memory, 2.0)],
        capacity:        0.0,
        vocabulary:      Some("delay"),
        effect_amount:   0.25,
        prerequisites:   &[Prerequisite::Owned { id: "room", count: 1 }],
    },
    CatalogEntry {
        id:              "lpf",
        display_name:    "Low-Pass Filter",
        kind:            EntryKind::Effect,
        base_cost:       3_000.0,
        cost_curve:      CostCurve::Linear,
        unit_production: 0.0,
        consumption:     &[(SignalProcessing, 2.0), (Compute, 1.0)],
        capacity:        0.0,
        vocabulary:      Some("lpf"),
        effect_amount:   800.0,
        prerequisites:   &[Prerequisite::PhaseReached("club")],
    },
    CatalogEntry {
        id:              "crush",
        display_name:    "Bitcrusher",
        kind:            EntryKind::Effect,
        base_cost:       8_000.0,
        cost_curve:      CostCurve::Linear,
        unit_production: 0.0,
        consumption:     &[(SignalProcessing, 4.0), (Compute, 2.0)],
        capacity:        0.0,
        vocabulary:      Some("crush"),
        effect_amount:   4.0,
        prerequisites:   &[Prerequisite::Owned { id: "lpf", count: 1 }],
    },
    // ── Hardware ────────────────────────────────────
    CatalogEntry {
        id:              "ram",
        display_name:    "RAM Stick",
        kind:            EntryKind::Hardware(Memory),
        base_cost:       60.0,
        cost_curve:      HARDWARE_GROWTH,
        unit_production: 0.0,
        consumption:     &[],
        capacity:        8.0,
        vocabulary:      None,
        effect_amount:   0.0,
        prerequisites:   &[],
    },
    CatalogEntry {
        id:              "cpu",
        display_name:    "CPU Core",
        kind:            EntryKind::Hardware(Compute),
        base_cost:       120.0,
        cost_curve:      HARDWARE_GROWTH,
        unit_production: 0.0,
        consumption:     &[],
        capacity:        6.0,
        vocabulary:      None,
        effect_amount:   0.0,
        prerequisites:   &[Prerequisite::Owned { id: "hh", count: 1 }],
    },
    CatalogEntry {
        id:              "dsp",
        display_name:    "DSP Chip",
        kind:            EntryKind::Hardware(SignalProcessing),
        base_cost:       250.0,
        cost_curve:      HARDWARE_GROWTH,
        unit_production: 0.0,
        consumption:     &[],
        capacity:        8.0,
        vocabulary:      None,
        effect_amount:   0.0,
        prerequisites:   &[Prerequisite::EntryUnlocked("room")],
    },
    CatalogEntry {
        id:              "ssd",
        display_name:    "SSD",
        kind:            EntryKind::Hardware(Storage),
        base_cost:       80.0,
        cost_curve:      HARDWARE_GROWTH,
        unit_production: 0.0,
        consumption:     &[],
        capacity:        8.0,
        vocabulary:      None,
        effect_amount:   0.0,
        prerequisites:   &[],
    },
];
