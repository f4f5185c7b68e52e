//! Phases, features, sample banks, tempo tiers and hardware-category gates.

use super::{BpmTier, FeatureDef, KindGate, PhaseDef, Prerequisite, SampleBankDef};
use crate::types::ResourceKind::{Compute, Memory, SignalProcessing, Storage};

pub static PHASES: &[PhaseDef] = &[
    PhaseDef {
        id:            "bedroom",
        name:          "Bedroom Producer",
        prerequisites: &[],
    },
    PhaseDef {
        id:            "open-mic",
        name:          "Open Mic",
        prerequisites: &[
            Prerequisite::Owned { id: "bd", count: 5 },
            Prerequisite::LifetimeBeats(250.0),
        ],
    },
    PhaseDef {
        id:            "club",
        name:          "Club Night",
        prerequisites: &[
            Prerequisite::PhaseReached("open-mic"),
            Prerequisite::Owned { id: "sd", count: 3 },
            Prerequisite::CapacityTotal { kind: Compute, at_least: 12.0 },
        ],
    },
    PhaseDef {
        id:            "festival",
        name:          "Festival Stage",
        prerequisites: &[
            Prerequisite::PhaseReached("club"),
            Prerequisite::ProductionRate(100.0),
        ],
    },
    PhaseDef {
        id:            "algorave",
        name:          "Algorave Legend",
        prerequisites: &[
            Prerequisite::PhaseReached("festival"),
            Prerequisite::FeaturePurchased("euclid"),
            Prerequisite::LifetimeBeats(1_000_000.0),
        ],
    },
];

/// Generator capabilities. Ids are matched by the pattern generator.
pub static FEATURES: &[FeatureDef] = &[
    FeatureDef {
        id:            "sequencer",
        name:          "Step Sequencer",
        cost:          20.0,
        consumption:   &[(Compute, 0.5)],
        prerequisites: &[Prerequisite::Owned { id: "bd", count: 1 }],
    },
    FeatureDef {
        id:            "layering",
        name:          "Layer Stack",
        cost:          400.0,
        consumption:   &[(Compute, 1.0), (Memory, 1.0)],
        prerequisites: &[Prerequisite::PhaseReached("open-mic")],
    },
    FeatureDef {
        id:            "subdivision",
        name:          "Subdivision",
        cost:          800.0,
        consumption:   &[(Compute, 1.0)],
        prerequisites: &[
            Prerequisite::PhaseReached("open-mic"),
            Prerequisite::FeaturePurchased("sequencer"),
        ],
    },
    FeatureDef {
        id:            "euclid",
        name:          "Euclidean Rhythms",
        cost:          3_000.0,
        consumption:   &[(Compute, 2.0)],
        prerequisites: &[Prerequisite::PhaseReached("club")],
    },
    FeatureDef {
        id:            "effects",
        name:          "Effect Chains",
        cost:          5_000.0,
        consumption:   &[(SignalProcessing, 2.0)],
        prerequisites: &[
            Prerequisite::PhaseReached("club"),
            Prerequisite::EntryUnlocked("room"),
        ],
    },
];

pub static SAMPLE_BANKS: &[SampleBankDef] = &[
    SampleBankDef {
        id:               "basic-kit",
        name:             "Basic Kit",
        samples:          &["bd"],
        cost:             0.0,
        production_bonus: 0.0,
        consumption:      &[],
        prerequisites:    &[],
    },
    SampleBankDef {
        id:               "percussion",
        name:             "Percussion Pack",
        samples:          &["rim", "cb", "lt", "ht"],
        cost:             500.0,
        production_bonus: 0.05,
        consumption:      &[(Storage, 2.0)],
        prerequisites:    &[Prerequisite::PhaseReached("open-mic")],
    },
    SampleBankDef {
        id:               "textures",
        name:             "Field Textures",
        samples:          &["wind", "insect", "crow"],
        cost:             4_000.0,
        production_bonus: 0.10,
        consumption:      &[(Storage, 4.0)],
        prerequisites:    &[Prerequisite::PhaseReached("club")],
    },
    SampleBankDef {
        id:               "voices",
        name:             "Voice Box",
        samples:          &["numbers", "mouth"],
        cost:             20_000.0,
        production_bonus: 0.15,
        consumption:      &[(Storage, 6.0)],
        prerequisites:    &[Prerequisite::PhaseReached("festival")],
    },
    SampleBankDef {
        id:               "breaks",
        name:             "Breakbeat Archive",
        samples:          &["breaks165", "amencutup"],
        cost:             60_000.0,
        production_bonus: 0.20,
        consumption:      &[(Storage, 8.0)],
        prerequisites:    &[
            Prerequisite::PhaseReached("festival"),
            Prerequisite::FeaturePurchased("subdivision"),
        ],
    },
];

/// Level 0 is owned from the start.
pub static BPM_TIERS: &[BpmTier] = &[
    BpmTier { level: 0, max_bpm: 130.0, cost: 0.0 },
    BpmTier { level: 1, max_bpm: 145.0, cost: 300.0 },
    BpmTier { level: 2, max_bpm: 160.0, cost: 2_000.0 },
    BpmTier { level: 3, max_bpm: 175.0, cost: 12_000.0 },
    BpmTier { level: 4, max_bpm: 200.0, cost: 80_000.0 },
];

pub static KIND_GATES: &[KindGate] = &[
    KindGate { kind: Memory,  prerequisites: &[] },
    KindGate { kind: Compute, prerequisites: &[] },
    KindGate {
        kind:          Storage,
        prerequisites: &[Prerequisite::Owned { id: "bd", count: 3 }],
    },
    KindGate {
        kind:          SignalProcessing,
        prerequisites: &[Prerequisite::EntryUnlocked("room")],
    },
];

