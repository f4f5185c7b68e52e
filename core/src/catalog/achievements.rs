use super::{builtin, AchievementDef, EntryKind};
use crate::state::GameState;

pub static ACHIEVEMENTS: &[AchievementDef] = &[
    AchievementDef {
        id:          "first-beat",
        name:        "First Beat",
        description: "Earn your very first beat.",
        hidden:      false,
        condition:   |s| s.lifetime_beats >= 1.0,
    },
    AchievementDef {
        id:          "hello-world",
        name:        "Hello, World",
        description: "Own a sound module.",
        hidden:      false,
        condition:   |s| owned_of_kind(s, EntryKind::Sound) >= 1,
    },
    AchievementDef {
        id:          "four-on-the-floor",
        name:        "Four on the Floor",
        description: "Own 10 kick drums.",
        hidden:      false,
        condition:   |s| s.owned("bd") >= 10,
    },
    AchievementDef {
        id:          "full-kit",
        name:        "Full Kit",
        description: "Own a kick, a hi-hat, a snare and a clap.",
        hidden:      false,
        condition:   |s| ["bd", "hh", "sd", "cp"].iter().all(|id| s.owned(id) >= 1),
    },
    AchievementDef {
        id:          "beat-hoarder",
        name:        "Beat Hoarder",
        description: "Hold 1,000 beats at once.",
        hidden:      false,
        condition:   |s| s.beats >= 1_000.0,
    },
    AchievementDef {
        id:          "wet-mix",
        name:        "Wet Mix",
        description: "Own two different effects.",
        hidden:      false,
        condition:   |s| distinct_owned_of_kind(s, EntryKind::Effect) >= 2,
    },
    AchievementDef {
        id:          "code-poet",
        name:        "Code Poet",
        description: "Unlock four lines of pattern code.",
        hidden:      false,
        condition:   |s| s.unlocked_lines >= 4,
    },
    AchievementDef {
        id:          "headliner",
        name:        "Headliner",
        description: "Reach the festival stage.",
        hidden:      false,
        condition:   |s| s.has_phase("festival"),
    },
    AchievementDef {
        id:          "crowd-pleaser",
        name:        "Crowd Pleaser",
        description: "Push engagement to 75.",
        hidden:      false,
        condition:   |s| s.engagement >= 75.0,
    },
    AchievementDef {
        id:          "millionaire",
        name:        "Beat Millionaire",
        description: "Earn a million beats in total.",
        hidden:      false,
        condition:   |s| s.lifetime_beats >= 1_000_000.0,
    },
    AchievementDef {
        id:          "overclocked",
        name:        "Overclocked",
        description: "Run a resource pool past its capacity.",
        hidden:      true,
        condition:   |s| !s.overloaded_kinds.is_empty(),
    },
    AchievementDef {
        id:          "speed-demon",
        name:        "Speed Demon",
        description: "Play at 175 BPM or faster.",
        hidden:      true,
        condition:   |s| s.bpm_upgrades.bpm >= 175.0,
    },
    AchievementDef {
        id:          "night-shift",
        name:        "Night Shift",
        description: "Keep the set going for an hour.",
        hidden:      true,
        condition:   |s| s.elapsed_time >= 3_600.0,
    },
];

fn owned_of_kind(state: &GameState, kind: EntryKind) -> u32 {
    builtin()
        .entries
        .iter()
        .filter(|e| e.kind == kind)
        .map(|e| state.owned(e.id))
        .sum()
}

fn distinct_owned_of_kind(state: &GameState, kind: EntryKind) -> usize {
    builtin()
        .entries
        .iter()
        .filter(|e| e.kind == kind && state.owned(e.id) > 0)
        .count()
}
