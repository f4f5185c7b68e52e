//! Shared primitive types used across the entire game core.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a catalog entry, feature, phase, bank or achievement.
pub type EntryId = String;

/// Milliseconds since the Unix epoch, as reported by a `TimeSource`.
pub type Timestamp = i64;

/// Bounded capacity pools consumed by owned entries.
/// Declaration order is the iteration order everywhere (BTree keys).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    Memory,
    Compute,
    SignalProcessing,
    Storage,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Memory,
        ResourceKind::Compute,
        ResourceKind::SignalProcessing,
        ResourceKind::Storage,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Memory           => "memory",
            Self::Compute          => "compute",
            Self::SignalProcessing => "signal processing",
            Self::Storage          => "storage",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
