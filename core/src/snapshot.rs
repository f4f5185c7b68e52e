//! Snapshot serialization: full game state to JSON.
//!
//! A snapshot is the camelCase GameState object with two extra keys,
//! `version` and `lastSavedTimestamp`, at the top level. Loading goes
//! through migration.rs, never straight back through serde, so older
//! and damaged saves still load.

use crate::{error::GameResult, state::GameState, types::Timestamp};
use serde::{Deserialize, Serialize};

pub const CURRENT_SAVE_VERSION: &str = "3.0.0";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSnapshot<'a> {
    pub version:              &'a str,
    pub last_saved_timestamp: Timestamp,
    #[serde(flatten)]
    pub state:                &'a GameState,
}

impl<'a> SaveSnapshot<'a> {
    pub fn capture(state: &'a GameState, now: Timestamp) -> Self {
        Self { version: CURRENT_SAVE_VERSION, last_saved_timestamp: now, state }
    }

    pub fn to_json(&self) -> GameResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// The two top-level keys every snapshot carries, read without parsing
/// the whole state.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaveHeader {
    pub version:              String,
    pub last_saved_timestamp: Timestamp,
}

impl Default for SaveHeader {
    fn default() -> Self {
        Self { version: "unknown".into(), last_saved_timestamp: 0 }
    }
}

impl SaveHeader {
    /// Unreadable payloads give the default header.
    pub fn peek(payload: &str) -> Self {
        serde_json::from_str(payload).unwrap_or_default()
    }
}
