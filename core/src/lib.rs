//! beat-idle-core: the game core of a live-coding idle game.
//!
//! The player taps for beats, buys sound modules, effects and hardware,
//! and the core writes Strudel pattern code that reflects what they own.
//! Everything here is a deterministic state transition: given elapsed
//! time and player actions it produces the next `GameState`.

pub mod achievement_subsystem;
pub mod autosave;
pub mod catalog;
pub mod clock;
pub mod command;
pub mod config;
pub mod cost;
pub mod engine;
pub mod error;
pub mod event;
pub mod game_loop;
pub mod migration;
pub mod pattern;
pub mod persistence;
pub mod production_subsystem;
pub mod reducer;
pub mod rng;
pub mod snapshot;
pub mod state;
pub mod store;
pub mod subsystem;
pub mod types;
pub mod unlock_subsystem;

pub use command::Action;
pub use config::GameConfig;
pub use engine::GameEngine;
pub use error::{GameError, GameResult};
pub use event::GameEvent;
pub use game_loop::{GameLoop, LoopPhase};
pub use state::GameState;
