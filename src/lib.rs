//! Tyrant battle simulator
//!
//! Resolves one complete match of a two-player, turn-based card battle to a
//! scored outcome. Matches are independent and cheap to replicate, so callers
//! typically run many of them in parallel (see [`batch`]).

pub mod batch;
pub mod config;
pub mod core;
pub mod error;
pub mod game;
pub mod loader;
pub mod zones;

pub use config::SimConfig;
pub use error::{Result, SimError};
pub use game::{simulate, MatchResult, MatchState, OptimizationMode};
