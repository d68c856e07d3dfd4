//! Battle engine: match state, skill resolution, combat and the turn loop

/// Narrate at Normal verbosity
///
/// The message is only formatted when the logger would keep it, and the
/// whole call compiles away without the `verbose-logging` feature.
macro_rules! log_if_verbose {
    ($state:expr, $($arg:tt)*) => {
        #[cfg(feature = "verbose-logging")]
        {
            if $state.logger.wants($crate::game::VerbosityLevel::Normal) {
                $state.logger.normal(&format!($($arg)*));
            }
        }
        #[cfg(not(feature = "verbose-logging"))]
        {
            let _ = &$state;
        }
    };
}

/// Narrate at Verbose verbosity (queue traffic, cancelled casts)
macro_rules! trace_if_verbose {
    ($state:expr, $($arg:tt)*) => {
        #[cfg(feature = "verbose-logging")]
        {
            if $state.logger.wants($crate::game::VerbosityLevel::Verbose) {
                $state.logger.verbose(&format!($($arg)*));
            }
        }
        #[cfg(not(feature = "verbose-logging"))]
        {
            let _ = &$state;
        }
    };
}

pub mod actions;
pub mod combat;
pub mod effects;
pub mod game_loop;
pub mod logger;
pub mod phase;
pub mod queue;
pub mod scoring;
pub mod state;
pub mod targeting;

pub use actions::{SkillHandler, SkillTable};
pub use effects::{GameMode, PassiveEffect, PassiveEffects, Quest, QuestType};
pub use game_loop::{simulate, MatchLoop};
pub use logger::{GameLogger, LogEntry, OutputMode, VerbosityLevel};
pub use phase::Phase;
pub use scoring::{MatchResult, OptimizationMode};
pub use state::MatchState;
