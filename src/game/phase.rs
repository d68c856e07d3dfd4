//! Turn phases

use serde::{Deserialize, Serialize};
use std::fmt;

/// Phases of one side's turn, in order
///
/// The derived ordering matches turn order; damage counting for Barrier only
/// happens in phases before `TurnEnd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Phase {
    #[default]
    TurnStart,
    PlayCard,
    Commander,
    Structures,
    Assaults,
    TurnEnd,
}

impl Phase {
    /// Get the next phase in turn order
    pub fn next(&self) -> Option<Phase> {
        match self {
            Phase::TurnStart => Some(Phase::PlayCard),
            Phase::PlayCard => Some(Phase::Commander),
            Phase::Commander => Some(Phase::Structures),
            Phase::Structures => Some(Phase::Assaults),
            Phase::Assaults => Some(Phase::TurnEnd),
            Phase::TurnEnd => None,
        }
    }

    /// Are units still acting in this phase?
    pub fn is_action_phase(&self) -> bool {
        *self < Phase::TurnEnd
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::TurnStart => "turn start",
            Phase::PlayCard => "play card",
            Phase::Commander => "commander",
            Phase::Structures => "structures",
            Phase::Assaults => "assaults",
            Phase::TurnEnd => "turn end",
        };
        f.write_str(name)
    }
}
