//! Error types for the battle simulator
//!
//! Only data and invariant violations are errors. Ordinary in-match outcomes
//! (no target, evaded, inhibited, zero attack) are plain control flow.

use crate::core::{CardType, SkillKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Card {card_id} has type {card_type:?} which cannot be placed here")]
    InvalidCardType { card_id: u32, card_type: CardType },

    #[error("No handler registered for skill {0:?}")]
    NoSkillHandler(SkillKind),

    #[error("Attack resolution invoked on a dead or missing unit: {0}")]
    DeadAttacker(String),

    #[error("Unit not found: {0}")]
    UnitNotFound(String),

    #[error("Invalid deck: {0}")]
    InvalidDeck(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
