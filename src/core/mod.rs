//! Core battle types: cards, skills and runtime unit state

pub mod card;
pub mod entity;
pub mod skill;
pub mod types;

pub use card::Card;
pub use entity::{CardStatus, Liveness, Slot, UnitRef};
pub use skill::{SkillMap, SkillSpec, SkillValues};
pub use types::{CardStep, CardType, Faction, Rarity, Side, SkillKind, NUM_SKILLS};
