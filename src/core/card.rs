//! Card definitions
//!
//! Cards are immutable once built and are shared between matches behind `Arc`.

use crate::core::{CardType, Faction, Rarity, SkillKind, SkillSpec, SkillValues};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// A card definition from the card registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: u32,
    pub name: String,
    pub card_type: CardType,
    pub faction: Faction,
    pub rarity: Rarity,
    pub attack: u32,
    pub health: u32,
    pub delay: u32,

    /// Declared skills in firing order
    pub skills: SmallVec<[SkillSpec; 4]>,

    /// Declared value per skill kind (1 for skills declared without a value)
    pub skill_value: SkillValues,
}

impl Card {
    pub fn new(id: u32, name: impl Into<String>, card_type: CardType) -> Self {
        Card {
            id,
            name: name.into(),
            card_type,
            faction: Faction::AllFactions,
            rarity: Rarity::Common,
            attack: 0,
            health: 1,
            delay: 0,
            skills: SmallVec::new(),
            skill_value: SkillValues::new(),
        }
    }

    pub fn commander(id: u32, name: impl Into<String>, health: u32) -> Self {
        Card::new(id, name, CardType::Commander).with_health(health)
    }

    pub fn assault(id: u32, name: impl Into<String>, attack: u32, health: u32, delay: u32) -> Self {
        Card::new(id, name, CardType::Assault)
            .with_attack(attack)
            .with_health(health)
            .with_delay(delay)
    }

    pub fn structure(id: u32, name: impl Into<String>, health: u32, delay: u32) -> Self {
        Card::new(id, name, CardType::Structure)
            .with_health(health)
            .with_delay(delay)
    }

    pub fn with_attack(mut self, attack: u32) -> Self {
        self.attack = attack;
        self
    }

    pub fn with_health(mut self, health: u32) -> Self {
        self.health = health;
        self
    }

    pub fn with_delay(mut self, delay: u32) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_faction(mut self, faction: Faction) -> Self {
        self.faction = faction;
        self
    }

    pub fn with_rarity(mut self, rarity: Rarity) -> Self {
        self.rarity = rarity;
        self
    }

    pub fn with_skill(mut self, spec: SkillSpec) -> Self {
        self.add_skill(spec);
        self
    }

    /// Append a skill declaration and record its value
    pub fn add_skill(&mut self, spec: SkillSpec) {
        self.skill_value[spec.kind] = spec.value.max(1);
        self.skills.push(spec);
    }

    pub fn is_type(&self, card_type: CardType) -> bool {
        self.card_type == card_type
    }

    pub fn has_skill(&self, kind: SkillKind) -> bool {
        self.skill_value[kind] > 0
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        match self.card_type {
            CardType::Assault => write!(f, ": {}/{}/{}", self.attack, self.health, self.delay)?,
            CardType::Structure => write!(f, ": {}/{}", self.health, self.delay)?,
            CardType::Commander => write!(f, ": hp:{}", self.health)?,
        }
        if self.rarity >= Rarity::Legendary {
            write!(f, " {}", self.rarity.name())?;
        }
        if self.faction != Faction::AllFactions {
            write!(f, " {}", self.faction)?;
        }
        for skill in &self.skills {
            write!(f, ", {}", skill)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_creation() {
        let card = Card::assault(1001, "Infantry", 2, 5, 1)
            .with_faction(Faction::Imperial)
            .with_skill(SkillSpec::new(SkillKind::Armor, 2))
            .with_skill(SkillSpec::new(SkillKind::Wall, 0));

        assert!(card.is_type(CardType::Assault));
        assert_eq!(card.skills.len(), 2);
        assert_eq!(card.skill_value[SkillKind::Armor], 2);
        // Valueless declarations still count as present
        assert_eq!(card.skill_value[SkillKind::Wall], 1);
        assert!(!card.has_skill(SkillKind::Counter));
    }

    #[test]
    fn test_card_display() {
        let card = Card::assault(1, "Raptor", 3, 4, 2)
            .with_faction(Faction::Bloodthirsty)
            .with_skill(SkillSpec::new(SkillKind::Counter, 2));
        assert_eq!(card.to_string(), "Raptor: 3/4/2 Bloodthirsty, Counter 2");

        let commander = Card::commander(2, "Dracorex", 40);
        assert_eq!(commander.to_string(), "Dracorex: hp:40");
    }
}
