//! Runtime unit state and stable unit handles
//!
//! A `CardStatus` is one card in play. Units refer to each other through
//! `UnitRef` handles (side + slot) rather than references, so the board can be
//! compacted without invalidating anything held across a resolution step.

use crate::core::skill::{apply_evolve, SkillMap, SkillValues};
use crate::core::{Card, CardStep, CardType, Faction, Side, SkillKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Card ids of the Gilian commanders, assaults and shard
const GILIAN_COMMANDERS: std::ops::RangeInclusive<u32> = 25054..=25063;
const GILIAN_UNITS: std::ops::RangeInclusive<u32> = 38348..=38388;

/// Position of a unit within one side's board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Slot {
    Commander,
    Assault(usize),
    Structure(usize),
}

/// Stable handle to a unit on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitRef {
    pub side: Side,
    pub slot: Slot,
}

impl UnitRef {
    pub fn commander(side: Side) -> Self {
        UnitRef {
            side,
            slot: Slot::Commander,
        }
    }

    pub fn assault(side: Side, index: usize) -> Self {
        UnitRef {
            side,
            slot: Slot::Assault(index),
        }
    }

    pub fn structure(side: Side, index: usize) -> Self {
        UnitRef {
            side,
            slot: Slot::Structure(index),
        }
    }

    pub fn is_commander(&self) -> bool {
        matches!(self.slot, Slot::Commander)
    }

    pub fn is_assault(&self) -> bool {
        matches!(self.slot, Slot::Assault(_))
    }

    pub fn is_structure(&self) -> bool {
        matches!(self.slot, Slot::Structure(_))
    }

    /// Board index (commanders report 0)
    pub fn index(&self) -> usize {
        match self.slot {
            Slot::Commander => 0,
            Slot::Assault(i) | Slot::Structure(i) => i,
        }
    }
}

impl fmt::Display for UnitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.slot {
            Slot::Commander => write!(f, "{} Commander", self.side),
            Slot::Assault(i) => write!(f, "{} Assault {}", self.side, i),
            Slot::Structure(i) => write!(f, "{} Structure {}", self.side, i),
        }
    }
}

/// Liveness of a unit
///
/// A unit at zero health is `Dead` but still addressable until the end of
/// the turn, when compaction marks it `Removed` and drops it from the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Liveness {
    Alive,
    Dead,
    Removed,
}

/// Runtime state of one card in play
#[derive(Debug, Clone)]
pub struct CardStatus {
    pub card: Arc<Card>,
    pub side: Side,
    /// Board index, refreshed at turn start
    pub index: usize,
    pub faction: Faction,

    pub attack: u32,
    pub hp: u32,
    pub max_hp: u32,
    pub delay: u32,
    pub step: CardStep,

    pub corroded_rate: u32,
    pub corroded_weakened: u32,
    pub enfeebled: u32,
    pub evaded: u32,
    pub inhibited: u32,
    pub sabotaged: u32,
    pub jammed: bool,
    pub overloaded: bool,
    pub paybacked: u32,
    pub poisoned: u32,
    pub protected: u32,
    pub protected_stasis: u32,
    pub rallied: u32,
    pub enraged: u32,
    pub derallied: u32,
    pub rush_attempted: bool,
    pub sundered: bool,
    pub weakened: u32,

    /// Slot each kind reads its declared value from
    pub primary_skill: SkillMap,
    /// Effect each declared kind executes
    pub evolved_skill: SkillMap,
    pub enhanced_value: SkillValues,
    pub skill_cd: SkillValues,

    removed: bool,
}

impl CardStatus {
    pub fn new(card: Arc<Card>, side: Side, index: usize) -> Self {
        CardStatus {
            side,
            index,
            faction: card.faction,
            attack: card.attack,
            hp: card.health,
            max_hp: card.health,
            delay: card.delay,
            step: CardStep::None,
            corroded_rate: 0,
            corroded_weakened: 0,
            enfeebled: 0,
            evaded: 0,
            inhibited: 0,
            sabotaged: 0,
            jammed: false,
            overloaded: false,
            paybacked: 0,
            poisoned: 0,
            protected: 0,
            protected_stasis: 0,
            rallied: 0,
            enraged: 0,
            derallied: 0,
            rush_attempted: false,
            sundered: false,
            weakened: 0,
            primary_skill: SkillMap::identity(),
            evolved_skill: SkillMap::identity(),
            enhanced_value: SkillValues::new(),
            skill_cd: SkillValues::new(),
            removed: false,
            card,
        }
    }

    pub fn card_type(&self) -> CardType {
        self.card.card_type
    }

    pub fn is_assault(&self) -> bool {
        self.card.card_type == CardType::Assault
    }

    pub fn liveness(&self) -> Liveness {
        if self.removed {
            Liveness::Removed
        } else if self.hp > 0 {
            Liveness::Alive
        } else {
            Liveness::Dead
        }
    }

    pub(crate) fn mark_removed(&mut self) {
        self.removed = true;
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    #[inline]
    pub fn can_act(&self) -> bool {
        self.is_alive() && !self.jammed
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.can_act() && self.delay == 0
    }

    #[inline]
    pub fn is_active_next_turn(&self) -> bool {
        self.can_act() && self.delay <= 1
    }

    #[inline]
    pub fn can_be_healed(&self) -> bool {
        self.is_alive() && self.hp < self.max_hp
    }

    #[inline]
    pub fn has_attacked(&self) -> bool {
        self.step == CardStep::Attacked
    }

    pub fn is_gilian(&self) -> bool {
        GILIAN_COMMANDERS.contains(&self.card.id) || GILIAN_UNITS.contains(&self.card.id)
    }

    pub fn is_alive_gilian(&self) -> bool {
        self.is_alive() && self.is_gilian()
    }

    /// Declared value of `kind` through the slot remap, plus enrage for berserk
    pub fn skill_base_value(&self, kind: SkillKind) -> u32 {
        let base = self.card.skill_value[self.primary_skill[kind]];
        if kind == SkillKind::Berserk {
            base + self.enraged
        } else {
            base
        }
    }

    /// Effective magnitude of `kind`: sabotage applies only to magnitude skills
    pub fn skill(&self, kind: SkillKind) -> u32 {
        let base = self.skill_base_value(kind);
        let base = if kind.has_magnitude() {
            base.saturating_sub(self.sabotaged)
        } else {
            base
        };
        base + self.enhanced(kind)
    }

    pub fn has_skill(&self, kind: SkillKind) -> bool {
        self.skill_base_value(kind) != 0
    }

    pub fn enhanced(&self, kind: SkillKind) -> u32 {
        self.enhanced_value[self.primary_skill[kind]]
    }

    /// Effect actually executed when declared `kind` fires
    pub fn evolved(&self, kind: SkillKind) -> SkillKind {
        self.evolved_skill[kind]
    }

    pub fn evolve(&mut self, from: SkillKind, to: SkillKind) {
        apply_evolve(&mut self.primary_skill, &mut self.evolved_skill, from, to);
    }

    pub fn protected_value(&self) -> u32 {
        self.protected + self.protected_stasis
    }

    /// Attack after weaken, corrosion, rally and derally; never negative
    pub fn attack_power(&self) -> u32 {
        (self.attack.saturating_sub(self.weakened + self.corroded_weakened) + self.rallied)
            .saturating_sub(self.derallied)
    }

    /// Heal, capped at max health
    pub fn add_hp(&mut self, amount: u32) {
        self.hp = (self.hp + amount).min(self.max_hp);
    }

    /// Permanent buff to max and current health
    pub fn extend_hp(&mut self, amount: u32) {
        self.max_hp += amount;
        self.hp += amount;
    }

    /// Tick down every declared skill's cooldown timer
    pub fn cooldown_skills(&mut self) -> usize {
        let mut ticked = 0;
        for spec in self.card.skills.iter() {
            if self.skill_cd[spec.kind] > 0 {
                self.skill_cd[spec.kind] -= 1;
                ticked += 1;
            }
        }
        ticked
    }

    /// Drop the statuses that last until the end of the opponent's turn
    pub fn clear_defender_statuses(&mut self) {
        self.enfeebled = 0;
        self.protected = 0;
        self.primary_skill.reset();
        self.evolved_skill.reset();
        self.enhanced_value.clear();
        self.evaded = 0;
        self.paybacked = 0;
    }

    /// Drop the statuses that last until the end of the unit's own turn
    pub fn clear_attacker_statuses(&mut self) {
        self.jammed = false;
        self.rallied = 0;
        self.enraged = 0;
        self.derallied = 0;
        self.sundered = false;
        self.weakened = 0;
        self.inhibited = 0;
        self.sabotaged = 0;
        self.overloaded = false;
        self.step = CardStep::None;
    }
}

impl fmt::Display for CardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.side)?;
        match self.card.card_type {
            CardType::Commander => write!(f, "Commander ")?,
            CardType::Assault => write!(f, "Assault {} ", self.index)?,
            CardType::Structure => write!(f, "Structure {} ", self.index)?,
        }
        write!(f, "[{}", self.card.name)?;
        if self.card.card_type == CardType::Assault {
            write!(f, " att:[{}", self.attack)?;
            if self.weakened > 0 {
                write!(f, "-{}(weakened)", self.weakened)?;
            }
            if self.corroded_weakened > 0 {
                write!(f, "-{}(corroded)", self.corroded_weakened)?;
            }
            write!(f, "]")?;
            if self.rallied > 0 {
                write!(f, "+{}(rallied)", self.rallied)?;
            }
            if self.derallied > 0 {
                write!(f, "-{}(derallied)", self.derallied)?;
            }
            write!(f, "={}", self.attack_power())?;
        }
        write!(f, " hp:{}", self.hp)?;
        if self.delay > 0 {
            write!(f, " cd:{}", self.delay)?;
        }
        if self.jammed {
            write!(f, ", jammed")?;
        }
        if self.overloaded {
            write!(f, ", overloaded")?;
        }
        if self.sundered {
            write!(f, ", sundered")?;
        }
        let counters = [
            ("corroded", self.corroded_rate),
            ("enfeebled", self.enfeebled),
            ("inhibited", self.inhibited),
            ("sabotaged", self.sabotaged),
            ("poisoned", self.poisoned),
            ("protected", self.protected),
            ("stasis", self.protected_stasis),
            ("enraged", self.enraged),
        ];
        for (name, value) in counters {
            if value > 0 {
                write!(f, ", {} {}", name, value)?;
            }
        }
        for spec in self.card.skills.iter() {
            let evolved = self.evolved_skill[spec.kind];
            let enhanced = self.enhanced_value[spec.kind];
            if evolved == spec.kind && enhanced == 0 {
                continue;
            }
            write!(f, ", {}", spec.kind)?;
            if evolved != spec.kind {
                write!(f, "->{}", evolved)?;
            }
            if enhanced != 0 {
                write!(f, " +{}", enhanced)?;
            }
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SkillSpec;

    fn status(card: Card) -> CardStatus {
        CardStatus::new(Arc::new(card), Side::Player, 0)
    }

    #[test]
    fn test_state_predicates() {
        let mut unit = status(Card::assault(1, "Grunt", 2, 5, 1));
        assert!(unit.is_alive());
        assert!(!unit.is_active());
        assert!(unit.is_active_next_turn());
        assert!(!unit.can_be_healed());

        unit.delay = 0;
        assert!(unit.is_active());
        unit.jammed = true;
        assert!(!unit.can_act());
        assert!(!unit.is_active_next_turn());

        unit.hp = 0;
        assert_eq!(unit.liveness(), Liveness::Dead);
        unit.mark_removed();
        assert_eq!(unit.liveness(), Liveness::Removed);
    }

    #[test]
    fn test_attack_power_floors_at_zero() {
        let mut unit = status(Card::assault(1, "Grunt", 3, 5, 0));
        unit.weakened = 5;
        unit.rallied = 2;
        assert_eq!(unit.attack_power(), 2);
        unit.derallied = 4;
        assert_eq!(unit.attack_power(), 0);
    }

    #[test]
    fn test_skill_value_sabotage_and_enhance() {
        let card = Card::assault(1, "Striker", 1, 5, 0)
            .with_skill(SkillSpec::new(SkillKind::Strike, 3))
            .with_skill(SkillSpec::new(SkillKind::Armor, 2))
            .with_skill(SkillSpec::new(SkillKind::Berserk, 1));
        let mut unit = status(card);

        unit.sabotaged = 2;
        unit.enhanced_value[SkillKind::Strike] = 4;
        // Strike is a magnitude skill: 3 - 2 + 4
        assert_eq!(unit.skill(SkillKind::Strike), 5);
        // Armor is not sabotaged
        assert_eq!(unit.skill(SkillKind::Armor), 2);

        unit.enraged = 3;
        assert_eq!(unit.skill(SkillKind::Berserk), 4);
    }

    #[test]
    fn test_evolve_remaps_value_and_effect() {
        let card = Card::assault(1, "Morph", 1, 5, 0).with_skill(SkillSpec::new(SkillKind::Strike, 3));
        let mut unit = status(card);

        unit.evolve(SkillKind::Strike, SkillKind::Siege);
        assert!(unit.has_skill(SkillKind::Siege));
        assert!(!unit.has_skill(SkillKind::Strike));
        assert_eq!(unit.skill(SkillKind::Siege), 3);
        assert_eq!(unit.evolved(SkillKind::Strike), SkillKind::Siege);

        unit.clear_defender_statuses();
        assert!(unit.has_skill(SkillKind::Strike));
        assert_eq!(unit.evolved(SkillKind::Strike), SkillKind::Strike);
    }

    #[test]
    fn test_hp_bounds() {
        let mut unit = status(Card::assault(1, "Grunt", 2, 5, 0));
        unit.hp = 2;
        unit.add_hp(10);
        assert_eq!(unit.hp, 5);
        unit.extend_hp(3);
        assert_eq!((unit.hp, unit.max_hp), (8, 8));
    }

    #[test]
    fn test_gilian_ranges() {
        let gilian = status(Card::assault(38350, "Gilian Sprout", 1, 1, 0));
        assert!(gilian.is_alive_gilian());
        let plain = status(Card::assault(38347, "Not Gilian", 1, 1, 0));
        assert!(!plain.is_gilian());
    }

    #[test]
    fn test_status_display() {
        let mut unit = CardStatus::new(Arc::new(Card::assault(1, "Grunt", 4, 5, 1)), Side::Enemy, 2);
        unit.weakened = 1;
        unit.rallied = 2;
        unit.poisoned = 3;
        assert_eq!(
            unit.to_string(),
            "P1 Assault 2 [Grunt att:[4-1(weakened)]+2(rallied)=5 hp:5 cd:1, poisoned 3]"
        );
    }
}
