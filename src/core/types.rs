//! Strongly-typed enumerations for battle concepts
//!
//! Skill kinds, factions, card types and sides are small closed sets. Keeping
//! them as enums lets per-kind tables be plain arrays indexed by discriminant.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of distinct skill kinds (size of every per-skill table)
pub const NUM_SKILLS: usize = 45;

/// Every skill a card can declare
///
/// The declaration order groups kinds by category; the category predicates
/// below rely on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SkillKind {
    NoSkill,
    Attack,

    // Activation (hostile)
    Enfeeble,
    Jam,
    Mortar,
    Siege,
    Strike,
    Sunder,
    Weaken,

    // Activation (helpful)
    Enhance,
    Evolve,
    Heal,
    Mend,
    Overload,
    Protect,
    Rally,
    Enrage,
    Rush,

    // Activation (polymorphic)
    Mimic,

    // Defensive
    Armor,
    Avenge,
    Corrosive,
    Counter,
    Evade,
    Payback,
    Revenge,
    Refresh,
    Wall,
    Barrier,

    // Combat modifiers
    Coalition,
    Legion,
    Pierce,
    Rupture,
    Swipe,
    Drain,
    Venom,

    // Damage-dependent
    Berserk,
    Inhibit,
    Sabotage,
    Leech,
    Poison,

    // Triggered
    Allegiance,
    Flurry,
    Valor,
    Stasis,
}

impl SkillKind {
    pub const ALL: [SkillKind; NUM_SKILLS] = [
        SkillKind::NoSkill,
        SkillKind::Attack,
        SkillKind::Enfeeble,
        SkillKind::Jam,
        SkillKind::Mortar,
        SkillKind::Siege,
        SkillKind::Strike,
        SkillKind::Sunder,
        SkillKind::Weaken,
        SkillKind::Enhance,
        SkillKind::Evolve,
        SkillKind::Heal,
        SkillKind::Mend,
        SkillKind::Overload,
        SkillKind::Protect,
        SkillKind::Rally,
        SkillKind::Enrage,
        SkillKind::Rush,
        SkillKind::Mimic,
        SkillKind::Armor,
        SkillKind::Avenge,
        SkillKind::Corrosive,
        SkillKind::Counter,
        SkillKind::Evade,
        SkillKind::Payback,
        SkillKind::Revenge,
        SkillKind::Refresh,
        SkillKind::Wall,
        SkillKind::Barrier,
        SkillKind::Coalition,
        SkillKind::Legion,
        SkillKind::Pierce,
        SkillKind::Rupture,
        SkillKind::Swipe,
        SkillKind::Drain,
        SkillKind::Venom,
        SkillKind::Berserk,
        SkillKind::Inhibit,
        SkillKind::Sabotage,
        SkillKind::Leech,
        SkillKind::Poison,
        SkillKind::Allegiance,
        SkillKind::Flurry,
        SkillKind::Valor,
        SkillKind::Stasis,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(idx: usize) -> Option<SkillKind> {
        SkillKind::ALL.get(idx).copied()
    }

    /// Skills that debuff or damage enemy units when activated
    pub fn is_activation_hostile(self) -> bool {
        (SkillKind::Enfeeble..=SkillKind::Weaken).contains(&self)
    }

    /// Skills that buff allied units when activated
    pub fn is_activation_helpful(self) -> bool {
        (SkillKind::Enhance..=SkillKind::Rush).contains(&self)
    }

    /// Skills that are cast during a unit's action
    pub fn is_activation(self) -> bool {
        (SkillKind::Enfeeble..=SkillKind::Mimic).contains(&self)
    }

    pub fn is_defensive(self) -> bool {
        (SkillKind::Armor..=SkillKind::Barrier).contains(&self)
    }

    /// Activation skills whose effect scales with a magnitude
    ///
    /// Sabotage reduces these, and a zero magnitude cancels the cast.
    pub fn has_magnitude(self) -> bool {
        matches!(
            self,
            SkillKind::Enfeeble
                | SkillKind::Mortar
                | SkillKind::Siege
                | SkillKind::Strike
                | SkillKind::Sunder
                | SkillKind::Weaken
                | SkillKind::Enhance
                | SkillKind::Heal
                | SkillKind::Mend
                | SkillKind::Protect
                | SkillKind::Rally
                | SkillKind::Enrage
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            SkillKind::NoSkill => "0",
            SkillKind::Attack => "Attack",
            SkillKind::Enfeeble => "Enfeeble",
            SkillKind::Jam => "Jam",
            SkillKind::Mortar => "Mortar",
            SkillKind::Siege => "Siege",
            SkillKind::Strike => "Strike",
            SkillKind::Sunder => "Sunder",
            SkillKind::Weaken => "Weaken",
            SkillKind::Enhance => "Enhance",
            SkillKind::Evolve => "Evolve",
            SkillKind::Heal => "Heal",
            SkillKind::Mend => "Mend",
            SkillKind::Overload => "Overload",
            SkillKind::Protect => "Protect",
            SkillKind::Rally => "Rally",
            SkillKind::Enrage => "Enrage",
            SkillKind::Rush => "Rush",
            SkillKind::Mimic => "Mimic",
            SkillKind::Armor => "Armor",
            SkillKind::Avenge => "Avenge",
            SkillKind::Corrosive => "Corrosive",
            SkillKind::Counter => "Counter",
            SkillKind::Evade => "Evade",
            SkillKind::Payback => "Payback",
            SkillKind::Revenge => "Revenge",
            SkillKind::Refresh => "Refresh",
            SkillKind::Wall => "Wall",
            SkillKind::Barrier => "Barrier",
            SkillKind::Coalition => "Coalition",
            SkillKind::Legion => "Legion",
            SkillKind::Pierce => "Pierce",
            SkillKind::Rupture => "Rupture",
            SkillKind::Swipe => "Swipe",
            SkillKind::Drain => "Drain",
            SkillKind::Venom => "Venom",
            SkillKind::Berserk => "Berserk",
            SkillKind::Inhibit => "Inhibit",
            SkillKind::Sabotage => "Sabotage",
            SkillKind::Leech => "Leech",
            SkillKind::Poison => "Poison",
            SkillKind::Allegiance => "Allegiance",
            SkillKind::Flurry => "Flurry",
            SkillKind::Valor => "Valor",
            SkillKind::Stasis => "Stasis",
        }
    }
}

impl fmt::Display for SkillKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Card faction. `AllFactions` doubles as the "any faction" skill filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Faction {
    #[default]
    AllFactions,
    Imperial,
    Raider,
    Bloodthirsty,
    Xeno,
    Righteous,
    /// Wildcard: matches every faction filter
    Progenitor,
}

impl Faction {
    /// Bit used in per-side faction bitmaps (stasis bookkeeping, coalition)
    #[inline]
    pub fn mask(self) -> u32 {
        1u32 << (self as u32)
    }

    pub fn name(self) -> &'static str {
        match self {
            Faction::AllFactions => "",
            Faction::Imperial => "Imperial",
            Faction::Raider => "Raider",
            Faction::Bloodthirsty => "Bloodthirsty",
            Faction::Xeno => "Xeno",
            Faction::Righteous => "Righteous",
            Faction::Progenitor => "Progenitor",
        }
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Rarity {
    #[default]
    Common,
    Rare,
    Epic,
    Legendary,
    Vindicator,
    Mythic,
}

impl Rarity {
    pub fn name(self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
            Rarity::Legendary => "legendary",
            Rarity::Vindicator => "vindicator",
            Rarity::Mythic => "mythic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardType {
    Commander,
    Assault,
    Structure,
}

impl CardType {
    #[inline]
    pub fn index(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            CardType::Commander => "Commander",
            CardType::Assault => "Assault",
            CardType::Structure => "Structure",
        }
    }
}

/// One of the two sides of a match
///
/// Side 0 (`Player`) is the deck being evaluated; scoring is from its view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Side {
    #[default]
    Player,
    Enemy,
}

impl Side {
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn opponent(self) -> Side {
        match self {
            Side::Player => Side::Enemy,
            Side::Enemy => Side::Player,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.index())
    }
}

/// Per-turn progress marker of an assault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CardStep {
    #[default]
    None,
    Attacking,
    Attacked,
}
