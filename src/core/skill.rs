//! Skill declarations and per-skill tables
//!
//! A `SkillSpec` is a value type: it is copied out of a card's declaration
//! list and transformed (evolve, sabotage, enhance) on its way through the
//! resolution queue. The declaration on the card is never touched.

use crate::core::{Faction, SkillKind, NUM_SKILLS};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Index, IndexMut};

/// One skill declaration (or a resolved, modified copy of one)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillSpec {
    pub kind: SkillKind,
    /// Magnitude (`x`)
    pub value: u32,
    /// Faction filter; `AllFactions` matches everything
    pub faction: Faction,
    /// Requested target count; 0 means one target
    pub count: u32,
    /// Cooldown in turns once the skill fires
    pub cooldown: u32,
    /// Skill operand (enhance/evolve source kind)
    pub primary: SkillKind,
    /// Second skill operand (evolve destination kind)
    pub secondary: SkillKind,
    /// Affect every eligible target
    pub all: bool,
}

impl SkillSpec {
    pub fn new(kind: SkillKind, value: u32) -> Self {
        SkillSpec {
            kind,
            value,
            faction: Faction::AllFactions,
            count: 0,
            cooldown: 0,
            primary: SkillKind::NoSkill,
            secondary: SkillKind::NoSkill,
            all: false,
        }
    }

    pub fn with_faction(mut self, faction: Faction) -> Self {
        self.faction = faction;
        self
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub fn with_cooldown(mut self, cooldown: u32) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn with_skills(mut self, primary: SkillKind, secondary: SkillKind) -> Self {
        self.primary = primary;
        self.secondary = secondary;
        self
    }

    pub fn all(mut self) -> Self {
        self.all = true;
        self
    }

    /// Copy with the kind replaced (evolution remap)
    pub fn evolved(&self, kind: SkillKind) -> Self {
        SkillSpec { kind, ..*self }
    }

    /// Copy with the magnitude reduced by `amount`, floored at zero
    pub fn sabotaged(&self, amount: u32) -> Self {
        SkillSpec {
            value: self.value.saturating_sub(amount),
            ..*self
        }
    }

    /// Copy with the magnitude increased by `amount`
    pub fn enhanced(&self, amount: u32) -> Self {
        SkillSpec {
            value: self.value + amount,
            ..*self
        }
    }

    /// Compact form used in action narration: kind, operands, magnitude
    pub fn short(&self) -> String {
        let mut desc = self.kind.name().to_string();
        if self.primary != SkillKind::NoSkill {
            desc.push(' ');
            desc.push_str(self.primary.name());
        }
        if self.secondary != SkillKind::NoSkill {
            desc.push(' ');
            desc.push_str(self.secondary.name());
        }
        if self.value != 0 {
            desc.push_str(&format!(" {}", self.value));
        }
        desc
    }
}

impl fmt::Display for SkillSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if self.all {
            write!(f, " all")?;
        } else if self.count != 0 {
            write!(f, " {}", self.count)?;
        }
        if self.faction != Faction::AllFactions {
            write!(f, " {}", self.faction)?;
        }
        if self.primary != SkillKind::NoSkill {
            write!(f, " {}", self.primary)?;
        }
        if self.secondary != SkillKind::NoSkill {
            write!(f, " {}", self.secondary)?;
        }
        if self.value != 0 {
            write!(f, " {}", self.value)?;
        }
        if self.cooldown != 0 {
            write!(f, " every {}", self.cooldown)?;
        }
        Ok(())
    }
}

/// Dense `u32` table indexed by skill kind
///
/// Used for declared skill values, cooldown timers and enhancement bonuses.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SkillValues([u32; NUM_SKILLS]);

impl SkillValues {
    pub fn new() -> Self {
        SkillValues([0; NUM_SKILLS])
    }

    pub fn clear(&mut self) {
        self.0 = [0; NUM_SKILLS];
    }

    /// Non-zero entries in kind order
    pub fn iter_set(&self) -> impl Iterator<Item = (SkillKind, u32)> + '_ {
        SkillKind::ALL
            .iter()
            .zip(self.0.iter())
            .filter(|(_, v)| **v != 0)
            .map(|(k, v)| (*k, *v))
    }
}

impl Default for SkillValues {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<SkillKind> for SkillValues {
    type Output = u32;

    fn index(&self, kind: SkillKind) -> &u32 {
        &self.0[kind.index()]
    }
}

impl IndexMut<SkillKind> for SkillValues {
    fn index_mut(&mut self, kind: SkillKind) -> &mut u32 {
        &mut self.0[kind.index()]
    }
}

impl fmt::Debug for SkillValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter_set()).finish()
    }
}

// Serialized sparsely as (kind, value) pairs; serde has no impls for arrays this long.
impl Serialize for SkillValues {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.iter_set())
    }
}

impl<'de> Deserialize<'de> for SkillValues {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let pairs = Vec::<(SkillKind, u32)>::deserialize(deserializer)?;
        let mut values = SkillValues::new();
        for (kind, value) in pairs {
            values[kind] = value;
        }
        Ok(values)
    }
}

/// Permutation over skill kinds
///
/// Each unit carries two of these. The primary map says which declared slot a
/// kind reads its value from; the evolved map says which effect a declared
/// kind actually executes. Both start as the identity.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SkillMap([SkillKind; NUM_SKILLS]);

impl SkillMap {
    pub fn identity() -> Self {
        SkillMap(SkillKind::ALL)
    }

    pub fn reset(&mut self) {
        self.0 = SkillKind::ALL;
    }

    pub fn is_identity(&self) -> bool {
        self.0 == SkillKind::ALL
    }
}

impl Default for SkillMap {
    fn default() -> Self {
        Self::identity()
    }
}

impl Index<SkillKind> for SkillMap {
    type Output = SkillKind;

    fn index(&self, kind: SkillKind) -> &SkillKind {
        &self.0[kind.index()]
    }
}

impl IndexMut<SkillKind> for SkillMap {
    fn index_mut(&mut self, kind: SkillKind) -> &mut SkillKind {
        &mut self.0[kind.index()]
    }
}

impl fmt::Debug for SkillMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                SkillKind::ALL
                    .iter()
                    .zip(self.0.iter())
                    .filter(|(from, to)| from != to),
            )
            .finish()
    }
}

/// Swap the slots of kinds `a` and `b` on a unit
///
/// After this, triggering `a` runs `b`'s effect from `a`'s old slot and vice
/// versa. Applying the swap again on an already-remapped pair composes with the
/// existing mapping, so both tables stay permutations.
pub fn apply_evolve(primary: &mut SkillMap, evolved: &mut SkillMap, a: SkillKind, b: SkillKind) {
    let slot_a = primary[a];
    let slot_b = primary[b];
    primary[a] = slot_b;
    primary[b] = slot_a;
    evolved[slot_a] = b;
    evolved[slot_b] = a;
}
