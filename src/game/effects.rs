//! Match-wide modifiers: passive battleground effects, game mode and quests

use crate::core::{CardType, Faction, SkillKind};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Global passive battleground effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PassiveEffect {
    /// Each assault's first damaging hit raises a per-turn attack bonus
    Bloodlust,
    /// Legion bonus also heals the attacker
    Brigade,
    /// Counter also heals and berserks the defender
    Counterflux,
    /// Swipe, drain and mend reach two slots each side
    CriticalReach,
    /// Leech and refresh grow the attacker when hitting assaults
    Devour,
    /// Buffs blocked by inhibit are redirected to a random unit
    Divert,
    /// Berserk also heals and protects
    EnduringRage,
    /// Assault armor is the best armor among itself and its neighbors
    Fortification,
    /// Enrage also heals
    Furiosity,
    /// Delayed assaults inhibit the unit across from them
    HaltedOrders,
    /// Valor grants protection at turn start and attack on kills
    Heroism,
    /// Faction filters are ignored
    Metamorphosis,
    /// Every death queues a heal-all and rally-all from the dead unit's commander
    Revenge,
    /// Counter contributes to stasis
    TemporalBacklash,
    /// Attack taken away by weaken/sunder is returned as rally
    TurningTides,
    /// Poison spreads from dying assaults to their neighbors
    Virulence,
    /// Heal from assaults also protects
    ZealotsPreservation,
}

impl PassiveEffect {
    /// Parameter used when the effect is active with parameter 0
    pub fn default_param(self) -> u32 {
        match self {
            PassiveEffect::Counterflux => 4,
            PassiveEffect::EnduringRage => 2,
            PassiveEffect::Devour => 4,
            _ => 0,
        }
    }
}

/// Set of active passive effects with their parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassiveEffects {
    effects: FxHashMap<PassiveEffect, u32>,
}

impl PassiveEffects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, effect: PassiveEffect, param: u32) -> Self {
        self.insert(effect, param);
        self
    }

    pub fn insert(&mut self, effect: PassiveEffect, param: u32) {
        self.effects.insert(effect, param);
    }

    #[inline]
    pub fn contains(&self, effect: PassiveEffect) -> bool {
        self.effects.contains_key(&effect)
    }

    /// Raw parameter of an active effect
    pub fn param(&self, effect: PassiveEffect) -> Option<u32> {
        self.effects.get(&effect).copied()
    }

    /// Parameter of an active effect, substituting the default for 0
    pub fn param_or_default(&self, effect: PassiveEffect) -> Option<u32> {
        self.param(effect)
            .map(|p| if p == 0 { effect.default_param() } else { p })
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

/// Who moves first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GameMode {
    #[default]
    Fight,
    /// The enemy side takes the first turn
    Surge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestType {
    SkillUse,
    SkillDamage,
    FactionAssaultCardKill,
    TypeCardKill,
    FactionAssaultCardUse,
    TypeCardUse,
    CardSurvival,
}

/// Quest objective tracked across a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quest {
    pub quest_type: QuestType,
    /// Skill index, faction index, card type index or card id depending on type
    pub key: u32,
    /// Optional second key (0 matches anything)
    #[serde(default)]
    pub key2: u32,
    /// Counter value that fulfils the quest
    pub value: u32,
    pub score: u64,
    #[serde(default)]
    pub win_score: u64,
    #[serde(default)]
    pub must_fulfill: bool,
    #[serde(default)]
    pub must_win: bool,
}

impl Quest {
    pub fn new(quest_type: QuestType, key: u32, value: u32, score: u64) -> Self {
        Quest {
            quest_type,
            key,
            key2: 0,
            value,
            score,
            win_score: 0,
            must_fulfill: false,
            must_win: false,
        }
    }

    pub fn skill_use(skill: SkillKind, value: u32, score: u64) -> Self {
        Quest::new(QuestType::SkillUse, skill.index() as u32, value, score)
    }

    pub fn faction_kill(faction: Faction, value: u32, score: u64) -> Self {
        Quest::new(QuestType::FactionAssaultCardKill, faction as u32, value, score)
    }

    pub fn type_kill(card_type: CardType, value: u32, score: u64) -> Self {
        Quest::new(QuestType::TypeCardKill, card_type.index(), value, score)
    }

    pub fn with_win_score(mut self, win_score: u64) -> Self {
        self.win_score = win_score;
        self
    }

    pub fn must_fulfill(mut self) -> Self {
        self.must_fulfill = true;
        self
    }

    pub fn must_win(mut self) -> Self {
        self.must_win = true;
        self
    }

    /// Does an event `(quest_type, key, key2)` count toward this quest?
    pub fn matches(&self, quest_type: QuestType, key: u32, key2: u32) -> bool {
        self.quest_type == quest_type && self.key == key && (self.key2 == 0 || self.key2 == key2)
    }

    /// Score earned for a counter value
    pub fn score_for(&self, counter: u32) -> u64 {
        if self.must_fulfill {
            if counter >= self.value {
                self.score
            } else {
                0
            }
        } else if self.value == 0 {
            self.score
        } else {
            self.score.min(self.score * counter as u64 / self.value as u64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_defaults() {
        let effects = PassiveEffects::new()
            .with(PassiveEffect::Counterflux, 0)
            .with(PassiveEffect::Bloodlust, 2);
        assert!(effects.contains(PassiveEffect::Counterflux));
        assert_eq!(effects.param_or_default(PassiveEffect::Counterflux), Some(4));
        assert_eq!(effects.param_or_default(PassiveEffect::Bloodlust), Some(2));
        assert_eq!(effects.param(PassiveEffect::Devour), None);
    }

    #[test]
    fn test_quest_matching() {
        let quest = Quest::skill_use(SkillKind::Strike, 10, 100);
        assert!(quest.matches(QuestType::SkillUse, SkillKind::Strike.index() as u32, 42));
        assert!(!quest.matches(QuestType::SkillDamage, SkillKind::Strike.index() as u32, 0));

        let mut keyed = quest.clone();
        keyed.key2 = 42;
        assert!(keyed.matches(QuestType::SkillUse, SkillKind::Strike.index() as u32, 42));
        assert!(!keyed.matches(QuestType::SkillUse, SkillKind::Strike.index() as u32, 7));
    }

    #[test]
    fn test_quest_score() {
        let quest = Quest::skill_use(SkillKind::Strike, 10, 100);
        assert_eq!(quest.score_for(5), 50);
        assert_eq!(quest.score_for(30), 100);

        let strict = quest.must_fulfill();
        assert_eq!(strict.score_for(9), 0);
        assert_eq!(strict.score_for(10), 100);
    }
}
