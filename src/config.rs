//! Match configuration
//!
//! Everything that is fixed for the lifetime of a match: turn limit, scoring
//! mode, passive modifiers, battleground skills, quest and the skill dispatch
//! table. A config is shared read-only (usually behind an `Arc`) by every
//! match of a batch.

use crate::core::SkillSpec;
use crate::game::{
    GameMode, OptimizationMode, PassiveEffect, PassiveEffects, Quest, SkillTable, VerbosityLevel,
};
use crate::{Result, SimError};
use serde::{Deserialize, Serialize};

/// Default number of turns before a match is declared a stall
pub const DEFAULT_TURN_LIMIT: u32 = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub turn_limit: u32,
    pub mode: OptimizationMode,
    pub game_mode: GameMode,
    pub effects: PassiveEffects,
    /// Activation skills cast by each side's commander every turn
    pub bg_skills: [Vec<SkillSpec>; 2],
    pub quest: Option<Quest>,
    pub verbosity: VerbosityLevel,

    #[serde(skip)]
    pub skill_table: SkillTable,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            turn_limit: DEFAULT_TURN_LIMIT,
            mode: OptimizationMode::default(),
            game_mode: GameMode::default(),
            effects: PassiveEffects::new(),
            bg_skills: [Vec::new(), Vec::new()],
            quest: None,
            verbosity: VerbosityLevel::Silent,
            skill_table: SkillTable::standard(),
        }
    }
}

impl SimConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from JSON; the dispatch table is rebuilt, never read
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_turn_limit(mut self, turn_limit: u32) -> Self {
        self.turn_limit = turn_limit;
        self
    }

    pub fn with_mode(mut self, mode: OptimizationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_game_mode(mut self, game_mode: GameMode) -> Self {
        self.game_mode = game_mode;
        self
    }

    pub fn with_effect(mut self, effect: PassiveEffect, param: u32) -> Self {
        self.effects.insert(effect, param);
        self
    }

    pub fn with_bg_skill(mut self, side: usize, spec: SkillSpec) -> Self {
        self.bg_skills[side].push(spec);
        self
    }

    pub fn with_quest(mut self, quest: Quest) -> Self {
        self.mode = OptimizationMode::Quest;
        self.quest = Some(quest);
        self
    }

    pub fn with_verbosity(mut self, verbosity: VerbosityLevel) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Reject configurations the engine cannot run
    pub fn validate(&self) -> Result<()> {
        if self.turn_limit == 0 {
            return Err(SimError::InvalidConfig("turn limit must be positive".into()));
        }
        for spec in self.bg_skills.iter().flatten() {
            if !self.skill_table.has_handler(spec.kind) {
                return Err(SimError::InvalidConfig(format!(
                    "battleground skill {} is not an activation skill",
                    spec
                )));
            }
        }
        if self.mode == OptimizationMode::Quest {
            match &self.quest {
                None => {
                    return Err(SimError::InvalidConfig(
                        "quest mode requires a quest".into(),
                    ))
                }
                Some(quest) if quest.value == 0 && !quest.must_fulfill => {
                    return Err(SimError::InvalidConfig(
                        "quest target value must be positive".into(),
                    ))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SkillKind;

    #[test]
    fn test_defaults() {
        let config = SimConfig::new();
        assert_eq!(config.turn_limit, 50);
        assert_eq!(config.mode, OptimizationMode::Winrate);
        assert!(config.effects.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_round_trip_rebuilds_table() {
        let config = SimConfig::new()
            .with_turn_limit(30)
            .with_mode(OptimizationMode::Raid)
            .with_effect(PassiveEffect::Bloodlust, 2)
            .with_bg_skill(0, SkillSpec::new(SkillKind::Strike, 1).all());

        let json = config.to_json().unwrap();
        let restored = SimConfig::from_json(&json).unwrap();
        assert_eq!(restored.turn_limit, 30);
        assert_eq!(restored.mode, OptimizationMode::Raid);
        assert_eq!(restored.effects.param(PassiveEffect::Bloodlust), Some(2));
        assert_eq!(restored.bg_skills[0].len(), 1);
        assert!(restored.skill_table.has_handler(SkillKind::Strike));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SimConfig::from_json(r#"{"turn_limit": 10}"#).unwrap();
        assert_eq!(config.turn_limit, 10);
        assert_eq!(config.game_mode, GameMode::Fight);
    }

    #[test]
    fn test_validate_rejects_bad_configs() {
        assert!(matches!(
            SimConfig::new().with_turn_limit(0).validate(),
            Err(SimError::InvalidConfig(_))
        ));
        assert!(matches!(
            SimConfig::new()
                .with_bg_skill(1, SkillSpec::new(SkillKind::Armor, 2))
                .validate(),
            Err(SimError::InvalidConfig(_))
        ));
        assert!(matches!(
            SimConfig::new().with_mode(OptimizationMode::Quest).validate(),
            Err(SimError::InvalidConfig(_))
        ));
        assert!(matches!(
            SimConfig::from_json("{not json"),
            Err(SimError::SerializationError(_))
        ));
    }
}
