//! Outcome scoring
//!
//! Turns a finished match into a result record from side 0's point of view.
//! Each optimization mode scores wins, losses and stalls differently.

use crate::core::Side;
use crate::game::effects::QuestType;
use crate::game::state::MatchState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a batch of matches is trying to maximize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OptimizationMode {
    /// Plain win/loss: 100 for a win, 0 otherwise
    #[default]
    Winrate,
    /// Surviving to the turn limit counts as full score
    Defense,
    /// Damage dealt to the enemy commander and board
    Raid,
    Brawl,
    BrawlDefense,
    /// Wins are worth less the more cards were spent
    Campaign,
    Quest,
}

/// Result of one match, from side 0's point of view
///
/// Exactly one of `won`, `stalled`, `lost` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MatchResult {
    pub won: bool,
    pub stalled: bool,
    pub lost: bool,
    pub score: u64,
}

impl MatchResult {
    pub fn win(score: u64) -> Self {
        MatchResult { won: true, score, ..Default::default() }
    }

    pub fn stall(score: u64) -> Self {
        MatchResult { stalled: true, score, ..Default::default() }
    }

    pub fn loss(score: u64) -> Self {
        MatchResult { lost: true, score, ..Default::default() }
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = if self.won {
            "win"
        } else if self.lost {
            "loss"
        } else {
            "stall"
        };
        write!(f, "{} (score {})", outcome, self.score)
    }
}

/// Highest score a brawl-defense match can yield
const BRAWL_DEFENSE_MAX: u64 = 67;
/// Brawl-defense score awarded for a win or stall
const BRAWL_DEFENSE_HOLD: u64 = 62;

impl MatchState {
    /// Score the match as it stands
    ///
    /// A living pair of commanders means the match ran out of turns.
    pub fn evaluate_outcome(&self) -> MatchResult {
        let mode = self.config().mode;
        let raid = if mode == OptimizationMode::Raid { self.raid_score() } else { 0 };
        let quest = self.config().quest.as_ref();
        let quest_score = match (mode, quest) {
            (OptimizationMode::Quest, Some(quest)) => quest.score_for(self.final_quest_counter()),
            _ => 0,
        };
        let must_win = quest.map_or(false, |q| q.must_win);

        if !self.commander(Side::Player).is_alive() {
            let score = match mode {
                OptimizationMode::Raid => raid,
                OptimizationMode::Brawl => 5,
                OptimizationMode::BrawlDefense => {
                    BRAWL_DEFENSE_MAX.saturating_sub(self.brawl_score(Side::Enemy))
                }
                OptimizationMode::Quest if !must_win => quest_score,
                _ => 0,
            };
            return MatchResult::loss(score);
        }

        if !self.commander(Side::Enemy).is_alive() {
            let score = match mode {
                OptimizationMode::Brawl => self.brawl_score(Side::Player),
                OptimizationMode::BrawlDefense => BRAWL_DEFENSE_HOLD,
                OptimizationMode::Campaign => {
                    let spent = self.cards_spent(Side::Player);
                    (100 - 10 * spent).max(0) as u64
                }
                OptimizationMode::Quest => {
                    quest.map_or(0, |q| q.win_score) + quest_score
                }
                _ => 100,
            };
            return MatchResult::win(score);
        }

        match mode {
            OptimizationMode::Defense => MatchResult::stall(100),
            OptimizationMode::Raid => MatchResult::stall(raid),
            OptimizationMode::Brawl => MatchResult::stall(5),
            OptimizationMode::BrawlDefense => MatchResult::win(BRAWL_DEFENSE_HOLD),
            OptimizationMode::Quest if !must_win => MatchResult::stall(quest_score),
            _ => MatchResult::stall(0),
        }
    }

    /// Cards a side could have played by now minus those still on its board
    fn cards_spent(&self, side: Side) -> i64 {
        let board = self.board(side);
        let playable = (board.deck.size() as i64).min(((self.turn + 1) / 2) as i64);
        playable - board.assaults.len() as i64 - board.structures.len() as i64
    }

    /// Raid damage against the enemy: board attrition plus commander damage
    fn raid_score(&self) -> u64 {
        let commander = self.commander(Side::Enemy);
        let health_left = if commander.max_hp > 0 {
            (10 * commander.hp / commander.max_hp) as i64
        } else {
            0
        };
        (15 + self.cards_spent(Side::Enemy) - health_left).max(0) as u64
    }

    fn brawl_score(&self, side: Side) -> u64 {
        let opponent = self.board(side.opponent());
        let own = self.board(side);
        (55 + opponent.total_cards_destroyed as u64 + own.deck.remaining() as u64)
            .saturating_sub(((self.turn + 7) / 8) as u64)
    }

    /// Quest counter including card-survival matches still on board or in the deck
    fn final_quest_counter(&self) -> u32 {
        let Some(quest) = &self.config().quest else {
            return self.quest_counter;
        };
        if quest.quest_type != QuestType::CardSurvival {
            return self.quest_counter;
        }
        let board = self.board(Side::Player);
        let on_board = board
            .assaults
            .iter()
            .chain(board.structures.iter())
            .filter(|u| u.card.id == quest.key)
            .count();
        let in_deck = board.deck.undrawn().filter(|c| c.id == quest.key).count();
        self.quest_counter + (on_board + in_deck) as u32
    }
}
