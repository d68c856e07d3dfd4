//! Match state: both boards, turn bookkeeping, the skill queue and the RNG
//!
//! Every mutation of a match goes through `MatchState`. Units are addressed by
//! `UnitRef` handles so the engine never holds a borrow of one unit while
//! mutating another.

use crate::config::SimConfig;
use crate::core::{Card, CardStatus, CardType, Side, SkillKind, SkillSpec, Slot, UnitRef};
use crate::game::effects::{PassiveEffect, PassiveEffects, QuestType};
use crate::game::logger::GameLogger;
use crate::game::phase::Phase;
use crate::loader::Deck;
use crate::zones::PlayerBoard;
use crate::{Result, SimError};
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

/// One complete match in progress
pub struct MatchState {
    config: Arc<SimConfig>,

    /// Indexed by `Side::index()`
    pub boards: [PlayerBoard; 2],
    pub active: Side,
    pub turn: u32,
    pub phase: Phase,

    /// Pending (source, skill) pairs, drained by `resolve_skills`
    pub(crate) queue: VecDeque<(UnitRef, SkillSpec)>,
    /// Units killed since the last death-trigger pass
    pub(crate) killed: Vec<UnitRef>,
    /// Hits taken per unit during the current action (Barrier)
    pub(crate) damaged_times: BTreeMap<UnitRef, u32>,

    /// Bloodlust bonus accumulated by the active side this turn
    pub bloodlust_value: u32,
    /// Whether the acting assault has already fed bloodlust
    pub assault_bloodlusted: bool,

    /// Set the instant a commander reaches zero health
    pub end: bool,
    pub quest_counter: u32,

    pub rng: ChaCha12Rng,
    pub logger: GameLogger,
}

impl MatchState {
    /// Set up a match: validate both decks and shuffle them with the match RNG
    pub fn new(config: Arc<SimConfig>, player: Deck, enemy: Deck, seed: u64) -> Result<Self> {
        config.validate()?;
        player.validate()?;
        enemy.validate()?;

        let mut rng = ChaCha12Rng::seed_from_u64(seed);
        let mut player = player;
        let mut enemy = enemy;
        player.shuffle(&mut rng);
        enemy.shuffle(&mut rng);

        let logger = GameLogger::with_verbosity(config.verbosity);
        Ok(MatchState {
            boards: [
                PlayerBoard::new(player, Side::Player)?,
                PlayerBoard::new(enemy, Side::Enemy)?,
            ],
            active: Side::Player,
            turn: 1,
            phase: Phase::TurnStart,
            queue: VecDeque::new(),
            killed: Vec::new(),
            damaged_times: BTreeMap::new(),
            bloodlust_value: 0,
            assault_bloodlusted: false,
            end: false,
            quest_counter: 0,
            rng,
            logger,
            config,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    #[inline]
    pub fn effects(&self) -> &PassiveEffects {
        &self.config.effects
    }

    #[inline]
    pub fn has_effect(&self, effect: PassiveEffect) -> bool {
        self.config.effects.contains(effect)
    }

    /// Side not taking the current turn
    #[inline]
    pub fn inactive(&self) -> Side {
        self.active.opponent()
    }

    #[inline]
    pub fn board(&self, side: Side) -> &PlayerBoard {
        &self.boards[side.index()]
    }

    #[inline]
    pub fn board_mut(&mut self, side: Side) -> &mut PlayerBoard {
        &mut self.boards[side.index()]
    }

    /// Resolve a handle; panics on a handle past the end of its storage
    #[inline]
    pub fn unit(&self, r: UnitRef) -> &CardStatus {
        let board = &self.boards[r.side.index()];
        match r.slot {
            Slot::Commander => &board.commander,
            Slot::Assault(i) => &board.assaults[i],
            Slot::Structure(i) => &board.structures[i],
        }
    }

    #[inline]
    pub fn unit_mut(&mut self, r: UnitRef) -> &mut CardStatus {
        let board = &mut self.boards[r.side.index()];
        match r.slot {
            Slot::Commander => &mut board.commander,
            Slot::Assault(i) => &mut board.assaults[i],
            Slot::Structure(i) => &mut board.structures[i],
        }
    }

    /// Resolve a handle that may be stale
    pub fn try_unit(&self, r: UnitRef) -> Result<&CardStatus> {
        self.boards[r.side.index()]
            .unit(r.slot)
            .ok_or_else(|| SimError::UnitNotFound(r.to_string()))
    }

    pub fn commander(&self, side: Side) -> &CardStatus {
        &self.boards[side.index()].commander
    }

    /// Handles of one side's assaults, in board order
    pub fn assault_refs(&self, side: Side) -> Vec<UnitRef> {
        (0..self.board(side).assaults.len())
            .map(|i| UnitRef::assault(side, i))
            .collect()
    }

    pub fn structure_refs(&self, side: Side) -> Vec<UnitRef> {
        (0..self.board(side).structures.len())
            .map(|i| UnitRef::structure(side, i))
            .collect()
    }

    /// Count a quest event; only side 0's actions are tracked by callers
    pub fn inc_counter(&mut self, quest_type: QuestType, key: u32, key2: u32, value: u32) {
        if let Some(quest) = &self.config.quest {
            if quest.matches(quest_type, key, key2) {
                self.quest_counter += value;
            }
        }
    }

    /// Put a drawn card into play on the active side
    ///
    /// Commanders cannot be played; everything else is appended to its storage.
    pub fn play_card(&mut self, card: Arc<Card>) -> Result<UnitRef> {
        let side = self.active;
        let slot = match card.card_type {
            CardType::Assault => {
                let status = CardStatus::new(Arc::clone(&card), side, 0);
                Slot::Assault(self.board_mut(side).assaults.push(status))
            }
            CardType::Structure => {
                let status = CardStatus::new(Arc::clone(&card), side, 0);
                Slot::Structure(self.board_mut(side).structures.push(status))
            }
            CardType::Commander => {
                return Err(SimError::InvalidCardType {
                    card_id: card.id,
                    card_type: card.card_type,
                })
            }
        };
        let r = UnitRef { side, slot };
        log_if_verbose!(self, "{} plays {} {}", side, card.card_type.name(), card);

        if side == Side::Player {
            if card.card_type == CardType::Assault {
                self.inc_counter(QuestType::FactionAssaultCardUse, card.faction as u32, 0, 1);
            }
            self.inc_counter(QuestType::TypeCardUse, card.card_type.index(), 0, 1);
        }
        if self.unit(r).delay == 0 {
            self.check_and_perform_valor(r);
        }
        Ok(r)
    }

    /// Valor: gain attack if the unit across is alive and hits harder
    pub fn check_and_perform_valor(&mut self, r: UnitRef) {
        let status = self.unit(r);
        let valor = status.skill(SkillKind::Valor);
        if valor == 0 || status.sundered || !r.is_assault() {
            return;
        }
        let across = UnitRef::assault(r.side.opponent(), r.index());
        let Some(opponent) = self.board(across.side).assaults.get(across.index()) else {
            return;
        };
        if !opponent.is_alive() || opponent.attack_power() <= status.attack_power() {
            return;
        }
        if r.side == Side::Player {
            self.inc_counter(QuestType::SkillUse, SkillKind::Valor.index() as u32, 0, 1);
        }
        log_if_verbose!(self, "{} activates Valor {}", self.unit(r), valor);
        self.unit_mut(r).attack += valor;
    }

    /// Heal up to max health
    pub fn add_hp(&mut self, r: UnitRef, amount: u32) {
        self.unit_mut(r).add_hp(amount);
    }

    /// Deal damage to a non-commander unit, recording a kill at zero health
    pub fn remove_hp(&mut self, r: UnitRef, dmg: u32) {
        if dmg == 0 || !self.unit(r).is_alive() {
            return;
        }
        let unit = self.unit_mut(r);
        unit.hp = unit.hp.saturating_sub(dmg);
        let dead = unit.hp == 0;
        let has_barrier = unit.has_skill(SkillKind::Barrier);
        if self.phase.is_action_phase() && has_barrier {
            *self.damaged_times.entry(r).or_insert(0) += 1;
        }
        trace_if_verbose!(self, "{} takes {} damage", self.unit(r), dmg);
        if !dead {
            return;
        }

        let card = Arc::clone(&self.unit(r).card);
        log_if_verbose!(self, "{} {} dies", r, card.name);
        if r.side == Side::Enemy {
            if card.card_type == CardType::Assault {
                self.inc_counter(QuestType::FactionAssaultCardKill, card.faction as u32, 0, 1);
            }
            self.inc_counter(QuestType::TypeCardKill, card.card_type.index(), 0, 1);
        }
        if card.card_type != CardType::Commander {
            self.killed.push(r);
            self.board_mut(r.side).total_cards_destroyed += 1;
        }
        if r.side == Side::Player && self.board(Side::Player).deck.vip_cards.contains(&card.id) {
            log_if_verbose!(self, "{} lost objective card {}", r.side, card.name);
            self.board_mut(Side::Player).commander.hp = 0;
            self.end = true;
        }
    }

    /// Damage a commander; zero health ends the match immediately
    pub fn remove_commander_hp(&mut self, side: Side, dmg: u32) {
        let commander = &mut self.board_mut(side).commander;
        commander.hp = commander.hp.saturating_sub(dmg);
        if commander.hp == 0 {
            log_if_verbose!(self, "{} commander dies", side);
            self.end = true;
        }
    }

    /// Drop dead units from every storage
    pub fn remove_dead(&mut self) {
        for board in self.boards.iter_mut() {
            board.remove_dead();
        }
    }
}

impl std::fmt::Debug for MatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchState")
            .field("turn", &self.turn)
            .field("active", &self.active)
            .field("phase", &self.phase)
            .field("end", &self.end)
            .field("player_hp", &self.boards[0].commander.hp)
            .field("enemy_hp", &self.boards[1].commander.hp)
            .field("queue_len", &self.queue.len())
            .finish()
    }
}
