//! Turn loop
//!
//! Drives a match through its phases, one side's turn at a time, until a
//! commander dies or the turn limit is reached:
//! TurnStart, PlayCard (with Heroism and battleground skills), Commander,
//! Structures, Assaults, TurnEnd. The `end` flag is checked after every
//! phase-level step so a commander death stops the match immediately.

use crate::config::SimConfig;
use crate::core::{Card, CardStep, CardType, Side, SkillKind, SkillSpec, UnitRef};
use crate::game::effects::{GameMode, PassiveEffect, QuestType};
use crate::game::phase::Phase;
use crate::game::scoring::MatchResult;
use crate::game::state::MatchState;
use crate::game::VerbosityLevel;
use crate::loader::Deck;
use crate::Result;
use std::sync::Arc;

/// Drives one match to completion
///
/// Runs the whole match in a single call; a loop is meant to be built once
/// per fresh `MatchState`.
pub struct MatchLoop<'a> {
    pub state: &'a mut MatchState,
    turn_limit: u32,
}

impl<'a> MatchLoop<'a> {
    pub fn new(state: &'a mut MatchState) -> Self {
        let turn_limit = state.config().turn_limit;
        MatchLoop { state, turn_limit }
    }

    /// Override the configured turn limit
    pub fn with_turn_limit(mut self, turn_limit: u32) -> Self {
        self.turn_limit = turn_limit;
        self
    }

    /// Play the match out and score it
    pub fn run(&mut self) -> Result<MatchResult> {
        self.state.begin()?;
        while self.state.turn <= self.turn_limit && !self.state.end {
            self.state.run_turn()?;
        }

        let result = self.state.evaluate_outcome();
        if self.state.logger.wants(VerbosityLevel::Minimal) {
            self.state.logger.minimal(&format!(
                "Match over after {} turns: {}",
                self.state.turn.min(self.turn_limit),
                result
            ));
        }
        Ok(result)
    }
}

/// Run one match from two decks and a seed
pub fn simulate(config: Arc<SimConfig>, player: Deck, enemy: Deck, seed: u64) -> Result<MatchResult> {
    let mut state = MatchState::new(config, player, enemy, seed)?;
    MatchLoop::new(&mut state).run()
}

impl MatchState {
    /// Pick the first side and place both sides' forts
    pub fn begin(&mut self) -> Result<()> {
        if self.config().game_mode == GameMode::Surge {
            self.active = Side::Enemy;
        }
        for _ in 0..2 {
            let forts = self.board(self.active).deck.forts.clone();
            for card in forts {
                self.play_card(card)?;
            }
            self.active = self.active.opponent();
        }
        Ok(())
    }

    /// One side's full turn; returns early once the match has ended
    pub fn run_turn(&mut self) -> Result<()> {
        self.phase = Phase::TurnStart;
        log_if_verbose!(
            self,
            "------------------------------------------------------------------------\nTURN {} begins for {}",
            self.turn,
            self.commander(self.active)
        );
        self.turn_start();

        self.phase = Phase::PlayCard;
        let side = self.active;
        if let Some(card) = self.board_mut(side).deck.next() {
            self.play_drawn_card(card)?;
        }
        if self.end {
            return Ok(());
        }
        if self.has_effect(PassiveEffect::Heroism) {
            self.heroism()?;
        }
        self.cast_bg_skills()?;
        if self.end {
            return Ok(());
        }

        self.phase = Phase::Commander;
        let mut attacked = false;
        self.evaluate_skills(UnitRef::commander(side), &mut attacked)?;
        if self.end {
            return Ok(());
        }

        self.structures_phase()?;
        self.assaults_phase()?;
        if self.end {
            return Ok(());
        }

        self.phase = Phase::TurnEnd;
        self.turn_end()?;
        if self.end {
            return Ok(());
        }

        self.active = self.active.opponent();
        self.turn += 1;
        Ok(())
    }

    /// Reindex both boards, tick delays and cooldowns of the active side
    pub fn turn_start(&mut self) {
        let side = self.active;
        self.board_mut(side).commander.cooldown_skills();

        for i in 0..self.board(side).assaults.len() {
            let r = UnitRef::assault(side, i);
            let unit = self.unit_mut(r);
            unit.index = i;
            if unit.delay > 0 {
                unit.delay -= 1;
                let ready = unit.delay == 0;
                trace_if_verbose!(self, "{} reduces its timer", self.unit(r));
                if ready {
                    self.check_and_perform_valor(r);
                }
            } else {
                unit.cooldown_skills();
            }
        }

        for unit in self.board_mut(side).structures.iter_mut() {
            if unit.delay > 0 {
                unit.delay -= 1;
            } else {
                unit.cooldown_skills();
            }
        }
        self.board_mut(side).structures.reindex();

        let inactive = self.inactive();
        self.board_mut(inactive).reindex();
    }

    /// Place a drawn card: Allegiance first, then the card, then Stasis
    pub fn play_drawn_card(&mut self, card: Arc<Card>) -> Result<UnitRef> {
        let side = self.active;

        for i in 0..self.board(side).assaults.len() {
            let unit = &mut self.board_mut(side).assaults[i];
            let allegiance = unit.skill(SkillKind::Allegiance);
            if allegiance == 0 || !unit.is_alive() || unit.card.faction != card.faction {
                continue;
            }
            if !unit.sundered {
                unit.attack += allegiance;
            }
            unit.extend_hp(allegiance);
            log_if_verbose!(
                self,
                "{} activates Allegiance {}",
                self.board(side).assaults[i],
                allegiance
            );
        }

        let r = self.play_card(Arc::clone(&card))?;
        self.apply_stasis(r, &card);
        Ok(r)
    }

    /// Mark stasis factions and stack stasis protection onto a delayed assault
    fn apply_stasis(&mut self, r: UnitRef, card: &Card) {
        let backlash = self.has_effect(PassiveEffect::TemporalBacklash);
        let played = self.unit(r);
        let faction = played.faction;
        let mask = faction.mask();
        if played.skill(SkillKind::Stasis) > 0 || (backlash && played.skill(SkillKind::Counter) > 0) {
            self.board_mut(r.side).stasis_faction_bitmap |= mask;
        }

        let board = self.board(r.side);
        if card.delay == 0
            || card.card_type != CardType::Assault
            || board.stasis_faction_bitmap & mask == 0
        {
            return;
        }

        let mut stacked = if board.commander.faction == faction {
            board.commander.skill(SkillKind::Stasis)
        } else {
            0
        };
        stacked += board
            .structures
            .iter()
            .filter(|s| s.faction == faction)
            .map(|s| s.skill(SkillKind::Stasis))
            .sum::<u32>();
        for unit in board.assaults.iter().filter(|u| u.faction == faction) {
            stacked += unit.skill(SkillKind::Stasis);
            if backlash {
                let counter = unit.skill(SkillKind::Counter);
                if counter > 0 {
                    stacked += (counter + 1) / 2;
                }
            }
        }

        self.unit_mut(r).protected_stasis = stacked;
        if stacked > 0 {
            log_if_verbose!(self, "{} gains {} stasis protection", self.unit(r), stacked);
        } else {
            self.board_mut(r.side).stasis_faction_bitmap &= !mask;
        }
    }

    /// Heroism: assaults with Valor are protected from their commander
    fn heroism(&mut self) -> Result<()> {
        let side = self.active;
        let commander = UnitRef::commander(side);
        for dst in self.assault_refs(side) {
            let value = (self.unit(dst).skill(SkillKind::Valor) + 1) / 2;
            if value == 0 {
                continue;
            }
            let protect = SkillSpec::new(SkillKind::Protect, value);

            if self.unit(dst).inhibited > 0 {
                log_if_verbose!(self, "Heroism: {} on {} but it is inhibited", protect.short(), self.unit(dst));
                self.unit_mut(dst).inhibited -= 1;
                if self.has_effect(PassiveEffect::Divert) {
                    let diverted = protect.with_count(1);
                    let selector = UnitRef::commander(self.inactive());
                    for target in self.select_targets(selector, &diverted) {
                        if self.unit(target).inhibited > 0 {
                            self.unit_mut(target).inhibited -= 1;
                            continue;
                        }
                        log_if_verbose!(self, "Heroism: {} (Diverted) on {}", diverted.short(), self.unit(target));
                        self.perform_skill(commander, target, &diverted)?;
                    }
                }
                continue;
            }

            let mut counted_quest = false;
            self.check_and_perform(commander, dst, &protect, false, &mut counted_quest)?;
        }
        Ok(())
    }

    /// Battleground activation skills, cast by the active commander
    fn cast_bg_skills(&mut self) -> Result<()> {
        let side = self.active;
        let count = self.config().bg_skills[side.index()].len();
        for i in 0..count {
            let spec = self.config().bg_skills[side.index()][i];
            self.prepare_action();
            trace_if_verbose!(self, "Evaluating BG skill {}", spec);
            self.enqueue(UnitRef::commander(side), spec);
            self.resolve_skills()?;
            self.finalize_action();
        }
        Ok(())
    }

    /// Run a unit's declared activation skills, then (assaults) its attack
    ///
    /// Flurry repeats the whole action; `attacked` records whether any
    /// repetition actually attacked.
    pub fn evaluate_skills(&mut self, r: UnitRef, attacked: &mut bool) -> Result<()> {
        let card = Arc::clone(&self.unit(r).card);
        let mut num_actions = 1;
        let mut action = 0;
        let mut flurried = false;

        while action < num_actions {
            self.prepare_action();
            for spec in card.skills.iter() {
                if !self.config().skill_table.has_handler(spec.kind) {
                    continue;
                }
                if self.unit(r).skill_cd[spec.kind] > 0 {
                    continue;
                }
                trace_if_verbose!(self, "Evaluating {} skill {}", self.unit(r), spec);
                self.enqueue(r, *spec);
                self.resolve_skills()?;
                if self.end {
                    return Ok(());
                }
            }

            if r.is_assault() {
                if self.unit(r).can_act() {
                    if self.attack_phase(r)? {
                        *attacked = true;
                    }
                    if self.end {
                        return Ok(());
                    }
                } else {
                    trace_if_verbose!(self, "{} cannot take attack", self.unit(r));
                }
            }
            self.finalize_action();

            let unit = self.unit(r);
            if !flurried
                && unit.can_act()
                && self.commander(r.side.opponent()).is_alive()
                && unit.has_skill(SkillKind::Flurry)
                && unit.skill_cd[SkillKind::Flurry] == 0
            {
                flurried = true;
                let extra = unit.skill_base_value(SkillKind::Flurry);
                if r.side == Side::Player {
                    self.inc_counter(QuestType::SkillUse, SkillKind::Flurry.index() as u32, 0, 1);
                }
                log_if_verbose!(self, "{} activates Flurry x {}", self.unit(r), extra);
                num_actions += extra;
                let unit = self.unit_mut(r);
                for spec in card.skills.iter() {
                    if unit.evolved(spec.kind) == SkillKind::Flurry {
                        unit.skill_cd[spec.kind] = spec.cooldown;
                    }
                }
            }
            action += 1;
        }
        Ok(())
    }

    fn structures_phase(&mut self) -> Result<()> {
        self.phase = Phase::Structures;
        let side = self.active;
        let mut i = 0;
        while !self.end && i < self.board(side).structures.len() {
            let r = UnitRef::structure(side, i);
            if self.unit(r).is_active() {
                let mut attacked = false;
                self.evaluate_skills(r, &mut attacked)?;
            } else {
                trace_if_verbose!(self, "{} cannot take action", self.unit(r));
            }
            i += 1;
        }
        Ok(())
    }

    fn assaults_phase(&mut self) -> Result<()> {
        self.phase = Phase::Assaults;
        self.bloodlust_value = 0;
        let side = self.active;
        let mut i = 0;
        while !self.end && i < self.board(side).assaults.len() {
            let r = UnitRef::assault(side, i);
            let mut attacked = false;
            if self.unit(r).is_active() {
                let unit = self.unit_mut(r);
                unit.protected_stasis = 0;
                unit.step = CardStep::Attacking;
                self.assault_bloodlusted = false;
                self.evaluate_skills(r, &mut attacked)?;
                if self.end {
                    break;
                }
            } else {
                trace_if_verbose!(self, "{} cannot take action", self.unit(r));
                self.halted_orders(r);
            }

            let unit = self.unit_mut(r);
            if unit.corroded_rate > 0 {
                if attacked {
                    let loss = unit.corroded_rate.min(unit.attack_power());
                    unit.corroded_weakened += loss;
                } else {
                    unit.corroded_rate = 0;
                    unit.corroded_weakened = 0;
                }
            }
            unit.step = CardStep::Attacked;
            i += 1;
        }
        Ok(())
    }

    /// HaltedOrders: a delayed assault still inhibits the unit across from it
    fn halted_orders(&mut self, r: UnitRef) {
        if !self.has_effect(PassiveEffect::HaltedOrders) {
            return;
        }
        let unit = self.unit(r);
        let inhibit = unit.skill(SkillKind::Inhibit);
        if unit.delay == 0 || inhibit == 0 {
            return;
        }
        let across = UnitRef::assault(r.side.opponent(), r.index());
        let halted = match self.board_mut(across.side).assaults.get_mut(across.index()) {
            Some(unit) if unit.is_alive() && inhibit > unit.inhibited => {
                unit.inhibited = inhibit;
                true
            }
            _ => false,
        };
        if halted {
            log_if_verbose!(self, "Halted Orders: {} inhibits {} by {}", r, across, inhibit);
        }
    }

    /// Clear temporary statuses, apply Refresh and poison, then compact the boards
    pub fn turn_end(&mut self) -> Result<()> {
        let inactive = self.inactive();
        let board = self.board_mut(inactive);
        for unit in board.assaults.iter_mut().filter(|u| u.is_alive()) {
            unit.clear_defender_statuses();
        }
        for unit in board.structures.iter_mut().filter(|u| u.is_alive()) {
            unit.evaded = 0;
        }

        let side = self.active;
        for r in self.assault_refs(side) {
            let unit = self.unit(r);
            if !unit.is_alive() {
                continue;
            }
            let refresh = unit.skill(SkillKind::Refresh);
            if refresh > 0 && unit.can_be_healed() {
                log_if_verbose!(self, "{} refreshes {} health", self.unit(r), refresh);
                self.add_hp(r, refresh);
            }

            let unit = self.unit(r);
            if unit.poisoned > 0 {
                let dmg = (unit.poisoned + unit.enfeebled).saturating_sub(unit.protected_value());
                if dmg > 0 {
                    if side == Side::Enemy {
                        self.inc_counter(QuestType::SkillDamage, SkillKind::Poison.index() as u32, 0, dmg);
                    }
                    log_if_verbose!(self, "{} takes poison damage {}", self.unit(r), dmg);
                    self.remove_hp(r, dmg);
                }
            }
            self.unit_mut(r).clear_attacker_statuses();
        }

        self.prepend_on_death();
        self.resolve_skills()?;
        self.remove_dead();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Faction;
    use crate::game::OptimizationMode;

    fn commander() -> Arc<Card> {
        Arc::new(Card::commander(1, "Commander", 20))
    }

    fn deck(name: &str, cards: Vec<Card>) -> Deck {
        Deck::new(name, commander(), cards.into_iter().map(Arc::new).collect())
    }

    fn state_with(config: SimConfig, player: Deck, enemy: Deck) -> MatchState {
        MatchState::new(Arc::new(config), player, enemy, 5).unwrap()
    }

    fn place(state: &mut MatchState, side: Side, card: Card) -> UnitRef {
        let previous = state.active;
        state.active = side;
        let r = state.play_card(Arc::new(card)).unwrap();
        state.active = previous;
        r
    }

    #[test]
    fn test_empty_decks_stall_at_turn_limit() {
        let mut state = state_with(SimConfig::new(), deck("a", vec![]), deck("b", vec![]));
        let result = MatchLoop::new(&mut state).run().unwrap();
        assert!(result.stalled);
        assert!(!result.won && !result.lost);
        assert_eq!(result.score, 0);
        assert_eq!(state.turn, 51);
    }

    #[test]
    fn test_commander_kill_ends_match() {
        let player = deck("a", vec![Card::assault(10, "Hammer", 10, 5, 0)]);
        let mut state = state_with(SimConfig::new(), player, deck("b", vec![]));
        let result = MatchLoop::new(&mut state).run().unwrap();
        assert!(result.won);
        assert_eq!(result.score, 100);
        assert_eq!(state.turn, 3);
        assert_eq!(state.commander(Side::Enemy).hp, 0);
    }

    #[test]
    fn test_turn_limit_override() {
        let mut state = state_with(SimConfig::new(), deck("a", vec![]), deck("b", vec![]));
        let result = MatchLoop::new(&mut state).with_turn_limit(4).run().unwrap();
        assert!(result.stalled);
        assert_eq!(state.turn, 5);
    }

    #[test]
    fn test_begin_places_forts_and_surge() {
        let fort = || vec![Arc::new(Card::structure(30, "Fort", 10, 0))];
        let player = deck("a", vec![]).with_forts(fort());
        let enemy = deck("b", vec![]).with_forts(fort());
        let config = SimConfig::new().with_game_mode(GameMode::Surge);
        let mut state = state_with(config, player, enemy);
        state.begin().unwrap();
        assert_eq!(state.active, Side::Enemy);
        assert_eq!(state.board(Side::Player).structures.len(), 1);
        assert_eq!(state.board(Side::Enemy).structures.len(), 1);
    }

    #[test]
    fn test_turn_start_ticks_active_side_only() {
        let mut state = state_with(SimConfig::new(), deck("a", vec![]), deck("b", vec![]));
        let mine = place(&mut state, Side::Player, Card::assault(10, "Mine", 1, 3, 2));
        let theirs = place(&mut state, Side::Enemy, Card::assault(11, "Theirs", 1, 3, 2));
        state.turn_start();
        assert_eq!(state.unit(mine).delay, 1);
        assert_eq!(state.unit(theirs).delay, 2);
    }

    #[test]
    fn test_turn_end_poison_and_status_reset() {
        let mut state = state_with(SimConfig::new(), deck("a", vec![]), deck("b", vec![]));
        let sick = place(&mut state, Side::Player, Card::assault(10, "Sick", 1, 10, 0));
        let defender = place(&mut state, Side::Enemy, Card::assault(11, "Guard", 1, 10, 0));
        {
            let unit = state.unit_mut(sick);
            unit.poisoned = 3;
            unit.enfeebled = 1;
            unit.protected = 2;
            unit.jammed = true;
            unit.rallied = 4;
        }
        state.unit_mut(defender).protected = 5;
        state.unit_mut(defender).enfeebled = 2;

        state.phase = Phase::TurnEnd;
        state.turn_end().unwrap();

        let unit = state.unit(sick);
        assert_eq!(unit.hp, 8);
        assert_eq!(unit.poisoned, 3);
        assert!(!unit.jammed);
        assert_eq!(unit.rallied, 0);
        let guard = state.unit(defender);
        assert_eq!((guard.protected, guard.enfeebled), (0, 0));
    }

    #[test]
    fn test_refresh_heals_at_turn_end() {
        let mut state = state_with(SimConfig::new(), deck("a", vec![]), deck("b", vec![]));
        let card = Card::assault(10, "Regen", 1, 10, 0).with_skill(SkillSpec::new(SkillKind::Refresh, 3));
        let r = place(&mut state, Side::Player, card);
        state.unit_mut(r).hp = 4;
        state.turn_end().unwrap();
        assert_eq!(state.unit(r).hp, 7);
    }

    #[test]
    fn test_poison_kill_is_compacted() {
        let mut state = state_with(SimConfig::new(), deck("a", vec![]), deck("b", vec![]));
        let r = place(&mut state, Side::Player, Card::assault(10, "Frail", 1, 2, 0));
        state.unit_mut(r).poisoned = 5;
        state.turn_end().unwrap();
        assert!(state.board(Side::Player).assaults.is_empty());
    }

    #[test]
    fn test_allegiance_on_matching_faction() {
        let mut state = state_with(SimConfig::new(), deck("a", vec![]), deck("b", vec![]));
        let loyal = Card::assault(10, "Loyal", 1, 3, 1)
            .with_faction(Faction::Raider)
            .with_skill(SkillSpec::new(SkillKind::Allegiance, 2));
        let loyal = place(&mut state, Side::Player, loyal);

        let other = Card::assault(11, "Other", 1, 3, 1).with_faction(Faction::Xeno);
        state.play_drawn_card(Arc::new(other)).unwrap();
        assert_eq!(state.unit(loyal).attack, 1);

        let kin = Card::assault(12, "Kin", 1, 3, 1).with_faction(Faction::Raider);
        state.play_drawn_card(Arc::new(kin)).unwrap();
        let unit = state.unit(loyal);
        assert_eq!((unit.attack, unit.hp, unit.max_hp), (3, 5, 5));
    }

    #[test]
    fn test_stasis_stacks_onto_delayed_assault() {
        let commander = Card::commander(1, "Warden", 20)
            .with_faction(Faction::Imperial)
            .with_skill(SkillSpec::new(SkillKind::Stasis, 2));
        let player = Deck::new("a", Arc::new(commander), vec![]);
        let mut state = state_with(SimConfig::new(), player, deck("b", vec![]));

        let slow = Card::assault(10, "Slow", 1, 3, 2).with_faction(Faction::Imperial);
        let r = state.play_drawn_card(Arc::new(slow)).unwrap();
        assert_eq!(state.unit(r).protected_stasis, 2);

        let stranger = Card::assault(11, "Stranger", 1, 3, 2).with_faction(Faction::Xeno);
        let r = state.play_drawn_card(Arc::new(stranger)).unwrap();
        assert_eq!(state.unit(r).protected_stasis, 0);
    }

    #[test]
    fn test_flurry_repeats_the_attack() {
        let mut state = state_with(SimConfig::new(), deck("a", vec![]), deck("b", vec![]));
        let card = Card::assault(10, "Flurrier", 1, 5, 0)
            .with_skill(SkillSpec::new(SkillKind::Flurry, 1).with_cooldown(2));
        let r = place(&mut state, Side::Player, card);
        state.phase = Phase::Assaults;
        let mut attacked = false;
        state.evaluate_skills(r, &mut attacked).unwrap();
        assert!(attacked);
        assert_eq!(state.commander(Side::Enemy).hp, 18);
        assert_eq!(state.unit(r).skill_cd[SkillKind::Flurry], 2);
    }

    #[test]
    fn test_halted_orders_inhibits_across() {
        let config = SimConfig::new().with_effect(PassiveEffect::HaltedOrders, 0);
        let mut state = state_with(config, deck("a", vec![]), deck("b", vec![]));
        let card = Card::assault(10, "Sleeper", 1, 5, 2).with_skill(SkillSpec::new(SkillKind::Inhibit, 2));
        place(&mut state, Side::Player, card);
        let across = place(&mut state, Side::Enemy, Card::assault(11, "Target", 1, 5, 1));
        state.assaults_phase().unwrap();
        assert_eq!(state.unit(across).inhibited, 2);
    }

    #[test]
    fn test_bg_skill_cast_by_commander() {
        let config = SimConfig::new().with_bg_skill(0, SkillSpec::new(SkillKind::Strike, 2).all());
        let mut state = state_with(config, deck("a", vec![]), deck("b", vec![]));
        let target = place(&mut state, Side::Enemy, Card::assault(11, "Target", 1, 5, 1));
        state.cast_bg_skills().unwrap();
        assert_eq!(state.unit(target).hp, 3);
        assert_eq!(state.queue_len(), 0);
    }

    #[test]
    fn test_heroism_protects_valor_units() {
        let config = SimConfig::new().with_effect(PassiveEffect::Heroism, 0);
        let mut state = state_with(config, deck("a", vec![]), deck("b", vec![]));
        let card = Card::assault(10, "Hero", 1, 5, 1).with_skill(SkillSpec::new(SkillKind::Valor, 3));
        let r = place(&mut state, Side::Player, card);
        state.heroism().unwrap();
        assert_eq!(state.unit(r).protected, 2);
    }

    #[test]
    fn test_simulate_is_deterministic() {
        let cards = || {
            (0..6)
                .map(|i| Card::assault(10 + i, "Grunt", 1 + i % 3, 3 + i % 2, i % 3))
                .collect::<Vec<_>>()
        };
        let config = Arc::new(SimConfig::new().with_mode(OptimizationMode::Winrate));
        let a = simulate(Arc::clone(&config), deck("a", cards()), deck("b", cards()), 99).unwrap();
        let b = simulate(config, deck("a", cards()), deck("b", cards()), 99).unwrap();
        assert_eq!(a, b);
    }
}
