//! Skill resolution queue
//!
//! Skills are resolved by draining a FIFO of (source, skill) pairs. Handlers
//! never recurse into each other: chained effects are enqueued, and
//! death-triggered effects are pushed to the front with `prepend_on_death` so
//! they resolve before anything already waiting.

use crate::core::{SkillKind, SkillSpec, UnitRef};
use crate::game::effects::PassiveEffect;
use crate::game::state::MatchState;
use crate::{Result, SimError};
use smallvec::SmallVec;

impl MatchState {
    /// Queue a skill cast at the back
    pub fn enqueue(&mut self, src: UnitRef, spec: SkillSpec) {
        self.queue.push_back((src, spec));
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Drain the queue to empty
    ///
    /// Each entry is transformed in fixed order (evolve, sabotage, enhance)
    /// before dispatch. Casts from dead or jammed sources and magnitude
    /// skills reduced to zero are dropped.
    pub fn resolve_skills(&mut self) -> Result<()> {
        while let Some((src, declared)) = self.queue.pop_front() {
            let status = self.unit(src);
            if !status.is_alive() {
                trace_if_verbose!(self, "{} cannot cast {} (dead)", src, declared);
                continue;
            }
            if status.jammed {
                trace_if_verbose!(self, "{} cannot cast {} (jammed)", src, declared);
                continue;
            }

            let mut spec = declared;
            let evolved = status.evolved(spec.kind);
            if evolved != spec.kind {
                spec = spec.evolved(evolved);
            }
            if status.sabotaged > 0 && spec.kind.has_magnitude() {
                spec = spec.sabotaged(status.sabotaged);
            }
            let enhanced = status.enhanced(spec.kind);
            if enhanced > 0 {
                spec = spec.enhanced(enhanced);
            }
            if spec.kind.has_magnitude() && spec.value == 0 {
                trace_if_verbose!(self, "{} {} cancelled (zero magnitude)", src, spec);
                continue;
            }

            let handler = self
                .config()
                .skill_table
                .handler(spec.kind)
                .ok_or(SimError::NoSkillHandler(spec.kind))?;
            handler(self, src, &spec)?;
        }
        Ok(())
    }

    /// Process the kill list: avenge, poison spread and revenge rewards
    ///
    /// Reward skills go to the front of the queue in kill order.
    pub fn prepend_on_death(&mut self) {
        if self.killed.is_empty() {
            return;
        }
        let killed = std::mem::take(&mut self.killed);
        let virulence = self.has_effect(PassiveEffect::Virulence);
        let revenge = self.effects().param(PassiveEffect::Revenge);

        let mut on_death: SmallVec<[(UnitRef, SkillSpec); 8]> = SmallVec::new();
        let mut stacked_poison = 0;
        let mut last_index: Option<usize> = None;
        let mut left_victim: Option<usize> = None;

        for dead in killed {
            if dead.is_assault() {
                let side = dead.side;
                let index = dead.index();

                let neighbors = self.board(side).assaults.adjacent_alive(index, 1);
                for i in neighbors {
                    let avenge = self.board(side).assaults[i].skill(SkillKind::Avenge);
                    if avenge == 0 {
                        continue;
                    }
                    let unit = &mut self.board_mut(side).assaults[i];
                    if !unit.sundered {
                        unit.attack += avenge;
                    }
                    unit.extend_hp(avenge);
                    log_if_verbose!(
                        self,
                        "{} avenges {}: +{}",
                        self.board(side).assaults[i],
                        dead,
                        avenge
                    );
                }

                if virulence {
                    if last_index.map_or(true, |last| index != last + 1) {
                        stacked_poison = 0;
                        left_victim = self.board(side).assaults.left_alive(index, 1);
                    }
                    let poisoned = self.unit(dead).poisoned;
                    if poisoned > 0 {
                        if let Some(left) = left_victim {
                            self.board_mut(side).assaults[left].poisoned += poisoned;
                        }
                        stacked_poison += poisoned;
                    }
                    if let Some(right) = self.board(side).assaults.right_alive(index, 1) {
                        self.board_mut(side).assaults[right].poisoned += stacked_poison;
                    }
                    last_index = Some(index);
                }
            }

            if let Some(value) = revenge {
                let commander = UnitRef::commander(dead.side);
                on_death.push((commander, SkillSpec::new(SkillKind::Heal, value).all()));
                on_death.push((commander, SkillSpec::new(SkillKind::Rally, value).all()));
            }
        }

        for entry in on_death.into_iter().rev() {
            self.queue.push_front(entry);
        }
    }

    /// Reset per-action bookkeeping
    pub fn prepare_action(&mut self) {
        self.damaged_times.clear();
    }

    /// Barrier: protection proportional to hits taken during the action
    pub fn finalize_action(&mut self) {
        let damaged = std::mem::take(&mut self.damaged_times);
        for (r, times) in damaged {
            let unit = self.unit_mut(r);
            if !unit.is_alive() {
                continue;
            }
            let barrier = unit.skill(SkillKind::Barrier);
            if barrier > 0 {
                unit.protected += barrier * times;
                log_if_verbose!(self, "{} gains {} barrier protection", r, barrier * times);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::core::{Card, Side};
    use crate::loader::Deck;
    use crate::game::SkillTable;
    use std::sync::Arc;

    fn state_with(config: SimConfig) -> MatchState {
        let deck = |name: &str| Deck::new(name, Arc::new(Card::commander(1, "Commander", 20)), vec![]);
        MatchState::new(Arc::new(config), deck("a"), deck("b"), 3).unwrap()
    }

    fn place(state: &mut MatchState, side: Side, card: Card) -> UnitRef {
        state.active = side;
        state.play_card(Arc::new(card)).unwrap()
    }

    #[test]
    fn test_queue_drains_to_empty() {
        let mut state = state_with(SimConfig::new());
        let target = place(&mut state, Side::Enemy, Card::assault(10, "Target", 1, 10, 1));
        let commander = UnitRef::commander(Side::Player);
        state.enqueue(commander, SkillSpec::new(SkillKind::Strike, 2));
        state.enqueue(commander, SkillSpec::new(SkillKind::Strike, 3));
        state.resolve_skills().unwrap();
        assert_eq!(state.queue_len(), 0);
        assert_eq!(state.unit(target).hp, 5);
    }

    #[test]
    fn test_dead_or_jammed_source_is_skipped() {
        let mut state = state_with(SimConfig::new());
        let target = place(&mut state, Side::Enemy, Card::assault(10, "Target", 1, 10, 1));
        let caster = place(&mut state, Side::Player, Card::assault(11, "Caster", 1, 5, 1));

        state.unit_mut(caster).jammed = true;
        state.enqueue(caster, SkillSpec::new(SkillKind::Strike, 2));
        state.resolve_skills().unwrap();
        assert_eq!(state.unit(target).hp, 10);

        state.unit_mut(caster).jammed = false;
        state.unit_mut(caster).hp = 0;
        state.enqueue(caster, SkillSpec::new(SkillKind::Strike, 2));
        state.resolve_skills().unwrap();
        assert_eq!(state.unit(target).hp, 10);
    }

    #[test]
    fn test_sabotage_to_zero_cancels() {
        let mut state = state_with(SimConfig::new());
        let target = place(&mut state, Side::Enemy, Card::assault(10, "Target", 1, 10, 1));
        let caster = place(&mut state, Side::Player, Card::assault(11, "Caster", 1, 5, 1));
        state.unit_mut(caster).sabotaged = 2;
        state.enqueue(caster, SkillSpec::new(SkillKind::Strike, 2));
        state.resolve_skills().unwrap();
        assert_eq!(state.unit(target).hp, 10);

        state.enqueue(caster, SkillSpec::new(SkillKind::Strike, 5));
        state.resolve_skills().unwrap();
        assert_eq!(state.unit(target).hp, 7);
    }

    #[test]
    fn test_missing_handler_is_an_error() {
        let mut config = SimConfig::new();
        config.skill_table = SkillTable::empty();
        let mut state = state_with(config);
        state.enqueue(UnitRef::commander(Side::Player), SkillSpec::new(SkillKind::Strike, 1));
        assert!(matches!(
            state.resolve_skills(),
            Err(SimError::NoSkillHandler(SkillKind::Strike))
        ));
    }

    #[test]
    fn test_avenge_on_neighbor_death() {
        let mut state = state_with(SimConfig::new());
        let left = place(&mut state, Side::Player, Card::assault(10, "Left", 1, 3, 1));
        let avenger = Card::assault(11, "Avenger", 2, 4, 1).with_skill(SkillSpec::new(SkillKind::Avenge, 2));
        let avenger = place(&mut state, Side::Player, avenger);

        state.remove_hp(left, 3);
        state.prepend_on_death();
        let unit = state.unit(avenger);
        assert_eq!(unit.attack, 4);
        assert_eq!((unit.hp, unit.max_hp), (6, 6));
        assert!(state.killed.is_empty());
    }

    #[test]
    fn test_virulence_spreads_poison() {
        let config = SimConfig::new().with_effect(PassiveEffect::Virulence, 0);
        let mut state = state_with(config);
        let refs: Vec<UnitRef> = (0..3)
            .map(|i| place(&mut state, Side::Enemy, Card::assault(20 + i, "Unit", 1, 5, 1)))
            .collect();
        state.unit_mut(refs[1]).poisoned = 3;
        state.remove_hp(refs[1], 5);
        state.prepend_on_death();
        assert_eq!(state.unit(refs[0]).poisoned, 3);
        assert_eq!(state.unit(refs[2]).poisoned, 3);
    }

    #[test]
    fn test_revenge_rewards_go_to_front() {
        let config = SimConfig::new().with_effect(PassiveEffect::Revenge, 2);
        let mut state = state_with(config);
        let victim = place(&mut state, Side::Enemy, Card::assault(10, "Victim", 1, 1, 1));
        state.enqueue(UnitRef::commander(Side::Player), SkillSpec::new(SkillKind::Strike, 1));
        state.remove_hp(victim, 1);
        state.prepend_on_death();

        let kinds: Vec<SkillKind> = state.queue.iter().map(|(_, s)| s.kind).collect();
        assert_eq!(kinds, vec![SkillKind::Heal, SkillKind::Rally, SkillKind::Strike]);
        assert_eq!(state.queue[0].0, UnitRef::commander(Side::Enemy));
    }

    #[test]
    fn test_barrier_protects_per_hit() {
        let mut state = state_with(SimConfig::new());
        let wall = Card::assault(10, "Wall", 1, 20, 1).with_skill(SkillSpec::new(SkillKind::Barrier, 2));
        let wall = place(&mut state, Side::Enemy, wall);
        state.phase = crate::game::Phase::Assaults;
        state.prepare_action();
        state.remove_hp(wall, 1);
        state.remove_hp(wall, 1);
        state.finalize_action();
        assert_eq!(state.unit(wall).protected, 4);
    }
}
