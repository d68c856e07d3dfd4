//! Activation skill handlers and the dispatch table
//!
//! Every activation kind is dispatched through a `SkillTable` built once per
//! configuration. Handlers select targets, apply the per-target effect and
//! take care of the cross-cutting rules: evasion, inhibit (with Divert),
//! cooldowns, Payback/Revenge retaliation and TurningTides.

use crate::core::{CardType, Faction, Side, SkillKind, SkillSpec, UnitRef, NUM_SKILLS};
use crate::game::effects::{PassiveEffect, QuestType};
use crate::game::state::MatchState;
use crate::game::targeting::mimickable;
use crate::{Result, SimError};
use rand::Rng;
use smallvec::SmallVec;
use std::fmt;

/// Entry point for one cast of a skill kind
pub type SkillHandler = fn(&mut MatchState, UnitRef, &SkillSpec) -> Result<()>;

/// Per-kind dispatch table
#[derive(Clone, Copy)]
pub struct SkillTable {
    handlers: [Option<SkillHandler>; NUM_SKILLS],
}

impl SkillTable {
    /// A table with nothing registered
    pub fn empty() -> Self {
        SkillTable {
            handlers: [None; NUM_SKILLS],
        }
    }

    /// Handlers for every activation skill
    pub fn standard() -> Self {
        let mut table = Self::empty();
        for kind in SkillKind::ALL {
            if kind == SkillKind::Rush {
                table.register(kind, perform_targeted_rush);
            } else if kind.is_activation_helpful() {
                table.register(kind, perform_targeted_allied);
            } else if kind.is_activation() {
                table.register(kind, perform_targeted_hostile);
            }
        }
        table
    }

    pub fn register(&mut self, kind: SkillKind, handler: SkillHandler) {
        self.handlers[kind.index()] = Some(handler);
    }

    #[inline]
    pub fn handler(&self, kind: SkillKind) -> Option<SkillHandler> {
        self.handlers[kind.index()]
    }

    pub fn has_handler(&self, kind: SkillKind) -> bool {
        self.handlers[kind.index()].is_some()
    }
}

impl Default for SkillTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for SkillTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(SkillKind::ALL.iter().filter(|k| self.has_handler(**k)))
            .finish()
    }
}

/// Buff allied assaults
pub fn perform_targeted_allied(state: &mut MatchState, src: UnitRef, s: &SkillSpec) -> Result<()> {
    state.perform_allied(src, s)
}

/// Debuff or damage enemy units, then resolve retaliation
pub fn perform_targeted_hostile(state: &mut MatchState, src: UnitRef, s: &SkillSpec) -> Result<()> {
    state.perform_hostile(src, s)
}

/// Rush: attempted once per unit; commanders (and battleground casts) always cast
pub fn perform_targeted_rush(state: &mut MatchState, src: UnitRef, s: &SkillSpec) -> Result<()> {
    if state.unit(src).card_type() == CardType::Commander {
        return state.perform_allied(src, s);
    }
    if state.unit(src).rush_attempted {
        trace_if_verbose!(state, "{} does not check Rush again", state.unit(src));
        return Ok(());
    }
    log_if_verbose!(state, "{} attempts to activate Rush", state.unit(src));
    state.perform_allied(src, s)?;
    state.unit_mut(src).rush_attempted = true;
    Ok(())
}

impl MatchState {
    /// Apply a skill's effect to one target, unconditionally
    pub fn perform_skill(&mut self, src: UnitRef, dst: UnitRef, s: &SkillSpec) -> Result<()> {
        match s.kind {
            SkillKind::Enfeeble => self.unit_mut(dst).enfeebled += s.value,
            SkillKind::Enhance => {
                let unit = self.unit_mut(dst);
                let slot = unit.primary_skill[s.primary];
                unit.enhanced_value[slot] += s.value;
            }
            SkillKind::Evolve => self.unit_mut(dst).evolve(s.primary, s.secondary),
            SkillKind::Heal => {
                self.add_hp(dst, s.value);
                if self.unit(src).is_assault() && self.has_effect(PassiveEffect::ZealotsPreservation) {
                    let bonus = (s.value + 1) / 2;
                    log_if_verbose!(self, "Zealot's Preservation: {} Protect {} on {}", src, bonus, dst);
                    self.unit_mut(dst).protected += bonus;
                }
            }
            SkillKind::Jam => self.unit_mut(dst).jammed = true,
            SkillKind::Mend => self.add_hp(dst, s.value),
            SkillKind::Mortar => {
                let dmg = if dst.is_structure() {
                    s.value
                } else {
                    self.reduced_skill_damage(src, dst, (s.value + 1) / 2)
                };
                self.remove_hp(dst, dmg);
            }
            SkillKind::Overload => self.unit_mut(dst).overloaded = true,
            SkillKind::Protect => self.unit_mut(dst).protected += s.value,
            SkillKind::Rally => self.unit_mut(dst).rallied += s.value,
            SkillKind::Enrage => {
                self.unit_mut(dst).enraged += s.value;
                if self.has_effect(PassiveEffect::Furiosity) && self.unit(dst).can_be_healed() {
                    log_if_verbose!(self, "Furiosity: {} heals {} for {}", src, dst, s.value);
                    self.add_hp(dst, s.value);
                }
            }
            SkillKind::Rush => {
                let unit = self.unit_mut(dst);
                let step = s.value.max(1).min(unit.delay);
                unit.delay -= step;
                if unit.delay == 0 {
                    self.check_and_perform_valor(dst);
                }
            }
            SkillKind::Siege => self.remove_hp(dst, s.value),
            SkillKind::Strike => {
                let dmg = self.reduced_skill_damage(src, dst, s.value);
                self.remove_hp(dst, dmg);
            }
            SkillKind::Weaken => self.weaken(dst, s.value),
            SkillKind::Sunder => {
                self.unit_mut(dst).sundered = true;
                self.weaken(dst, s.value);
            }
            SkillKind::Mimic => self.perform_mimic(src, dst, s)?,
            _ => {}
        }
        Ok(())
    }

    /// Skill damage after enfeeble and protection; overloaded sources pierce protection
    fn reduced_skill_damage(&self, src: UnitRef, dst: UnitRef, base: u32) -> u32 {
        let target = self.unit(dst);
        let protection = if self.unit(src).overloaded {
            0
        } else {
            target.protected_value()
        };
        (base + target.enfeebled).saturating_sub(protection)
    }

    /// Weaken eats into rally first, then into attack
    fn weaken(&mut self, dst: UnitRef, value: u32) {
        let unit = self.unit_mut(dst);
        let mut remaining = value;
        if unit.rallied > unit.derallied {
            let derally = remaining.min(unit.rallied - unit.derallied);
            unit.derallied += derally;
            remaining -= derally;
        }
        if remaining > 0 {
            let cap = unit.attack_power();
            unit.weakened += remaining.min(cap);
        }
    }

    /// Copy a random activation skill from `dst` and cast it as `src`
    fn perform_mimic(&mut self, src: UnitRef, dst: UnitRef, s: &SkillSpec) -> Result<()> {
        let src_is_assault = self.unit(src).is_assault();
        let candidates: SmallVec<[SkillSpec; 4]> = self
            .unit(dst)
            .card
            .skills
            .iter()
            .filter(|ss| mimickable(ss.kind, src_is_assault))
            .copied()
            .collect();
        let picked = match candidates.len() {
            0 => return Ok(()),
            1 => candidates[0],
            n => candidates[self.rng.gen_range(0..n)],
        };

        let mimicked = SkillSpec {
            kind: picked.kind,
            value: s.value + self.unit(src).enhanced(picked.kind),
            faction: Faction::AllFactions,
            count: picked.count,
            cooldown: 0,
            primary: picked.primary,
            secondary: picked.secondary,
            all: picked.all,
        };
        log_if_verbose!(self, " * Mimicked skill: {}", mimicked);
        let handler = self
            .config()
            .skill_table
            .handler(mimicked.kind)
            .ok_or(SimError::NoSkillHandler(mimicked.kind))?;
        handler(self, src, &mimicked)
    }

    /// Evade check, then the effect and the source's cooldown
    ///
    /// Returns whether the effect landed.
    pub fn check_and_perform(
        &mut self,
        src: UnitRef,
        dst: UnitRef,
        s: &SkillSpec,
        evadable: bool,
        counted_quest: &mut bool,
    ) -> Result<bool> {
        if src.side == Side::Player && !*counted_quest {
            let card_id = self.unit(dst).card.id;
            self.inc_counter(QuestType::SkillUse, s.kind.index() as u32, card_id, 1);
            *counted_quest = true;
        }
        let target = self.unit(dst);
        if evadable && target.evaded < target.skill(SkillKind::Evade) && dst.side != src.side {
            self.unit_mut(dst).evaded += 1;
            log_if_verbose!(self, "{} {} on {} but it evades", self.unit(src), s.short(), self.unit(dst));
            return Ok(false);
        }
        log_if_verbose!(self, "{} {} on {}", self.unit(src), s.short(), self.unit(dst));
        self.perform_skill(src, dst, s)?;
        if s.cooldown > 0 {
            self.unit_mut(src).skill_cd[s.kind] = s.cooldown;
        }
        Ok(true)
    }

    /// Allied application: inhibit charges block buffs unless the source is overloaded
    pub fn perform_allied(&mut self, src: UnitRef, s: &SkillSpec) -> Result<()> {
        let targets = self.select_targets(src, s);
        let src_overloaded = self.unit(src).overloaded;
        let mut num_inhibited = 0;
        let mut counted_quest = false;

        for dst in targets {
            if self.unit(dst).inhibited > 0 && !src_overloaded {
                log_if_verbose!(self, "{} {} on {} but it is inhibited", self.unit(src), s.short(), self.unit(dst));
                self.unit_mut(dst).inhibited -= 1;
                num_inhibited += 1;
                continue;
            }
            self.check_and_perform(src, dst, s, false, &mut counted_quest)?;
        }

        if num_inhibited > 0 && self.has_effect(PassiveEffect::Divert) {
            let diverted = SkillSpec {
                faction: Faction::AllFactions,
                count: 1,
                all: false,
                ..*s
            };
            let selector = UnitRef::commander(self.inactive());
            for _ in 0..num_inhibited {
                for dst in self.select_targets(selector, &diverted) {
                    if self.unit(dst).inhibited > 0 {
                        log_if_verbose!(self, "{} {} (Diverted) on {} but it is inhibited", src, diverted.short(), dst);
                        self.unit_mut(dst).inhibited -= 1;
                        continue;
                    }
                    log_if_verbose!(self, "{} {} (Diverted) on {}", src, diverted.short(), dst);
                    self.perform_skill(src, dst, &diverted)?;
                }
            }
        }
        Ok(())
    }

    /// Rally from a side's commander with the attack TurningTides took away
    fn turning_tides_rally(&mut self, side: Side, value: u32, all: bool) -> Result<()> {
        log_if_verbose!(self, "TurningTides {}!", value);
        let mut rally = SkillSpec::new(SkillKind::Rally, value);
        rally.all = all;
        self.perform_allied(UnitRef::commander(side), &rally)
    }

    /// Hostile application with evasion, Payback/Revenge and TurningTides
    pub fn perform_hostile(&mut self, src: UnitRef, s: &SkillSpec) -> Result<()> {
        let targets = self.select_targets(src, s);
        let evadable = !self.unit(src).overloaded;
        let turning_tides = self.has_effect(PassiveEffect::TurningTides)
            && matches!(s.kind, SkillKind::Weaken | SkillKind::Sunder);
        let mut turning_tides_value = 0;
        let mut counted_quest = false;
        let mut paybackers: SmallVec<[UnitRef; 8]> = SmallVec::new();

        for dst in targets {
            let old_attack = self.unit(dst).attack_power();
            if !self.check_and_perform(src, dst, s, evadable, &mut counted_quest)? {
                continue;
            }
            if turning_tides {
                let lost = old_attack.saturating_sub(self.unit(dst).attack_power());
                turning_tides_value = turning_tides_value.max(lost);
            }
            let target = self.unit(dst);
            let payback = target.skill(SkillKind::Payback) + target.skill(SkillKind::Revenge);
            let source = self.unit(src);
            if s.kind != SkillKind::Mimic
                && target.paybacked < payback
                && source.is_assault()
                && source.is_alive()
            {
                paybackers.push(dst);
            }
        }

        if turning_tides && turning_tides_value > 0 {
            self.turning_tides_rally(src.side, turning_tides_value, s.all)?;
        }
        self.prepend_on_death();

        for pb in paybackers {
            if self.unit(pb).skill(SkillKind::Revenge) > 0 {
                self.perform_revenge(src, pb, s, turning_tides)?;
            } else {
                self.perform_payback(src, pb, s, turning_tides)?;
            }
        }

        self.prepend_on_death();
        Ok(())
    }

    /// Revenge: re-cast at the source and its living neighbors
    fn perform_revenge(
        &mut self,
        src: UnitRef,
        revenger: UnitRef,
        s: &SkillSpec,
        turning_tides: bool,
    ) -> Result<()> {
        let index = self.unit(src).index;
        let row = &self.board(src.side).assaults;
        let targets = [
            row.left_alive(index, 1).map(|i| (UnitRef::assault(src.side, i), "left")),
            Some((src, "core")),
            row.right_alive(index, 1).map(|i| (UnitRef::assault(src.side, i), "right")),
        ];

        let mut turning_tides_value = 0;
        let mut revenged = 0;
        for (target, direction) in targets.into_iter().flatten() {
            if !self.skill_predicate(target, target, s) {
                continue;
            }
            if !self.unit(target).is_alive() {
                trace_if_verbose!(self, "(CANCELLED: target unit dead) {} Revenge (to {}) {}", revenger, direction, s.short());
                continue;
            }
            let old_attack = self.unit(target).attack_power();
            log_if_verbose!(self, "{} Revenge (to {}) {} on {}", self.unit(revenger), direction, s.short(), self.unit(target));
            self.perform_skill(revenger, target, s)?;
            revenged += 1;
            if turning_tides {
                let lost = old_attack.saturating_sub(self.unit(target).attack_power());
                turning_tides_value = turning_tides_value.max(lost);
            }
        }

        if revenged > 0 {
            self.unit_mut(revenger).paybacked += 1;
            if turning_tides && turning_tides_value > 0 {
                self.turning_tides_rally(revenger.side, turning_tides_value, false)?;
            }
        }
        Ok(())
    }

    /// Payback: re-cast the identical skill back at the source
    fn perform_payback(
        &mut self,
        src: UnitRef,
        payer: UnitRef,
        s: &SkillSpec,
        turning_tides: bool,
    ) -> Result<()> {
        if !self.skill_predicate(src, src, s) {
            return Ok(());
        }
        if !self.unit(src).is_alive() {
            trace_if_verbose!(self, "(CANCELLED: src unit dead) {} Payback {}", payer, s.short());
            return Ok(());
        }
        let old_attack = self.unit(src).attack_power();
        log_if_verbose!(self, "{} Payback {} on {}", self.unit(payer), s.short(), self.unit(src));
        self.perform_skill(payer, src, s)?;
        self.unit_mut(payer).paybacked += 1;
        if turning_tides {
            let lost = old_attack.saturating_sub(self.unit(src).attack_power());
            if lost > 0 {
                self.turning_tides_rally(payer.side, lost, false)?;
            }
        }
        Ok(())
    }
}
