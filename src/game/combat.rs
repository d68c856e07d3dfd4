//! Attack resolution
//!
//! An active assault attacks the enemy assault across from it, or else the
//! first living enemy wall, or else the enemy commander. Damage is modified
//! (legion, coalition, rupture, venom, bloodlust, enfeeble), reduced (armor,
//! protection, pierce), dealt, and followed by damage-dependent statuses,
//! counter, corrosion and the attacker's self-buffs.

use crate::core::{CardType, Side, SkillKind, UnitRef};
use crate::game::effects::{PassiveEffect, QuestType};
use crate::game::state::MatchState;
use crate::{Result, SimError};

impl MatchState {
    /// Let an assault take its attack; returns whether it attacked
    pub fn attack_phase(&mut self, att: UnitRef) -> Result<bool> {
        let attacker = self.try_unit(att)?;
        if !attacker.is_alive() || !att.is_assault() {
            return Err(SimError::DeadAttacker(att.to_string()));
        }
        if attacker.attack_power() == 0 {
            log_if_verbose!(self, "{} cannot take attack (zeroed)", self.unit(att));
            return Ok(false);
        }

        let defender_side = att.side.opponent();
        let index = att.index();
        let dmg = if self.board(defender_side).assaults.alive_at(index) {
            let def = UnitRef::assault(defender_side, index);
            let dmg = self.perform_attack(att, def)?;
            self.swipe_and_drain(att, def, dmg)?;
            dmg
        } else {
            let wall = self
                .board(defender_side)
                .structures
                .iter()
                .position(|s| s.has_skill(SkillKind::Wall) && s.is_alive());
            let def = match wall {
                Some(i) => UnitRef::structure(defender_side, i),
                None => UnitRef::commander(defender_side),
            };
            self.perform_attack(att, def)?
        };

        if dmg > 0 && !self.assault_bloodlusted {
            if let Some(bloodlust) = self.effects().param(PassiveEffect::Bloodlust) {
                self.bloodlust_value += bloodlust;
                self.assault_bloodlusted = true;
            }
        }
        Ok(true)
    }

    /// Secondary damage to the defender's neighbors; drain heals by the total
    fn swipe_and_drain(&mut self, att: UnitRef, def: UnitRef, primary_dmg: u32) -> Result<()> {
        let attacker = self.unit(att);
        let swipe = attacker.skill(SkillKind::Swipe);
        let drain = attacker.skill(SkillKind::Drain);
        if swipe == 0 && drain == 0 {
            return Ok(());
        }
        let reach = if self.has_effect(PassiveEffect::CriticalReach) { 2 } else { 1 };
        let defender = self.unit(def);
        // Reduction uses the primary defender's statuses for every neighbor
        let swipe_dmg = (swipe + drain + defender.enfeebled).saturating_sub(defender.protected_value());
        let neighbors = self.board(def.side).assaults.adjacent_alive(def.index(), reach);

        let mut total = primary_dmg;
        for i in neighbors {
            let adj = UnitRef::assault(def.side, i);
            log_if_verbose!(self, "{} swipes {} for {} damage", self.unit(att), self.unit(adj), swipe_dmg);
            self.remove_hp(adj, swipe_dmg);
            total += swipe_dmg;
        }
        if drain > 0 && self.unit(att).can_be_healed() {
            log_if_verbose!(self, "{} drains {} hp", self.unit(att), total);
            self.add_hp(att, total);
        }
        self.prepend_on_death();
        self.resolve_skills()
    }

    /// Attack damage before reduction, plus the legion count for Brigade
    fn modified_attack_damage(&self, att: UnitRef, def: UnitRef) -> (u32, u32) {
        let attacker = self.unit(att);
        let defender = self.unit(def);
        let mut dmg = attacker.attack_power();
        let mut legion_value = 0;
        if attacker.sundered {
            return (dmg, legion_value);
        }

        let row = &self.board(att.side).assaults;
        let legion = attacker.skill(SkillKind::Legion);
        if legion > 0 {
            let index = attacker.index;
            let same_faction = |i: usize| row.get(i).is_some_and(|u| u.is_alive() && u.faction == attacker.faction);
            legion_value = index.checked_sub(1).map_or(0, |i| same_faction(i) as u32)
                + same_faction(index + 1) as u32;
            if legion_value > 0 && attacker.is_active() {
                legion_value *= legion;
                dmg += legion_value;
            }
        }

        let coalition = attacker.skill(SkillKind::Coalition);
        if coalition > 0 {
            let factions = row
                .iter()
                .filter(|u| u.is_alive())
                .fold(0u32, |bits, u| bits | u.card.faction.mask());
            dmg += coalition * factions.count_ones();
        }

        dmg += attacker.skill(SkillKind::Rupture);
        let venom = attacker.skill(SkillKind::Venom);
        if venom > 0 && defender.poisoned > 0 {
            dmg += venom;
        }
        dmg += self.bloodlust_value;
        dmg += defender.enfeebled;
        (dmg, legion_value)
    }

    /// Armor (best adjacent under Fortification) plus protection, minus pierce
    fn damage_reduction(&self, att: UnitRef, def: UnitRef) -> u32 {
        let defender = self.unit(def);
        let mut armor = defender.skill(SkillKind::Armor);
        if def.is_assault() && self.has_effect(PassiveEffect::Fortification) {
            let row = &self.board(def.side).assaults;
            for i in row.adjacent_alive(def.index(), 1) {
                armor = armor.max(row[i].skill(SkillKind::Armor));
            }
        }
        let reduction = armor + defender.protected_value();
        let attacker = self.unit(att);
        let pierce = attacker.skill(SkillKind::Pierce) + attacker.skill(SkillKind::Rupture);
        if reduction > 0 && pierce > 0 {
            reduction.saturating_sub(pierce)
        } else {
            reduction
        }
    }

    /// Resolve one attack against a chosen defender; returns damage dealt
    pub fn perform_attack(&mut self, att: UnitRef, def: UnitRef) -> Result<u32> {
        if self.unit(att).attack_power() == 0 {
            return Ok(0);
        }
        let (modified, legion_value) = self.modified_attack_damage(att, def);
        let reduction = self.damage_reduction(att, def);
        let dmg = modified.saturating_sub(reduction);
        log_if_verbose!(
            self,
            "{} attacks {} for {} damage ({} - {})",
            self.unit(att),
            self.unit(def),
            dmg,
            modified,
            reduction
        );

        if legion_value > 0
            && self.unit(att).can_be_healed()
            && self.has_effect(PassiveEffect::Brigade)
        {
            log_if_verbose!(self, "Brigade: {} heals itself for {}", att, legion_value);
            self.add_hp(att, legion_value);
        }
        if dmg == 0 {
            return Ok(0);
        }

        if def.is_commander() {
            self.remove_commander_hp(def.side, dmg);
        } else {
            self.remove_hp(def, dmg);
            self.prepend_on_death();
            self.resolve_skills()?;
        }
        if self.end {
            return Ok(dmg);
        }

        if def.is_assault() {
            self.apply_damage_dependent(att, def);
        }

        if self.unit(def).has_skill(SkillKind::Counter) {
            self.counter_attack(att, def)?;
            if !self.unit(att).is_alive() {
                return Ok(dmg);
            }
        }

        let corrosive = self.unit(def).skill(SkillKind::Corrosive);
        if corrosive > self.unit(att).corroded_rate {
            log_if_verbose!(self, "{} corrodes {} by {}", def, att, corrosive);
            self.unit_mut(att).corroded_rate = corrosive;
        }

        self.attacker_self_buffs(att, def, dmg);
        Ok(dmg)
    }

    /// Poison, inhibit and sabotage only ever raise the defender's status
    fn apply_damage_dependent(&mut self, att: UnitRef, def: UnitRef) {
        let attacker = self.unit(att);
        let poison = attacker.skill(SkillKind::Poison).max(attacker.skill(SkillKind::Venom));
        let inhibit = attacker.skill(SkillKind::Inhibit);
        let sabotage = attacker.skill(SkillKind::Sabotage);

        if poison > self.unit(def).poisoned {
            if att.side == Side::Player {
                self.inc_counter(QuestType::SkillUse, SkillKind::Poison.index() as u32, 0, 1);
            }
            log_if_verbose!(self, "{} poisons {} by {}", att, def, poison);
            self.unit_mut(def).poisoned = poison;
        }
        let defender = self.unit_mut(def);
        if inhibit > defender.inhibited {
            defender.inhibited = inhibit;
        }
        if sabotage > defender.sabotaged {
            defender.sabotaged = sabotage;
        }
    }

    /// Counter damage back at the attacker, with the Counterflux reward
    fn counter_attack(&mut self, att: UnitRef, def: UnitRef) -> Result<()> {
        let counter = self.unit(def).skill(SkillKind::Counter);
        let attacker = self.unit(att);
        let counter_dmg = (counter + attacker.enfeebled).saturating_sub(attacker.protected_value());
        if def.side == Side::Player {
            let key = SkillKind::Counter.index() as u32;
            self.inc_counter(QuestType::SkillUse, key, 0, 1);
            self.inc_counter(QuestType::SkillDamage, key, 0, counter_dmg);
        }
        log_if_verbose!(self, "{} takes {} counter damage from {}", self.unit(att), counter_dmg, self.unit(def));
        self.remove_hp(att, counter_dmg);
        self.prepend_on_death();
        self.resolve_skills()?;

        if def.is_assault() && self.unit(def).is_alive() {
            if let Some(denominator) = self.effects().param_or_default(PassiveEffect::Counterflux) {
                let flux = (counter.max(1) - 1) / denominator + 1;
                log_if_verbose!(self, "Counterflux: {} heals itself and berserks for {}", def, flux);
                let defender = self.unit_mut(def);
                defender.add_hp(flux);
                if !defender.sundered {
                    defender.attack += flux;
                }
            }
        }
        Ok(())
    }

    /// Berserk, leech, Heroism and Devour
    fn attacker_self_buffs(&mut self, att: UnitRef, def: UnitRef, dmg: u32) {
        let berserk = self.unit(att).skill(SkillKind::Berserk);
        if !self.unit(att).sundered && berserk > 0 {
            self.unit_mut(att).attack += berserk;
            if att.side == Side::Player {
                self.inc_counter(QuestType::SkillUse, SkillKind::Berserk.index() as u32, 0, 1);
            }
            if let Some(denominator) = self.effects().param_or_default(PassiveEffect::EnduringRage) {
                let bonus = (berserk - 1) / denominator + 1;
                log_if_verbose!(self, "EnduringRage: {} heals and protects itself for {}", att, bonus);
                let attacker = self.unit_mut(att);
                attacker.add_hp(bonus);
                attacker.protected += bonus;
            }
        }

        if !def.is_assault() {
            return;
        }

        let leech = dmg.min(self.unit(att).skill(SkillKind::Leech));
        if leech > 0 && self.unit(att).can_be_healed() {
            if att.side == Side::Player {
                self.inc_counter(QuestType::SkillUse, SkillKind::Leech.index() as u32, 0, 1);
            }
            log_if_verbose!(self, "{} leeches {} health", self.unit(att), leech);
            self.add_hp(att, leech);
        }

        let valor = self.unit(att).skill(SkillKind::Valor);
        if valor > 0
            && !self.unit(att).sundered
            && self.has_effect(PassiveEffect::Heroism)
            && !self.unit(def).is_alive()
        {
            log_if_verbose!(self, "Heroism: {} gains {} attack", att, valor);
            self.unit_mut(att).attack += valor;
        }

        let attacker = self.unit(att);
        let devour_base = attacker.skill(SkillKind::Leech) + attacker.skill(SkillKind::Refresh);
        if devour_base > 0 {
            if let Some(denominator) = self.effects().param_or_default(PassiveEffect::Devour) {
                let bonus = (devour_base - 1) / denominator + 1;
                log_if_verbose!(self, "Devour: {} grows by {}", att, bonus);
                let attacker = self.unit_mut(att);
                if !attacker.sundered {
                    attacker.attack += bonus;
                }
                attacker.extend_hp(bonus);
            }
        }
    }
}
