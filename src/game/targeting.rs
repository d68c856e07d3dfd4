//! Target selection for activation skills
//!
//! A skill's candidates come from a fixed domain per kind (enemy assaults,
//! allied assaults or enemy structures), filtered by liveness, a per-kind
//! eligibility predicate and the declared faction. When fewer targets are
//! requested than qualify, a partial Fisher-Yates draw picks them and the
//! result is re-sorted by board index.

use crate::core::{CardStep, Faction, Side, SkillKind, SkillSpec, UnitRef};
use crate::game::effects::PassiveEffect;
use crate::game::state::MatchState;
use rand::Rng;
use smallvec::SmallVec;

/// Selected targets, in application order
pub type Targets = SmallVec<[UnitRef; 8]>;

/// Where a skill kind looks for targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetDomain {
    HostileAssaults,
    AlliedAssaults,
    HostileStructures,
}

impl TargetDomain {
    pub fn for_kind(kind: SkillKind) -> TargetDomain {
        match kind {
            SkillKind::Siege => TargetDomain::HostileStructures,
            kind if kind.is_activation_helpful() => TargetDomain::AlliedAssaults,
            _ => TargetDomain::HostileAssaults,
        }
    }
}

/// Can this unit's declared skills be copied by a mimic from `src`?
pub(crate) fn mimickable(kind: SkillKind, src_is_assault: bool) -> bool {
    kind.is_activation() && kind != SkillKind::Mimic && (kind != SkillKind::Mend || src_is_assault)
}

impl MatchState {
    /// Eligibility of `dst` for skill `s` cast by `src`
    pub fn skill_predicate(&self, src: UnitRef, dst: UnitRef, s: &SkillSpec) -> bool {
        let d = self.unit(dst);
        match s.kind {
            SkillKind::Enhance => {
                d.is_alive()
                    && d.has_skill(s.primary)
                    && (d.is_active()
                        || s.primary.is_defensive()
                        || self.unit(src).is_alive_gilian())
            }
            SkillKind::Evolve => {
                d.is_alive()
                    && d.has_skill(s.primary)
                    && !d.has_skill(s.secondary)
                    && (d.is_active()
                        || s.secondary.is_defensive()
                        || self.unit(src).is_alive_gilian())
            }
            SkillKind::Heal | SkillKind::Mend => d.can_be_healed(),
            SkillKind::Jam => d.is_active_next_turn(),
            SkillKind::Mimic => {
                let src_is_assault = self.unit(src).is_assault();
                d.is_alive()
                    && d.card
                        .skills
                        .iter()
                        .any(|ss| mimickable(ss.kind, src_is_assault))
            }
            SkillKind::Overload => self.overload_predicate(dst),
            SkillKind::Rally => {
                !d.sundered
                    && if dst.side == self.active {
                        d.is_active() && !d.has_attacked()
                    } else {
                        d.is_active_next_turn()
                    }
            }
            SkillKind::Enrage => {
                d.is_active() && d.step == CardStep::None && d.attack_power() > 0
            }
            SkillKind::Rush => {
                let source = self.unit(src);
                let min_delay = if source.is_assault() && d.index < source.index {
                    2
                } else {
                    1
                };
                !source.rush_attempted && d.delay >= min_delay
            }
            SkillKind::Weaken | SkillKind::Sunder => {
                d.attack_power() > 0 && d.is_active_next_turn()
            }
            _ => d.is_alive(),
        }
    }

    /// Overload only targets units that are ready to act and would use it
    fn overload_predicate(&self, dst: UnitRef) -> bool {
        let d = self.unit(dst);
        if d.overloaded || d.has_attacked() || !d.is_active() {
            return false;
        }
        let inhibited_ally = self
            .board(dst.side)
            .assaults
            .iter()
            .any(|u| u.is_alive() && u.inhibited > 0);
        d.card.skills.iter().any(|ss| {
            if d.skill_cd[ss.kind] > 0 {
                return false;
            }
            let evolved = d.evolved(ss.kind);
            evolved.is_activation_hostile()
                || (inhibited_ally && evolved != SkillKind::Mend && evolved.is_activation_helpful())
        })
    }

    fn faction_matches(&self, r: UnitRef, filter: Faction) -> bool {
        if filter == Faction::AllFactions || self.has_effect(PassiveEffect::Metamorphosis) {
            return true;
        }
        let faction = self.unit(r).faction;
        faction == filter || faction == Faction::Progenitor
    }

    fn domain_side(&self, src: UnitRef, domain: TargetDomain) -> Side {
        match domain {
            TargetDomain::AlliedAssaults => src.side,
            TargetDomain::HostileAssaults | TargetDomain::HostileStructures => src.side.opponent(),
        }
    }

    /// Every eligible target in a domain, in board order
    pub fn candidates(&self, src: UnitRef, s: &SkillSpec, domain: TargetDomain) -> Targets {
        let side = self.domain_side(src, domain);
        let refs = match domain {
            TargetDomain::HostileStructures => self.structure_refs(side),
            _ => self.assault_refs(side),
        };
        refs.into_iter()
            .filter(|&r| self.unit(r).is_alive())
            .filter(|&r| self.faction_matches(r, s.faction))
            .filter(|&r| self.skill_predicate(src, r, s))
            .collect()
    }

    /// Mend reaches only the source's neighbors on its own row
    fn mend_candidates(&self, src: UnitRef, s: &SkillSpec) -> Targets {
        let reach = if self.has_effect(PassiveEffect::CriticalReach) { 2 } else { 1 };
        let index = self.unit(src).index;
        self.board(src.side)
            .assaults
            .adjacent_alive(index, reach)
            .into_iter()
            .map(|i| UnitRef::assault(src.side, i))
            .filter(|&r| self.skill_predicate(src, r, s))
            .collect()
    }

    /// Choose the targets of one cast
    pub fn select_targets(&mut self, src: UnitRef, s: &SkillSpec) -> Targets {
        let mut targets = match s.kind {
            SkillKind::Mend => self.mend_candidates(src, s),
            SkillKind::Mortar => {
                let structures = self.candidates(src, s, TargetDomain::HostileStructures);
                if structures.is_empty() {
                    self.candidates(src, s, TargetDomain::HostileAssaults)
                } else {
                    structures
                }
            }
            kind => self.candidates(src, s, TargetDomain::for_kind(kind)),
        };

        let available = targets.len();
        if available == 0 {
            return targets;
        }
        let wanted = if s.count > 0 { s.count as usize } else { 1 };
        if s.all || wanted >= available || s.kind == SkillKind::Mend {
            return targets;
        }

        for i in 0..wanted {
            let j = self.rng.gen_range(i..available);
            targets.swap(i, j);
        }
        targets.truncate(wanted);
        if wanted > 1 {
            targets.sort_by_key(|r| r.index());
        }
        targets
    }
}
