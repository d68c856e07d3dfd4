//! Board storage: per-side commander, assault row and structure row

use crate::core::{CardStatus, CardType, Liveness, Side, SkillKind, Slot};
use crate::loader::Deck;
use crate::{Result, SimError};
use smallvec::SmallVec;
use std::ops::{Index, IndexMut};
use std::sync::Arc;

/// An ordered row of units (assaults or structures)
///
/// Insertion appends. Dead units stay in place until `compact`, so board
/// positions are stable for the whole turn.
#[derive(Debug, Clone, Default)]
pub struct Storage {
    units: Vec<CardStatus>,
}

impl Storage {
    pub fn new() -> Self {
        Storage { units: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CardStatus> {
        self.units.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut CardStatus> {
        self.units.get_mut(index)
    }

    /// Append a unit and return its position
    pub fn push(&mut self, mut status: CardStatus) -> usize {
        let index = self.units.len();
        status.index = index;
        self.units.push(status);
        index
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CardStatus> {
        self.units.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, CardStatus> {
        self.units.iter_mut()
    }

    /// Positions of the living units, left to right
    pub fn live_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.units
            .iter()
            .enumerate()
            .filter(|(_, u)| u.is_alive())
            .map(|(i, _)| i)
    }

    pub fn count_alive(&self) -> usize {
        self.units.iter().filter(|u| u.is_alive()).count()
    }

    pub fn alive_at(&self, index: usize) -> bool {
        self.units.get(index).is_some_and(|u| u.is_alive())
    }

    /// The living unit `distance` slots to the left, if any
    pub fn left_alive(&self, index: usize, distance: usize) -> Option<usize> {
        let left = index.checked_sub(distance)?;
        self.alive_at(left).then_some(left)
    }

    /// The living unit `distance` slots to the right, if any
    pub fn right_alive(&self, index: usize, distance: usize) -> Option<usize> {
        let right = index + distance;
        self.alive_at(right).then_some(right)
    }

    /// Living neighbors within `reach`: far-left to near-left, then near-right to far-right
    pub fn adjacent_alive(&self, index: usize, reach: usize) -> SmallVec<[usize; 4]> {
        let mut adjacent = SmallVec::new();
        for distance in (1..=reach).rev() {
            if let Some(i) = self.left_alive(index, distance) {
                adjacent.push(i);
            }
        }
        for distance in 1..=reach {
            if let Some(i) = self.right_alive(index, distance) {
                adjacent.push(i);
            }
        }
        adjacent
    }

    /// Refresh every unit's board index from its position
    pub fn reindex(&mut self) {
        for (i, unit) in self.units.iter_mut().enumerate() {
            unit.index = i;
        }
    }

    /// Drop dead units, preserving the order of survivors
    ///
    /// Returns the dropped units, marked `Removed`.
    pub fn compact(&mut self) -> Vec<CardStatus> {
        let (alive, mut dead): (Vec<_>, Vec<_>) =
            self.units.drain(..).partition(|u| u.is_alive());
        self.units = alive;
        for unit in dead.iter_mut() {
            unit.mark_removed();
            debug_assert_eq!(unit.liveness(), Liveness::Removed);
        }
        dead
    }
}

impl Index<usize> for Storage {
    type Output = CardStatus;

    fn index(&self, index: usize) -> &CardStatus {
        &self.units[index]
    }
}

impl IndexMut<usize> for Storage {
    fn index_mut(&mut self, index: usize) -> &mut CardStatus {
        &mut self.units[index]
    }
}

/// Everything one side owns during a match
#[derive(Debug, Clone)]
pub struct PlayerBoard {
    pub commander: CardStatus,
    pub assaults: Storage,
    pub structures: Storage,
    pub deck: Deck,
    /// Non-commander units of this side destroyed so far
    pub total_cards_destroyed: u32,
    /// Factions currently tracked for stasis stacking
    pub stasis_faction_bitmap: u32,
}

impl PlayerBoard {
    pub fn new(deck: Deck, side: Side) -> Result<Self> {
        let commander_card = Arc::clone(&deck.commander);
        if !commander_card.is_type(CardType::Commander) {
            return Err(SimError::InvalidCardType {
                card_id: commander_card.id,
                card_type: commander_card.card_type,
            });
        }
        let commander = CardStatus::new(commander_card, side, 0);
        let stasis_faction_bitmap = if commander.skill(SkillKind::Stasis) > 0 {
            commander.faction.mask()
        } else {
            0
        };
        Ok(PlayerBoard {
            commander,
            assaults: Storage::new(),
            structures: Storage::new(),
            deck,
            total_cards_destroyed: 0,
            stasis_faction_bitmap,
        })
    }

    pub fn unit(&self, slot: Slot) -> Option<&CardStatus> {
        match slot {
            Slot::Commander => Some(&self.commander),
            Slot::Assault(i) => self.assaults.get(i),
            Slot::Structure(i) => self.structures.get(i),
        }
    }

    pub fn unit_mut(&mut self, slot: Slot) -> Option<&mut CardStatus> {
        match slot {
            Slot::Commander => Some(&mut self.commander),
            Slot::Assault(i) => self.assaults.get_mut(i),
            Slot::Structure(i) => self.structures.get_mut(i),
        }
    }

    pub fn reindex(&mut self) {
        self.assaults.reindex();
        self.structures.reindex();
    }

    /// Remove dead assaults and structures; returns what was removed
    pub fn remove_dead(&mut self) -> Vec<CardStatus> {
        let mut removed = self.assaults.compact();
        removed.extend(self.structures.compact());
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Card;

    fn unit(id: u32, hp: u32) -> CardStatus {
        let mut status = CardStatus::new(Arc::new(Card::assault(id, "Unit", 1, 3, 0)), Side::Player, 0);
        status.hp = hp;
        status
    }

    #[test]
    fn test_storage_push_and_index() {
        let mut row = Storage::new();
        assert!(row.is_empty());
        assert_eq!(row.push(unit(1, 3)), 0);
        assert_eq!(row.push(unit(2, 3)), 1);
        assert_eq!(row[1].index, 1);
        assert_eq!(row[1].card.id, 2);
    }

    #[test]
    fn test_neighbor_queries() {
        let mut row = Storage::new();
        for (id, hp) in [(1, 3), (2, 0), (3, 3), (4, 3), (5, 3)] {
            row.push(unit(id, hp));
        }
        assert_eq!(row.left_alive(2, 1), None); // slot 1 is dead
        assert_eq!(row.right_alive(2, 1), Some(3));
        assert_eq!(row.adjacent_alive(2, 1).as_slice(), &[3]);
        assert_eq!(row.adjacent_alive(2, 2).as_slice(), &[0, 3, 4]);
        assert_eq!(row.right_alive(4, 1), None);
        assert_eq!(row.live_indices().collect::<Vec<_>>(), vec![0, 2, 3, 4]);
    }

    #[test]
    fn test_compact_preserves_order() {
        let mut row = Storage::new();
        for (id, hp) in [(1, 0), (2, 3), (3, 0), (4, 3)] {
            row.push(unit(id, hp));
        }
        let removed = row.compact();
        assert_eq!(removed.len(), 2);
        assert!(removed.iter().all(|u| u.liveness() == Liveness::Removed));
        let ids: Vec<u32> = row.iter().map(|u| u.card.id).collect();
        assert_eq!(ids, vec![2, 4]);

        row.reindex();
        assert_eq!(row[1].index, 1);
    }
}
