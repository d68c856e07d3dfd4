//! Deck boundary: commander, draw pile, pre-placed structures and objective cards

use crate::core::{Card, CardType};
use crate::{Result, SimError};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

/// How the draw pile is ordered at match start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DeckStrategy {
    /// Shuffled with the match RNG
    #[default]
    Random,
    /// Drawn in listed order
    ExactOrdered,
}

/// A deck as handed to the engine
///
/// The card lists are immutable; `shuffle` builds the per-match draw pile and
/// `next` consumes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deck {
    pub name: String,
    pub commander: Arc<Card>,
    pub cards: Vec<Arc<Card>>,
    /// Structures placed before the first turn
    #[serde(default)]
    pub forts: Vec<Arc<Card>>,
    /// Objective card ids: losing one forfeits the match for side 0
    #[serde(default)]
    pub vip_cards: BTreeSet<u32>,
    #[serde(default)]
    pub strategy: DeckStrategy,

    #[serde(skip)]
    draw_pile: VecDeque<Arc<Card>>,
}

impl Deck {
    pub fn new(name: impl Into<String>, commander: Arc<Card>, cards: Vec<Arc<Card>>) -> Self {
        let draw_pile = cards.iter().cloned().collect();
        Deck {
            name: name.into(),
            commander,
            cards,
            forts: Vec::new(),
            vip_cards: BTreeSet::new(),
            strategy: DeckStrategy::Random,
            draw_pile,
        }
    }

    pub fn with_forts(mut self, forts: Vec<Arc<Card>>) -> Self {
        self.forts = forts;
        self
    }

    pub fn with_vip_cards(mut self, ids: impl IntoIterator<Item = u32>) -> Self {
        self.vip_cards = ids.into_iter().collect();
        self
    }

    pub fn with_strategy(mut self, strategy: DeckStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Check card types: a commander at the head, units in the pile, structures as forts
    pub fn validate(&self) -> Result<()> {
        if !self.commander.is_type(CardType::Commander) {
            return Err(SimError::InvalidDeck(format!(
                "{}: commander slot holds {} ({})",
                self.name,
                self.commander.name,
                self.commander.card_type.name()
            )));
        }
        if let Some(card) = self.cards.iter().find(|c| c.is_type(CardType::Commander)) {
            return Err(SimError::InvalidCardType {
                card_id: card.id,
                card_type: card.card_type,
            });
        }
        if let Some(card) = self.forts.iter().find(|c| !c.is_type(CardType::Structure)) {
            return Err(SimError::InvalidCardType {
                card_id: card.id,
                card_type: card.card_type,
            });
        }
        Ok(())
    }

    /// Build the draw pile for a new match
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut pile: Vec<Arc<Card>> = self.cards.clone();
        if self.strategy == DeckStrategy::Random {
            pile.shuffle(rng);
        }
        self.draw_pile = pile.into();
    }

    /// Draw the next card, if any remain
    pub fn next(&mut self) -> Option<Arc<Card>> {
        self.draw_pile.pop_front()
    }

    /// Number of undrawn cards
    pub fn remaining(&self) -> usize {
        self.draw_pile.len()
    }

    pub fn undrawn(&self) -> impl Iterator<Item = &Arc<Card>> {
        self.draw_pile.iter()
    }

    /// Declared deck size (excluding commander and forts)
    pub fn size(&self) -> usize {
        self.cards.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    fn sample_deck() -> Deck {
        let commander = Arc::new(Card::commander(1, "Commander", 30));
        let cards = (10..15)
            .map(|id| Arc::new(Card::assault(id, format!("Unit {}", id), 1, 2, 1)))
            .collect();
        Deck::new("sample", commander, cards)
    }

    #[test]
    fn test_ordered_draw() {
        let mut deck = sample_deck().with_strategy(DeckStrategy::ExactOrdered);
        let mut rng = ChaCha12Rng::seed_from_u64(7);
        deck.shuffle(&mut rng);

        assert_eq!(deck.remaining(), 5);
        let ids: Vec<u32> = std::iter::from_fn(|| deck.next()).map(|c| c.id).collect();
        assert_eq!(ids, vec![10, 11, 12, 13, 14]);
        assert_eq!(deck.remaining(), 0);
        assert!(deck.next().is_none());
        assert_eq!(deck.size(), 5);
    }

    #[test]
    fn test_random_shuffle_is_seeded() {
        let mut a = sample_deck();
        let mut b = sample_deck();
        a.shuffle(&mut ChaCha12Rng::seed_from_u64(99));
        b.shuffle(&mut ChaCha12Rng::seed_from_u64(99));
        let ids_a: Vec<u32> = a.undrawn().map(|c| c.id).collect();
        let ids_b: Vec<u32> = b.undrawn().map(|c| c.id).collect();
        assert_eq!(ids_a, ids_b);

        let mut sorted = ids_a.clone();
        sorted.sort();
        assert_eq!(sorted, vec![10, 11, 12, 13, 14]);
    }

    #[test]
    fn test_validate_rejects_commander_in_pile() {
        let mut deck = sample_deck();
        deck.cards.push(Arc::new(Card::commander(2, "Stowaway", 10)));
        assert!(matches!(
            deck.validate(),
            Err(SimError::InvalidCardType { card_id: 2, .. })
        ));
        assert!(sample_deck().validate().is_ok());
    }
}
