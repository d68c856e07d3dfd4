//! Deck input boundary
//!
//! Card registries and deck construction live outside the engine; this module
//! defines the shape in which decks are handed over.

pub mod deck;

pub use deck::{Deck, DeckStrategy};
