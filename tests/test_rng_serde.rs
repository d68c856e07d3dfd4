//! RNG state serialization fidelity
//!
//! A match's ChaCha12 stream must survive a serde_json round trip so a
//! captured match can be resumed with the same draws.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use std::sync::Arc;
use tyrant_sim::core::Card;
use tyrant_sim::loader::Deck;
use tyrant_sim::{MatchState, SimConfig};

#[test]
fn test_rng_serialize_deserialize_fidelity() {
    let mut rng1 = ChaCha12Rng::seed_from_u64(42);
    for _ in 0..10 {
        rng1.gen::<u64>();
    }

    let json = serde_json::to_string(&rng1).expect("Failed to serialize RNG");
    let mut rng2: ChaCha12Rng = serde_json::from_str(&json).expect("Failed to deserialize RNG");

    for i in 0..100 {
        let val1 = rng1.gen_range(0..1000u32);
        let val2 = rng2.gen_range(0..1000u32);
        assert_eq!(val1, val2, "RNG divergence at iteration {}", i);
    }
}

#[test]
fn test_match_rng_resumes_after_round_trip() {
    let deck = |name: &str| {
        let cards = (0..4).map(|i| Arc::new(Card::assault(10 + i, "Unit", 1, 2, 1))).collect();
        Deck::new(name, Arc::new(Card::commander(1, "Commander", 10)), cards)
    };
    let mut state = MatchState::new(Arc::new(SimConfig::new()), deck("a"), deck("b"), 5).unwrap();

    let json = serde_json::to_string(&state.rng).unwrap();
    let mut restored: ChaCha12Rng = serde_json::from_str(&json).unwrap();
    let expected: Vec<u64> = (0..8).map(|_| state.rng.gen()).collect();
    let actual: Vec<u64> = (0..8).map(|_| restored.gen()).collect();
    assert_eq!(expected, actual);
}
