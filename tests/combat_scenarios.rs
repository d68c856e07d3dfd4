//! Battle scenarios built from small hand-made cards

use std::sync::Arc;
use tyrant_sim::core::{Card, Side, SkillKind, SkillSpec, UnitRef};
use tyrant_sim::game::{MatchLoop, Phase, SkillTable};
use tyrant_sim::loader::{Deck, DeckStrategy};
use tyrant_sim::{MatchState, OptimizationMode, SimConfig, SimError};

fn empty_deck(name: &str, health: u32) -> Deck {
    Deck::new(name, Arc::new(Card::commander(1, "Commander", health)), vec![])
}

fn battle() -> MatchState {
    let mut state =
        MatchState::new(Arc::new(SimConfig::new()), empty_deck("a", 30), empty_deck("b", 30), 1).unwrap();
    state.phase = Phase::Assaults;
    state
}

fn place(state: &mut MatchState, side: Side, card: Card) -> UnitRef {
    let active = state.active;
    state.active = side;
    let r = state.play_card(Arc::new(card)).unwrap();
    state.active = active;
    r
}

#[test]
fn poison_keeps_the_higher_value() {
    let mut state = battle();
    let weak = Card::assault(10, "Weak Viper", 2, 10, 0).with_skill(SkillSpec::new(SkillKind::Poison, 4));
    let att = place(&mut state, Side::Player, weak);
    let def = place(&mut state, Side::Enemy, Card::assault(11, "Target", 1, 30, 0));
    state.unit_mut(def).poisoned = 6;
    assert!(state.attack_phase(att).unwrap());
    assert_eq!(state.unit(def).poisoned, 6);

    let mut state = battle();
    let strong = Card::assault(10, "Strong Viper", 2, 10, 0).with_skill(SkillSpec::new(SkillKind::Poison, 9));
    let att = place(&mut state, Side::Player, strong);
    let def = place(&mut state, Side::Enemy, Card::assault(11, "Target", 1, 30, 0));
    state.unit_mut(def).poisoned = 6;
    state.attack_phase(att).unwrap();
    assert_eq!(state.unit(def).poisoned, 9);
}

#[test]
fn damage_floors_at_zero() {
    let mut state = battle();
    let att = place(&mut state, Side::Player, Card::assault(10, "Jab", 3, 10, 0));
    let def = place(&mut state, Side::Enemy, Card::assault(11, "Shielded", 1, 10, 0));
    state.unit_mut(def).protected = 10;
    assert_eq!(state.perform_attack(att, def).unwrap(), 0);
    assert_eq!(state.unit(def).hp, 10);
}

#[test]
fn counter_costs_exactly_its_value() {
    let mut state = battle();
    let att = place(&mut state, Side::Player, Card::assault(10, "Striker", 5, 10, 0));
    let spiky = Card::assault(11, "Spiky", 1, 20, 0).with_skill(SkillSpec::new(SkillKind::Counter, 3));
    let def = place(&mut state, Side::Enemy, spiky);
    state.attack_phase(att).unwrap();
    assert_eq!(state.unit(att).hp, 7);
    assert_eq!(state.unit(def).hp, 15);
}

#[test]
fn swipe_and_drain_hit_neighbors_and_heal() {
    let mut state = battle();
    place(&mut state, Side::Player, Card::assault(9, "Filler", 1, 5, 3));
    let card = Card::assault(10, "Reaper", 4, 20, 0)
        .with_skill(SkillSpec::new(SkillKind::Swipe, 2))
        .with_skill(SkillSpec::new(SkillKind::Drain, 1));
    let att = place(&mut state, Side::Player, card);
    state.unit_mut(att).hp = 5;
    let enemies: Vec<UnitRef> = (0..3)
        .map(|i| place(&mut state, Side::Enemy, Card::assault(20 + i, "Grunt", 1, 10, 1)))
        .collect();

    state.attack_phase(att).unwrap();
    assert_eq!(state.unit(enemies[1]).hp, 6);
    assert_eq!(state.unit(enemies[0]).hp, 7);
    assert_eq!(state.unit(enemies[2]).hp, 7);
    // 4 primary + 3 + 3 secondary
    assert_eq!(state.unit(att).hp, 15);
}

#[test]
fn empty_board_stalls_after_the_turn_limit() {
    let config = Arc::new(SimConfig::new().with_mode(OptimizationMode::Defense));
    let mut state = MatchState::new(config, empty_deck("a", 30), empty_deck("b", 30), 3).unwrap();
    let result = MatchLoop::new(&mut state).run().unwrap();
    assert!(result.stalled);
    assert_eq!(result.score, 100);
    assert_eq!(state.turn, 51);
}

#[test]
fn commander_death_stops_the_phase() {
    let cards = vec![
        Arc::new(Card::assault(10, "First", 3, 10, 0)),
        Arc::new(Card::assault(11, "Second", 3, 10, 0).with_skill(SkillSpec::new(SkillKind::Berserk, 2))),
    ];
    let player = Deck::new("a", Arc::new(Card::commander(1, "Commander", 30)), cards)
        .with_strategy(DeckStrategy::ExactOrdered);
    let enemy = empty_deck("b", 6);
    let mut state = MatchState::new(Arc::new(SimConfig::new()), player, enemy, 3).unwrap();
    let result = MatchLoop::new(&mut state).run().unwrap();

    assert!(result.won);
    assert_eq!(state.turn, 3);
    let second = state.unit(UnitRef::assault(Side::Player, 1));
    assert_eq!(second.attack, 3);
}

#[test]
fn walls_guard_the_commander() {
    let mut state = battle();
    let att = place(&mut state, Side::Player, Card::assault(10, "Raider", 4, 10, 0));
    let wall = Card::structure(11, "Wall", 10, 0).with_skill(SkillSpec::new(SkillKind::Wall, 1));
    let wall = place(&mut state, Side::Enemy, wall);
    state.attack_phase(att).unwrap();
    assert_eq!(state.unit(wall).hp, 6);
    assert_eq!(state.commander(Side::Enemy).hp, 30);
}

#[test]
fn attacking_with_a_dead_unit_is_an_error() {
    let mut state = battle();
    let att = place(&mut state, Side::Player, Card::assault(10, "Ghost", 3, 1, 0));
    state.unit_mut(att).hp = 0;
    assert!(matches!(state.attack_phase(att), Err(SimError::DeadAttacker(_))));
}

#[test]
fn commander_in_the_draw_pile_is_rejected() {
    let commander = Arc::new(Card::commander(1, "Commander", 30));
    let stray = Arc::new(Card::commander(2, "Stray", 30));
    let deck = Deck::new("a", Arc::clone(&commander), vec![stray]);
    let err = MatchState::new(Arc::new(SimConfig::new()), deck, empty_deck("b", 30), 1).unwrap_err();
    assert!(matches!(err, SimError::InvalidCardType { card_id: 2, .. }));
}

#[test]
fn unhandled_battleground_skill_is_rejected() {
    let mut config = SimConfig::new().with_bg_skill(0, SkillSpec::new(SkillKind::Strike, 1));
    config.skill_table = SkillTable::empty();
    let err = tyrant_sim::simulate(Arc::new(config), empty_deck("a", 30), empty_deck("b", 30), 1).unwrap_err();
    assert!(matches!(err, SimError::InvalidConfig(_)));
}
