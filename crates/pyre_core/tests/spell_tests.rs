//! Spell casting tests for pyre_core.

use pyre_core::prelude::*;
use pyre_test_utils::fixtures::{
    self, place, ARCHER, SPEARMAN, SPELL_FIREBALL, SPELL_HEAL, SPELL_RALLY,
};

fn mid(tile: i32) -> SpellTarget {
    SpellTarget::LanePoint {
        lane: Lane::Mid,
        tile,
    }
}

fn hp(sim: &BattleSimulation<'_>, id: u32) -> Option<i32> {
    sim.state().unit(UnitId(id)).map(|u| u.hp)
}

// =============================================================================
// Heal
// =============================================================================

#[test]
fn test_heal_clamps_to_max_and_charges_once() {
    let content = fixtures::content();
    let setup = fixtures::setup(vec![place(SPEARMAN, Lane::Mid, 0).with_hp(50)], Vec::new());
    let mut sim = BattleSimulation::new(&setup, &content, 1, BattleConfig::default()).unwrap();

    assert!(sim.cast(SPELL_HEAL, mid(0)));
    assert_eq!(hp(&sim, 1), Some(60));
    assert_eq!(sim.state().energy_remaining(), 8);
    assert_eq!(sim.state().casts_remaining(), 1);
}

#[test]
fn test_heal_on_unit_anchor() {
    let content = fixtures::content();
    let setup = fixtures::setup(
        vec![
            place(SPEARMAN, Lane::Left, 0).with_hp(20),
            place(ARCHER, Lane::Right, 2).with_hp(10),
        ],
        Vec::new(),
    );
    let mut sim = BattleSimulation::new(&setup, &content, 1, BattleConfig::default()).unwrap();

    assert!(sim.cast(SPELL_HEAL, SpellTarget::Unit(UnitId(2))));
    assert_eq!(hp(&sim, 2), Some(35));
    assert_eq!(hp(&sim, 1), Some(20));
}

#[test]
fn test_heal_with_nobody_wounded_is_rejected() {
    let content = fixtures::content();
    let setup = fixtures::setup(vec![place(SPEARMAN, Lane::Mid, 0)], Vec::new());
    let mut sim = BattleSimulation::new(&setup, &content, 1, BattleConfig::default()).unwrap();

    assert!(!sim.cast(SPELL_HEAL, mid(0)));
    assert_eq!(sim.state().energy_remaining(), 10);
    assert_eq!(sim.state().casts_remaining(), 2);
}

// =============================================================================
// Fireball
// =============================================================================

#[test]
fn test_fireball_only_hits_anchor_lane_within_radius() {
    let content = fixtures::content();
    let setup = fixtures::setup(
        Vec::new(),
        vec![
            place(SPEARMAN, Lane::Mid, 0),
            place(SPEARMAN, Lane::Mid, 1),
            place(SPEARMAN, Lane::Left, 0),
        ],
    );
    let mut sim = BattleSimulation::new(&setup, &content, 1, BattleConfig::default()).unwrap();

    assert!(sim.cast(SPELL_FIREBALL, mid(28)));

    let survivors: Vec<(Lane, i32)> = sim.state().units().map(|u| (u.lane, u.hp)).collect();
    assert_eq!(survivors, vec![(Lane::Left, 60)]);
    assert_eq!(sim.state().energy_remaining(), 7);
}

#[test]
fn test_fireball_outside_radius_misses() {
    let content = fixtures::content();
    let setup = fixtures::setup(Vec::new(), vec![place(SPEARMAN, Lane::Mid, 0)]);
    let mut sim = BattleSimulation::new(&setup, &content, 1, BattleConfig::default()).unwrap();

    assert!(!sim.cast(SPELL_FIREBALL, mid(27)));
    assert_eq!(hp(&sim, 1), Some(60));
    assert_eq!(sim.state().energy_remaining(), 10);
}

#[test]
fn test_far_off_field_anchors_are_rejected() {
    let content = fixtures::content();
    let setup = fixtures::setup(
        vec![place(SPEARMAN, Lane::Mid, 0).with_hp(20)],
        vec![place(SPEARMAN, Lane::Mid, 0)],
    );
    let mut sim = BattleSimulation::new(&setup, &content, 1, BattleConfig::default()).unwrap();

    assert!(!sim.cast(SPELL_FIREBALL, mid(i32::MIN)));
    assert!(!sim.cast(SPELL_FIREBALL, mid(i32::MAX)));
    assert_eq!(hp(&sim, 2), Some(60));
    assert_eq!(sim.state().energy_remaining(), 10);

    // Single-target heal still finds the nearest wounded ally.
    assert!(sim.cast(SPELL_HEAL, mid(i32::MIN)));
    assert_eq!(hp(&sim, 1), Some(45));
}

#[test]
fn test_replayed_cast_with_extreme_tile_runs_to_completion() {
    let content = fixtures::content();
    let replay = BattleReplay::new(
        3,
        fixtures::push_setup(),
        vec![
            ReplayAction::CastSpell {
                tick: 0,
                spell_id: SPELL_HEAL.to_string(),
                lane: None,
                tile: Some(i32::MIN),
            },
            ReplayAction::CastSpell {
                tick: 1,
                spell_id: SPELL_FIREBALL.to_string(),
                lane: Some(Lane::Mid),
                tile: Some(i32::MAX),
            },
        ],
    );

    assert_eq!(
        replay.run(&content, BattleConfig::default()).unwrap(),
        BattleOutcome::Victory
    );
}

// =============================================================================
// Rally
// =============================================================================

#[test]
fn test_rally_shortens_next_attack_interval() {
    let content = fixtures::content();
    let setup = fixtures::setup(
        vec![place(SPEARMAN, Lane::Mid, 0)],
        vec![place(SPEARMAN, Lane::Mid, 0)],
    );
    let mut sim =
        BattleSimulation::new(&setup, &content, 1, fixtures::config_with_field(2)).unwrap();

    assert!(sim.cast(SPELL_RALLY, mid(0)));
    sim.step();

    let cooldowns: Vec<u32> = sim.state().units().map(|u| u.attack_cooldown).collect();
    assert_eq!(cooldowns, vec![48, 60]);
    assert_eq!(hp(&sim, 1), Some(52));
    assert_eq!(hp(&sim, 2), Some(52));
}

#[test]
fn test_rally_needs_allies_in_lane() {
    let content = fixtures::content();
    let setup = fixtures::setup(vec![place(SPEARMAN, Lane::Left, 0)], Vec::new());
    let mut sim = BattleSimulation::new(&setup, &content, 1, BattleConfig::default()).unwrap();

    assert!(!sim.cast(SPELL_RALLY, mid(0)));
}

// =============================================================================
// Guards
// =============================================================================

#[test]
fn test_cast_budget_runs_out() {
    let content = fixtures::content();
    let setup = fixtures::setup(vec![place(SPEARMAN, Lane::Mid, 0)], Vec::new());
    let mut sim = BattleSimulation::new(&setup, &content, 1, BattleConfig::default()).unwrap();

    assert!(sim.cast(SPELL_RALLY, mid(0)));
    assert!(sim.cast(SPELL_RALLY, mid(0)));
    assert!(!sim.cast(SPELL_RALLY, mid(0)));
    assert_eq!(sim.state().casts_remaining(), 0);
    assert_eq!(sim.state().energy_remaining(), 6);
}

#[test]
fn test_spell_outside_hand_is_rejected() {
    let content = fixtures::content();
    let mut setup = fixtures::setup(Vec::new(), vec![place(SPEARMAN, Lane::Mid, 0)]);
    setup.hand = Some(vec![SPELL_HEAL.to_string()]);
    let mut sim = BattleSimulation::new(&setup, &content, 1, BattleConfig::default()).unwrap();

    assert!(!sim.cast(SPELL_FIREBALL, mid(29)));
    assert!(!sim.cast("spell.meteor", mid(29)));
    assert_eq!(hp(&sim, 1), Some(60));
}

#[test]
fn test_insufficient_energy_is_rejected() {
    let content = fixtures::content();
    let mut setup = fixtures::setup(Vec::new(), vec![place(SPEARMAN, Lane::Mid, 0)]);
    setup.energy = 2;
    let mut sim = BattleSimulation::new(&setup, &content, 1, BattleConfig::default()).unwrap();

    assert!(!sim.cast(SPELL_FIREBALL, mid(29)));
    assert_eq!(sim.state().energy_remaining(), 2);
}

#[test]
fn test_dead_anchor_unit_is_rejected() {
    let content = fixtures::content();
    let setup = fixtures::setup(Vec::new(), vec![place(SPEARMAN, Lane::Mid, 0)]);
    let mut sim = BattleSimulation::new(&setup, &content, 1, BattleConfig::default()).unwrap();

    assert!(sim.cast(SPELL_FIREBALL, SpellTarget::Unit(UnitId(1))));
    assert!(!sim.cast(SPELL_FIREBALL, SpellTarget::Unit(UnitId(1))));
}

#[test]
fn test_no_casts_after_battle_ends() {
    let content = fixtures::content();
    let setup = fixtures::push_setup();
    let mut sim = BattleSimulation::new(&setup, &content, 1, BattleConfig::default()).unwrap();
    assert_eq!(sim.simulate_until_finished(5_000), BattleOutcome::Victory);

    assert!(!sim.cast(SPELL_RALLY, mid(0)));
}
