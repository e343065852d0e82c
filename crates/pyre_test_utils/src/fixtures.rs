//! Test fixtures and helpers.
//!
//! A small content catalog and pre-built setups for consistent testing.
//! Numbers match the shipped starter content so scenario tests read like
//! real battles.

use pyre_core::components::{
    ArtifactArchetype, ArtifactEffect, Lane, Pyre, Role, SpellArchetype, SpellEffect, Stance,
    Team, TrapArchetype, TrapEffect, UnitArchetype,
};
use pyre_core::content::ContentDatabase;
use pyre_core::replay::BattleReplay;
use pyre_core::state::{BattleConfig, BattleSetup, UnitPlacement};

/// Melee line infantry.
pub const SPEARMAN: &str = "spearman";
/// Ranged support.
pub const ARCHER: &str = "archer";
/// Heals wounded allies.
pub const HEALER: &str = "healer";
/// Hero unit with the adjacency aura.
pub const ACHILLES: &str = "hero.achilles";
/// Fast-attacking melee.
pub const PATROCLUS: &str = "patroclus";

/// Single-target heal, 25 HP.
pub const SPELL_HEAL: &str = "heal";
/// Lane fireball, 60 damage radius 1.
pub const SPELL_FIREBALL: &str = "fireball";
/// Lane rally, 20% faster attacks for 5 seconds.
pub const SPELL_RALLY: &str = "rally";

/// Spike trap, 6 damage.
pub const TRAP_SPIKES: &str = "trap.spikes";

/// +3 armor for front-slot allies.
pub const PHALANX_CREST: &str = "artifact.phalanx_crest";
/// Heal 5 on kill.
pub const LYRE_OF_APOLLO: &str = "artifact.lyre_of_apollo";

fn unit(
    key: &str,
    role: Role,
    max_hp: i32,
    attack: i32,
    attack_interval_ticks: u32,
    range_tiles: i32,
    cost: u32,
) -> UnitArchetype {
    UnitArchetype {
        key: key.to_string(),
        role,
        max_hp,
        attack,
        attack_interval_ticks,
        range_tiles,
        speed_tiles_per_second: 2,
        cost,
    }
}

/// Unit archetypes of the starter roster.
#[must_use]
pub fn unit_archetypes() -> Vec<UnitArchetype> {
    vec![
        unit(SPEARMAN, Role::Melee, 60, 8, 60, 1, 2),
        unit(ARCHER, Role::Ranged, 40, 7, 60, 4, 3),
        unit(HEALER, Role::Healer, 45, 0, 45, 4, 3),
        unit(ACHILLES, Role::Melee, 200, 12, 60, 1, 0),
        unit(PATROCLUS, Role::Melee, 80, 10, 54, 1, 3),
    ]
}

/// Spell archetypes of the starter hand.
#[must_use]
pub fn spell_archetypes() -> Vec<SpellArchetype> {
    vec![
        SpellArchetype {
            key: SPELL_HEAL.to_string(),
            cost: 2,
            effect: SpellEffect::Heal {
                amount: 25,
                radius: None,
            },
        },
        SpellArchetype {
            key: SPELL_FIREBALL.to_string(),
            cost: 3,
            effect: SpellEffect::Fireball {
                damage: 60,
                radius: 1,
            },
        },
        SpellArchetype {
            key: SPELL_RALLY.to_string(),
            cost: 2,
            effect: SpellEffect::Rally {
                attack_speed_percent: 20,
                duration_ticks: 300,
            },
        },
    ]
}

/// The full fixture content database.
#[must_use]
pub fn content() -> ContentDatabase {
    ContentDatabase::new(unit_archetypes(), spell_archetypes())
        .with_traps(vec![TrapArchetype {
            key: TRAP_SPIKES.to_string(),
            cost: 1,
            effect: TrapEffect::Spikes { damage: 6 },
        }])
        .with_artifacts(vec![
            ArtifactArchetype {
                key: PHALANX_CREST.to_string(),
                effect: ArtifactEffect::FrontSlotArmor { amount: 3 },
                description: "Front-slot allies gain 3 armor.".to_string(),
            },
            ArtifactArchetype {
                key: LYRE_OF_APOLLO.to_string(),
                effect: ArtifactEffect::OnKillHeal { amount: 5 },
                description: "Kills heal the most wounded lane ally for 5.".to_string(),
            },
        ])
}

/// Starter pyre for a side: 200 HP, 8 attack, 72-tick interval.
#[must_use]
pub fn pyre(team: Team) -> Pyre {
    Pyre::new(team, 200, 8, 72)
}

/// A pyre that never damages anything.
#[must_use]
pub fn harmless_pyre(team: Team) -> Pyre {
    Pyre::new(team, 200, 0, 72)
}

/// Guard-stance placement at full HP.
#[must_use]
pub fn place(key: &str, lane: Lane, slot: u8) -> UnitPlacement {
    UnitPlacement::new(key, lane, slot, Stance::Guard)
}

/// Setup with the given placements, starter pyres and 10 energy.
#[must_use]
pub fn setup(player: Vec<UnitPlacement>, enemy: Vec<UnitPlacement>) -> BattleSetup {
    BattleSetup::new(player, enemy, pyre(Team::Player), pyre(Team::Enemy), 10)
}

/// No units on either side.
#[must_use]
pub fn empty_setup() -> BattleSetup {
    setup(Vec::new(), Vec::new())
}

/// Three lanes of mixed units per side.
#[must_use]
pub fn baseline_setup() -> BattleSetup {
    setup(
        vec![
            place(SPEARMAN, Lane::Left, 0),
            place(ARCHER, Lane::Left, 2),
            place(ACHILLES, Lane::Mid, 1).hero(),
            place(HEALER, Lane::Mid, 2),
            UnitPlacement::new(SPEARMAN, Lane::Right, 0, Stance::Skirmish),
            UnitPlacement::new(PATROCLUS, Lane::Right, 1, Stance::Hunter).veteran(),
        ],
        vec![
            place(SPEARMAN, Lane::Left, 0),
            UnitPlacement::new(ARCHER, Lane::Left, 1, Stance::Hunter),
            place(SPEARMAN, Lane::Mid, 0),
            place(PATROCLUS, Lane::Mid, 1),
            UnitPlacement::new(SPEARMAN, Lane::Right, 0, Stance::Skirmish),
            place(ARCHER, Lane::Right, 2),
        ],
    )
}

/// One spearman marching on an 8 HP enemy pyre.
#[must_use]
pub fn push_setup() -> BattleSetup {
    let mut s = setup(vec![place(SPEARMAN, Lane::Mid, 0)], Vec::new());
    s.enemy_pyre = Pyre::new(Team::Enemy, 8, 8, 72);
    s
}

/// Baseline setup with artifacts and traps on both sides.
#[must_use]
pub fn loadout_setup() -> BattleSetup {
    let mut s = baseline_setup();
    s.player_artifacts = vec![PHALANX_CREST.to_string(), LYRE_OF_APOLLO.to_string()];
    s.enemy_artifacts = vec![PHALANX_CREST.to_string()];
    s.player_traps.insert(Lane::Mid, TRAP_SPIKES.to_string());
    s.enemy_traps.insert(Lane::Left, TRAP_SPIKES.to_string());
    s
}

/// Default config with a different field length.
#[must_use]
pub fn config_with_field(field_length_tiles: i32) -> BattleConfig {
    BattleConfig {
        field_length_tiles,
        ..BattleConfig::default()
    }
}

/// Parse a replay fixture, panicking with the parse error on failure.
///
/// # Panics
///
/// Panics if `text` is not a valid replay document.
#[must_use]
pub fn replay_from_ron(text: &str) -> BattleReplay {
    match BattleReplay::from_ron(text) {
        Ok(replay) => replay,
        Err(err) => panic!("invalid replay fixture: {err}"),
    }
}

/// Parse a setup document in RON.
///
/// # Panics
///
/// Panics if `text` is not a valid setup document.
#[must_use]
pub fn setup_from_ron(text: &str) -> BattleSetup {
    match ron::from_str(text) {
        Ok(setup) => setup,
        Err(err) => panic!("invalid setup fixture: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_content_resolves_every_key() {
        let db = content();
        for key in [SPEARMAN, ARCHER, HEALER, ACHILLES, PATROCLUS] {
            assert!(db.unit(key).is_ok(), "missing unit {key}");
        }
        for key in [SPELL_HEAL, SPELL_FIREBALL, SPELL_RALLY] {
            assert!(db.spell(key).is_ok(), "missing spell {key}");
        }
        assert_eq!(db.trap(TRAP_SPIKES).map(|t| t.damage()), Ok(6));
        assert!(db.artifact(LYRE_OF_APOLLO).is_some());
    }

    #[test]
    fn test_setup_from_ron_defaults_loadouts() {
        let s = setup_from_ron(
            r#"(
                player_placements: [(archetype_key: "spearman", lane: Left, slot: 0, stance: Guard)],
                enemy_placements: [],
                player_pyre: (team: Player, hp: 200, attack: 8, attack_interval_ticks: 72, cooldown: 72),
                enemy_pyre: (team: Enemy, hp: 200, attack: 8, attack_interval_ticks: 72, cooldown: 72),
                energy: 10,
            )"#,
        );
        assert_eq!(s.player_placements.len(), 1);
        assert!(s.player_artifacts.is_empty());
        assert!(s.enemy_traps.is_empty());
        assert_eq!(s.hand, None);
    }
}
