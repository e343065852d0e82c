//! Spell effect resolution.
//!
//! Each function returns `false` when the effect found nothing to act on.
//! Callers only charge energy and casts after a `true`.

use crate::components::{Lane, SpellTarget, StatusEffect, Team, UnitId};
use crate::content::ContentDatabase;
use crate::state::BattleState;

/// The lane and tile a spell is centred on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    /// Anchor lane.
    pub lane: Lane,
    /// Anchor tile.
    pub tile: i32,
}

/// Resolve a spell target to an anchor; dead or missing units resolve to nothing.
#[must_use]
pub fn resolve_anchor(state: &BattleState, target: SpellTarget) -> Option<Anchor> {
    match target {
        SpellTarget::Unit(id) => state
            .unit(id)
            .filter(|u| u.is_alive())
            .map(|u| Anchor {
                lane: u.lane,
                tile: u.x_tile,
            }),
        SpellTarget::LanePoint { lane, tile } => Some(Anchor { lane, tile }),
    }
}

/// Tile distance from the anchor; anchors from callers may be far off the field.
fn anchor_distance(anchor: Anchor, x: i32) -> u32 {
    x.abs_diff(anchor.tile)
}

/// Whether `x` lies within `radius` tiles of the anchor. Negative radii cover nothing.
fn within_radius(anchor: Anchor, x: i32, radius: i32) -> bool {
    u32::try_from(radius).is_ok_and(|r| anchor_distance(anchor, x) <= r)
}

fn max_hp(content: &ContentDatabase, key: &str) -> Option<i32> {
    content.unit(key).ok().map(|a| a.max_hp)
}

/// Wounded living allies as `(id, lane, x, max_hp)`.
fn wounded_allies(
    state: &BattleState,
    content: &ContentDatabase,
    team: Team,
) -> Vec<(UnitId, Lane, i32, i32)> {
    state
        .units_for(team)
        .filter_map(|u| {
            let max = max_hp(content, &u.archetype_key)?;
            (u.hp < max).then_some((u.id, u.lane, u.x_tile, max))
        })
        .collect()
}

/// Restore HP to player allies around the anchor.
///
/// Without a radius only the nearest wounded ally is healed, searching
/// every lane. With a radius every wounded ally in the anchor lane within
/// `radius` tiles is healed.
pub fn apply_heal(
    state: &mut BattleState,
    content: &ContentDatabase,
    anchor: Anchor,
    amount: i32,
    radius: Option<i32>,
) -> bool {
    let wounded = wounded_allies(state, content, Team::Player);
    let targets: Vec<(UnitId, i32)> = match radius {
        None => wounded
            .iter()
            .min_by_key(|(id, lane, x, _)| {
                (anchor.lane.distance(*lane), anchor_distance(anchor, *x), *id)
            })
            .map(|&(id, _, _, max)| vec![(id, max)])
            .unwrap_or_default(),
        Some(r) => wounded
            .iter()
            .filter(|(_, lane, x, _)| *lane == anchor.lane && within_radius(anchor, *x, r))
            .map(|&(id, _, _, max)| (id, max))
            .collect(),
    };

    if targets.is_empty() {
        return false;
    }
    for (id, max) in targets {
        if let Some(unit) = state.unit_mut(id) {
            unit.hp = unit.hp.saturating_add(amount).min(max);
        }
    }
    true
}

/// Damage every enemy in the anchor lane within `radius` tiles.
///
/// Victims are processed nearest first, then by slot, then by id.
pub fn apply_fireball(state: &mut BattleState, anchor: Anchor, damage: i32, radius: i32) -> bool {
    let mut victims: Vec<(u32, u8, UnitId)> = state
        .units_for(Team::Enemy)
        .filter(|u| u.lane == anchor.lane && within_radius(anchor, u.x_tile, radius))
        .map(|u| (anchor_distance(anchor, u.x_tile), u.slot, u.id))
        .collect();
    if victims.is_empty() {
        return false;
    }
    victims.sort_unstable();

    for (_, _, id) in victims {
        let dead = match state.unit_mut(id) {
            Some(unit) => {
                unit.hp = unit.hp.saturating_sub(damage);
                !unit.is_alive()
            }
            None => false,
        };
        if dead {
            state.remove(id);
            state.last_attacker.remove(&id);
        }
    }
    true
}

/// Grant a timed rally to every living player ally in `lane`.
pub fn apply_rally(
    state: &mut BattleState,
    lane: Lane,
    attack_speed_percent: i32,
    duration_ticks: u64,
) -> bool {
    let allies: Vec<UnitId> = state
        .units_for(Team::Player)
        .filter(|u| u.lane == lane)
        .map(|u| u.id)
        .collect();
    if allies.is_empty() {
        return false;
    }

    let status = StatusEffect::Rally {
        expires_at_tick: state.tick().saturating_add(duration_ticks),
        attack_speed_modifier_pct: -attack_speed_percent,
    };
    for id in allies {
        if let Some(unit) = state.unit_mut(id) {
            unit.statuses.push(status);
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::components::{Pyre, Role, Stance, UnitArchetype, UnitInstance};
    use crate::state::BattleSetup;

    fn content() -> ContentDatabase {
        ContentDatabase::new(
            vec![UnitArchetype {
                key: "spearman".to_string(),
                role: Role::Melee,
                max_hp: 60,
                attack: 8,
                attack_interval_ticks: 60,
                range_tiles: 1,
                speed_tiles_per_second: 2,
                cost: 2,
            }],
            Vec::new(),
        )
    }

    fn state() -> BattleState {
        let setup = BattleSetup::new(
            Vec::new(),
            Vec::new(),
            Pyre::new(Team::Player, 200, 8, 72),
            Pyre::new(Team::Enemy, 200, 8, 72),
            10,
        );
        BattleState::new(&setup, 2, BTreeSet::new())
    }

    fn put(state: &mut BattleState, team: Team, lane: Lane, x: i32, hp: i32) -> UnitId {
        state.insert(UnitInstance {
            id: UnitId(0),
            archetype_key: "spearman".to_string(),
            team,
            lane,
            slot: 0,
            x_tile: x,
            hp,
            attack_cooldown: 0,
            stance: Stance::Guard,
            statuses: Vec::new(),
            is_hero: false,
            is_veteran: false,
            armor: 0,
        })
    }

    #[test]
    fn test_anchor_from_dead_unit_is_none() {
        let mut s = state();
        let id = put(&mut s, Team::Player, Lane::Left, 3, 10);
        assert_eq!(
            resolve_anchor(&s, SpellTarget::Unit(id)),
            Some(Anchor {
                lane: Lane::Left,
                tile: 3
            })
        );
        if let Some(unit) = s.unit_mut(id) {
            unit.hp = 0;
        }
        assert_eq!(resolve_anchor(&s, SpellTarget::Unit(id)), None);
        assert_eq!(resolve_anchor(&s, SpellTarget::Unit(UnitId(99))), None);
    }

    #[test]
    fn test_single_target_heal_picks_nearest() {
        let mut s = state();
        let far = put(&mut s, Team::Player, Lane::Right, 0, 10);
        let near = put(&mut s, Team::Player, Lane::Mid, 4, 10);
        let anchor = Anchor {
            lane: Lane::Mid,
            tile: 0,
        };

        assert!(apply_heal(&mut s, &content(), anchor, 25, None));
        assert_eq!(s.unit(near).map(|u| u.hp), Some(35));
        assert_eq!(s.unit(far).map(|u| u.hp), Some(10));
    }

    #[test]
    fn test_heal_without_wounded_fails() {
        let mut s = state();
        put(&mut s, Team::Player, Lane::Mid, 0, 60);
        let anchor = Anchor {
            lane: Lane::Mid,
            tile: 0,
        };
        assert!(!apply_heal(&mut s, &content(), anchor, 25, Some(3)));
    }

    #[test]
    fn test_fireball_kills_are_removed() {
        let mut s = state();
        let a = put(&mut s, Team::Enemy, Lane::Mid, 10, 20);
        let b = put(&mut s, Team::Enemy, Lane::Mid, 11, 60);
        let anchor = Anchor {
            lane: Lane::Mid,
            tile: 10,
        };

        assert!(apply_fireball(&mut s, anchor, 30, 1));
        assert!(s.unit(a).is_none());
        assert_eq!(s.unit(b).map(|u| u.hp), Some(30));
    }

    #[test]
    fn test_negative_radius_covers_nothing() {
        let mut s = state();
        put(&mut s, Team::Enemy, Lane::Mid, 10, 20);
        let anchor = Anchor {
            lane: Lane::Mid,
            tile: 10,
        };

        assert!(!apply_fireball(&mut s, anchor, 30, -1));
        assert!(within_radius(anchor, 10, 0));
        let far = Anchor {
            lane: Lane::Mid,
            tile: i32::MIN,
        };
        assert_eq!(anchor_distance(far, i32::MAX), u32::MAX);
    }

    #[test]
    fn test_rally_needs_allies_in_lane() {
        let mut s = state();
        let id = put(&mut s, Team::Player, Lane::Left, 0, 60);

        assert!(!apply_rally(&mut s, Lane::Right, 20, 120));
        assert!(apply_rally(&mut s, Lane::Left, 20, 120));
        assert_eq!(
            s.unit(id).map(|u| u.statuses.clone()),
            Some(vec![StatusEffect::Rally {
                expires_at_tick: 120,
                attack_speed_modifier_pct: -20,
            }])
        );
    }
}
