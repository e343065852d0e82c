//! Target priority, attack cadence and movement cadence.
//!
//! Pure functions over unit data. Lower priorities win; every comparison
//! ends on the unit id so selection is a strict total order.

use crate::components::{Lane, Stance, StatusEffect, UnitArchetype, UnitInstance};
use crate::math::scale_by_percent;

/// Lexicographic target priority: lane bucket, stance bias, unit id.
pub type TargetPriority = (u8, i64, crate::components::UnitId);

/// 0 for the same lane, 1 for a neighbouring lane, 2 otherwise.
#[must_use]
pub const fn lane_bucket(from: Lane, to: Lane) -> u8 {
    let distance = from.distance(to);
    if distance > 2 {
        2
    } else {
        distance
    }
}

/// Priority of `candidate` as a target for `attacker`.
#[must_use]
pub fn target_priority(
    attacker: &UnitInstance,
    candidate: &UnitInstance,
    candidate_archetype: &UnitArchetype,
) -> TargetPriority {
    let bias = match attacker.stance {
        Stance::Guard => i64::from((candidate.x_tile - attacker.x_tile).abs()),
        Stance::Skirmish => i64::from(candidate.hp),
        Stance::Hunter => i64::from(!candidate_archetype.is_ranged()),
    };
    (lane_bucket(attacker.lane, candidate.lane), bias, candidate.id)
}

/// Attack interval after rally and slow modifiers.
///
/// Modifiers compound in list order. The result is never below one tick.
#[must_use]
pub fn effective_attack_interval(base: u32, statuses: &[StatusEffect]) -> u32 {
    let mut interval = i64::from(base);
    for status in statuses {
        match *status {
            StatusEffect::Rally {
                attack_speed_modifier_pct,
                ..
            } => interval = scale_by_percent(interval, attack_speed_modifier_pct),
            StatusEffect::Slow { percent, .. } => interval = scale_by_percent(interval, percent),
            StatusEffect::Burn { .. } => {}
        }
        interval = interval.max(1);
    }
    u32::try_from(interval.max(1)).unwrap_or(u32::MAX)
}

/// Whether a unit with `speed` tiles per second may step on `tick`.
#[must_use]
pub fn can_move_on_tick(tick: u64, tick_rate: u32, speed: u32) -> bool {
    if speed == 0 {
        return false;
    }
    let interval = u64::from((tick_rate / speed).max(1));
    tick % interval == 0
}

/// Whether `target` is within `range` tiles of `x_tile`.
#[must_use]
pub const fn in_range(x_tile: i32, target_x: i32, range: i32) -> bool {
    (target_x - x_tile).abs() <= range
}
