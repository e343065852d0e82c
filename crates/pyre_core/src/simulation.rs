//! Battle simulation: the fixed-tick state machine.
//!
//! A [`BattleSimulation`] owns one [`BattleState`] and borrows the content
//! database it was built from. Each call to [`BattleSimulation::step`]
//! runs one tick in a fixed phase order:
//!
//! 1. scheduled replay casts for this tick
//! 2. status expiry and burn, then the hero aura pass
//! 3. attack cooldowns
//! 4. targeting, movement, trap checks and healer behaviour
//! 5. queued attack resolution
//! 6. pyre shots, then pyre contact
//! 7. victory check
//! 8. tick counter
//!
//! # Determinism
//!
//! - Every "for all units" loop walks the insertion-ordered id list.
//! - Every selection compares an explicit priority ending in [`UnitId`].
//! - All arithmetic is integer; HP ratios use fixed-point.
//! - The seeded [`DeterministicRng`] is the only randomness source.
//!
//! # Example
//!
//! ```
//! use pyre_core::prelude::*;
//!
//! let content = ContentDatabase::new(
//!     vec![UnitArchetype {
//!         key: "spearman".to_string(),
//!         role: Role::Melee,
//!         max_hp: 60,
//!         attack: 8,
//!         attack_interval_ticks: 60,
//!         range_tiles: 1,
//!         speed_tiles_per_second: 2,
//!         cost: 2,
//!     }],
//!     Vec::new(),
//! );
//! let setup = BattleSetup::new(
//!     vec![UnitPlacement::new("spearman", Lane::Mid, 0, Stance::Guard)],
//!     Vec::new(),
//!     Pyre::new(Team::Player, 200, 8, 72),
//!     Pyre::new(Team::Enemy, 8, 8, 72),
//!     10,
//! );
//!
//! let mut sim = BattleSimulation::new(&setup, &content, 42, BattleConfig::default()).unwrap();
//! assert_eq!(sim.simulate_until_finished(10_000), BattleOutcome::Victory);
//! ```

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::components::{
    ArtifactEffect, BattleOutcome, Lane, Role, SpellEffect, SpellTarget, StatusEffect, Team,
    UnitArchetype, UnitId, UnitInstance,
};
use crate::content::ContentDatabase;
use crate::error::{CoreError, Result};
use crate::math::hp_ratio;
use crate::rng::DeterministicRng;
use crate::spells;
use crate::state::{BattleConfig, BattleSetup, BattleState, UnitPlacement};
use crate::targeting::{can_move_on_tick, effective_attack_interval, in_range, target_priority};

/// Attack-speed modifier granted by a hero to adjacent allies.
pub const HERO_AURA_SPEED_PCT: i32 = -10;

/// Highest valid placement slot.
pub const MAX_SLOT: u8 = 2;

/// The only slot the lane-swap maneuver may move.
pub const MANEUVER_SLOT: u8 = 1;

/// A spell cast pinned to a tick, used for replays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledCast {
    /// Tick the cast fires on, before any other phase.
    pub tick: u64,
    /// Spell key.
    pub spell_id: String,
    /// Spell anchor.
    pub target: SpellTarget,
}

#[derive(Debug, Clone, Copy)]
struct PendingAttack {
    attacker: UnitId,
    attacker_team: Team,
    attacker_lane: Lane,
    defender: UnitId,
    damage: i32,
}

/// Artifact totals for one side, resolved at construction.
#[derive(Debug, Clone, Copy, Default)]
struct TeamPassives {
    front_slot_armor: i32,
    on_kill_heal: i32,
}

/// Deterministic battle driver.
#[derive(Debug, Clone)]
pub struct BattleSimulation<'a> {
    state: BattleState,
    content: &'a ContentDatabase,
    config: BattleConfig,
    seed: u64,
    rng: DeterministicRng,
    trap_damage: BTreeMap<(Team, Lane), i32>,
    passives: BTreeMap<Team, TeamPassives>,
    scheduled: Vec<ScheduledCast>,
    next_scheduled: usize,
    pending_attacks: Vec<PendingAttack>,
}

impl<'a> BattleSimulation<'a> {
    /// Build a simulation and deploy every placement.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidPlacementSlot`] for a slot above 2,
    /// [`CoreError::MissingArchetype`] for an unknown unit key and
    /// [`CoreError::MissingTrap`] for an unknown trap key.
    pub fn new(
        setup: &BattleSetup,
        content: &'a ContentDatabase,
        seed: u64,
        config: BattleConfig,
    ) -> Result<Self> {
        let hand: BTreeSet<String> = match &setup.hand {
            Some(keys) => keys.iter().cloned().collect(),
            None => content.spell_keys().map(str::to_string).collect(),
        };

        let mut trap_damage = BTreeMap::new();
        let mut passives = BTreeMap::new();
        for team in [Team::Player, Team::Enemy] {
            for (lane, key) in setup.traps(team) {
                trap_damage.insert((team, *lane), content.trap(key)?.damage());
            }

            let mut totals = TeamPassives::default();
            for key in setup.artifacts(team) {
                match content.artifact(key).map(|a| a.effect) {
                    Some(ArtifactEffect::FrontSlotArmor { amount }) => {
                        totals.front_slot_armor += amount;
                    }
                    Some(ArtifactEffect::OnKillHeal { amount }) => totals.on_kill_heal += amount,
                    None => tracing::warn!(artifact = %key, ?team, "Unknown artifact ignored"),
                }
            }
            passives.insert(team, totals);
        }

        let mut sim = Self {
            state: BattleState::new(setup, config.casts_per_battle, hand),
            content,
            config,
            seed,
            rng: DeterministicRng::new(seed),
            trap_damage,
            passives,
            scheduled: Vec::new(),
            next_scheduled: 0,
            pending_attacks: Vec::new(),
        };
        sim.bootstrap(&setup.player_placements, Team::Player)?;
        sim.bootstrap(&setup.enemy_placements, Team::Enemy)?;
        Ok(sim)
    }

    fn bootstrap(&mut self, placements: &[UnitPlacement], team: Team) -> Result<()> {
        let content = self.content;
        let armor = self.passives.get(&team).map_or(0, |p| p.front_slot_armor);

        for placement in placements {
            if placement.slot > MAX_SLOT {
                return Err(CoreError::InvalidPlacementSlot {
                    slot: placement.slot,
                });
            }
            let archetype = content.unit(&placement.archetype_key)?;
            let hp = placement
                .initial_hp
                .unwrap_or(archetype.max_hp)
                .min(archetype.max_hp)
                .max(1);

            self.state.insert(UnitInstance {
                id: UnitId(0),
                archetype_key: archetype.key.clone(),
                team,
                lane: placement.lane,
                slot: placement.slot,
                x_tile: self.start_tile(team, placement.slot),
                hp,
                attack_cooldown: 0,
                stance: placement.stance,
                statuses: Vec::new(),
                is_hero: placement.is_hero,
                is_veteran: placement.is_veteran,
                armor: if placement.slot == 0 { armor } else { 0 },
            });
        }
        Ok(())
    }

    fn start_tile(&self, team: Team, slot: u8) -> i32 {
        let field = self.config.field_length_tiles;
        let x = match team {
            Team::Player => i32::from(slot),
            Team::Enemy => field - 1 - i32::from(slot),
        };
        x.max(0).min(field)
    }

    // ========================================================================
    // Driver surface
    // ========================================================================

    /// Read-only view of the battle state.
    #[must_use]
    pub fn state(&self) -> &BattleState {
        &self.state
    }

    /// Tuning in effect.
    #[must_use]
    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Seed the simulation was built with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Battle-scoped random stream.
    pub fn rng_mut(&mut self) -> &mut DeterministicRng {
        &mut self.rng
    }

    /// Whether the outcome is final.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state.outcome.is_terminal()
    }

    /// Hash of the current state digest.
    #[must_use]
    pub fn battle_hash(&self) -> u64 {
        self.state.digest().hash()
    }

    /// Register a cast timeline. Casts are stable-sorted by tick.
    ///
    /// Casts for ticks that have already run are skipped.
    pub fn schedule_actions(&mut self, mut actions: Vec<ScheduledCast>) {
        actions.sort_by_key(|a| a.tick);
        self.scheduled = actions;
        self.next_scheduled = 0;
    }

    /// Step until the outcome is final or `max_ticks` is reached.
    ///
    /// A battle still undecided at the cap is forced to defeat.
    pub fn simulate_until_finished(&mut self, max_ticks: u64) -> BattleOutcome {
        while !self.is_complete() && self.state.tick < max_ticks {
            self.step();
        }
        if !self.is_complete() {
            tracing::warn!(
                tick = self.state.tick,
                max_ticks,
                "Battle timed out, forcing defeat"
            );
            self.state.set_outcome(BattleOutcome::Defeat);
            self.log_outcome();
        }
        self.state.outcome
    }

    /// Advance the battle by one tick. Does nothing once the outcome is final.
    pub fn step(&mut self) {
        if self.is_complete() {
            return;
        }

        self.apply_scheduled_actions();
        self.process_statuses();
        self.apply_hero_auras();
        self.update_cooldowns();
        self.acquire_targets_and_move();
        self.resolve_pending_attacks();
        self.perform_pyre_attacks();
        self.check_victory();
        self.state.advance_tick();

        #[cfg(debug_assertions)]
        {
            let hash = self.battle_hash();
            tracing::debug!(tick = self.state.tick, state_hash = hash, "Battle state hash");
        }

        if self.is_complete() {
            self.log_outcome();
        }
    }

    fn log_outcome(&self) {
        tracing::info!(
            tick = self.state.tick,
            outcome = ?self.state.outcome,
            player_pyre_hp = self.state.player_pyre.hp,
            enemy_pyre_hp = self.state.enemy_pyre.hp,
            "Battle finished"
        );
    }

    // ========================================================================
    // Player actions
    // ========================================================================

    /// Cast a spell from the hand at `target`.
    ///
    /// Returns `false` without changing any state when the battle is over,
    /// the budget or energy is short, the spell is not in the hand or not
    /// in the content database, the anchor unit is gone, or the effect
    /// finds nothing to act on.
    pub fn cast(&mut self, spell_id: &str, target: SpellTarget) -> bool {
        if self.is_complete() {
            return self.reject_cast(spell_id, "battle over");
        }
        if self.state.casts_remaining == 0 {
            return self.reject_cast(spell_id, "no casts remaining");
        }
        if !self.state.hand.contains(spell_id) {
            return self.reject_cast(spell_id, "not in hand");
        }
        let content = self.content;
        let Ok(spell) = content.spell(spell_id) else {
            return self.reject_cast(spell_id, "unknown spell");
        };
        if self.state.energy_remaining < spell.cost {
            return self.reject_cast(spell_id, "insufficient energy");
        }
        let Some(anchor) = spells::resolve_anchor(&self.state, target) else {
            return self.reject_cast(spell_id, "anchor unit unavailable");
        };

        let applied = match spell.effect {
            SpellEffect::Heal { amount, radius } => {
                spells::apply_heal(&mut self.state, content, anchor, amount, radius)
            }
            SpellEffect::Fireball { damage, radius } => {
                spells::apply_fireball(&mut self.state, anchor, damage, radius)
            }
            SpellEffect::Rally {
                attack_speed_percent,
                duration_ticks,
            } => spells::apply_rally(
                &mut self.state,
                anchor.lane,
                attack_speed_percent,
                duration_ticks,
            ),
        };
        if !applied {
            return self.reject_cast(spell_id, "no valid targets");
        }

        self.state.energy_remaining -= spell.cost;
        self.state.casts_remaining -= 1;
        tracing::debug!(
            tick = self.state.tick,
            spell = spell_id,
            ?anchor,
            energy = self.state.energy_remaining,
            "Spell cast"
        );
        true
    }

    fn reject_cast(&self, spell_id: &str, reason: &str) -> bool {
        tracing::debug!(tick = self.state.tick, spell = spell_id, reason, "Cast rejected");
        false
    }

    /// Swap the middle-slot player units of two adjacent lanes, once per battle.
    pub fn perform_skirmish_maneuver(&mut self, lane_a: Lane, lane_b: Lane, slot: u8) -> bool {
        if self.is_complete() || self.state.maneuver_used {
            tracing::debug!(tick = self.state.tick, "Maneuver unavailable");
            return false;
        }
        if !lane_a.is_adjacent(lane_b) || slot != MANEUVER_SLOT {
            tracing::debug!(?lane_a, ?lane_b, slot, "Maneuver rejected");
            return false;
        }

        let occupant = |lane: Lane| {
            self.state
                .units_for(Team::Player)
                .find(|u| u.lane == lane && u.slot == slot)
                .map(|u| u.id)
        };
        let (Some(a), Some(b)) = (occupant(lane_a), occupant(lane_b)) else {
            tracing::debug!(?lane_a, ?lane_b, "Maneuver needs both slots occupied");
            return false;
        };

        if let Some(unit) = self.state.unit_mut(a) {
            unit.lane = lane_b;
        }
        if let Some(unit) = self.state.unit_mut(b) {
            unit.lane = lane_a;
        }
        self.state.maneuver_used = true;
        true
    }

    /// Attach a status to a living unit.
    pub fn apply_status(&mut self, id: UnitId, status: StatusEffect) -> bool {
        match self.state.unit_mut(id) {
            Some(unit) if unit.is_alive() => {
                unit.statuses.push(status);
                true
            }
            _ => false,
        }
    }

    // ========================================================================
    // Tick phases
    // ========================================================================

    fn apply_scheduled_actions(&mut self) {
        let tick = self.state.tick;
        while let Some(action) = self.scheduled.get(self.next_scheduled) {
            if action.tick > tick {
                break;
            }
            let action = action.clone();
            self.next_scheduled += 1;
            if action.tick == tick {
                self.cast(&action.spell_id, action.target);
            } else {
                tracing::debug!(tick, action_tick = action.tick, "Skipping stale action");
            }
        }
    }

    fn process_statuses(&mut self) {
        let tick = self.state.tick;
        for id in self.state.ordered_ids.clone() {
            let Some(unit) = self.state.unit_mut(id) else {
                continue;
            };
            if !unit.is_alive() {
                continue;
            }

            let mut burn: i32 = 0;
            unit.statuses.retain(|status| {
                if status.is_expired(tick) {
                    return false;
                }
                if let StatusEffect::Burn {
                    damage_per_tick, ..
                } = *status
                {
                    burn = burn.saturating_add(damage_per_tick);
                }
                true
            });
            unit.hp = unit.hp.saturating_sub(burn);

            if !unit.is_alive() {
                self.kill(id);
            }
        }
    }

    fn apply_hero_auras(&mut self) {
        let expires_at_tick = self.state.tick + 1;
        let heroes: Vec<(UnitId, Team, Lane, u8)> = self
            .state
            .units()
            .filter(|u| u.is_alive() && u.is_hero)
            .map(|u| (u.id, u.team, u.lane, u.slot))
            .collect();

        for (hero, team, lane, slot) in heroes {
            let allies: Vec<UnitId> = self
                .state
                .units_for(team)
                .filter(|u| u.id != hero && u.slot == slot && u.lane.is_adjacent(lane))
                .map(|u| u.id)
                .collect();
            for id in allies {
                if let Some(unit) = self.state.unit_mut(id) {
                    unit.statuses.push(StatusEffect::Rally {
                        expires_at_tick,
                        attack_speed_modifier_pct: HERO_AURA_SPEED_PCT,
                    });
                }
            }
        }
    }

    fn update_cooldowns(&mut self) {
        for id in self.state.ordered_ids.clone() {
            if let Some(unit) = self.state.unit_mut(id) {
                if unit.is_alive() {
                    unit.attack_cooldown = unit.attack_cooldown.saturating_sub(1);
                }
            }
        }
    }

    fn acquire_targets_and_move(&mut self) {
        let content = self.content;
        let tick = self.state.tick;
        self.pending_attacks.clear();

        for id in self.state.ordered_ids.clone() {
            let Some(unit) = self.state.unit(id).filter(|u| u.is_alive()).cloned() else {
                continue;
            };
            let Ok(archetype) = content.unit(&unit.archetype_key) else {
                continue;
            };
            if archetype.role == Role::Healer {
                self.heal_or_advance(&unit, archetype);
                continue;
            }

            let may_move =
                can_move_on_tick(tick, self.config.tick_rate, archetype.speed_tiles_per_second);
            match self.select_target(&unit) {
                Some((target, target_x)) if in_range(unit.x_tile, target_x, archetype.range_tiles) => {
                    if unit.attack_cooldown == 0 {
                        self.queue_attack(&unit, archetype, target);
                    }
                }
                Some(_) if archetype.is_ranged() && self.any_enemy_in_range(&unit, archetype) => {}
                _ => {
                    if may_move {
                        self.advance(id);
                    }
                }
            }
        }
    }

    fn select_target(&self, unit: &UnitInstance) -> Option<(UnitId, i32)> {
        let content = self.content;
        self.state
            .units_for(unit.team.opponent())
            .filter_map(|candidate| {
                let archetype = content.unit(&candidate.archetype_key).ok()?;
                Some((target_priority(unit, candidate, archetype), candidate.x_tile))
            })
            .min_by_key(|(priority, _)| *priority)
            .map(|((_, _, id), x)| (id, x))
    }

    fn any_enemy_in_range(&self, unit: &UnitInstance, archetype: &UnitArchetype) -> bool {
        self.state
            .units_for(unit.team.opponent())
            .any(|enemy| in_range(unit.x_tile, enemy.x_tile, archetype.range_tiles))
    }

    fn queue_attack(&mut self, unit: &UnitInstance, archetype: &UnitArchetype, target: UnitId) {
        self.pending_attacks.push(PendingAttack {
            attacker: unit.id,
            attacker_team: unit.team,
            attacker_lane: unit.lane,
            defender: target,
            damage: archetype.attack,
        });
        if let Some(attacker) = self.state.unit_mut(unit.id) {
            attacker.attack_cooldown =
                effective_attack_interval(archetype.attack_interval_ticks, &attacker.statuses);
        }
    }

    fn heal_or_advance(&mut self, healer: &UnitInstance, archetype: &UnitArchetype) {
        let content = self.content;
        let target = self
            .state
            .units_for(healer.team)
            .filter(|ally| {
                ally.id != healer.id && in_range(healer.x_tile, ally.x_tile, archetype.range_tiles)
            })
            .filter_map(|ally| {
                let max_hp = content.unit(&ally.archetype_key).ok()?.max_hp;
                (ally.hp < max_hp)
                    .then_some(((healer.lane.distance(ally.lane), ally.hp, ally.id), max_hp))
            })
            .min_by_key(|(priority, _)| *priority);

        if let Some(((_, _, ally), max_hp)) = target {
            if healer.attack_cooldown == 0 {
                let amount = (archetype.attack_interval_ticks / 5).max(1) as i32;
                if let Some(unit) = self.state.unit_mut(ally) {
                    unit.hp = (unit.hp + amount).min(max_hp);
                }
                if let Some(unit) = self.state.unit_mut(healer.id) {
                    unit.attack_cooldown =
                        effective_attack_interval(archetype.attack_interval_ticks, &unit.statuses);
                }
                return;
            }
        }

        let direction = healer.team.direction();
        let front_line = self
            .state
            .units_for(healer.team)
            .filter(|ally| ally.id != healer.id)
            .map(|ally| ally.x_tile * direction)
            .max();
        let behind = front_line.is_some_and(|front| healer.x_tile * direction < front);
        if behind
            && can_move_on_tick(
                self.state.tick,
                self.config.tick_rate,
                archetype.speed_tiles_per_second,
            )
        {
            self.advance(healer.id);
        }
    }

    fn advance(&mut self, id: UnitId) {
        let field = self.config.field_length_tiles;
        let Some(unit) = self.state.unit_mut(id) else {
            return;
        };
        unit.x_tile = (unit.x_tile + unit.team.direction()).max(0).min(field);
        let (team, lane, x_tile) = (unit.team, unit.lane, unit.x_tile);
        self.check_trap(id, team, lane, x_tile);
    }

    fn check_trap(&mut self, id: UnitId, team: Team, lane: Lane, x_tile: i32) {
        let defender = team.opponent();
        let Some(&damage) = self.trap_damage.get(&(defender, lane)) else {
            return;
        };
        if self.state.trap_triggered(defender, lane) != Some(false) {
            return;
        }

        let field = self.config.field_length_tiles;
        let zone = field / 3;
        let inside = match defender {
            Team::Player => x_tile <= zone,
            Team::Enemy => x_tile >= field - zone,
        };
        if !inside {
            return;
        }

        if let Some(lanes) = self.state.trap_triggered.get_mut(&defender) {
            lanes.insert(lane, true);
        }
        let dead = match self.state.unit_mut(id) {
            Some(unit) => {
                unit.hp -= damage;
                !unit.is_alive()
            }
            None => false,
        };
        tracing::debug!(
            tick = self.state.tick,
            ?defender,
            ?lane,
            unit = id.0,
            damage,
            "Trap triggered"
        );
        if dead {
            self.kill(id);
        }
    }

    fn resolve_pending_attacks(&mut self) {
        let attacks = std::mem::take(&mut self.pending_attacks);
        for attack in &attacks {
            let Some(defender) = self.state.unit_mut(attack.defender) else {
                continue;
            };
            if !defender.is_alive() {
                continue;
            }
            defender.hp -= (attack.damage - defender.armor).max(0);
            let dead = !defender.is_alive();
            self.state
                .last_attacker
                .insert(attack.defender, attack.attacker);

            if dead {
                self.kill(attack.defender);
                tracing::trace!(
                    victim = attack.defender.0,
                    killer = attack.attacker.0,
                    "Unit slain"
                );
                self.on_kill(attack);
            }
        }
        self.pending_attacks = attacks;
        self.pending_attacks.clear();
    }

    fn on_kill(&mut self, attack: &PendingAttack) {
        let amount = self
            .passives
            .get(&attack.attacker_team)
            .map_or(0, |p| p.on_kill_heal);
        if amount <= 0 {
            return;
        }

        let content = self.content;
        let target = self
            .state
            .units_for(attack.attacker_team)
            .filter(|ally| ally.lane == attack.attacker_lane)
            .filter_map(|ally| {
                let max_hp = content.unit(&ally.archetype_key).ok()?.max_hp;
                (ally.hp < max_hp).then_some((hp_ratio(ally.hp, max_hp), ally.id, max_hp))
            })
            .min_by_key(|(ratio, id, _)| (*ratio, *id));

        if let Some((_, id, max_hp)) = target {
            if let Some(unit) = self.state.unit_mut(id) {
                unit.hp = (unit.hp + amount).min(max_hp);
            }
        }
    }

    fn kill(&mut self, id: UnitId) {
        self.state.remove(id);
        self.state.last_attacker.remove(&id);
    }

    fn perform_pyre_attacks(&mut self) {
        for team in [Team::Player, Team::Enemy] {
            self.pyre_attack(team);
        }
        for team in [Team::Player, Team::Enemy] {
            self.resolve_pyre_contact(team);
        }
    }

    fn pyre_attack(&mut self, team: Team) {
        let pyre = self.state.pyre_mut(team);
        pyre.cooldown = pyre.cooldown.saturating_sub(1);
        if pyre.cooldown > 0 {
            return;
        }
        let Some(target) = self.pyre_target(team) else {
            return;
        };

        let pyre = self.state.pyre_mut(team);
        pyre.cooldown = pyre.attack_interval_ticks;
        let damage = pyre.attack;
        let dead = match self.state.unit_mut(target) {
            Some(unit) => {
                unit.hp -= damage;
                !unit.is_alive()
            }
            None => false,
        };
        if dead {
            self.kill(target);
        }
    }

    /// Most advanced enemy, provided it stands in the middle third.
    fn pyre_target(&self, team: Team) -> Option<UnitId> {
        let field = self.config.field_length_tiles;
        let enemy = team.opponent();
        let direction = enemy.direction();
        let front = self
            .state
            .units_for(enemy)
            .min_by_key(|u| (Reverse(u.x_tile * direction), u.id))?;
        (field / 3..=2 * field / 3)
            .contains(&front.x_tile)
            .then_some(front.id)
    }

    fn resolve_pyre_contact(&mut self, team: Team) {
        let content = self.content;
        let field = self.config.field_length_tiles;
        let arrivals: Vec<(UnitId, i32)> = self
            .state
            .units_for(team)
            .filter(|u| match team {
                Team::Player => u.x_tile >= field,
                Team::Enemy => u.x_tile <= 0,
            })
            .map(|u| (u.id, content.unit(&u.archetype_key).map_or(0, |a| a.attack)))
            .collect();

        for (id, damage) in arrivals {
            let pyre = self.state.pyre_mut(team.opponent());
            pyre.hp = (pyre.hp - damage.max(0)).max(0);
            self.kill(id);
        }
    }

    fn check_victory(&mut self) {
        if self.state.player_pyre.is_destroyed() {
            self.state.set_outcome(BattleOutcome::Defeat);
        } else if self.state.enemy_pyre.is_destroyed() {
            self.state.set_outcome(BattleOutcome::Victory);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Pyre, SpellArchetype, Stance};

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
            vec![SpellArchetype {
                key: "heal".to_string(),
                cost: 2,
                effect: SpellEffect::Heal {
                    amount: 25,
                    radius: None,
                },
            }],
        )
    }

    fn setup(player: Vec<UnitPlacement>, enemy: Vec<UnitPlacement>) -> BattleSetup {
        BattleSetup::new(
            player,
            enemy,
            Pyre::new(Team::Player, 200, 8, 72),
            Pyre::new(Team::Enemy, 200, 8, 72),
            10,
        )
    }

    #[test]
    fn test_invalid_slot_fails_construction() {
        let content = content();
        let s = setup(
            vec![UnitPlacement::new("spearman", Lane::Mid, 3, Stance::Guard)],
            Vec::new(),
        );
        let err = BattleSimulation::new(&s, &content, 1, BattleConfig::default()).unwrap_err();
        assert_eq!(err, CoreError::InvalidPlacementSlot { slot: 3 });
    }

    #[test]
    fn test_unknown_archetype_fails_construction() {
        let content = content();
        let s = setup(
            Vec::new(),
            vec![UnitPlacement::new("cyclops", Lane::Mid, 0, Stance::Guard)],
        );
        let err = BattleSimulation::new(&s, &content, 1, BattleConfig::default()).unwrap_err();
        assert_eq!(err, CoreError::MissingArchetype("cyclops".to_string()));
    }

    #[test]
    fn test_unknown_trap_fails_construction() {
        let content = content();
        let mut s = setup(Vec::new(), Vec::new());
        s.enemy_traps.insert(Lane::Left, "trap.pit".to_string());
        let err = BattleSimulation::new(&s, &content, 1, BattleConfig::default()).unwrap_err();
        assert_eq!(err, CoreError::MissingTrap("trap.pit".to_string()));
    }

    #[test]
    fn test_start_tiles() {
        let content = content();
        let s = setup(
            vec![
                UnitPlacement::new("spearman", Lane::Mid, 0, Stance::Guard),
                UnitPlacement::new("spearman", Lane::Mid, 2, Stance::Guard),
            ],
            vec![UnitPlacement::new("spearman", Lane::Mid, 1, Stance::Guard)],
        );
        let sim = BattleSimulation::new(&s, &content, 1, BattleConfig::default()).unwrap();
        let tiles: Vec<i32> = sim.state().units().map(|u| u.x_tile).collect();
        assert_eq!(tiles, vec![0, 2, 28]);
    }

    #[test]
    fn test_hand_defaults_to_all_spells() {
        let content = content();
        let sim = BattleSimulation::new(
            &setup(Vec::new(), Vec::new()),
            &content,
            1,
            BattleConfig::default(),
        )
        .unwrap();
        assert!(sim.state().hand().contains("heal"));
        assert_eq!(sim.state().casts_remaining(), 2);
    }

    #[test]
    fn test_melee_duel_is_reproducible() {
        let content = content();
        let s = setup(
            vec![UnitPlacement::new("spearman", Lane::Mid, 0, Stance::Guard)],
            vec![UnitPlacement::new("spearman", Lane::Mid, 0, Stance::Skirmish)],
        );

        let mut a = BattleSimulation::new(&s, &content, 9, BattleConfig::default()).unwrap();
        let mut b = BattleSimulation::new(&s, &content, 9, BattleConfig::default()).unwrap();
        for _ in 0..900 {
            a.step();
            b.step();
            assert_eq!(a.battle_hash(), b.battle_hash());
        }
    }

    #[test]
    fn test_timeout_forces_defeat() {
        let content = content();
        let mut sim = BattleSimulation::new(
            &setup(Vec::new(), Vec::new()),
            &content,
            1,
            BattleConfig::default(),
        )
        .unwrap();

        assert_eq!(sim.simulate_until_finished(50), BattleOutcome::Defeat);
        assert_eq!(sim.state().tick(), 50);
        sim.step();
        assert_eq!(sim.state().tick(), 50, "terminal battles do not advance");
    }

    #[test]
    fn test_apply_status_needs_living_unit() {
        let content = content();
        let s = setup(
            vec![UnitPlacement::new("spearman", Lane::Left, 0, Stance::Guard)],
            Vec::new(),
        );
        let mut sim = BattleSimulation::new(&s, &content, 1, BattleConfig::default()).unwrap();
        let burn = StatusEffect::Burn {
            damage_per_tick: 100,
            expires_at_tick: 10,
        };

        assert!(sim.apply_status(UnitId(1), burn));
        sim.step();
        assert!(sim.state().unit(UnitId(1)).is_none());
        assert!(!sim.apply_status(UnitId(1), burn));
    }

    #[test]
    fn test_scheduled_cast_fires_on_its_tick() {
        let content = content();
        let s = setup(
            vec![UnitPlacement::new("spearman", Lane::Mid, 0, Stance::Guard).with_hp(20)],
            Vec::new(),
        );
        let mut sim = BattleSimulation::new(&s, &content, 1, BattleConfig::default()).unwrap();
        sim.schedule_actions(vec![ScheduledCast {
            tick: 3,
            spell_id: "heal".to_string(),
            target: SpellTarget::LanePoint {
                lane: Lane::Mid,
                tile: 0,
            },
        }]);

        for _ in 0..3 {
            sim.step();
        }
        assert_eq!(sim.state().energy_remaining(), 10);
        sim.step();
        assert_eq!(sim.state().energy_remaining(), 8);
        assert_eq!(sim.state().unit(UnitId(1)).map(|u| u.hp), Some(45));
    }
}
