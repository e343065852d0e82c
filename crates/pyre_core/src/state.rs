//! Battle setup, configuration and the mutable entity store.
//!
//! [`BattleState`] only does storage and bookkeeping. Every rule lives in
//! [`crate::simulation`]. Units are kept in a map for lookup plus an
//! insertion-ordered id list; the list is the only iteration order the
//! engine ever uses.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::components::{BattleOutcome, Lane, Pyre, Stance, Team, UnitId, UnitInstance};
use crate::rng::mix64;

/// Where and how a unit is deployed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitPlacement {
    /// Unit archetype key.
    pub archetype_key: String,
    /// Deployment lane.
    pub lane: Lane,
    /// 0 = front, 1 = mid, 2 = back.
    pub slot: u8,
    /// Target-selection bias.
    pub stance: Stance,
    /// Projects the hero aura.
    #[serde(default)]
    pub is_hero: bool,
    /// Veteran marker.
    #[serde(default)]
    pub is_veteran: bool,
    /// Starting HP override; defaults to archetype max.
    #[serde(default)]
    pub initial_hp: Option<i32>,
}

impl UnitPlacement {
    /// Plain placement at full HP.
    #[must_use]
    pub fn new(archetype_key: impl Into<String>, lane: Lane, slot: u8, stance: Stance) -> Self {
        Self {
            archetype_key: archetype_key.into(),
            lane,
            slot,
            stance,
            is_hero: false,
            is_veteran: false,
            initial_hp: None,
        }
    }

    /// Mark the placement as a hero.
    #[must_use]
    pub fn hero(mut self) -> Self {
        self.is_hero = true;
        self
    }

    /// Mark the placement as a veteran.
    #[must_use]
    pub fn veteran(mut self) -> Self {
        self.is_veteran = true;
        self
    }

    /// Start the unit wounded.
    #[must_use]
    pub fn with_hp(mut self, hp: i32) -> Self {
        self.initial_hp = Some(hp);
        self
    }
}

/// Everything needed to start a battle.
///
/// Fields added after the first replay format carry serde defaults so older
/// records still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleSetup {
    /// Player deployments, in insertion order.
    pub player_placements: Vec<UnitPlacement>,
    /// Enemy deployments, in insertion order.
    pub enemy_placements: Vec<UnitPlacement>,
    /// Player base.
    pub player_pyre: Pyre,
    /// Enemy base.
    pub enemy_pyre: Pyre,
    /// Starting spell energy.
    pub energy: u32,
    /// Player artifact keys.
    #[serde(default)]
    pub player_artifacts: Vec<String>,
    /// Enemy artifact keys.
    #[serde(default)]
    pub enemy_artifacts: Vec<String>,
    /// Player trap key per lane.
    #[serde(default)]
    pub player_traps: BTreeMap<Lane, String>,
    /// Enemy trap key per lane.
    #[serde(default)]
    pub enemy_traps: BTreeMap<Lane, String>,
    /// Castable spell keys; `None` means every spell in the content database.
    #[serde(default)]
    pub hand: Option<Vec<String>>,
}

impl BattleSetup {
    /// Setup with placements and pyres only.
    #[must_use]
    pub fn new(
        player_placements: Vec<UnitPlacement>,
        enemy_placements: Vec<UnitPlacement>,
        player_pyre: Pyre,
        enemy_pyre: Pyre,
        energy: u32,
    ) -> Self {
        Self {
            player_placements,
            enemy_placements,
            player_pyre,
            enemy_pyre,
            energy,
            player_artifacts: Vec::new(),
            enemy_artifacts: Vec::new(),
            player_traps: BTreeMap::new(),
            enemy_traps: BTreeMap::new(),
            hand: None,
        }
    }

    /// Placements for a side.
    #[must_use]
    pub fn placements(&self, team: Team) -> &[UnitPlacement] {
        match team {
            Team::Player => &self.player_placements,
            Team::Enemy => &self.enemy_placements,
        }
    }

    /// Artifact keys for a side.
    #[must_use]
    pub fn artifacts(&self, team: Team) -> &[String] {
        match team {
            Team::Player => &self.player_artifacts,
            Team::Enemy => &self.enemy_artifacts,
        }
    }

    /// Trap keys for a side.
    #[must_use]
    pub fn traps(&self, team: Team) -> &BTreeMap<Lane, String> {
        match team {
            Team::Player => &self.player_traps,
            Team::Enemy => &self.enemy_traps,
        }
    }
}

fn default_field_length() -> i32 {
    30
}

fn default_lane_width() -> u32 {
    96
}

fn default_tick_rate() -> u32 {
    60
}

fn default_casts() -> u32 {
    2
}

fn default_max_ticks() -> u64 {
    60 * 60 * 5
}

/// Tuning knobs for a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleConfig {
    /// Tiles between the two pyres.
    #[serde(default = "default_field_length")]
    pub field_length_tiles: i32,
    /// Presentation hint; the engine does not read it.
    #[serde(default = "default_lane_width")]
    pub lane_width_pixels: u32,
    /// Ticks per simulated second.
    #[serde(default = "default_tick_rate")]
    pub tick_rate: u32,
    /// Spell casts allowed per battle.
    #[serde(default = "default_casts")]
    pub casts_per_battle: u32,
    /// Tick cap before an unresolved battle is forced to defeat.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            field_length_tiles: default_field_length(),
            lane_width_pixels: default_lane_width(),
            tick_rate: default_tick_rate(),
            casts_per_battle: default_casts(),
            max_ticks: default_max_ticks(),
        }
    }
}

/// Compact fingerprint of a battle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BattleDigest {
    /// Tick counter.
    pub tick: u64,
    /// Current outcome.
    pub outcome: BattleOutcome,
    /// Player pyre HP.
    pub player_pyre_hp: i32,
    /// Enemy pyre HP.
    pub enemy_pyre_hp: i32,
    /// Living player units.
    pub player_units: u32,
    /// Living enemy units.
    pub enemy_units: u32,
}

impl BattleDigest {
    /// Fold the digest into a single 64-bit value with the seed mixer.
    ///
    /// This value is what golden replay tests pin.
    #[must_use]
    pub fn hash(&self) -> u64 {
        let mut state = mix64(self.tick);
        for value in [
            self.outcome.code(),
            i64::from(self.player_pyre_hp) as u64,
            i64::from(self.enemy_pyre_hp) as u64,
            u64::from(self.player_units),
            u64::from(self.enemy_units),
        ] {
            state = mix64(state ^ value);
        }
        state
    }
}

/// The mutable battle store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleState {
    pub(crate) tick: u64,
    pub(crate) outcome: BattleOutcome,
    pub(crate) units: BTreeMap<UnitId, UnitInstance>,
    pub(crate) ordered_ids: Vec<UnitId>,
    pub(crate) player_pyre: Pyre,
    pub(crate) enemy_pyre: Pyre,
    pub(crate) energy_remaining: u32,
    pub(crate) casts_remaining: u32,
    pub(crate) hand: BTreeSet<String>,
    pub(crate) player_artifacts: Vec<String>,
    pub(crate) enemy_artifacts: Vec<String>,
    pub(crate) trap_triggered: BTreeMap<Team, BTreeMap<Lane, bool>>,
    pub(crate) last_attacker: BTreeMap<UnitId, UnitId>,
    pub(crate) maneuver_used: bool,
    next_id: u32,
}

impl BattleState {
    /// Empty state seeded from a setup's pyres, energy and loadouts.
    ///
    /// Units are inserted separately by the simulation bootstrap.
    #[must_use]
    pub fn new(setup: &BattleSetup, casts: u32, hand: BTreeSet<String>) -> Self {
        let mut trap_triggered: BTreeMap<Team, BTreeMap<Lane, bool>> = BTreeMap::new();
        for team in [Team::Player, Team::Enemy] {
            for lane in setup.traps(team).keys() {
                trap_triggered.entry(team).or_default().insert(*lane, false);
            }
        }

        Self {
            tick: 0,
            outcome: BattleOutcome::InProgress,
            units: BTreeMap::new(),
            ordered_ids: Vec::new(),
            player_pyre: setup.player_pyre.clone(),
            enemy_pyre: setup.enemy_pyre.clone(),
            energy_remaining: setup.energy,
            casts_remaining: casts,
            hand,
            player_artifacts: setup.player_artifacts.clone(),
            enemy_artifacts: setup.enemy_artifacts.clone(),
            trap_triggered,
            last_attacker: BTreeMap::new(),
            maneuver_used: false,
            next_id: 1,
        }
    }

    /// Current tick.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Current outcome.
    #[must_use]
    pub const fn outcome(&self) -> BattleOutcome {
        self.outcome
    }

    /// Move the outcome out of in-progress.
    ///
    /// Terminal outcomes never change; later calls are ignored.
    pub fn set_outcome(&mut self, outcome: BattleOutcome) {
        if self.outcome == BattleOutcome::InProgress {
            self.outcome = outcome;
        }
    }

    /// Advance the tick counter.
    pub fn advance_tick(&mut self) {
        self.tick += 1;
    }

    /// Assign the next sequence id to `unit` and append it.
    pub fn insert(&mut self, mut unit: UnitInstance) -> UnitId {
        let id = UnitId(self.next_id);
        self.next_id += 1;
        unit.id = id;
        self.units.insert(id, unit);
        self.ordered_ids.push(id);
        id
    }

    /// Remove a unit from both the map and the ordered list.
    pub fn remove(&mut self, id: UnitId) -> Option<UnitInstance> {
        let removed = self.units.remove(&id);
        if removed.is_some() {
            self.ordered_ids.retain(|&other| other != id);
        }
        removed
    }

    /// Look up a unit.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&UnitInstance> {
        self.units.get(&id)
    }

    /// Look up a unit mutably.
    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut UnitInstance> {
        self.units.get_mut(&id)
    }

    /// Ids in insertion order.
    #[must_use]
    pub fn ordered_ids(&self) -> &[UnitId] {
        &self.ordered_ids
    }

    /// Units in insertion order.
    pub fn units(&self) -> impl Iterator<Item = &UnitInstance> {
        self.ordered_ids.iter().filter_map(|id| self.units.get(id))
    }

    /// Living units of one side in insertion order.
    pub fn units_for(&self, team: Team) -> impl Iterator<Item = &UnitInstance> {
        self.units()
            .filter(move |u| u.team == team && u.is_alive())
    }

    /// Number of living units on a side.
    #[must_use]
    pub fn living_unit_count(&self, team: Team) -> u32 {
        self.units_for(team).count() as u32
    }

    /// A side's pyre.
    #[must_use]
    pub fn pyre(&self, team: Team) -> &Pyre {
        match team {
            Team::Player => &self.player_pyre,
            Team::Enemy => &self.enemy_pyre,
        }
    }

    /// A side's pyre, mutably.
    pub fn pyre_mut(&mut self, team: Team) -> &mut Pyre {
        match team {
            Team::Player => &mut self.player_pyre,
            Team::Enemy => &mut self.enemy_pyre,
        }
    }

    /// Spell energy left.
    #[must_use]
    pub const fn energy_remaining(&self) -> u32 {
        self.energy_remaining
    }

    /// Spell casts left.
    #[must_use]
    pub const fn casts_remaining(&self) -> u32 {
        self.casts_remaining
    }

    /// Castable spell keys.
    #[must_use]
    pub fn hand(&self) -> &BTreeSet<String> {
        &self.hand
    }

    /// Artifact keys held by a side.
    #[must_use]
    pub fn artifacts(&self, team: Team) -> &[String] {
        match team {
            Team::Player => &self.player_artifacts,
            Team::Enemy => &self.enemy_artifacts,
        }
    }

    /// Trap status for a side's lane.
    ///
    /// `None` means no trap was configured there; `Some(false)` means armed.
    #[must_use]
    pub fn trap_triggered(&self, team: Team, lane: Lane) -> Option<bool> {
        self.trap_triggered
            .get(&team)
            .and_then(|lanes| lanes.get(&lane))
            .copied()
    }

    /// Most recent attacker of a unit, if it was hit by a unit.
    #[must_use]
    pub fn last_attacker(&self, defender: UnitId) -> Option<UnitId> {
        self.last_attacker.get(&defender).copied()
    }

    /// Whether the one-shot lane swap has been spent.
    #[must_use]
    pub const fn maneuver_used(&self) -> bool {
        self.maneuver_used
    }

    /// Compact fingerprint used for hashing.
    #[must_use]
    pub fn digest(&self) -> BattleDigest {
        BattleDigest {
            tick: self.tick,
            outcome: self.outcome,
            player_pyre_hp: self.player_pyre.hp,
            enemy_pyre_hp: self.enemy_pyre.hp,
            player_units: self.living_unit_count(Team::Player),
            enemy_units: self.living_unit_count(Team::Enemy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Stance;

    fn setup() -> BattleSetup {
        BattleSetup::new(
            Vec::new(),
            Vec::new(),
            Pyre::new(Team::Player, 200, 8, 72),
            Pyre::new(Team::Enemy, 150, 8, 72),
            10,
        )
    }

    fn unit(team: Team) -> UnitInstance {
        UnitInstance {
            id: UnitId(0),
            archetype_key: "spearman".to_string(),
            team,
            lane: Lane::Mid,
            slot: 0,
            x_tile: 0,
            hp: 60,
            attack_cooldown: 0,
            stance: Stance::Guard,
            statuses: Vec::new(),
            is_hero: false,
            is_veteran: false,
            armor: 0,
        }
    }

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let mut state = BattleState::new(&setup(), 2, BTreeSet::new());
        let a = state.insert(unit(Team::Player));
        let b = state.insert(unit(Team::Enemy));
        let c = state.insert(unit(Team::Player));

        assert_eq!((a, b, c), (UnitId(1), UnitId(2), UnitId(3)));
        assert_eq!(state.ordered_ids(), &[a, b, c]);
        assert_eq!(state.living_unit_count(Team::Player), 2);
    }

    #[test]
    fn test_remove_keeps_order_of_rest() {
        let mut state = BattleState::new(&setup(), 2, BTreeSet::new());
        let a = state.insert(unit(Team::Player));
        let b = state.insert(unit(Team::Player));
        let c = state.insert(unit(Team::Player));

        assert!(state.remove(b).is_some());
        assert!(state.remove(b).is_none());
        assert_eq!(state.ordered_ids(), &[a, c]);
        assert!(state.unit(b).is_none());
    }

    #[test]
    fn test_outcome_is_monotonic() {
        let mut state = BattleState::new(&setup(), 2, BTreeSet::new());
        state.set_outcome(BattleOutcome::Victory);
        state.set_outcome(BattleOutcome::Defeat);
        assert_eq!(state.outcome(), BattleOutcome::Victory);
    }

    #[test]
    fn test_traps_start_armed() {
        let mut s = setup();
        s.player_traps.insert(Lane::Mid, "trap.spikes".to_string());
        let state = BattleState::new(&s, 2, BTreeSet::new());

        assert_eq!(state.trap_triggered(Team::Player, Lane::Mid), Some(false));
        assert_eq!(state.trap_triggered(Team::Player, Lane::Left), None);
        assert_eq!(state.trap_triggered(Team::Enemy, Lane::Mid), None);
    }

    #[test]
    fn test_digest_and_hash() {
        let mut state = BattleState::new(&setup(), 2, BTreeSet::new());
        state.insert(unit(Team::Enemy));
        state.advance_tick();

        let digest = state.digest();
        assert_eq!(digest.tick, 1);
        assert_eq!(digest.player_pyre_hp, 200);
        assert_eq!(digest.enemy_pyre_hp, 150);
        assert_eq!(digest.player_units, 0);
        assert_eq!(digest.enemy_units, 1);
        assert_eq!(digest.hash(), state.clone().digest().hash());
    }

    #[test]
    fn test_config_partial_ron_uses_defaults() {
        let config: BattleConfig = ron::from_str("(field_length_tiles: 12)").unwrap();
        assert_eq!(config.field_length_tiles, 12);
        assert_eq!(config.tick_rate, 60);
        assert_eq!(config.casts_per_battle, 2);
        assert_eq!(config.max_ticks, 18_000);
    }
}
