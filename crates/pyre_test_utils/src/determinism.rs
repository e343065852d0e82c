//! Determinism testing utilities.
//!
//! Provides a harness for verifying that battles produce identical results
//! given identical inputs.
//!
//! # Testing Strategy
//!
//! A battle must be a pure function of (setup, content, seed, timeline).
//! Sources of non-determinism include:
//!
//! - **Floating-point math**: HP ratios use [`pyre_core::math::Fixed`].
//!
//! - **Map iteration order**: units are always walked through the
//!   insertion-ordered id list, never a map's native order.
//!
//! - **System randomness**: the engine only draws from its seeded
//!   [`pyre_core::rng::DeterministicRng`].
//!
//! # Test Levels
//!
//! 1. **Unit tests**: individual phases (targeting, spells, traps)
//! 2. **Property tests**: random setups must still hash identically
//! 3. **Golden tests**: recorded replays keep their pinned hash
//! 4. **Parallel tests**: running N battles on threads all match

use std::thread;

use pyre_core::content::ContentDatabase;
use pyre_core::replay::BattleReplay;
use pyre_core::simulation::BattleSimulation;
use pyre_core::state::BattleConfig;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    fn from_hashes(hashes: Vec<u64>, ticks: u64) -> Self {
        Self {
            is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
            hashes,
            ticks,
        }
    }

    /// Get all unique hashes (should be 1 for a deterministic battle).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the battle was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Battle is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a state machine multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `ticks` - Number of steps per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance by one step
/// * `hash` - Function to compute the state hash
///
/// # Example
///
/// ```
/// use pyre_test_utils::determinism::verify_determinism;
///
/// let result = verify_determinism(3, 10, || 0u64, |n| *n += 2, |n| *n);
/// result.assert_deterministic();
/// assert_eq!(result.hashes, vec![20, 20, 20]);
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    DeterminismResult::from_hashes(hashes, ticks)
}

/// Run a replay to completion `runs` times and compare final hashes.
///
/// # Panics
///
/// Panics if the replay cannot be constructed against `content`.
pub fn verify_replay_determinism(
    replay: &BattleReplay,
    content: &ContentDatabase,
    config: BattleConfig,
    runs: usize,
) -> DeterminismResult {
    let hashes = (0..runs)
        .map(|_| match replay.hash_outcome(content, config) {
            Ok(hash) => hash,
            Err(err) => panic!("replay failed to build: {err}"),
        })
        .collect();
    DeterminismResult::from_hashes(hashes, config.max_ticks)
}

/// Run N battles on scoped threads and collect final hashes.
///
/// Catches non-determinism that only shows up under thread scheduling or
/// memory layout differences.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn run_parallel_simulations_scoped<'a, F>(
    setup_fn: F,
    num_sims: usize,
    num_ticks: u64,
) -> DeterminismResult
where
    F: Fn() -> BattleSimulation<'a> + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut sim = setup_fn();
                    for _ in 0..num_ticks {
                        sim.step();
                    }
                    sim.battle_hash()
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    DeterminismResult::from_hashes(hashes, num_ticks)
}

/// Compare two runs tick-by-tick, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs agree for `num_ticks`, `Some(tick)` if they diverge
/// at that tick.
pub fn find_first_divergence<'a, F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> BattleSimulation<'a>,
{
    let mut sim1 = setup_fn();
    let mut sim2 = setup_fn();

    if sim1.battle_hash() != sim2.battle_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        sim1.step();
        sim2.step();

        if sim1.state() != sim2.state() {
            tracing::debug!(tick, "Battle states diverged");
            return Some(tick);
        }
    }

    None
}

/// Verify that both replay encodings keep the outcome hash.
///
/// # Returns
///
/// `false` if either encoding fails or a decoded replay hashes differently.
pub fn verify_serialization_determinism(
    replay: &BattleReplay,
    content: &ContentDatabase,
    config: BattleConfig,
) -> bool {
    let Ok(expected) = replay.hash_outcome(content, config) else {
        return false;
    };

    let from_ron = replay
        .to_ron()
        .and_then(|text| BattleReplay::from_ron(&text))
        .and_then(|decoded| decoded.hash_outcome(content, config));
    let from_bytes = replay
        .to_bytes()
        .and_then(|bytes| BattleReplay::from_bytes(&bytes))
        .and_then(|decoded| decoded.hash_outcome(content, config));

    from_ron == Ok(expected) && from_bytes == Ok(expected)
}

/// Proptest strategies for determinism testing.
///
/// These strategies generate random but reproducible battle inputs for
/// property-based testing.
pub mod strategies {
    use proptest::prelude::*;
    use pyre_core::components::{Lane, Stance};
    use pyre_core::replay::{BattleReplay, ReplayAction};
    use pyre_core::state::{BattleSetup, UnitPlacement};

    use crate::fixtures::{self, ACHILLES, ARCHER, HEALER, PATROCLUS, SPEARMAN};

    /// Any lane.
    pub fn arb_lane() -> impl Strategy<Value = Lane> {
        prop_oneof![Just(Lane::Left), Just(Lane::Mid), Just(Lane::Right)]
    }

    /// Any stance.
    pub fn arb_stance() -> impl Strategy<Value = Stance> {
        prop_oneof![
            Just(Stance::Guard),
            Just(Stance::Skirmish),
            Just(Stance::Hunter)
        ]
    }

    /// A fixture unit key.
    pub fn arb_unit_key() -> impl Strategy<Value = &'static str> {
        prop_oneof![
            Just(SPEARMAN),
            Just(ARCHER),
            Just(HEALER),
            Just(ACHILLES),
            Just(PATROCLUS)
        ]
    }

    /// A valid placement of a fixture unit.
    pub fn arb_placement() -> impl Strategy<Value = UnitPlacement> {
        (arb_unit_key(), arb_lane(), 0u8..=2, arb_stance(), any::<bool>()).prop_map(
            |(key, lane, slot, stance, hero)| {
                let placement = UnitPlacement::new(key, lane, slot, stance);
                if hero {
                    placement.hero()
                } else {
                    placement
                }
            },
        )
    }

    /// A setup with up to `max_per_side` units on each side.
    pub fn arb_setup(max_per_side: usize) -> impl Strategy<Value = BattleSetup> {
        (
            proptest::collection::vec(arb_placement(), 0..=max_per_side),
            proptest::collection::vec(arb_placement(), 0..=max_per_side),
            0u32..=12,
        )
            .prop_map(|(player, enemy, energy)| {
                let mut setup = fixtures::setup(player, enemy);
                setup.energy = energy;
                setup
            })
    }

    /// A cast of a fixture spell, with or without an explicit anchor.
    pub fn arb_cast_action(max_tick: u64) -> impl Strategy<Value = ReplayAction> {
        (
            0..max_tick,
            prop_oneof![
                Just(fixtures::SPELL_HEAL),
                Just(fixtures::SPELL_FIREBALL),
                Just(fixtures::SPELL_RALLY),
                Just("spell.unknown")
            ],
            proptest::option::of(arb_lane()),
            proptest::option::of(0i32..30),
        )
            .prop_map(|(tick, spell, lane, tile)| ReplayAction::CastSpell {
                tick,
                spell_id: spell.to_string(),
                lane,
                tile,
            })
    }

    /// A full replay record.
    pub fn arb_replay(max_per_side: usize, max_actions: usize) -> impl Strategy<Value = BattleReplay> {
        (
            any::<u64>(),
            arb_setup(max_per_side),
            proptest::collection::vec(arb_cast_action(2_000), 0..=max_actions),
        )
            .prop_map(|(seed, setup, actions)| BattleReplay::new(seed, setup, actions))
    }
}
