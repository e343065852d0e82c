//! Run and encounter seed derivation.
//!
//! A run starts from one draw of external entropy. Every encounter seed
//! after that is a pure function of the run seed, the floor (map column)
//! index and the encounter node's 128-bit identifier, so a whole run can
//! be rebuilt from the run seed and the public map graph.

use crate::rng::mix64;

/// Seed derivation entry points.
pub struct SeedFactory;

impl SeedFactory {
    /// Produce a fresh run seed from a single call to `entropy`.
    ///
    /// This is the only place non-determinism enters a run.
    pub fn make_run_seed<F>(entropy: F) -> u64
    where
        F: FnOnce() -> u64,
    {
        mix64(entropy())
    }

    /// Derive the seed for one encounter node.
    ///
    /// `node_id` is the node's UUID read as a big-endian 128-bit integer.
    #[must_use]
    pub fn encounter_seed(run_seed: u64, floor: i64, node_id: u128, salt: u64) -> u64 {
        let high = (node_id >> 64) as u64;
        let low = node_id as u64;

        let mut state = mix64(run_seed.wrapping_add(salt));
        state = mix64(state.wrapping_add(floor as u64));
        state = mix64(state ^ high);
        mix64(state ^ low)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUN_SEED: u64 = 0xDEAD_BEEF_CAFE_BABE;
    const NODE_A: u128 = 0xD9A5_4F62_7BB7_4C06_AF0D_7E79_D407_F7B3;
    const NODE_B: u128 = 0x0B38_E8F4_E4D3_4CF1_9675_8FA7_196E_5AC9;

    #[test]
    fn test_encounter_seed_is_stable() {
        let a = SeedFactory::encounter_seed(RUN_SEED, 2, NODE_A, 0);
        let b = SeedFactory::encounter_seed(RUN_SEED, 2, NODE_A, 0);
        assert_eq!(a, b);
        assert_eq!(a, 12_588_451_843_636_665_169);
    }

    #[test]
    fn test_each_input_changes_seed() {
        let base = SeedFactory::encounter_seed(RUN_SEED, 2, NODE_A, 0);
        assert_ne!(base, SeedFactory::encounter_seed(RUN_SEED, 3, NODE_A, 0));
        assert_ne!(base, SeedFactory::encounter_seed(RUN_SEED, 2, NODE_B, 0));
        assert_ne!(base, SeedFactory::encounter_seed(RUN_SEED, 2, NODE_A, 1));
        assert_ne!(base, SeedFactory::encounter_seed(RUN_SEED ^ 1, 2, NODE_A, 0));
    }

    #[test]
    fn test_run_seed_mixes_entropy() {
        assert_eq!(SeedFactory::make_run_seed(|| 0), mix64(0));
        assert_ne!(
            SeedFactory::make_run_seed(|| 1),
            SeedFactory::make_run_seed(|| 2)
        );
    }
}
