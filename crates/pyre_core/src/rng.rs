//! Seeded pseudo-random generator.
//!
//! SplitMix64 state stepping with a 32-bit output. The generator is
//! reproducible bit-for-bit across platforms given the same seed and the
//! same call sequence; nothing here reads OS entropy.

use serde::{Deserialize, Serialize};

/// Golden-ratio increment used by SplitMix64.
pub const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// SplitMix64 finalizer.
///
/// Shared by the generator, the seed factory and the battle hash so all
/// three decorrelate values the same way.
#[must_use]
pub const fn mix64(value: u64) -> u64 {
    let mut z = value.wrapping_add(GOLDEN_GAMMA);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Deterministic random number generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    /// Create a generator from a 64-bit seed.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_mul(GOLDEN_GAMMA),
        }
    }

    /// Next raw 32-bit value.
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(GOLDEN_GAMMA);
        let mut z = self.state;
        z ^= z >> 30;
        z = z.wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z ^= z >> 27;
        z = z.wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        z as u32
    }

    /// Uniform-ish draw in `[0, upper_exclusive)`.
    ///
    /// # Panics
    ///
    /// Panics if `upper_exclusive` is zero.
    pub fn next(&mut self, upper_exclusive: u32) -> u32 {
        assert!(upper_exclusive > 0, "upper bound must be positive");
        self.next_u32() % upper_exclusive
    }

    /// Roll a percent chance.
    ///
    /// `0` never succeeds and `100` always does; neither consumes a draw.
    ///
    /// # Panics
    ///
    /// Panics if `percent` is above 100.
    pub fn chance(&mut self, percent: u32) -> bool {
        assert!(percent <= 100, "percent must be within 0..=100");
        match percent {
            0 => false,
            100 => true,
            _ => self.next(100) < percent,
        }
    }

    /// Fisher-Yates shuffle in place.
    pub fn shuffle<T>(&mut self, values: &mut [T]) {
        if values.len() < 2 {
            return;
        }
        for i in (1..values.len()).rev() {
            let j = self.next((i + 1) as u32) as usize;
            if i != j {
                values.swap(i, j);
            }
        }
    }
}
