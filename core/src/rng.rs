//! Seeded linear congruential generator shared by every implementation.
//!
//! The generator is the reproducibility contract of the game: a client that
//! runs the same steps from the same [`Seed`] rebuilds a byte-identical map,
//! so the arithmetic here must never change.

use serde::{Deserialize, Serialize};

const MULTIPLIER: u64 = 1_103_515_245;
const INCREMENT: u64 = 12_345;
const MODULUS_MASK: u64 = 0x7fff_ffff;
const MODULUS: f64 = 2_147_483_648.0;

/// 31-bit seed that drives map generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Seed(u32);

impl Seed {
    /// Creates a seed, discarding bits above the 31-bit range.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value & MODULUS_MASK as u32)
    }

    /// Retrieves the numeric representation of the seed.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Seed of the next depth, derived with a single generator step.
    #[must_use]
    pub fn successor(self) -> Seed {
        let mut rng = Lcg::new(self);
        Seed::new(rng.next_u31())
    }
}

/// Linear congruential generator over the 31-bit state space.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    /// Creates a generator whose initial state is the seed.
    #[must_use]
    pub const fn new(seed: Seed) -> Self {
        Self { state: seed.get() }
    }

    /// Advances the generator and returns the new 31-bit state.
    pub fn next_u31(&mut self) -> u32 {
        let next = (u64::from(self.state) * MULTIPLIER + INCREMENT) & MODULUS_MASK;
        self.state = next as u32;
        self.state
    }

    /// Draws a value in `[0, bound)`; a zero bound yields zero.
    pub fn next_below(&mut self, bound: u32) -> u32 {
        let value = self.next_u31();
        if bound == 0 {
            return 0;
        }
        value % bound
    }

    /// Draws a value in `[low, high]`; an inverted range yields `low`.
    pub fn next_in_range(&mut self, low: u32, high: u32) -> u32 {
        if high <= low {
            let _ = self.next_u31();
            return low;
        }
        low + self.next_below(high - low + 1)
    }

    /// Draws a value in `[0, 1)`.
    pub fn next_unit(&mut self) -> f64 {
        f64::from(self.next_u31()) / MODULUS
    }
}
