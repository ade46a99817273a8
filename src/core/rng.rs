//! Deterministic Random Number Generator
//!
//! Uses Xorshift128+ algorithm for fast, high-quality, deterministic randomness.
//! Given the same seed, produces identical sequence on all platforms.
//!
//! Every stochastic engine function takes an explicit `&mut DeterministicRng`
//! rather than drawing from an ambient source, so summon sessions and battles
//! can be replayed exactly.

use serde::{Serialize, Deserialize};
use sha2::{Sha256, Digest};

/// Deterministic PRNG using Xorshift128+ algorithm.
///
/// # Determinism Guarantee
///
/// Given the same seed, this RNG will produce the exact same sequence
/// of random numbers on any platform.
///
/// # Example
///
/// ```
/// use beastforge::core::rng::DeterministicRng;
///
/// let mut rng1 = DeterministicRng::new(12345);
/// let mut rng2 = DeterministicRng::new(12345);
/// assert_eq!(rng1.next_u64(), rng2.next_u64());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeterministicRng {
    state: [u64; 2],
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl DeterministicRng {
    /// Create a new RNG from a 64-bit seed.
    ///
    /// Uses SplitMix64 to initialize the internal state, ensuring
    /// good distribution even from weak seeds.
    pub fn new(seed: u64) -> Self {
        let mut s = seed;
        let state0 = splitmix64(&mut s);
        let state1 = splitmix64(&mut s);

        // Ensure state is never all zeros
        let state = if state0 == 0 && state1 == 0 {
            [1, 1]
        } else {
            [state0, state1]
        };

        Self { state }
    }

    /// Generate the next 64-bit random value.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let s0 = self.state[0];
        let mut s1 = self.state[1];
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.state[0] = s0.rotate_left(24) ^ s1 ^ (s1 << 16);
        self.state[1] = s1.rotate_left(37);

        result
    }

    /// Generate a random u32.
    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        self.next_u64() as u32
    }

    /// Generate a random integer in range [0, max).
    #[inline]
    pub fn next_int(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        // Simple modulo - slight bias for very large max, but acceptable
        (self.next_u64() % max as u64) as u32
    }

    /// Generate a random integer in range [min, max].
    #[inline]
    pub fn next_int_range(&mut self, min: i32, max: i32) -> i32 {
        if min >= max {
            return min;
        }
        let range = (max - min + 1) as u32;
        min + self.next_int(range) as i32
    }

    /// Generate a uniform value in [0, 1) with 53 bits of precision.
    ///
    /// Used for cumulative-distribution draws (drop tables).
    #[inline]
    pub fn next_unit_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Generate a random percentage in [0, 100).
    #[inline]
    pub fn next_percent(&mut self) -> u32 {
        self.next_int(100)
    }

    /// Probability check in whole percent: true with probability `pct`/100.
    #[inline]
    pub fn next_bool_pct(&mut self, pct: u32) -> bool {
        self.next_percent() < pct
    }

    /// Shuffle a slice in place using Fisher-Yates algorithm.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        let len = slice.len();
        for i in (1..len).rev() {
            let j = self.next_int((i + 1) as u32) as usize;
            slice.swap(i, j);
        }
    }

    /// Select a random element from a slice.
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        if slice.is_empty() {
            None
        } else {
            let idx = self.next_int(slice.len() as u32) as usize;
            Some(&slice[idx])
        }
    }

    /// Choose an index with probability proportional to its weight.
    ///
    /// Weights do not need to sum to 1.0. Returns `None` if weights
    /// are empty or all zero.
    pub fn choose_weighted(&mut self, weights: &[f64]) -> Option<usize> {
        if weights.is_empty() {
            return None;
        }

        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return None;
        }

        let mut threshold = self.next_unit_f64() * total;
        for (i, &weight) in weights.iter().enumerate() {
            threshold -= weight;
            if threshold <= 0.0 {
                return Some(i);
            }
        }

        // Floating point edge case - fall back to the last entry
        Some(weights.len() - 1)
    }

    /// Get current state (for checkpointing/debugging).
    pub fn state(&self) -> [u64; 2] {
        self.state
    }

    /// Restore from saved state.
    pub fn set_state(&mut self, state: [u64; 2]) {
        self.state = state;
    }
}

/// SplitMix64 for seed initialization.
/// Produces well-distributed values from sequential seeds.
#[inline]
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Derive a battle seed from match parameters.
///
/// The seed is unique per match and cannot be biased by either
/// participant alone.
///
/// # Parameters
///
/// - `match_id`: Unique match identifier
/// - `participant_ids`: Both participant IDs (MUST be sorted for determinism)
pub fn derive_battle_seed(match_id: &[u8; 16], participant_ids: &[[u8; 16]]) -> u64 {
    let mut hasher = Sha256::new();

    // Domain separator
    hasher.update(b"BEASTFORGE_SEED_V1");

    // Match ID (unique per match)
    hasher.update(match_id);

    // Participant IDs (sorted for determinism)
    // IMPORTANT: Caller must ensure participant_ids is sorted!
    for pid in participant_ids {
        hasher.update(pid);
    }

    let hash = hasher.finalize();

    // Take first 8 bytes as seed
    u64::from_le_bytes(hash[0..8].try_into().unwrap())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_determinism() {
        // Same seed must produce same sequence
        let mut rng1 = DeterministicRng::new(12345);
        let mut rng2 = DeterministicRng::new(12345);

        for _ in 0..1000 {
            assert_eq!(rng1.next_u64(), rng2.next_u64());
        }
    }

    #[test]
    fn test_rng_different_seeds() {
        // Different seeds produce different sequences
        let mut rng1 = DeterministicRng::new(12345);
        let mut rng2 = DeterministicRng::new(54321);

        // Very unlikely to match
        assert_ne!(rng1.next_u64(), rng2.next_u64());
    }

    #[test]
    fn test_next_int() {
        let mut rng = DeterministicRng::new(1234);

        for _ in 0..1000 {
            let val = rng.next_int(100);
            assert!(val < 100);
        }

        // Edge case: max = 0
        assert_eq!(rng.next_int(0), 0);

        // Edge case: max = 1
        assert_eq!(rng.next_int(1), 0);
    }

    #[test]
    fn test_next_int_range() {
        let mut rng = DeterministicRng::new(5678);

        for _ in 0..1000 {
            let val = rng.next_int_range(-10, 10);
            assert!(val >= -10 && val <= 10);
        }

        // Edge case: min = max
        assert_eq!(rng.next_int_range(5, 5), 5);
    }

    #[test]
    fn test_next_unit_f64() {
        let mut rng = DeterministicRng::new(9999);

        for _ in 0..1000 {
            let val = rng.next_unit_f64();
            assert!((0.0..1.0).contains(&val));
        }
    }

    #[test]
    fn test_next_bool_pct_extremes() {
        let mut rng = DeterministicRng::new(7777);

        for _ in 0..100 {
            assert!(!rng.next_bool_pct(0));
            assert!(rng.next_bool_pct(100));
        }
    }

    #[test]
    fn test_shuffle_determinism() {
        let mut rng1 = DeterministicRng::new(1111);
        let mut rng2 = DeterministicRng::new(1111);

        let mut arr1 = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10];
        let mut arr2 = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10];

        rng1.shuffle(&mut arr1);
        rng2.shuffle(&mut arr2);

        assert_eq!(arr1, arr2);
    }

    #[test]
    fn test_choose_weighted() {
        let mut rng = DeterministicRng::new(2468);

        // All mass on index 0
        let weights = [100.0, 0.0, 0.0];
        for _ in 0..10 {
            assert_eq!(rng.choose_weighted(&weights), Some(0));
        }

        // Empty weights
        assert_eq!(rng.choose_weighted(&[]), None);

        // All zero weights
        assert_eq!(rng.choose_weighted(&[0.0, 0.0]), None);
    }

    #[test]
    fn test_derive_battle_seed() {
        let match_id = [1u8; 16];
        let participants = [[2u8; 16], [3u8; 16]];

        let seed1 = derive_battle_seed(&match_id, &participants);
        let seed2 = derive_battle_seed(&match_id, &participants);

        // Same inputs = same seed
        assert_eq!(seed1, seed2);

        // Different match = different seed
        let other_match = [99u8; 16];
        let seed3 = derive_battle_seed(&other_match, &participants);
        assert_ne!(seed1, seed3);
    }

    #[test]
    fn test_state_checkpoint() {
        let mut rng = DeterministicRng::new(5555);

        // Advance some
        for _ in 0..50 {
            rng.next_u64();
        }

        // Save state
        let saved_state = rng.state();

        // Advance more
        let next_values: Vec<u64> = (0..10).map(|_| rng.next_u64()).collect();

        // Restore state
        rng.set_state(saved_state);

        // Should produce same values again
        for expected in next_values {
            assert_eq!(rng.next_u64(), expected);
        }
    }
}
