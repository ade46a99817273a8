//! Core deterministic primitives.
//!
//! Seedable randomness, pure ELO rating math, and state hashing.
//! Nothing in this module touches game entities or persistence.

pub mod rng;
pub mod rating;
pub mod hash;

// Re-export core types
pub use rng::{DeterministicRng, derive_battle_seed};
pub use rating::{Outcome, Division, STARTING_RATING};
pub use hash::{StateHash, compute_state_hash};
