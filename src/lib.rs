//! # Beastforge Engine
//!
//! Deterministic meta-game engine for Beastforge: summoning, fusion,
//! turn-based combat, and ranked matchmaking.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    BEASTFORGE ENGINE                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │  ├── rating.rs   - Pure ELO rating math and divisions        │
//! │  └── hash.rs     - State hashing for verification            │
//! │                                                              │
//! │  game/           - Pure engines (deterministic)              │
//! │  ├── player.rs   - Player economy and ranked-ladder record   │
//! │  ├── creature.rs - Creatures, templates, elements, lineage   │
//! │  ├── ability.rs  - Ability content and typed effects         │
//! │  ├── gacha.rs    - Pity-tracked summon rolls                 │
//! │  ├── fusion.rs   - Stat blending and lineage construction    │
//! │  ├── battle.rs   - Battle state and combatant snapshots      │
//! │  ├── turn.rs     - Authoritative turn resolver               │
//! │  └── events.rs   - Append-only combat log                    │
//! │                                                              │
//! │  service/        - Store-facing orchestration                │
//! │  ├── store.rs    - Injected persistence boundary             │
//! │  ├── collection.rs - Summon and fusion operations            │
//! │  ├── matchmaking.rs- Opponent discovery                      │
//! │  └── lifecycle.rs  - Match lifecycle and rewards             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are **100% deterministic**:
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time dependencies (clocks are explicit parameters)
//! - All randomness from seeded Xorshift128+, injected per call
//!
//! Given identical inputs and RNG seed, a summon session or battle
//! produces **identical results** on any platform.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod service;

// Re-export commonly used types
pub use crate::core::rng::DeterministicRng;
pub use crate::core::rating::{Division, Outcome};
pub use crate::game::battle::{BattleOutcome, BattleState};
pub use crate::game::creature::{Creature, Element, Rarity};
pub use crate::game::player::{Player, PlayerId, Ranking};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
