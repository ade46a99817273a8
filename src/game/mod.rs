//! Game Logic Module
//!
//! Pure engines over entity snapshots. 100% deterministic: no
//! persistence, no wall clock, all randomness through an injected RNG.
//!
//! ## Module Structure
//!
//! - `player`: Player economy aggregate and ranked-ladder record
//! - `creature`: Creatures, templates, rarity, elements, lineage
//! - `ability`: Ability reference data and typed effect variants
//! - `gacha`: Pity-tracked summon rolls and template selection
//! - `fusion`: Stat blending, catalysts, lineage construction
//! - `battle`: Battle state, combatants, statuses, domain effects
//! - `turn`: Authoritative turn resolver
//! - `events`: Combat log for replay/verification

pub mod player;
pub mod creature;
pub mod ability;
pub mod gacha;
pub mod fusion;
pub mod battle;
pub mod turn;
pub mod events;

// Re-export key types
pub use player::{Player, PlayerId, Ranking};
pub use creature::{Creature, CreatureId, CreatureTemplate, Element, Rarity, StatBlock};
pub use ability::{Ability, AbilityBook, AbilityKind, EffectSpec, StatusKind};
pub use battle::{BattleConfig, BattleOutcome, BattlePhase, BattleState, TeamSide};
pub use turn::{TurnReport, resolve_turn, run_battle};
pub use events::CombatLogEntry;
