//! Abilities and Effect Definitions
//!
//! Abilities are read-only reference data: an ordered list of typed
//! effects the battle resolver applies in declaration order. Effects
//! are a closed tagged variant so the resolver can match exhaustively
//! without runtime type checks.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

use crate::game::creature::{Element, Stat};

/// Content key for an ability.
pub type AbilityId = String;

// =============================================================================
// STATUS KINDS
// =============================================================================

/// A status condition a combatant can carry for a number of turns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum StatusKind {
    /// Damage over time (5% of max HP at end of turn)
    Burn = 0,
    /// Damage over time (8% of max HP at end of turn)
    Poison = 1,
    /// Skip the turn
    Stun = 2,
    /// Skip the turn
    Freeze = 3,
    /// Heal over time (6% of max HP at end of turn)
    Regenerate = 4,
}

impl StatusKind {
    /// Whether this status makes the afflicted combatant skip its turn.
    pub fn skips_turn(self) -> bool {
        matches!(self, StatusKind::Stun | StatusKind::Freeze)
    }

    /// Whether this status helps rather than harms its carrier.
    pub fn is_beneficial(self) -> bool {
        matches!(self, StatusKind::Regenerate)
    }

    /// HP change at end of the carrier's turn, as percent of max HP.
    /// Negative values are damage.
    pub fn tick_hp_pct(self) -> i32 {
        match self {
            StatusKind::Burn => -5,
            StatusKind::Poison => -8,
            StatusKind::Stun | StatusKind::Freeze => 0,
            StatusKind::Regenerate => 6,
        }
    }
}

// =============================================================================
// EFFECTS
// =============================================================================

/// An atomic ability effect, applied in the order declared on the ability.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectSpec {
    /// Deal damage to the chosen enemy. Elemental multiplier, hit and
    /// crit rolls apply.
    Damage {
        /// Base power added to the attacker's effective attack
        power: i32,
    },

    /// Restore HP to the chosen ally (capped at max HP).
    Heal {
        /// Flat amount restored
        amount: i32,
    },

    /// Apply a status condition with a probability.
    Status {
        /// Condition to apply
        status: StatusKind,
        /// Application chance in whole percent
        chance_pct: u32,
        /// Duration in turns of the afflicted combatant
        turns: u32,
    },

    /// Raise a stat for a duration. `amount` is additive, `percent`
    /// multiplicative; either may be zero.
    Buff {
        /// Stat to modify
        stat: Stat,
        /// Flat increase
        amount: i32,
        /// Percent increase
        percent: i32,
        /// Duration in turns
        turns: u32,
    },

    /// Lower a stat for a duration. `amount`/`percent` are given as
    /// positive magnitudes.
    Debuff {
        /// Stat to modify
        stat: Stat,
        /// Flat decrease
        amount: i32,
        /// Percent decrease
        percent: i32,
        /// Duration in turns
        turns: u32,
    },

    /// Heal the attacker by a fraction of damage dealt so far by this
    /// action.
    Lifesteal {
        /// Fraction of dealt damage, in whole percent
        percent: u32,
    },
}

impl EffectSpec {
    /// Whether this effect targets an enemy (vs. an ally or the actor).
    pub fn is_offensive(&self) -> bool {
        match self {
            EffectSpec::Damage { .. } | EffectSpec::Debuff { .. } => true,
            EffectSpec::Status { status, .. } => !status.is_beneficial(),
            EffectSpec::Heal { .. } | EffectSpec::Buff { .. } | EffectSpec::Lifesteal { .. } => {
                false
            }
        }
    }
}

// =============================================================================
// ABILITY
// =============================================================================

/// Behavior class of an ability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum AbilityKind {
    /// Always-on; never selected as an action
    Passive = 0,
    /// Standard action
    Active = 1,
    /// High-cost action
    Ultimate = 2,
}

/// Ability reference data.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ability {
    /// Content key
    pub id: AbilityId,
    /// Display name
    pub name: String,
    /// Behavior class
    pub kind: AbilityKind,
    /// Energy cost to use
    pub energy_cost: i32,
    /// Cooldown in turns after use
    pub cooldown: u32,
    /// Elemental affinity (drives the matchup multiplier)
    pub element: Element,
    /// Ordered effect list
    pub effects: Vec<EffectSpec>,
}

impl Ability {
    /// Sum of base damage power across this ability's damage effects.
    pub fn total_damage_power(&self) -> i32 {
        self.effects
            .iter()
            .map(|e| match e {
                EffectSpec::Damage { power } => *power,
                _ => 0,
            })
            .sum()
    }

    /// Whether the ability has any damage effect.
    pub fn deals_damage(&self) -> bool {
        self.effects.iter().any(|e| matches!(e, EffectSpec::Damage { .. }))
    }
}

// =============================================================================
// ABILITY BOOK
// =============================================================================

/// Missing or malformed ability content.
///
/// Raised at startup/battle-creation time, never per-request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AbilityBookError {
    /// A creature references an ability id that is not in the book.
    #[error("missing ability reference: {0}")]
    MissingAbility(AbilityId),
}

/// Lookup table of all ability content, keyed by id.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AbilityBook {
    abilities: BTreeMap<AbilityId, Ability>,
}

impl AbilityBook {
    /// Empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a book from a list of abilities.
    pub fn from_abilities(abilities: impl IntoIterator<Item = Ability>) -> Self {
        Self {
            abilities: abilities.into_iter().map(|a| (a.id.clone(), a)).collect(),
        }
    }

    /// Load a book from a JSON array of abilities.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let abilities: Vec<Ability> = serde_json::from_str(json)?;
        Ok(Self::from_abilities(abilities))
    }

    /// Add an ability.
    pub fn insert(&mut self, ability: Ability) {
        self.abilities.insert(ability.id.clone(), ability);
    }

    /// Look up an ability.
    pub fn get(&self, id: &str) -> Option<&Ability> {
        self.abilities.get(id)
    }

    /// Number of abilities.
    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    /// Whether the book is empty.
    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }

    /// Verify every referenced id resolves.
    ///
    /// Battle creation calls this over all participating creatures so
    /// a broken content table fails up front instead of mid-battle.
    pub fn validate_refs<'a>(
        &self,
        ids: impl IntoIterator<Item = &'a AbilityId>,
    ) -> Result<(), AbilityBookError> {
        for id in ids {
            if !self.abilities.contains_key(id) {
                return Err(AbilityBookError::MissingAbility(id.clone()));
            }
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
