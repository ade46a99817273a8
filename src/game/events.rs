//! Combat Log
//!
//! Append-only log entries generated during battle resolution. Together
//! with the initial state and RNG seed, the log is sufficient to
//! reconstruct a battle outcome exactly.

use serde::{Serialize, Deserialize};

use crate::game::ability::{AbilityId, StatusKind};
use crate::game::creature::{CreatureId, Stat};

/// Why an acting combatant did nothing this turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum SkipReason {
    /// Stunned
    Stunned = 0,
    /// Frozen
    Frozen = 1,
    /// No ability affordable or off cooldown
    NoUsableAbility = 2,
}

/// What the acting combatant (or the battlefield) did.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogAction {
    /// An ability was used
    Ability {
        /// Ability that resolved
        ability: AbilityId,
    },

    /// The turn was skipped
    Skip {
        /// Why the turn was skipped
        reason: SkipReason,
    },

    /// End-of-turn status conditions ticked on the actor
    StatusTick,

    /// A battlefield-wide domain effect pulsed
    DomainPulse,
}

/// A stat modifier noted in the log when a buff/debuff lands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierNote {
    /// Affected stat
    pub stat: Stat,
    /// Flat change (signed)
    pub amount: i32,
    /// Percent change (signed)
    pub percent: i32,
}

/// Per-target result of one resolved action.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetOutcome {
    /// Target creature
    pub target: CreatureId,

    /// Damage dealt (0 if none)
    pub damage: i32,

    /// Healing received (0 if none)
    pub healing: i32,

    /// Status condition applied, if any
    pub status_applied: Option<StatusKind>,

    /// Buff or debuff applied, if any
    pub modifier_applied: Option<ModifierNote>,

    /// The action missed this target
    pub missed: bool,

    /// The damage was a critical hit
    pub critical: bool,
}

impl TargetOutcome {
    /// Empty outcome for a target.
    pub fn new(target: CreatureId) -> Self {
        Self { target, ..Default::default() }
    }

    /// A plain miss against a target.
    pub fn miss(target: CreatureId) -> Self {
        Self { target, missed: true, ..Default::default() }
    }
}

/// One resolved action in the combat log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatLogEntry {
    /// Turn number the action resolved on
    pub turn: u32,

    /// Acting creature (for domain pulses: the creature whose turn it is)
    pub actor: CreatureId,

    /// What happened
    pub action: LogAction,

    /// Per-target results
    pub outcomes: Vec<TargetOutcome>,
}

impl CombatLogEntry {
    /// Entry for a resolved ability.
    pub fn ability(
        turn: u32,
        actor: CreatureId,
        ability: AbilityId,
        outcomes: Vec<TargetOutcome>,
    ) -> Self {
        Self { turn, actor, action: LogAction::Ability { ability }, outcomes }
    }

    /// Entry for a skipped turn.
    pub fn skip(turn: u32, actor: CreatureId, reason: SkipReason) -> Self {
        Self { turn, actor, action: LogAction::Skip { reason }, outcomes: Vec::new() }
    }

    /// Entry for end-of-turn status ticks on the actor.
    pub fn status_tick(turn: u32, actor: CreatureId, outcomes: Vec<TargetOutcome>) -> Self {
        Self { turn, actor, action: LogAction::StatusTick, outcomes }
    }

    /// Entry for a domain effect pulse.
    pub fn domain_pulse(turn: u32, actor: CreatureId, outcomes: Vec<TargetOutcome>) -> Self {
        Self { turn, actor, action: LogAction::DomainPulse, outcomes }
    }

    /// Total damage across all targets in this entry.
    pub fn total_damage(&self) -> i64 {
        self.outcomes.iter().map(|o| o.damage as i64).sum()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ability_entry() {
        let actor = CreatureId::new([1; 16]);
        let target = CreatureId::new([2; 16]);

        let outcome = TargetOutcome {
            target,
            damage: 42,
            critical: true,
            ..Default::default()
        };
        let entry = CombatLogEntry::ability(3, actor, "scorch".to_string(), vec![outcome]);

        assert_eq!(entry.turn, 3);
        assert_eq!(entry.total_damage(), 42);
        assert!(matches!(entry.action, LogAction::Ability { ref ability } if ability == "scorch"));
    }

    #[test]
    fn test_miss_outcome() {
        let outcome = TargetOutcome::miss(CreatureId::new([2; 16]));
        assert!(outcome.missed);
        assert_eq!(outcome.damage, 0);
        assert!(outcome.status_applied.is_none());
    }

    #[test]
    fn test_skip_entry_has_no_outcomes() {
        let entry = CombatLogEntry::skip(1, CreatureId::new([1; 16]), SkipReason::Stunned);
        assert!(entry.outcomes.is_empty());
        assert_eq!(entry.total_damage(), 0);
    }
}
